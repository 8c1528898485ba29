//! # Active Chunks Module
//!
//! The set of chunks currently resident in memory, keyed by chunk coordinates,
//! and cell addressing that crosses chunk borders.
//!
//! Lateral neighbor lookups follow the links stored on each chunk rather than
//! probing the map, so a lookup across an unlinked edge fails even if the map
//! happens to hold a chunk there. The links are kept symmetric by
//! [`link_neighbors`](ActiveChunks::link_neighbors) and
//! [`unlink_neighbors`](ActiveChunks::unlink_neighbors).

use std::collections::HashMap;

use super::block::block_side::BlockSide;
use super::block::Block;
use super::chunk::{
    chunk_coords_from_world_coords, index_from_world_coords, BlockIndex, Chunk, ChunkCoords,
    WorldCoords, STEP_NORTH, STEP_UP, X_MASK, Y_MASK, Z_MASK,
};

/// A cell addressed by its chunk and its index inside that chunk.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct BlockLocation {
    pub chunk: ChunkCoords,
    pub index: BlockIndex,
}

impl BlockLocation {
    pub fn new(chunk: ChunkCoords, index: BlockIndex) -> Self {
        BlockLocation { chunk, index }
    }
}

/// Every chunk currently in memory.
#[derive(Default, Debug)]
pub struct ActiveChunks {
    chunks: HashMap<ChunkCoords, Chunk>,
}

impl ActiveChunks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn contains(&self, coords: ChunkCoords) -> bool {
        self.chunks.contains_key(&coords)
    }

    pub fn get(&self, coords: ChunkCoords) -> Option<&Chunk> {
        self.chunks.get(&coords)
    }

    pub fn get_mut(&mut self, coords: ChunkCoords) -> Option<&mut Chunk> {
        self.chunks.get_mut(&coords)
    }

    /// Adds a chunk under its own position. Neighbor links are not touched.
    pub(crate) fn insert(&mut self, chunk: Chunk) -> Option<Chunk> {
        self.chunks.insert(chunk.position(), chunk)
    }

    pub(crate) fn remove(&mut self, coords: ChunkCoords) -> Option<Chunk> {
        self.chunks.remove(&coords)
    }

    /// Coordinates of every active chunk, in no particular order.
    pub fn coords(&self) -> impl Iterator<Item = ChunkCoords> + '_ {
        self.chunks.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Chunk> {
        self.chunks.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Chunk> {
        self.chunks.values_mut()
    }

    pub fn block(&self, location: BlockLocation) -> Option<&Block> {
        self.get(location.chunk).map(|chunk| chunk.block(location.index))
    }

    pub fn block_mut(&mut self, location: BlockLocation) -> Option<&mut Block> {
        self.get_mut(location.chunk)
            .map(|chunk| chunk.block_mut(location.index))
    }

    /// Marks the chunk at `coords`, if active, as needing new geometry.
    pub fn mark_stale(&mut self, coords: ChunkCoords) {
        if let Some(chunk) = self.get_mut(coords) {
            chunk.mark_geometry_stale();
        }
    }

    /// Resolves a world position to an active cell.
    ///
    /// # Returns
    /// `None` if the containing chunk is inactive or the position is outside
    /// the column's height.
    pub fn location_at_world(&self, world: WorldCoords) -> Option<BlockLocation> {
        let chunk = chunk_coords_from_world_coords(world);
        if !self.contains(chunk) {
            return None;
        }
        let index = index_from_world_coords(world)?;
        Some(BlockLocation { chunk, index })
    }

    pub fn block_at_world(&self, world: WorldCoords) -> Option<&Block> {
        self.location_at_world(world)
            .and_then(|location| self.block(location))
    }

    /// The cell adjacent to `location` across `side`.
    ///
    /// Steps inside the chunk are plain index offsets. Lateral steps off the
    /// edge follow the chunk's neighbor link and wrap the index to the far
    /// edge of the neighbor.
    ///
    /// # Returns
    /// `None` above the top or below the bottom of the column, across an
    /// edge with no linked neighbor, or if `location` itself is inactive.
    pub fn neighbor_location(&self, location: BlockLocation, side: BlockSide) -> Option<BlockLocation> {
        let chunk = self.get(location.chunk)?;
        let index = location.index;
        let across = |index: BlockIndex| {
            chunk
                .neighbor(side)
                .map(|neighbor| BlockLocation::new(neighbor, index))
        };
        let within = |index: BlockIndex| Some(BlockLocation::new(location.chunk, index));

        match side {
            BlockSide::EAST if index & X_MASK == X_MASK => across(index & !X_MASK),
            BlockSide::EAST => within(index + 1),
            BlockSide::WEST if index & X_MASK == 0 => across(index | X_MASK),
            BlockSide::WEST => within(index - 1),
            BlockSide::NORTH if index & Y_MASK == Y_MASK => across(index & !Y_MASK),
            BlockSide::NORTH => within(index + STEP_NORTH),
            BlockSide::SOUTH if index & Y_MASK == 0 => across(index | Y_MASK),
            BlockSide::SOUTH => within(index - STEP_NORTH),
            BlockSide::TOP if index & Z_MASK == Z_MASK => None,
            BlockSide::TOP => within(index + STEP_UP),
            BlockSide::BOTTOM if index & Z_MASK == 0 => None,
            BlockSide::BOTTOM => within(index - STEP_UP),
        }
    }

    /// Whether stepping across `side` from `location` leaves its chunk.
    pub fn crosses_chunk_edge(location: BlockLocation, side: BlockSide) -> bool {
        let index = location.index;
        match side {
            BlockSide::EAST => index & X_MASK == X_MASK,
            BlockSide::WEST => index & X_MASK == 0,
            BlockSide::NORTH => index & Y_MASK == Y_MASK,
            BlockSide::SOUTH => index & Y_MASK == 0,
            BlockSide::TOP | BlockSide::BOTTOM => false,
        }
    }

    /// Links the chunk at `coords` with every active lateral neighbor, in
    /// both directions.
    pub(crate) fn link_neighbors(&mut self, coords: ChunkCoords) {
        for side in BlockSide::lateral() {
            let offset = side.offset();
            let neighbor = ChunkCoords::new(coords.x + offset.x, coords.y + offset.y);
            let Some(neighbor_chunk) = self.get_mut(neighbor) else {
                continue;
            };
            neighbor_chunk.set_neighbor(side.opposite(), Some(coords));
            if let Some(chunk) = self.get_mut(coords) {
                chunk.set_neighbor(side, Some(neighbor));
            }
        }
    }

    /// Clears every link to and from the chunk at `coords`.
    ///
    /// # Returns
    /// Each former neighbor together with the side of that neighbor which is
    /// now open.
    pub(crate) fn unlink_neighbors(&mut self, coords: ChunkCoords) -> Vec<(ChunkCoords, BlockSide)> {
        let Some(chunk) = self.get_mut(coords) else {
            return Vec::new();
        };
        let mut former = Vec::with_capacity(4);
        for side in BlockSide::lateral() {
            if let Some(neighbor) = chunk.neighbor(side) {
                former.push((neighbor, side.opposite()));
            }
            chunk.set_neighbor(side, None);
        }
        for &(neighbor, open_side) in &former {
            if let Some(neighbor_chunk) = self.get_mut(neighbor) {
                neighbor_chunk.set_neighbor(open_side, None);
            }
        }
        former
    }
}
