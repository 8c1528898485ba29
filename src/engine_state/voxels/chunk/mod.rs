//! # Chunk Module
//!
//! This module provides the `Chunk` struct and related functionality for managing
//! 16x16x128 columns of voxel data: coordinate conversions, construction,
//! run-length persistence and terrain generation.
//!
//! ## Block Indexing
//!
//! Every cell of a chunk is addressed by a single packed [`BlockIndex`]:
//!
//! ```text
//!  bit 15 | 14 ......... 8 | 7 ... 4 | 3 ... 0
//!  unused |       z        |    y    |    x
//! ```
//!
//! Because every dimension is a power of two, converting between local
//! coordinates and indices is a handful of masks and shifts, and stepping to a
//! neighbor is a constant offset (`±1` east/west, `±16` north/south, `±256`
//! up/down) as long as the step stays inside the chunk.
//!
//! Chunks span the full world height, so they are keyed by a 2D
//! [`ChunkCoords`] and only ever border each other horizontally.

use cgmath::{Point2, Point3};

use super::block::block_side::BlockSide;
use super::block::block_type::BlockType;
use super::block::Block;

pub mod chunk_codec;
mod chunk_creation;
pub mod chunk_generation;
pub mod chunk_iteration;

pub use chunk_creation::ChunkBuilder;

/// Packed local coordinates of a cell inside its chunk.
pub type BlockIndex = u16;
/// Integer column identifier of a chunk.
pub type ChunkCoords = Point2<i32>;
/// Continuous world-space position. Z is up.
pub type WorldCoords = Point3<f32>;
/// Integer position of a cell inside its chunk.
pub type LocalCoords = Point3<i32>;

/// Bits of the index used by each axis.
pub const CHUNK_X_BITS: u32 = 4;
pub const CHUNK_Y_BITS: u32 = 4;
pub const CHUNK_Z_BITS: u32 = 7;

/// Width of a chunk along X, in blocks.
pub const CHUNK_SIZE_X: i32 = 1 << CHUNK_X_BITS;
/// Length of a chunk along Y, in blocks.
pub const CHUNK_SIZE_Y: i32 = 1 << CHUNK_Y_BITS;
/// Height of a chunk (and of the world) along Z, in blocks.
pub const CHUNK_SIZE_Z: i32 = 1 << CHUNK_Z_BITS;

/// Number of cells in one horizontal layer of a chunk.
pub const BLOCKS_PER_LAYER: usize = (CHUNK_SIZE_X * CHUNK_SIZE_Y) as usize;
/// Total number of cells in a chunk.
pub const BLOCKS_PER_CHUNK: usize = BLOCKS_PER_LAYER * CHUNK_SIZE_Z as usize;

pub const X_MASK: BlockIndex = (CHUNK_SIZE_X - 1) as BlockIndex;
pub const Y_MASK: BlockIndex = ((CHUNK_SIZE_Y - 1) as BlockIndex) << CHUNK_X_BITS;
pub const Z_MASK: BlockIndex = ((CHUNK_SIZE_Z - 1) as BlockIndex) << (CHUNK_X_BITS + CHUNK_Y_BITS);
/// Masks the column (x and y) part of an index.
pub const LAYER_MASK: BlockIndex = X_MASK | Y_MASK;

/// Index offset of one step north (+Y).
pub const STEP_NORTH: BlockIndex = 1 << CHUNK_X_BITS;
/// Index offset of one step up (+Z).
pub const STEP_UP: BlockIndex = 1 << (CHUNK_X_BITS + CHUNK_Y_BITS);

/// Represents a full-height 16x16x128 column of voxel blocks in the world.
///
/// Chunks are the unit of streaming and persistence. The [`World`] owns every
/// active chunk; a chunk only refers to its lateral neighbors by coordinate,
/// and those links are maintained by the world as chunks come and go.
///
/// [`World`]: crate::engine_state::voxels::world::World
#[derive(Clone, Debug)]
pub struct Chunk {
    /// The position of this chunk in chunk coordinates (not block coordinates).
    position: ChunkCoords,

    /// Every cell of the chunk, addressed by [`BlockIndex`].
    blocks: Vec<Block>,

    /// Coordinates of the active neighbor on each lateral side, indexed by
    /// `BlockSide as usize` (east, west, north, south).
    neighbors: [Option<ChunkCoords>; 4],

    /// Set whenever a change may have altered this chunk's visible geometry.
    geometry_stale: bool,
}

impl Chunk {
    /// Wraps a complete cell array. Used by [`ChunkBuilder`].
    fn from_blocks(position: ChunkCoords, blocks: Vec<Block>) -> Self {
        debug_assert_eq!(blocks.len(), BLOCKS_PER_CHUNK);
        Chunk {
            position,
            blocks,
            neighbors: [None; 4],
            geometry_stale: true,
        }
    }

    /// Creates a new, completely empty chunk (all blocks are air).
    ///
    /// # Arguments
    /// * `position` - The chunk coordinates of the new chunk
    ///
    /// # Returns
    /// A new `Chunk` instance filled with unlit air blocks.
    pub fn empty(position: ChunkCoords) -> Self {
        Chunk::from_blocks(position, vec![Block::new(BlockType::AIR); BLOCKS_PER_CHUNK])
    }

    /// The coordinates of this chunk.
    pub fn position(&self) -> ChunkCoords {
        self.position
    }

    /// World-space minimum corner of this chunk.
    pub fn world_mins(&self) -> WorldCoords {
        world_coords_from_chunk_coords(self.position)
    }

    #[inline]
    pub fn block(&self, index: BlockIndex) -> &Block {
        &self.blocks[index as usize]
    }

    #[inline]
    pub fn block_mut(&mut self, index: BlockIndex) -> &mut Block {
        &mut self.blocks[index as usize]
    }

    /// All cells in index order.
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// The packed cell array as raw bytes, two per cell in index order.
    ///
    /// This is what an external mesher consumes to rebuild geometry.
    pub fn cell_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.blocks)
    }

    /// The active neighbor across `side`, if any. Always `None` for top and bottom.
    pub fn neighbor(&self, side: BlockSide) -> Option<ChunkCoords> {
        if side.is_lateral() {
            self.neighbors[side as usize]
        } else {
            None
        }
    }

    /// Links or unlinks the neighbor across a lateral `side`.
    pub(crate) fn set_neighbor(&mut self, side: BlockSide, neighbor: Option<ChunkCoords>) {
        if side.is_lateral() {
            self.neighbors[side as usize] = neighbor;
        }
    }

    pub fn is_geometry_stale(&self) -> bool {
        self.geometry_stale
    }

    pub fn mark_geometry_stale(&mut self) {
        self.geometry_stale = true;
    }

    /// Called by the geometry consumer once it has rebuilt from the current cells.
    pub fn clear_geometry_stale(&mut self) {
        self.geometry_stale = false;
    }

    /// World coordinates of the minimum corner of the cell at `index`.
    pub fn world_coords_from_index(&self, index: BlockIndex) -> WorldCoords {
        let mins = self.world_mins();
        let local = local_coords_from_index(index);
        Point3::new(
            mins.x + local.x as f32,
            mins.y + local.y as f32,
            local.z as f32,
        )
    }

    /// Integer world position of the cell at `index`.
    pub fn world_block_coords(&self, index: BlockIndex) -> Point3<i32> {
        let local = local_coords_from_index(index);
        Point3::new(
            self.position.x * CHUNK_SIZE_X + local.x,
            self.position.y * CHUNK_SIZE_Y + local.y,
            local.z,
        )
    }
}

/// Splits an index into its local (x, y, z) coordinates.
#[inline]
pub fn local_coords_from_index(index: BlockIndex) -> LocalCoords {
    Point3::new(
        (index & X_MASK) as i32,
        ((index & Y_MASK) >> CHUNK_X_BITS) as i32,
        ((index & Z_MASK) >> (CHUNK_X_BITS + CHUNK_Y_BITS)) as i32,
    )
}

/// Packs local coordinates into an index.
///
/// # Returns
/// `None` if any coordinate falls outside the chunk.
#[inline]
pub fn index_from_local_coords(local: LocalCoords) -> Option<BlockIndex> {
    if !(0..CHUNK_SIZE_X).contains(&local.x)
        || !(0..CHUNK_SIZE_Y).contains(&local.y)
        || !(0..CHUNK_SIZE_Z).contains(&local.z)
    {
        return None;
    }
    Some(
        (local.x | (local.y << CHUNK_X_BITS) | (local.z << (CHUNK_X_BITS + CHUNK_Y_BITS)))
            as BlockIndex,
    )
}

/// The chunk column containing a world position.
#[inline]
pub fn chunk_coords_from_world_coords(world: WorldCoords) -> ChunkCoords {
    Point2::new(
        (world.x.floor() as i32) >> CHUNK_X_BITS,
        (world.y.floor() as i32) >> CHUNK_Y_BITS,
    )
}

/// World-space minimum corner of a chunk column. Z is always 0.
#[inline]
pub fn world_coords_from_chunk_coords(coords: ChunkCoords) -> WorldCoords {
    Point3::new(
        (coords.x << CHUNK_X_BITS) as f32,
        (coords.y << CHUNK_Y_BITS) as f32,
        0.0,
    )
}

/// Local coordinates of a world position inside whichever chunk contains it.
///
/// Z is not wrapped; it may fall outside `0..CHUNK_SIZE_Z`.
#[inline]
pub fn local_coords_from_world_coords(world: WorldCoords) -> LocalCoords {
    Point3::new(
        (world.x.floor() as i32) & (CHUNK_SIZE_X - 1),
        (world.y.floor() as i32) & (CHUNK_SIZE_Y - 1),
        world.z.floor() as i32,
    )
}

/// Index of the cell containing a world position, within that position's chunk.
///
/// # Returns
/// `None` when the position is below the bottom or at/above the top of the world.
#[inline]
pub fn index_from_world_coords(world: WorldCoords) -> Option<BlockIndex> {
    index_from_local_coords(local_coords_from_world_coords(world))
}

/// Iterates the indices of the cells on one lateral face of a chunk.
///
/// Returns an empty iterator for top and bottom.
pub fn border_indices(side: BlockSide) -> impl Iterator<Item = BlockIndex> {
    (0..BLOCKS_PER_CHUNK as BlockIndex).filter(move |&index| match side {
        BlockSide::EAST => index & X_MASK == X_MASK,
        BlockSide::WEST => index & X_MASK == 0,
        BlockSide::NORTH => index & Y_MASK == Y_MASK,
        BlockSide::SOUTH => index & Y_MASK == 0,
        BlockSide::TOP | BlockSide::BOTTOM => false,
    })
}

/// Distance between two chunk columns, squared, in chunk units.
#[inline]
pub fn chunk_distance_squared(a: ChunkCoords, b: ChunkCoords) -> i32 {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    dx * dx + dy * dy
}
