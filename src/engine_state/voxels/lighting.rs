//! # Lighting Module
//!
//! Incremental light propagation over the active chunks.
//!
//! Every cell stores a light value in `0..=15`. The value a cell *should*
//! hold, its ideal light, is one less than the brightest of itself-plus-one
//! and its six neighbors:
//!
//! ```text
//! ideal = max(inherent + 1, neighbor lights...) - 1
//! ```
//!
//! Cells that see the sky never drop below the ambient sky level, and opaque
//! cells hold only their own emission because light cannot pass through them.
//!
//! Cells whose ideal may have changed are flagged dirty and pushed onto a
//! work stack. Draining the stack recomputes each cell; a cell whose value
//! changes dirties its non-opaque neighbors, so changes ripple outward until
//! nothing moves. The dirty flag keeps a cell from sitting in the stack
//! twice.
//!
//! For debugging, [`LightingMode::Capture`] parks queued cells instead of
//! processing them so the wavefront can be inspected and stepped manually.

use log::{debug, trace};

use super::active_chunks::{ActiveChunks, BlockLocation};
use super::block::block_definition::BlockRegistry;
use super::block::block_side::BlockSide;
use super::block::block_type::BlockType;
use super::chunk::{
    border_indices, BlockIndex, ChunkCoords, WorldCoords, BLOCKS_PER_LAYER, CHUNK_SIZE_Z,
    STEP_UP,
};

/// Ambient sky level at noon.
pub const DAYLIGHT: u8 = 15;
/// Ambient sky level under heavy cloud or at dusk.
pub const MEDIUMLIGHT: u8 = 10;
/// Ambient sky level at night.
pub const MOONLIGHT: u8 = 6;

/// How [`LightingEngine::update`] treats queued cells.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum LightingMode {
    /// Drain the queue to a fixed point.
    #[default]
    Propagate,
    /// Park queued cells for inspection. Cells handed back with
    /// [`LightingEngine::release_captured`] are processed one wave per update.
    Capture,
}

/// Counters from one lighting update.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct LightingStats {
    /// Cells recomputed.
    pub processed: usize,
    /// Cells whose light value changed.
    pub changed: usize,
}

/// Owns the dirty-cell work stack and the ambient sky level.
#[derive(Debug)]
pub struct LightingEngine {
    dirty_blocks: Vec<BlockLocation>,
    captured: Vec<BlockLocation>,
    released: Vec<BlockLocation>,
    sky_light_level: u8,
}

impl LightingEngine {
    pub fn new(sky_light_level: u8) -> Self {
        LightingEngine {
            dirty_blocks: Vec::new(),
            captured: Vec::new(),
            released: Vec::new(),
            sky_light_level: sky_light_level.min(DAYLIGHT),
        }
    }

    pub fn sky_light_level(&self) -> u8 {
        self.sky_light_level
    }

    /// Number of cells waiting to be processed, captured ones included.
    pub fn pending(&self) -> usize {
        self.dirty_blocks.len() + self.captured.len() + self.released.len()
    }

    pub fn is_settled(&self) -> bool {
        self.pending() == 0
    }

    /// Flags `location` dirty and queues it, unless it is already queued.
    pub fn enqueue(&mut self, location: BlockLocation, chunks: &mut ActiveChunks) {
        let Some(block) = chunks.block_mut(location) else {
            return;
        };
        if !block.is_lighting_dirty() {
            block.dirty_lighting();
            self.dirty_blocks.push(location);
        }
    }

    /// Queues every non-opaque, not-yet-dirty neighbor of `location`.
    ///
    /// Each neighbor's chunk is also marked stale, since a light change at a
    /// chunk edge shows up in the adjacent chunk's geometry.
    pub fn dirty_nonopaque_neighbors(
        &mut self,
        location: BlockLocation,
        including_above_below: bool,
        chunks: &mut ActiveChunks,
        registry: &BlockRegistry,
    ) {
        for side in BlockSide::all() {
            if !including_above_below && !side.is_lateral() {
                continue;
            }
            let Some(neighbor) = chunks.neighbor_location(location, side) else {
                continue;
            };
            let Some(chunk) = chunks.get_mut(neighbor.chunk) else {
                continue;
            };
            chunk.mark_geometry_stale();
            let block = chunk.block_mut(neighbor.index);
            if !registry.of(block).is_opaque && !block.is_lighting_dirty() {
                block.dirty_lighting();
                self.dirty_blocks.push(neighbor);
            }
        }
    }

    /// The light value `location` should hold given its neighbors.
    ///
    /// # Returns
    /// `None` if the cell's chunk is not active.
    pub fn ideal_light(
        &self,
        location: BlockLocation,
        chunks: &ActiveChunks,
        registry: &BlockRegistry,
    ) -> Option<u8> {
        let block = chunks.block(location)?;
        let definition = registry.of(block);
        // Opaque cells hold their own emission and take nothing from neighbors.
        if definition.is_opaque {
            return Some(definition.inherent_light);
        }

        let mut brightest = definition.inherent_light + 1;
        for side in BlockSide::all() {
            let neighbor = chunks
                .neighbor_location(location, side)
                .and_then(|neighbor| chunks.block(neighbor));
            if let Some(neighbor) = neighbor {
                brightest = brightest.max(neighbor.light_value());
            }
        }

        let ideal = brightest - 1;
        if block.is_sky() {
            Some(ideal.max(self.sky_light_level))
        } else {
            Some(ideal)
        }
    }

    /// Seeds a newly activated chunk.
    ///
    /// Each column is walked from the top down. Air above the first non-air
    /// cell is sky: it is flagged, set to the ambient level and its lateral
    /// neighbors are queued. Below that, emitters queue their neighbors and
    /// every other non-opaque cell is queued itself.
    pub fn seed_activated_chunk(
        &mut self,
        coords: ChunkCoords,
        chunks: &mut ActiveChunks,
        registry: &BlockRegistry,
    ) {
        let queued_before = self.dirty_blocks.len();
        for column in 0..BLOCKS_PER_LAYER as BlockIndex {
            let mut ended_sky = false;
            for z in (0..CHUNK_SIZE_Z as BlockIndex).rev() {
                let location = BlockLocation::new(coords, column + z * STEP_UP);
                let Some(block) = chunks.block_mut(location) else {
                    return;
                };

                if !ended_sky && block.block_type() == BlockType::AIR {
                    block.mark_as_sky();
                    block.set_light_value(self.sky_light_level);
                    self.dirty_nonopaque_neighbors(location, false, chunks, registry);
                    continue;
                }

                ended_sky = true;
                if block.light_value() != 0 {
                    self.dirty_nonopaque_neighbors(location, true, chunks, registry);
                } else if !registry.of(block).is_opaque && !block.is_lighting_dirty() {
                    block.dirty_lighting();
                    self.dirty_blocks.push(location);
                }
            }
        }
        trace!(
            "Seeded chunk {:?}: {} cells queued",
            coords,
            self.dirty_blocks.len() - queued_before
        );
    }

    /// Queues the non-opaque cells on one lateral face of a chunk, used when
    /// the neighbor across that face goes away.
    pub fn dirty_border(
        &mut self,
        coords: ChunkCoords,
        side: BlockSide,
        chunks: &mut ActiveChunks,
        registry: &BlockRegistry,
    ) {
        let Some(chunk) = chunks.get_mut(coords) else {
            return;
        };
        chunk.mark_geometry_stale();
        for index in border_indices(side) {
            let block = chunk.block_mut(index);
            if !registry.of(block).is_opaque && !block.is_lighting_dirty() {
                block.dirty_lighting();
                self.dirty_blocks.push(BlockLocation::new(coords, index));
            }
        }
    }

    /// Drops every queued entry that belongs to the chunk at `coords`.
    pub fn purge_chunk(&mut self, coords: ChunkCoords) {
        let before = self.pending();
        self.dirty_blocks.retain(|location| location.chunk != coords);
        self.captured.retain(|location| location.chunk != coords);
        self.released.retain(|location| location.chunk != coords);
        let purged = before - self.pending();
        if purged > 0 {
            trace!("Purged {} queued cells of chunk {:?}", purged, coords);
        }
    }

    /// Changes the ambient level and queues every sky cell for recomputation.
    pub fn set_sky_light_level(
        &mut self,
        level: u8,
        chunks: &mut ActiveChunks,
    ) {
        let level = level.min(DAYLIGHT);
        if level == self.sky_light_level {
            return;
        }
        debug!("Sky light level {} -> {}", self.sky_light_level, level);
        self.sky_light_level = level;

        for chunk in chunks.iter_mut() {
            let coords = chunk.position();
            for index in 0..chunk.blocks().len() as BlockIndex {
                let block = chunk.block_mut(index);
                if block.is_sky() && !block.is_lighting_dirty() {
                    block.dirty_lighting();
                    self.dirty_blocks.push(BlockLocation::new(coords, index));
                }
            }
        }
    }

    /// Recomputes one cell.
    ///
    /// # Returns
    /// Whether its light value changed, or `None` if its chunk is gone.
    fn update_block(
        &mut self,
        location: BlockLocation,
        chunks: &mut ActiveChunks,
        registry: &BlockRegistry,
    ) -> Option<bool> {
        let ideal = self.ideal_light(location, chunks, registry)?;
        let chunk = chunks.get_mut(location.chunk)?;
        chunk.mark_geometry_stale();
        let block = chunk.block_mut(location.index);
        let changed = block.light_value() != ideal;
        block.set_light_value(ideal);
        block.undirty_lighting();

        if changed {
            self.dirty_nonopaque_neighbors(location, true, chunks, registry);
        }
        Some(changed)
    }

    /// Processes queued cells according to `mode`.
    ///
    /// In [`LightingMode::Propagate`] every queued cell, including any still
    /// captured, is drained to a fixed point. In [`LightingMode::Capture`]
    /// newly queued cells are parked, and only cells previously handed back
    /// with [`release_captured`](Self::release_captured) are processed.
    pub fn update(
        &mut self,
        mode: LightingMode,
        chunks: &mut ActiveChunks,
        registry: &BlockRegistry,
    ) -> LightingStats {
        let mut stats = LightingStats::default();
        match mode {
            LightingMode::Propagate => {
                self.dirty_blocks.append(&mut self.released);
                self.dirty_blocks.append(&mut self.captured);
                while let Some(location) = self.dirty_blocks.pop() {
                    self.record(location, chunks, registry, &mut stats);
                }
            }
            LightingMode::Capture => {
                self.captured.append(&mut self.dirty_blocks);
                let wave = std::mem::take(&mut self.released);
                for location in wave {
                    self.record(location, chunks, registry, &mut stats);
                }
                self.captured.append(&mut self.dirty_blocks);
            }
        }

        if stats.processed > 0 {
            trace!(
                "Lighting pass: {} processed, {} changed, {} pending",
                stats.processed,
                stats.changed,
                self.pending()
            );
        }
        stats
    }

    fn record(
        &mut self,
        location: BlockLocation,
        chunks: &mut ActiveChunks,
        registry: &BlockRegistry,
        stats: &mut LightingStats,
    ) {
        if let Some(changed) = self.update_block(location, chunks, registry) {
            stats.processed += 1;
            if changed {
                stats.changed += 1;
            }
        }
    }

    /// World positions of the cells parked by [`LightingMode::Capture`].
    pub fn captured_positions(&self, chunks: &ActiveChunks) -> Vec<WorldCoords> {
        self.captured
            .iter()
            .filter_map(|location| {
                chunks
                    .get(location.chunk)
                    .map(|chunk| chunk.world_coords_from_index(location.index))
            })
            .collect()
    }

    /// Hands every captured cell back for processing by the next update.
    pub fn release_captured(&mut self) -> usize {
        let count = self.captured.len();
        self.released.append(&mut self.captured);
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::voxels::block::Block;
    use crate::engine_state::voxels::chunk::{
        index_from_local_coords, Chunk, ChunkBuilder, LocalCoords, BLOCKS_PER_CHUNK,
    };
    use cgmath::Point2;

    fn index(x: i32, y: i32, z: i32) -> BlockIndex {
        index_from_local_coords(LocalCoords::new(x, y, z)).unwrap()
    }

    /// A chunk of stone below `ground` and air above it.
    fn layered(coords: ChunkCoords, ground: i32, registry: &BlockRegistry) -> Chunk {
        let mut builder = ChunkBuilder::new(coords);
        builder.push_run(registry.default_block(BlockType::STONE), BLOCKS_PER_LAYER * ground as usize);
        builder.push_run(registry.default_block(BlockType::AIR), BLOCKS_PER_CHUNK);
        builder.return_chunk()
    }

    fn activate(
        engine: &mut LightingEngine,
        chunks: &mut ActiveChunks,
        chunk: Chunk,
        registry: &BlockRegistry,
    ) {
        let coords = chunk.position();
        chunks.insert(chunk);
        chunks.link_neighbors(coords);
        engine.seed_activated_chunk(coords, chunks, registry);
    }

    fn assert_fixed_point(engine: &LightingEngine, chunks: &ActiveChunks, registry: &BlockRegistry) {
        for chunk in chunks.iter() {
            for index in 0..BLOCKS_PER_CHUNK as BlockIndex {
                let location = BlockLocation::new(chunk.position(), index);
                let stored = chunk.block(index).light_value();
                assert_eq!(
                    engine.ideal_light(location, chunks, registry),
                    Some(stored),
                    "cell {index} of {:?}",
                    chunk.position()
                );
                assert!(!chunk.block(index).is_lighting_dirty());
            }
        }
    }

    #[test]
    fn open_sky_is_ambient_everywhere() {
        let registry = BlockRegistry::default();
        let mut chunks = ActiveChunks::new();
        let mut engine = LightingEngine::new(MEDIUMLIGHT);
        activate(&mut engine, &mut chunks, layered(Point2::new(0, 0), 0, &registry), &registry);
        engine.update(LightingMode::Propagate, &mut chunks, &registry);

        let chunk = chunks.get(Point2::new(0, 0)).unwrap();
        assert!(chunk
            .blocks()
            .iter()
            .all(|block| block.is_sky() && block.light_value() == MEDIUMLIGHT));
        assert!(engine.is_settled());
    }

    #[test]
    fn glowstone_in_a_cave_falls_off_by_distance() {
        let registry = BlockRegistry::default();
        let mut builder = ChunkBuilder::new(Point2::new(0, 0));
        // Stone everywhere except a one-cell-high air slab at z = 10.
        builder.push_run(registry.default_block(BlockType::STONE), BLOCKS_PER_LAYER * 10);
        builder.push_run(registry.default_block(BlockType::AIR), BLOCKS_PER_LAYER);
        builder.push_run(registry.default_block(BlockType::STONE), BLOCKS_PER_CHUNK);
        let mut chunk = builder.return_chunk();
        *chunk.block_mut(index(0, 0, 10)) = registry.default_block(BlockType::GLOWSTONE);

        let mut chunks = ActiveChunks::new();
        let mut engine = LightingEngine::new(DAYLIGHT);
        activate(&mut engine, &mut chunks, chunk, &registry);
        let stats = engine.update(LightingMode::Propagate, &mut chunks, &registry);
        assert!(stats.changed > 0);

        let chunk = chunks.get(Point2::new(0, 0)).unwrap();
        assert_eq!(chunk.block(index(0, 0, 10)).light_value(), 14);
        assert_eq!(chunk.block(index(1, 0, 10)).light_value(), 13);
        assert_eq!(chunk.block(index(3, 4, 10)).light_value(), 7);
        assert_eq!(chunk.block(index(15, 15, 10)).light_value(), 0);
        // Light does not pass through the stone above.
        assert_eq!(chunk.block(index(1, 0, 11)).light_value(), 0);
        assert_fixed_point(&engine, &chunks, &registry);
    }

    #[test]
    fn light_crosses_linked_chunk_edges() {
        let registry = BlockRegistry::default();
        let mut chunks = ActiveChunks::new();
        let mut engine = LightingEngine::new(DAYLIGHT);

        // A roofed tunnel in the east chunk opening onto a sky shaft in the west one.
        let mut east = layered(Point2::new(1, 0), 20, &registry);
        for x in 0..4 {
            *east.block_mut(index(x, 7, 19)) = registry.default_block(BlockType::AIR);
            *east.block_mut(index(x, 7, 20)) = registry.default_block(BlockType::STONE);
        }
        let mut west = layered(Point2::new(0, 0), 20, &registry);
        *west.block_mut(index(15, 7, 19)) = registry.default_block(BlockType::AIR);

        activate(&mut engine, &mut chunks, east, &registry);
        activate(&mut engine, &mut chunks, west, &registry);
        engine.update(LightingMode::Propagate, &mut chunks, &registry);

        let west = chunks.get(Point2::new(0, 0)).unwrap();
        assert!(west.block(index(15, 7, 19)).is_sky());
        assert_eq!(west.block(index(15, 7, 19)).light_value(), DAYLIGHT);
        let east = chunks.get(Point2::new(1, 0)).unwrap();
        assert!(!east.block(index(0, 7, 19)).is_sky());
        assert_eq!(east.block(index(0, 7, 19)).light_value(), 14);
        assert_eq!(east.block(index(3, 7, 19)).light_value(), 11);
        assert_fixed_point(&engine, &chunks, &registry);
    }

    #[test]
    fn capture_parks_cells_until_released() {
        let registry = BlockRegistry::default();
        let mut chunks = ActiveChunks::new();
        let mut engine = LightingEngine::new(DAYLIGHT);
        let mut chunk = layered(Point2::new(0, 0), 30, &registry);
        *chunk.block_mut(index(8, 8, 35)) = Block::with_light(BlockType::GLOWSTONE, 14);
        activate(&mut engine, &mut chunks, chunk, &registry);

        let stats = engine.update(LightingMode::Capture, &mut chunks, &registry);
        assert_eq!(stats.processed, 0);
        let parked = engine.captured_positions(&chunks).len();
        assert!(parked > 0);

        // Each released wave is processed once and its successors are parked.
        assert_eq!(engine.release_captured(), parked);
        let stats = engine.update(LightingMode::Capture, &mut chunks, &registry);
        assert_eq!(stats.processed, parked);

        engine.update(LightingMode::Propagate, &mut chunks, &registry);
        assert!(engine.is_settled());
        assert!(engine.captured_positions(&chunks).is_empty());
        assert_fixed_point(&engine, &chunks, &registry);
    }

    #[test]
    fn captured_result_matches_direct_propagation() {
        let registry = BlockRegistry::default();
        let build = || {
            let mut chunk = layered(Point2::new(0, 0), 40, &registry);
            for z in 30..40 {
                *chunk.block_mut(index(4, 4, z)) = registry.default_block(BlockType::AIR);
            }
            *chunk.block_mut(index(4, 5, 33)) = registry.default_block(BlockType::GLOWSTONE);
            chunk
        };

        let mut direct_chunks = ActiveChunks::new();
        let mut direct = LightingEngine::new(DAYLIGHT);
        activate(&mut direct, &mut direct_chunks, build(), &registry);
        direct.update(LightingMode::Propagate, &mut direct_chunks, &registry);

        let mut stepped_chunks = ActiveChunks::new();
        let mut stepped = LightingEngine::new(DAYLIGHT);
        activate(&mut stepped, &mut stepped_chunks, build(), &registry);
        for _ in 0..5 {
            stepped.update(LightingMode::Capture, &mut stepped_chunks, &registry);
            stepped.release_captured();
        }
        stepped.update(LightingMode::Propagate, &mut stepped_chunks, &registry);

        let a = direct_chunks.get(Point2::new(0, 0)).unwrap();
        let b = stepped_chunks.get(Point2::new(0, 0)).unwrap();
        assert_eq!(a.blocks(), b.blocks());
    }

    #[test]
    fn lowering_the_sky_relights() {
        let registry = BlockRegistry::default();
        let mut chunks = ActiveChunks::new();
        let mut engine = LightingEngine::new(DAYLIGHT);
        let mut chunk = layered(Point2::new(0, 0), 20, &registry);
        // A water column reaching down from the surface.
        for z in 10..20 {
            *chunk.block_mut(index(2, 2, z)) = registry.default_block(BlockType::WATER);
        }
        activate(&mut engine, &mut chunks, chunk, &registry);
        engine.update(LightingMode::Propagate, &mut chunks, &registry);
        assert_eq!(chunks.get(Point2::new(0, 0)).unwrap().block(index(2, 2, 19)).light_value(), 14);

        engine.set_sky_light_level(MOONLIGHT, &mut chunks);
        engine.update(LightingMode::Propagate, &mut chunks, &registry);

        let chunk = chunks.get(Point2::new(0, 0)).unwrap();
        assert_eq!(chunk.block(index(0, 0, 100)).light_value(), MOONLIGHT);
        assert_eq!(chunk.block(index(2, 2, 19)).light_value(), MOONLIGHT - 1);
        assert_eq!(chunk.block(index(2, 2, 14)).light_value(), 0);
        assert_fixed_point(&engine, &chunks, &registry);
    }

    #[test]
    fn purge_drops_entries_of_removed_chunk() {
        let registry = BlockRegistry::default();
        let mut chunks = ActiveChunks::new();
        let mut engine = LightingEngine::new(DAYLIGHT);
        activate(&mut engine, &mut chunks, layered(Point2::new(0, 0), 10, &registry), &registry);
        activate(&mut engine, &mut chunks, layered(Point2::new(5, 5), 10, &registry), &registry);
        assert!(engine.pending() > 0);

        chunks.remove(Point2::new(5, 5));
        engine.purge_chunk(Point2::new(5, 5));
        assert!(engine
            .dirty_blocks
            .iter()
            .all(|location| location.chunk == Point2::new(0, 0)));
        engine.update(LightingMode::Propagate, &mut chunks, &registry);
        assert_fixed_point(&engine, &chunks, &registry);
    }
}
