//! # World Module
//!
//! This module provides the `World` struct, the single owner of every active
//! chunk. It coordinates chunk streaming around the viewer, persistence,
//! block edits and the lighting work those edits produce.
//!
//! ## Streaming
//!
//! Each call to [`World::update_streaming`] activates at most one chunk and
//! deactivates at most one chunk:
//!
//! - the nearest inactive chunk strictly inside the inner radius is loaded
//!   from disk, or generated if it has never been saved
//! - the farthest active chunk strictly outside the outer radius (one more
//!   than the inner radius) is saved and dropped
//!
//! The gap between the two radii keeps chunks near a boundary from being
//! loaded and dropped on alternate steps.
//!
//! ## Lighting
//!
//! Activation, deactivation and edits only queue cells; nothing is relit
//! until [`World::update_lighting`] drains the queue.

use std::path::Path;

use log::{debug, error, info, warn};
use thiserror::Error;

use crate::config::WorldConfig;
use crate::engine_state::physics::raycast::{raycast, RaycastHit};
use crate::error::EngineError;

use super::active_chunks::ActiveChunks;
use super::block::block_definition::BlockRegistry;
use super::block::block_side::BlockSide;
use super::block::block_type::BlockType;
use super::block::Block;
use super::chunk::chunk_generation::TerrainGenerator;
use super::chunk::{
    chunk_coords_from_world_coords, chunk_distance_squared, ChunkCoords, WorldCoords,
};
use super::lighting::{LightingEngine, LightingMode, LightingStats};
use super::storage::{ChunkStore, StorageError};

/// What one streaming step changed.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct StreamingStep {
    pub activated: Option<ChunkCoords>,
    pub deactivated: Option<ChunkCoords>,
}

/// A streaming step whose deactivation could not save its chunk.
///
/// `step` still reports the chunk activated earlier in the same call.
#[derive(Error, Debug)]
#[error("chunk {failed:?} could not be deactivated: {source}")]
pub struct StreamingError {
    pub step: StreamingStep,
    pub failed: ChunkCoords,
    pub source: StorageError,
}

/// The active voxel world.
///
/// Owns the active chunks, the lighting queue, the block table, the terrain
/// generator and the chunk store.
#[derive(Debug)]
pub struct World {
    chunks: ActiveChunks,
    lighting: LightingEngine,
    registry: BlockRegistry,
    generator: TerrainGenerator,
    store: ChunkStore,
    inner_radius: i32,
}

impl World {
    /// Creates an empty world from its configuration.
    ///
    /// The block table is read from `block_definitions` when one is
    /// configured, otherwise the built-in table is used.
    pub fn new(config: &WorldConfig) -> Result<Self, EngineError> {
        let registry = match &config.block_definitions {
            Some(path) => {
                info!("Loading block definitions from {}", path.display());
                BlockRegistry::from_json_file(path)?
            }
            None => BlockRegistry::default(),
        };
        Ok(Self::with_registry(config, registry))
    }

    /// Creates an empty world using an already built block table.
    pub fn with_registry(config: &WorldConfig, registry: BlockRegistry) -> Self {
        World {
            chunks: ActiveChunks::new(),
            lighting: LightingEngine::new(config.sky_light_level),
            registry,
            generator: TerrainGenerator::new(config.generation.clone()),
            store: ChunkStore::new(&config.data_dir),
            inner_radius: config.inner_radius,
        }
    }

    pub fn chunks(&self) -> &ActiveChunks {
        &self.chunks
    }

    /// Mutable access to the active chunks, for clearing geometry flags
    /// after a rebuild.
    pub fn chunks_mut(&mut self) -> &mut ActiveChunks {
        &mut self.chunks
    }

    pub fn registry(&self) -> &BlockRegistry {
        &self.registry
    }

    pub fn generator(&self) -> &TerrainGenerator {
        &self.generator
    }

    pub fn lighting(&self) -> &LightingEngine {
        &self.lighting
    }

    pub fn data_dir(&self) -> &Path {
        self.store.data_dir()
    }

    pub fn inner_radius(&self) -> i32 {
        self.inner_radius
    }

    pub fn outer_radius(&self) -> i32 {
        self.inner_radius + 1
    }

    pub fn sky_light_level(&self) -> u8 {
        self.lighting.sky_light_level()
    }

    /// The cell at a world position, if its chunk is active.
    pub fn block_at(&self, world: WorldCoords) -> Option<Block> {
        self.chunks.block_at_world(world).copied()
    }

    /// Casts a ray through the active chunks.
    pub fn raycast(&self, start: WorldCoords, end: WorldCoords) -> Option<RaycastHit> {
        raycast(&self.chunks, &self.registry, start, end)
    }

    /// Active chunks whose geometry needs rebuilding, sorted by coordinate.
    pub fn stale_chunks(&self) -> Vec<ChunkCoords> {
        let mut stale: Vec<ChunkCoords> = self
            .chunks
            .iter()
            .filter(|chunk| chunk.is_geometry_stale())
            .map(|chunk| chunk.position())
            .collect();
        stale.sort_by_key(|coords| (coords.x, coords.y));
        stale
    }

    /// The closest inactive chunk inside the inner radius of `viewer`.
    ///
    /// The neighborhood is scanned row by row; of equally distant candidates
    /// the first one scanned wins.
    pub fn nearest_inactive_candidate(&self, viewer: ChunkCoords) -> Option<ChunkCoords> {
        let inner_squared = self.inner_radius * self.inner_radius;
        let outer = self.outer_radius();
        let mut best: Option<(i32, ChunkCoords)> = None;

        for dy in -outer..=outer {
            for dx in -outer..=outer {
                let coords = ChunkCoords::new(viewer.x + dx, viewer.y + dy);
                if self.chunks.contains(coords) {
                    continue;
                }
                let distance = chunk_distance_squared(coords, viewer);
                if distance >= inner_squared {
                    continue;
                }
                if best.map_or(true, |(closest, _)| distance < closest) {
                    best = Some((distance, coords));
                }
            }
        }
        best.map(|(_, coords)| coords)
    }

    /// The farthest active chunk outside the outer radius of `viewer`.
    ///
    /// Of equally distant candidates the one with the smallest `(x, y)` wins.
    pub fn farthest_active_candidate(&self, viewer: ChunkCoords) -> Option<ChunkCoords> {
        let outer = self.outer_radius();
        let outer_squared = outer * outer;

        self.chunks
            .coords()
            .map(|coords| (chunk_distance_squared(coords, viewer), coords))
            .filter(|&(distance, _)| distance > outer_squared)
            .min_by(|(a_distance, a), (b_distance, b)| {
                b_distance
                    .cmp(a_distance)
                    .then((a.x, a.y).cmp(&(b.x, b.y)))
            })
            .map(|(_, coords)| coords)
    }

    /// Activates at most one chunk and deactivates at most one chunk around
    /// the viewer.
    ///
    /// # Returns
    /// The chunks that changed. If the chunk picked for deactivation cannot
    /// be saved it stays active, and the error carries the partial step.
    pub fn update_streaming(&mut self, viewer: WorldCoords) -> Result<StreamingStep, StreamingError> {
        let viewer = chunk_coords_from_world_coords(viewer);
        let mut step = StreamingStep::default();

        if let Some(coords) = self.nearest_inactive_candidate(viewer) {
            if self.activate_chunk(coords) {
                step.activated = Some(coords);
            }
        }
        if let Some(coords) = self.farthest_active_candidate(viewer) {
            match self.deactivate_chunk(coords) {
                Ok(true) => step.deactivated = Some(coords),
                Ok(false) => {}
                Err(source) => {
                    return Err(StreamingError {
                        step,
                        failed: coords,
                        source,
                    })
                }
            }
        }
        Ok(step)
    }

    /// Brings the chunk at `coords` into the world.
    ///
    /// The chunk is read from its file, or generated if it has none. A file
    /// that cannot be read is reported and the chunk is generated instead;
    /// the next save overwrites it. Once inserted, the chunk is linked to its
    /// active neighbors and its cells are seeded into the lighting queue.
    ///
    /// # Returns
    /// `false` if the chunk was already active.
    pub fn activate_chunk(&mut self, coords: ChunkCoords) -> bool {
        if self.chunks.contains(coords) {
            return false;
        }

        let chunk = match self.store.load(coords, &self.registry) {
            Ok(Some(chunk)) => {
                debug!("Activating chunk {:?} from disk", coords);
                chunk
            }
            Ok(None) => {
                debug!("Activating chunk {:?} from terrain generator", coords);
                self.generator.generate(coords, &self.registry)
            }
            Err(err) => {
                warn!("{}; regenerating chunk {:?}", err, coords);
                self.generator.generate(coords, &self.registry)
            }
        };

        self.chunks.insert(chunk);
        self.chunks.link_neighbors(coords);
        self.lighting
            .seed_activated_chunk(coords, &mut self.chunks, &self.registry);
        true
    }

    /// Saves the chunk at `coords` and drops it from the world.
    ///
    /// Every former neighbor queues the cells along its newly open edge,
    /// since light that came across that edge is gone.
    ///
    /// # Returns
    /// `Ok(false)` if the chunk was not active. If the save fails the chunk
    /// stays active and the error is returned.
    pub fn deactivate_chunk(&mut self, coords: ChunkCoords) -> Result<bool, StorageError> {
        let Some(chunk) = self.chunks.get(coords) else {
            return Ok(false);
        };
        if let Err(err) = self.store.save(chunk) {
            error!("Keeping chunk {:?} active: {}", coords, err);
            return Err(err);
        }

        self.lighting.purge_chunk(coords);
        for (neighbor, open_side) in self.chunks.unlink_neighbors(coords) {
            self.lighting
                .dirty_border(neighbor, open_side, &mut self.chunks, &self.registry);
        }
        self.chunks.remove(coords);
        debug!("Deactivated chunk {:?}", coords);
        Ok(true)
    }

    /// Saves and drops every active chunk.
    ///
    /// Unlike [`deactivate_chunk`](Self::deactivate_chunk), nothing is
    /// queued for relighting. Chunks are saved in coordinate order and a
    /// chunk whose save fails stays active.
    ///
    /// # Returns
    /// The first save error, after every chunk has been attempted.
    pub fn shutdown(&mut self) -> Result<(), StorageError> {
        let mut coords: Vec<ChunkCoords> = self.chunks.coords().collect();
        coords.sort_by_key(|coords| (coords.x, coords.y));
        info!("Saving {} chunks to {}", coords.len(), self.store.data_dir().display());

        let mut first_error = None;
        for coords in coords {
            let Some(chunk) = self.chunks.get(coords) else {
                continue;
            };
            if let Err(err) = self.store.save(chunk) {
                error!("Failed to save chunk {:?}: {}", coords, err);
                first_error.get_or_insert(err);
                continue;
            }
            self.lighting.purge_chunk(coords);
            self.chunks.unlink_neighbors(coords);
            self.chunks.remove(coords);
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Drains the lighting queue.
    pub fn update_lighting(&mut self, mode: LightingMode) -> LightingStats {
        self.lighting
            .update(mode, &mut self.chunks, &self.registry)
    }

    /// Changes the ambient light and queues every sky cell for relighting.
    pub fn set_sky_light_level(&mut self, level: u8) {
        self.lighting.set_sky_light_level(level, &mut self.chunks);
    }

    /// World positions of the cells held back by capture mode.
    pub fn captured_positions(&self) -> Vec<WorldCoords> {
        self.lighting.captured_positions(&self.chunks)
    }

    /// Returns the captured cells to the lighting queue.
    pub fn release_captured(&mut self) -> usize {
        self.lighting.release_captured()
    }

    /// Places a block of `block_type` at a world position.
    ///
    /// The cell takes the type's inherent light and loses its sky exposure,
    /// as does the run of sky cells directly beneath it. The cell, its
    /// non-opaque neighbors and the newly shadowed cells are queued for
    /// relighting. Placing air is the same as destroying.
    ///
    /// # Returns
    /// `false` if the position is not in an active chunk or the cell already
    /// holds `block_type`.
    pub fn place_block(&mut self, world: WorldCoords, block_type: BlockType) -> bool {
        if block_type == BlockType::AIR {
            return self.destroy_block(world);
        }
        let Some(location) = self.chunks.location_at_world(world) else {
            return false;
        };
        let inherent_light = self.registry.get(block_type).inherent_light;
        let Some(block) = self.chunks.block_mut(location) else {
            return false;
        };
        if block.block_type() == block_type {
            return false;
        }

        let was_sky = block.is_sky();
        block.set_block_type(block_type);
        block.set_light_value(inherent_light);
        block.unmark_as_sky();
        self.chunks.mark_stale(location.chunk);

        self.lighting.enqueue(location, &mut self.chunks);
        self.lighting
            .dirty_nonopaque_neighbors(location, true, &mut self.chunks, &self.registry);

        if was_sky {
            let mut below = self.chunks.neighbor_location(location, BlockSide::BOTTOM);
            while let Some(current) = below {
                match self.chunks.block_mut(current) {
                    Some(block) if block.is_sky() => block.unmark_as_sky(),
                    _ => break,
                }
                self.lighting.enqueue(current, &mut self.chunks);
                below = self.chunks.neighbor_location(current, BlockSide::BOTTOM);
            }
        }
        true
    }

    /// Replaces the block at a world position with air.
    ///
    /// The emptied cell keeps its light until relit. If it is now open to
    /// the sky, it and the air run beneath it become sky cells. Chunks across
    /// any edge the cell touches are flagged for a geometry rebuild, since
    /// the face they hid is now exposed.
    ///
    /// # Returns
    /// `false` if the position is not in an active chunk or the cell is
    /// already air.
    pub fn destroy_block(&mut self, world: WorldCoords) -> bool {
        let Some(location) = self.chunks.location_at_world(world) else {
            return false;
        };
        let Some(block) = self.chunks.block_mut(location) else {
            return false;
        };
        if block.block_type() == BlockType::AIR {
            return false;
        }
        block.set_block_type(BlockType::AIR);

        self.chunks.mark_stale(location.chunk);
        for side in BlockSide::lateral() {
            if !ActiveChunks::crosses_chunk_edge(location, side) {
                continue;
            }
            let neighbor = self
                .chunks
                .get(location.chunk)
                .and_then(|chunk| chunk.neighbor(side));
            if let Some(neighbor) = neighbor {
                self.chunks.mark_stale(neighbor);
            }
        }
        self.lighting.enqueue(location, &mut self.chunks);

        let open_above = match self.chunks.neighbor_location(location, BlockSide::TOP) {
            Some(above) => self.chunks.block(above).is_some_and(Block::is_sky),
            None => true,
        };
        if open_above {
            let mut current = Some(location);
            while let Some(cell) = current {
                match self.chunks.block_mut(cell) {
                    Some(block) if block.block_type() == BlockType::AIR => block.mark_as_sky(),
                    _ => break,
                }
                self.lighting.enqueue(cell, &mut self.chunks);
                current = self.chunks.neighbor_location(cell, BlockSide::BOTTOM);
            }
        }
        true
    }
}
