//! # Chunk Generation Module
//!
//! Deterministic terrain population for chunks that have never been saved.
//!
//! Each column samples three 2D noise fields at its world (x, y):
//! - **ground height**: where the surface block sits
//! - **biome**: warm below the snow threshold, cold above it; scaled by
//!   `sqrt(ground / average_ground)` so low-lying land is milder
//! - **dirt depth**: how far below the surface stone begins
//!
//! Every cell of the column is then classified by comparing its height to the
//! ground height and the sea level. The same coordinates and settings always
//! produce the same chunk.

use noise::{NoiseFn, Perlin};

use crate::config::{GenerationConfig, GenerationMethod, NoiseParams};
use crate::engine_state::voxels::block::block_definition::BlockRegistry;
use crate::engine_state::voxels::block::block_type::BlockType;

use super::{
    world_coords_from_chunk_coords, Chunk, ChunkBuilder, ChunkCoords, WorldCoords,
    BLOCKS_PER_CHUNK, BLOCKS_PER_LAYER, CHUNK_SIZE_X,
};

/// How much colder water gets per block below sea level before freezing.
const FREEZE_DEPTH_FACTOR: f64 = 0.03;
/// How fast the weather field drifts west, in blocks per second.
const WEATHER_DRIFT_SPEED: f64 = 1.5;
/// Depth of the dirt layer in flat worlds.
const FLAT_DIRT_DEPTH: i32 = 3;

/// The noise samples shared by every cell of one column.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ColumnSample {
    pub ground_height: i32,
    pub biome: f64,
    pub dirt_depth: i32,
}

/// Populates fresh chunks according to a [`GenerationConfig`].
#[derive(Clone, Debug)]
pub struct TerrainGenerator {
    config: GenerationConfig,
    perlin: Perlin,
}

impl TerrainGenerator {
    pub fn new(config: GenerationConfig) -> Self {
        let perlin = Perlin::new(config.seed);
        TerrainGenerator { config, perlin }
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    /// Sums `params.octaves` octaves of Perlin noise at (x, y).
    fn octave_noise(&self, x: f64, y: f64, params: &NoiseParams) -> f64 {
        let mut total = 0.0;
        let mut frequency = 1.0 / params.scale;
        let mut amplitude = params.amplitude;
        for _ in 0..params.octaves {
            total += self.perlin.get([x * frequency, y * frequency]) * amplitude;
            frequency *= 2.0;
            amplitude *= params.persistence;
        }
        total
    }

    pub fn ground_height_at(&self, x: f64, y: f64) -> i32 {
        (self.config.average_ground_height + self.octave_noise(x, y, &self.config.ground)) as i32
    }

    /// Biome value of the column at (x, y), together with its ground height.
    pub fn biome_at(&self, x: f64, y: f64) -> (f64, i32) {
        let ground_height = self.ground_height_at(x, y);
        let biome = 0.5 + self.octave_noise(x, y, &self.config.biome);
        let taper = (ground_height.max(0) as f64 / self.config.average_ground_height).sqrt();
        (biome * taper, ground_height)
    }

    pub fn dirt_depth_at(&self, x: f64, y: f64) -> i32 {
        (self.config.base_dirt_depth + self.octave_noise(x, y, &self.config.dirt)) as i32
    }

    pub fn sample_column(&self, x: f64, y: f64) -> ColumnSample {
        let (biome, ground_height) = self.biome_at(x, y);
        ColumnSample {
            ground_height,
            biome,
            dirt_depth: self.dirt_depth_at(x, y),
        }
    }

    /// The block type at height `z` of a column.
    pub fn classify(&self, z: i32, column: &ColumnSample) -> BlockType {
        let sea_level = self.config.sea_level;
        let min_snow_biome = self.config.min_snow_biome;
        let warm = column.biome < min_snow_biome;

        if z > column.ground_height {
            if z > sea_level {
                BlockType::AIR
            } else if column.biome
                < min_snow_biome + (sea_level - z) as f64 * FREEZE_DEPTH_FACTOR
            {
                BlockType::WATER
            } else {
                BlockType::ICE
            }
        } else if z == column.ground_height {
            if z == sea_level {
                if warm {
                    BlockType::SAND
                } else {
                    BlockType::SNOW
                }
            } else if z > sea_level {
                if warm {
                    BlockType::GRASS
                } else {
                    BlockType::SNOW
                }
            } else {
                BlockType::DIRT
            }
        } else if z > column.ground_height - column.dirt_depth {
            BlockType::DIRT
        } else {
            BlockType::STONE
        }
    }

    fn classify_flat(z: i32, ground_height: i32) -> BlockType {
        if z > ground_height {
            BlockType::AIR
        } else if z == ground_height {
            BlockType::GRASS
        } else if z > ground_height - FLAT_DIRT_DEPTH {
            BlockType::DIRT
        } else {
            BlockType::STONE
        }
    }

    /// Builds the chunk at `position`. Each cell carries its type's inherent
    /// light and no flags.
    ///
    /// # Arguments
    /// * `position` - The chunk coordinates where the chunk will be placed
    /// * `registry` - Supplies each type's inherent light
    ///
    /// # Returns
    /// A new `Chunk` populated with the configured method.
    pub fn generate(&self, position: ChunkCoords, registry: &BlockRegistry) -> Chunk {
        let mut builder = ChunkBuilder::new(position);

        match self.config.method {
            GenerationMethod::Empty => {
                builder.push_run(registry.default_block(BlockType::AIR), BLOCKS_PER_CHUNK);
            }
            GenerationMethod::Flat { ground_height } => {
                while let Some(local) = builder.next_local_coords() {
                    let block_type = Self::classify_flat(local.z, ground_height);
                    builder.push_block(registry.default_block(block_type));
                }
            }
            GenerationMethod::Perlin => {
                let mins = world_coords_from_chunk_coords(position);
                let columns: Vec<ColumnSample> = (0..BLOCKS_PER_LAYER as i32)
                    .map(|column| {
                        let x = mins.x as f64 + (column % CHUNK_SIZE_X) as f64;
                        let y = mins.y as f64 + (column / CHUNK_SIZE_X) as f64;
                        self.sample_column(x, y)
                    })
                    .collect();

                let mut column = 0;
                while let Some(local) = builder.next_local_coords() {
                    let block_type = self.classify(local.z, &columns[column]);
                    builder.push_block(registry.default_block(block_type));
                    column = (column + 1) % BLOCKS_PER_LAYER;
                }
            }
        }

        builder.return_chunk()
    }

    /// Precipitation field at a world position, drifting with time.
    pub fn weather_at(&self, world: WorldCoords, seconds: f64) -> f64 {
        let x = world.x as f64 - WEATHER_DRIFT_SPEED * seconds;
        0.5 + self.octave_noise(x, world.y as f64, &self.config.weather)
    }

    /// Whether rain falls at a world position. Cold biomes never get rain.
    pub fn is_raining_at(&self, world: WorldCoords, seconds: f64) -> bool {
        if self.weather_at(world, seconds) < self.config.min_precipitation {
            return false;
        }
        let (biome, _) = self.biome_at(world.x.floor() as f64, world.y.floor() as f64);
        biome < self.config.min_snow_biome
    }
}
