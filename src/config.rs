//! # Configuration
//!
//! Engine settings loaded from a JSON file. Every struct falls back to its
//! `Default` field by field, so a config file only needs to name the values it
//! changes:
//!
//! ```json
//! { "world": { "inner_radius": 6, "generation": { "method": "empty" } } }
//! ```

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::engine_state::voxels::block::Block;
use crate::engine_state::voxels::chunk::CHUNK_SIZE_Z;

/// Errors raised while loading or validating an [`EngineConfig`].
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Parameters of one octave-summed Perlin noise field.
///
/// The field at `(x, y)` is the sum over `octaves` of
/// `perlin(x / scale * 2^i, y / scale * 2^i) * amplitude * persistence^i`.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NoiseParams {
    pub scale: f64,
    pub octaves: u32,
    pub amplitude: f64,
    pub persistence: f64,
}

impl NoiseParams {
    pub const fn new(scale: f64, octaves: u32, amplitude: f64, persistence: f64) -> Self {
        NoiseParams {
            scale,
            octaves,
            amplitude,
            persistence,
        }
    }
}

/// How fresh chunks are populated when no chunk file exists.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationMethod {
    /// Height, biome and dirt-depth noise fields.
    Perlin,
    /// Stone up to `ground_height - 3`, dirt above it, grass at `ground_height`.
    Flat { ground_height: i32 },
    /// Nothing but air.
    Empty,
}

/// Terrain generation settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub method: GenerationMethod,
    pub seed: u32,
    pub sea_level: i32,
    pub average_ground_height: f64,
    pub base_dirt_depth: f64,
    pub min_snow_biome: f64,
    pub min_precipitation: f64,
    pub ground: NoiseParams,
    pub biome: NoiseParams,
    pub dirt: NoiseParams,
    pub weather: NoiseParams,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        GenerationConfig {
            method: GenerationMethod::Perlin,
            seed: 0,
            sea_level: 80,
            average_ground_height: 83.0,
            base_dirt_depth: 10.0,
            min_snow_biome: 0.5,
            min_precipitation: 0.6,
            ground: NoiseParams::new(80.0, 8, 18.0, 0.5),
            biome: NoiseParams::new(200.0, 8, 0.5, 0.5),
            dirt: NoiseParams::new(40.0, 8, 6.0, 0.5),
            weather: NoiseParams::new(300.0, 8, 0.5, 0.5),
        }
    }
}

/// World streaming, persistence and lighting settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Directory holding one file per saved chunk.
    pub data_dir: PathBuf,
    /// Chunks closer than this many chunks to the viewer are activated.
    /// Chunks farther than one more than this are deactivated.
    pub inner_radius: i32,
    /// Ambient light of sky-exposed cells, 0-15.
    pub sky_light_level: u8,
    pub generation: GenerationConfig,
    /// JSON block table to use instead of the built-in one.
    pub block_definitions: Option<PathBuf>,
}

impl Default for WorldConfig {
    fn default() -> Self {
        WorldConfig {
            data_dir: PathBuf::from("data/chunks"),
            inner_radius: 15,
            sky_light_level: Block::MAX_LIGHT,
            generation: GenerationConfig::default(),
            block_definitions: None,
        }
    }
}

/// Player spawn and interaction settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Minimum corner of the player's box at startup.
    pub spawn_position: [f32; 3],
    /// How far the view ray reaches when placing or destroying blocks.
    pub reach: f32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        PlayerConfig {
            spawn_position: [0.0, 0.0, 80.0],
            reach: 8.0,
        }
    }
}

/// Top-level engine configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub world: WorldConfig,
    pub player: PlayerConfig,
}

impl EngineConfig {
    /// Reads and validates a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let file = File::open(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: EngineConfig =
            serde_json::from_reader(BufReader::new(file)).map_err(|source| ConfigError::Json {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Like [`load`](Self::load), but a missing file yields the defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            log::info!("No config at {}, using defaults", path.display());
            return Ok(EngineConfig::default());
        }
        Self::load(path)
    }

    /// Checks values serde cannot.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let world = &self.world;
        if world.sky_light_level > Block::MAX_LIGHT {
            return Err(ConfigError::Invalid {
                field: "world.sky_light_level",
                reason: format!("{} exceeds {}", world.sky_light_level, Block::MAX_LIGHT),
            });
        }
        if world.inner_radius < 1 {
            return Err(ConfigError::Invalid {
                field: "world.inner_radius",
                reason: format!("{} is less than 1", world.inner_radius),
            });
        }

        let generation = &world.generation;
        if !(0..CHUNK_SIZE_Z).contains(&generation.sea_level) {
            return Err(ConfigError::Invalid {
                field: "world.generation.sea_level",
                reason: format!("{} is outside the world height", generation.sea_level),
            });
        }
        if let GenerationMethod::Flat { ground_height } = generation.method {
            if !(0..CHUNK_SIZE_Z).contains(&ground_height) {
                return Err(ConfigError::Invalid {
                    field: "world.generation.method.flat.ground_height",
                    reason: format!("{} is outside the world height", ground_height),
                });
            }
        }
        for (field, params) in [
            ("world.generation.ground", &generation.ground),
            ("world.generation.biome", &generation.biome),
            ("world.generation.dirt", &generation.dirt),
            ("world.generation.weather", &generation.weather),
        ] {
            if params.scale <= 0.0 || params.octaves == 0 {
                return Err(ConfigError::Invalid {
                    field,
                    reason: "scale must be positive and octaves at least 1".to_string(),
                });
            }
        }

        if self.player.reach <= 0.0 {
            return Err(ConfigError::Invalid {
                field: "player.reach",
                reason: format!("{} is not positive", self.player.reach),
            });
        }
        Ok(())
    }
}
