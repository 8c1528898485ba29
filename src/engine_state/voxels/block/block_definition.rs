//! # Block Definition Module
//!
//! Per-type behavior table. Every cell only stores its type id; whether it is
//! solid, opaque, visible or glowing comes from the [`BlockDefinition`] of that
//! type. The table is built once at startup (either the built-in defaults or a
//! JSON file) and shared by reference with every system that needs it.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::block_type::{BlockType, BLOCK_TYPE_COUNT};
use super::Block;

/// Errors raised while building a [`BlockRegistry`].
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("failed to read block table {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse block table {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("block type {0:?} is defined more than once")]
    Duplicate(BlockType),
    #[error("block type {0:?} has no definition")]
    Missing(BlockType),
    #[error("block type {block_type:?} emits light {light}, above the maximum of {max}", max = Block::MAX_LIGHT)]
    LightOutOfRange { block_type: BlockType, light: u8 },
}

/// Static description of one block type.
///
/// Sprite numbers index the texture atlas and are only consumed by a renderer.
/// Sound lists hold asset names for the walk, place and break events.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BlockDefinition {
    pub block_type: BlockType,
    pub top_sprite: u32,
    pub bottom_sprite: u32,
    pub side_sprite: u32,
    pub is_solid: bool,
    pub is_opaque: bool,
    pub is_visible: bool,
    #[serde(default)]
    pub falls_with_gravity: bool,
    #[serde(default)]
    pub inherent_light: u8,
    #[serde(default)]
    pub walk_sounds: Vec<String>,
    #[serde(default)]
    pub place_sounds: Vec<String>,
    #[serde(default)]
    pub break_sounds: Vec<String>,
}

impl BlockDefinition {
    /// An opaque, solid, visible, non-emitting block using one sprite on every face.
    fn solid(block_type: BlockType, sprite: u32) -> Self {
        BlockDefinition {
            block_type,
            top_sprite: sprite,
            bottom_sprite: sprite,
            side_sprite: sprite,
            is_solid: true,
            is_opaque: true,
            is_visible: true,
            falls_with_gravity: false,
            inherent_light: 0,
            walk_sounds: Vec::new(),
            place_sounds: Vec::new(),
            break_sounds: Vec::new(),
        }
    }

    fn with_sounds(mut self, walk: &[&str], place: &[&str], broken: &[&str]) -> Self {
        let owned = |names: &[&str]| -> Vec<String> { names.iter().map(|name| name.to_string()).collect() };
        self.walk_sounds = owned(walk);
        self.place_sounds = owned(place);
        self.break_sounds = owned(broken);
        self
    }
}

/// Read-only lookup from [`BlockType`] to its [`BlockDefinition`].
///
/// The definitions are stored in type id order, so a lookup is a plain index.
#[derive(Clone, Debug)]
pub struct BlockRegistry {
    definitions: Vec<BlockDefinition>,
}

const GRAVEL: [&str; 3] = ["gravel2", "gravel3", "gravel4"];
const STONE: [&str; 6] = ["stone1", "stone2", "stone3", "stone4", "stone5", "stone6"];

impl Default for BlockRegistry {
    /// The built-in block table.
    fn default() -> Self {
        let grass_walk = ["grass1", "grass2", "grass3", "grass4", "grass5", "grass6"];
        let sand = ["sand1", "sand2", "sand3", "sand4", "sand5"];
        let swim = ["swim1", "swim2", "swim3", "swim4"];

        let air = BlockDefinition {
            is_solid: false,
            is_opaque: false,
            is_visible: false,
            ..BlockDefinition::solid(BlockType::AIR, 0)
        };
        let grass = BlockDefinition {
            top_sprite: 695,
            side_sprite: 627,
            ..BlockDefinition::solid(BlockType::GRASS, 626)
        }
        .with_sounds(&grass_walk, &GRAVEL, &GRAVEL);
        let mut dirt_walk = GRAVEL.to_vec();
        dirt_walk.push("gravel1");
        let dirt = BlockDefinition::solid(BlockType::DIRT, 626).with_sounds(&dirt_walk, &GRAVEL, &GRAVEL);
        let stone = BlockDefinition::solid(BlockType::STONE, 624).with_sounds(&STONE, &STONE, &STONE);
        let water = BlockDefinition {
            is_solid: false,
            is_opaque: false,
            falls_with_gravity: true,
            ..BlockDefinition::solid(BlockType::WATER, 1022)
        }
        .with_sounds(&swim, &swim, &swim);
        let sand_block = BlockDefinition::solid(BlockType::SAND, 658).with_sounds(&sand, &sand, &sand);
        let glowstone = BlockDefinition {
            inherent_light: 14,
            ..BlockDefinition::solid(BlockType::GLOWSTONE, 201)
        }
        .with_sounds(&STONE, &STONE, &STONE);
        let ice = BlockDefinition {
            is_opaque: false,
            ..BlockDefinition::solid(BlockType::ICE, 755)
        }
        .with_sounds(&STONE, &STONE, &STONE);
        let snow = BlockDefinition {
            top_sprite: 754,
            side_sprite: 756,
            ..BlockDefinition::solid(BlockType::SNOW, 626)
        }
        .with_sounds(&["snow1", "snow2", "snow3", "snow4"], &GRAVEL, &GRAVEL);

        BlockRegistry {
            definitions: vec![air, grass, dirt, stone, water, sand_block, glowstone, ice, snow],
        }
    }
}

impl BlockRegistry {
    /// Builds a registry from an unordered list of definitions.
    ///
    /// # Arguments
    /// * `definitions` - One definition per block type, in any order
    ///
    /// # Returns
    /// The registry, or a `RegistryError` if a type is missing, duplicated or
    /// emits more light than a cell can hold.
    pub fn from_definitions(definitions: Vec<BlockDefinition>) -> Result<Self, RegistryError> {
        let mut slots: Vec<Option<BlockDefinition>> = vec![None; BLOCK_TYPE_COUNT];

        for definition in definitions {
            if definition.inherent_light > Block::MAX_LIGHT {
                return Err(RegistryError::LightOutOfRange {
                    block_type: definition.block_type,
                    light: definition.inherent_light,
                });
            }
            let slot = &mut slots[definition.block_type as usize];
            if slot.is_some() {
                return Err(RegistryError::Duplicate(definition.block_type));
            }
            *slot = Some(definition);
        }

        let mut ordered = Vec::with_capacity(BLOCK_TYPE_COUNT);
        for (slot, block_type) in slots.into_iter().zip(BlockType::ALL) {
            ordered.push(slot.ok_or(RegistryError::Missing(block_type))?);
        }

        Ok(BlockRegistry {
            definitions: ordered,
        })
    }

    /// Loads and validates a JSON array of [`BlockDefinition`]s.
    pub fn from_json_file(path: &Path) -> Result<Self, RegistryError> {
        let file = File::open(path).map_err(|source| RegistryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let definitions: Vec<BlockDefinition> = serde_json::from_reader(BufReader::new(file))
            .map_err(|source| RegistryError::Json {
                path: path.to_path_buf(),
                source,
            })?;
        Self::from_definitions(definitions)
    }

    /// The definition of `block_type`.
    #[inline]
    pub fn get(&self, block_type: BlockType) -> &BlockDefinition {
        &self.definitions[block_type as usize]
    }

    /// The definition of the type stored in `block`.
    #[inline]
    pub fn of(&self, block: &Block) -> &BlockDefinition {
        self.get(block.block_type())
    }

    /// All definitions in type id order.
    pub fn definitions(&self) -> &[BlockDefinition] {
        &self.definitions
    }

    /// A freshly placed or loaded cell of `block_type`, lit by its own emission.
    pub fn default_block(&self, block_type: BlockType) -> Block {
        Block::with_light(block_type, self.get(block_type).inherent_light)
    }
}
