//! # Block Type Module
//!
//! This module defines the different types of blocks in the voxel world.
//! It provides conversion between the compact on-disk/in-memory id and the
//! rich enum used by the rest of the engine.

use num_derive::FromPrimitive;
use serde::{Deserialize, Serialize};

use super::BlockTypeSize;

/// Enumerates all possible block types in the voxel world.
///
/// The discriminants are the type ids stored in every [`Block`](super::Block)
/// and in the chunk files, so the order of the variants is part of the save
/// format. The `FromPrimitive` derive allows conversion back from those ids.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, FromPrimitive, Serialize, Deserialize)]
#[repr(u8)]
pub enum BlockType {
    /// Empty space. Non-solid, transparent and never drawn.
    AIR = 0,

    /// Grass-topped soil, found at ground level above sea level.
    GRASS = 1,

    /// Plain soil, found in the layer below the surface.
    DIRT = 2,

    /// Bedrock of the terrain, everything deeper than the dirt layer.
    STONE = 3,

    /// Visible but non-solid and non-opaque. Light passes through it.
    WATER = 4,

    /// Beach block at sea level in warm biomes.
    SAND = 5,

    /// Solid, opaque, and emits light on its own.
    GLOWSTONE = 6,

    /// Frozen water in cold biomes. Solid but lets light through.
    ICE = 7,

    /// Surface block for cold biomes.
    SNOW = 8,
}

/// Number of distinct block types. Sizes the block definition table.
pub const BLOCK_TYPE_COUNT: usize = 9;

impl BlockType {
    /// Every block type in id order.
    pub const ALL: [BlockType; BLOCK_TYPE_COUNT] = [
        BlockType::AIR,
        BlockType::GRASS,
        BlockType::DIRT,
        BlockType::STONE,
        BlockType::WATER,
        BlockType::SAND,
        BlockType::GLOWSTONE,
        BlockType::ICE,
        BlockType::SNOW,
    ];

    /// Converts a `BlockTypeSize` to a `BlockType`.
    ///
    /// This is typically used when decoding chunk files, where the id comes
    /// from outside the process and may be garbage.
    ///
    /// # Arguments
    /// * `btype` - The block type as a `BlockTypeSize`
    ///
    /// # Returns
    /// The corresponding `BlockType`, or `None` if no type has that id.
    pub fn get_block_type_from_int(btype: BlockTypeSize) -> Option<Self> {
        num_traits::FromPrimitive::from_u8(btype)
    }

    /// The compact id stored in cells and chunk files.
    #[inline]
    pub fn id(self) -> BlockTypeSize {
        self as BlockTypeSize
    }
}
