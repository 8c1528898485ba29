//! # Block Module
//!
//! This module provides the core block-related functionality for the voxel engine.
//! It includes block type definitions, block face handling, the per-type
//! definition table and the packed cell stored in every chunk.

use block_type::BlockType;

pub mod block_definition;
pub mod block_side;
pub mod block_type;

/// The underlying integer type used to represent block types in memory.
/// This is used for efficient storage and serialization of block data.
pub type BlockTypeSize = u8;

/// Bits of `lighting_and_flags` holding the light level.
const LIGHT_MASK: u8 = 0x0F;
/// Set while the cell has an unobstructed view of the sky straight up.
const SKY_FLAG: u8 = 0x10;
/// Set while the cell sits in the lighting work queue.
const LIGHT_DIRTY_FLAG: u8 = 0x20;

/// Represents a single voxel block in the world.
///
/// This is a lightweight structure that stores only the essential block data.
/// Solidity, opacity and the other behaviors are looked up from the block
/// type in the [`BlockRegistry`](block_definition::BlockRegistry), never stored
/// per cell.
///
/// # Memory Layout
/// The `#[repr(C)]` attribute ensures a consistent two byte layout so a chunk's
/// cell array can be handed to a mesher as raw bytes. The second byte packs:
/// - bits 0-3: light level (0-15)
/// - bit 4: sky-exposed flag
/// - bit 5: lighting-dirty flag
#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable, Debug, Default, PartialEq, Eq)]
pub struct Block {
    /// The type of this block, encoded as a `BlockTypeSize` for compact storage.
    block_type: BlockTypeSize,
    /// Light level and flag bits.
    lighting_and_flags: u8,
}

impl Block {
    /// The brightest light level a cell can hold.
    pub const MAX_LIGHT: u8 = LIGHT_MASK;

    /// Creates a new, unlit block of the specified type.
    ///
    /// # Arguments
    /// * `block_type` - The type of block to create
    ///
    /// # Returns
    /// A new `Block` instance with the specified type, no light and no flags set.
    pub fn new(block_type: BlockType) -> Self {
        Block {
            block_type: block_type.id(),
            lighting_and_flags: 0,
        }
    }

    /// Creates a block of the given type already carrying `light`.
    ///
    /// Used when a cell is (re)populated and takes its type's inherent light.
    pub fn with_light(block_type: BlockType, light: u8) -> Self {
        let mut block = Block::new(block_type);
        block.set_light_value(light);
        block
    }

    /// The type of this block.
    pub fn block_type(&self) -> BlockType {
        // Cells are only ever written through `BlockType`, so the id is valid.
        BlockType::get_block_type_from_int(self.block_type).unwrap_or(BlockType::AIR)
    }

    /// The compact type id as stored on disk.
    #[inline]
    pub fn block_type_id(&self) -> BlockTypeSize {
        self.block_type
    }

    /// Changes the type of this block, keeping its light and flags.
    pub fn set_block_type(&mut self, block_type: BlockType) {
        self.block_type = block_type.id();
    }

    /// Current light level, always within `0..=MAX_LIGHT`.
    #[inline]
    pub fn light_value(&self) -> u8 {
        self.lighting_and_flags & LIGHT_MASK
    }

    /// Stores a new light level, clamping anything brighter than `MAX_LIGHT`.
    ///
    /// The flag bits are left untouched.
    #[inline]
    pub fn set_light_value(&mut self, light: u8) {
        self.lighting_and_flags =
            (self.lighting_and_flags & !LIGHT_MASK) | light.min(Self::MAX_LIGHT);
    }

    #[inline]
    pub fn is_sky(&self) -> bool {
        self.lighting_and_flags & SKY_FLAG != 0
    }

    #[inline]
    pub fn mark_as_sky(&mut self) {
        self.lighting_and_flags |= SKY_FLAG;
    }

    #[inline]
    pub fn unmark_as_sky(&mut self) {
        self.lighting_and_flags &= !SKY_FLAG;
    }

    #[inline]
    pub fn is_lighting_dirty(&self) -> bool {
        self.lighting_and_flags & LIGHT_DIRTY_FLAG != 0
    }

    #[inline]
    pub fn dirty_lighting(&mut self) {
        self.lighting_and_flags |= LIGHT_DIRTY_FLAG;
    }

    #[inline]
    pub fn undirty_lighting(&mut self) {
        self.lighting_and_flags &= !LIGHT_DIRTY_FLAG;
    }
}
