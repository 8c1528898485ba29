//! # Block Side Module
//!
//! This module defines the six faces of a voxel block and the compass
//! directions used to link neighboring chunks.
//!
//! The world is Z-up: east is +X, north is +Y and top is +Z.

use cgmath::Vector3;

/// Represents the six possible faces of a voxel block.
///
/// The four lateral sides double as the directions of a chunk's neighbor
/// links, since chunks are full-height columns and only ever border each
/// other horizontally.
#[derive(PartialEq, Eq, Hash, Copy, Clone, Debug)]
pub enum BlockSide {
    /// The east face (facing positive X)
    EAST = 0,

    /// The west face (facing negative X)
    WEST = 1,

    /// The north face (facing positive Y)
    NORTH = 2,

    /// The south face (facing negative Y)
    SOUTH = 3,

    /// The top face (facing positive Z)
    TOP = 4,

    /// The bottom face (facing negative Z)
    BOTTOM = 5,
}

impl BlockSide {
    /// Returns an array containing all six block faces in a consistent order.
    ///
    /// The order is: [EAST, WEST, NORTH, SOUTH, TOP, BOTTOM]
    pub fn all() -> [BlockSide; 6] {
        [
            BlockSide::EAST,
            BlockSide::WEST,
            BlockSide::NORTH,
            BlockSide::SOUTH,
            BlockSide::TOP,
            BlockSide::BOTTOM,
        ]
    }

    /// Returns the four horizontal sides.
    ///
    /// These are the only directions in which a chunk can have a neighbor.
    pub fn lateral() -> [BlockSide; 4] {
        [
            BlockSide::EAST,
            BlockSide::WEST,
            BlockSide::NORTH,
            BlockSide::SOUTH,
        ]
    }

    /// Whether this side is one of the four horizontal ones.
    pub fn is_lateral(self) -> bool {
        !matches!(self, BlockSide::TOP | BlockSide::BOTTOM)
    }

    /// The face on the other side of the block.
    pub fn opposite(self) -> BlockSide {
        match self {
            BlockSide::EAST => BlockSide::WEST,
            BlockSide::WEST => BlockSide::EAST,
            BlockSide::NORTH => BlockSide::SOUTH,
            BlockSide::SOUTH => BlockSide::NORTH,
            BlockSide::TOP => BlockSide::BOTTOM,
            BlockSide::BOTTOM => BlockSide::TOP,
        }
    }

    /// Unit step, in blocks, from a block to its neighbor across this face.
    pub fn offset(self) -> Vector3<i32> {
        match self {
            BlockSide::EAST => Vector3::new(1, 0, 0),
            BlockSide::WEST => Vector3::new(-1, 0, 0),
            BlockSide::NORTH => Vector3::new(0, 1, 0),
            BlockSide::SOUTH => Vector3::new(0, -1, 0),
            BlockSide::TOP => Vector3::new(0, 0, 1),
            BlockSide::BOTTOM => Vector3::new(0, 0, -1),
        }
    }

    /// Outward surface normal of this face.
    pub fn normal(self) -> Vector3<f32> {
        self.offset().cast::<f32>().unwrap_or(Vector3::new(0.0, 0.0, 0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opposite_offsets_cancel() {
        for side in BlockSide::all() {
            assert_eq!(side.offset() + side.opposite().offset(), Vector3::new(0, 0, 0));
            assert_eq!(side.opposite().opposite(), side);
        }
    }

    #[test]
    fn lateral_sides_are_horizontal() {
        for side in BlockSide::lateral() {
            assert!(side.is_lateral());
            assert_eq!(side.offset().z, 0);
        }
        assert!(!BlockSide::TOP.is_lateral());
        assert!(!BlockSide::BOTTOM.is_lateral());
    }
}
