//! # Physics Module
//!
//! Geometric queries against the active voxel grid:
//!
//! * [`raycast`] - discrete ray marching for block targeting
//! * [`collision`] - axis-separated swept movement of a box through solid cells
//!
//! Both operate on [`ActiveChunks`](crate::engine_state::voxels::active_chunks::ActiveChunks)
//! and fail cleanly rather than reading from chunks that are not loaded.

use cgmath::{Point3, Vector3};

pub mod collision;
pub mod raycast;

/// Axis-aligned bounding box in world space.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Aabb3 {
    pub mins: Point3<f32>,
    pub maxs: Point3<f32>,
}

impl Aabb3 {
    pub fn new(mins: Point3<f32>, maxs: Point3<f32>) -> Self {
        Aabb3 { mins, maxs }
    }

    /// A box with its minimum corner at `mins` and the given extents.
    pub fn from_mins_and_size(mins: Point3<f32>, size: Vector3<f32>) -> Self {
        Aabb3 {
            mins,
            maxs: mins + size,
        }
    }

    pub fn size(&self) -> Vector3<f32> {
        self.maxs - self.mins
    }

    pub fn center(&self) -> Point3<f32> {
        Point3::new(
            (self.mins.x + self.maxs.x) * 0.5,
            (self.mins.y + self.maxs.y) * 0.5,
            (self.mins.z + self.maxs.z) * 0.5,
        )
    }

    pub fn translate(&mut self, offset: Vector3<f32>) {
        self.mins += offset;
        self.maxs += offset;
    }

    pub fn contains(&self, point: Point3<f32>) -> bool {
        point.x >= self.mins.x
            && point.x <= self.maxs.x
            && point.y >= self.mins.y
            && point.y <= self.maxs.y
            && point.z >= self.mins.z
            && point.z <= self.maxs.z
    }

    /// The points tested against the voxel grid when the box moves: the eight
    /// corners, then four points at mid-height on the vertical edges.
    ///
    /// The box is narrower than a block, so these are enough to catch any
    /// cell it overlaps as long as it is no taller than two blocks.
    pub fn contact_points(&self) -> [Point3<f32>; 12] {
        let (lo, hi) = (self.mins, self.maxs);
        let mid_z = (lo.z + hi.z) * 0.5;
        [
            Point3::new(lo.x, lo.y, lo.z),
            Point3::new(hi.x, lo.y, lo.z),
            Point3::new(lo.x, hi.y, lo.z),
            Point3::new(hi.x, hi.y, lo.z),
            Point3::new(lo.x, lo.y, hi.z),
            Point3::new(hi.x, lo.y, hi.z),
            Point3::new(lo.x, hi.y, hi.z),
            Point3::new(hi.x, hi.y, hi.z),
            Point3::new(hi.x, hi.y, mid_z),
            Point3::new(lo.x, lo.y, mid_z),
            Point3::new(hi.x, lo.y, mid_z),
            Point3::new(lo.x, hi.y, mid_z),
        ]
    }

    /// Whether any contact point falls inside the unit cell whose minimum
    /// corner is `cell`.
    pub fn touches_cell(&self, cell: Point3<i32>) -> bool {
        self.contact_points().iter().any(|point| {
            point.x.floor() as i32 == cell.x
                && point.y.floor() as i32 == cell.y
                && point.z.floor() as i32 == cell.z
        })
    }
}
