//! # Collision
//!
//! Moves a box through the voxel grid in small fixed sub-steps, stopping
//! each axis independently when one of the box's contact points enters a
//! solid cell.
//!
//! When a contact point lands in a solid cell, the axis whose sub-step
//! carried it across a cell boundary (checked in the order z, x, y) is the
//! one that collided. The sub-step is undone, that axis stops, and the sweep
//! carries on along the others. Horizontal hits also rotate the carried
//! velocity so the box keeps sliding along the wall it touched.

use cgmath::{InnerSpace, Point3, Rad, Vector3, Zero};

use crate::engine_state::voxels::active_chunks::ActiveChunks;
use crate::engine_state::voxels::block::block_definition::BlockRegistry;
use crate::engine_state::voxels::block::block_type::BlockType;
use crate::engine_state::voxels::chunk::{
    chunk_coords_from_world_coords, index_from_world_coords, CHUNK_SIZE_Z,
};

use super::Aabb3;

/// Fraction of the requested displacement covered by one sub-step.
pub const SWEEP_INCREMENT: f32 = 0.01;
const SWEEP_STEPS: u32 = 100;
/// How far the box is lifted per attempt while it starts inside terrain.
pub const UNSTUCK_STEP: f32 = 0.1;

/// What a single contact point is touching.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Probe {
    /// The point's chunk is not active.
    Unloaded,
    Open,
    Solid(BlockType),
    /// Below the bottom of the world.
    Floor,
}

impl Probe {
    pub fn is_blocking(self) -> bool {
        matches!(self, Probe::Solid(_) | Probe::Floor)
    }
}

/// Which axes were stopped during a sweep.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ImpactedAxes {
    pub x: bool,
    pub y: bool,
    pub z: bool,
}

impl ImpactedAxes {
    pub fn any(&self) -> bool {
        self.x || self.y || self.z
    }
}

/// Outcome of [`sweep_move`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SweepResult {
    /// Displacement actually applied to the box, including any unstuck lift.
    pub translation: Vector3<f32>,
    /// Carried velocity after impacts, in the mover's local frame.
    pub velocity: Vector3<f32>,
    pub impacted: ImpactedAxes,
    /// Set when the box came down onto something.
    pub grounded: bool,
    /// Type of the solid cell landed on, if any.
    pub ground_block: Option<BlockType>,
    /// The sweep touched unloaded space and nothing was moved.
    pub aborted: bool,
}

impl SweepResult {
    fn unmoved(velocity: Vector3<f32>) -> Self {
        SweepResult {
            translation: Vector3::zero(),
            velocity,
            impacted: ImpactedAxes::default(),
            grounded: false,
            ground_block: None,
            aborted: false,
        }
    }

    pub fn landed_on_ice(&self) -> bool {
        self.ground_block == Some(BlockType::ICE)
    }
}

/// Classifies the cell under `point`.
///
/// Points above the column are open and points below it are solid, so a
/// box can rise out of the top of the world but never fall out of the
/// bottom.
pub fn probe(chunks: &ActiveChunks, registry: &BlockRegistry, point: Point3<f32>) -> Probe {
    let Some(chunk) = chunks.get(chunk_coords_from_world_coords(point)) else {
        return Probe::Unloaded;
    };
    let z = point.z.floor() as i32;
    if z >= CHUNK_SIZE_Z {
        return Probe::Open;
    }
    let Some(index) = index_from_world_coords(point) else {
        return Probe::Floor;
    };
    let block = chunk.block(index);
    if registry.of(block).is_solid {
        Probe::Solid(block.block_type())
    } else {
        Probe::Open
    }
}

/// Lifts `bounds` until none of its contact points is inside a solid cell.
///
/// # Returns
/// `false` if a contact point is in unloaded space, in which case `bounds`
/// may have been partly lifted.
pub fn unstuck(chunks: &ActiveChunks, registry: &BlockRegistry, bounds: &mut Aabb3) -> bool {
    loop {
        let mut stuck = false;
        for point in bounds.contact_points() {
            let contact = probe(chunks, registry, point);
            if contact == Probe::Unloaded {
                return false;
            }
            if contact.is_blocking() {
                stuck = true;
                break;
            }
        }
        if !stuck {
            return true;
        }
        bounds.translate(Vector3::new(0.0, 0.0, UNSTUCK_STEP));
    }
}

/// Moves `bounds` by up to `displacement`, stopping axes that run into solid
/// cells.
///
/// # Arguments
/// * `bounds` - The moving box, updated in place
/// * `displacement` - Requested world-space movement for this step
/// * `velocity` - Carried velocity in the mover's frame (x forward, y left,
///   z up); the returned copy has impacted components removed
/// * `yaw` - Heading of the mover's frame about +Z
///
/// # Returns
/// A [`SweepResult`]. If any contact point enters unloaded space the box is
/// restored to where it started and the result is marked aborted.
pub fn sweep_move(
    chunks: &ActiveChunks,
    registry: &BlockRegistry,
    bounds: &mut Aabb3,
    displacement: Vector3<f32>,
    velocity: Vector3<f32>,
    yaw: Rad<f32>,
) -> SweepResult {
    let mut result = SweepResult::unmoved(velocity);
    if displacement.is_zero() {
        return result;
    }

    let start = *bounds;
    if !unstuck(chunks, registry, bounds) {
        *bounds = start;
        result.aborted = true;
        return result;
    }

    let (sin, cos) = (yaw.0.sin(), yaw.0.cos());
    let mut step = displacement * SWEEP_INCREMENT;

    'sweep: for _ in 0..SWEEP_STEPS {
        bounds.translate(step);

        for point in bounds.contact_points() {
            let hit = match probe(chunks, registry, point) {
                Probe::Unloaded => {
                    *bounds = start;
                    return SweepResult {
                        aborted: true,
                        ..SweepResult::unmoved(velocity)
                    };
                }
                Probe::Open => continue,
                Probe::Solid(block_type) => Some(block_type),
                Probe::Floor => None,
            };

            let before = point - step;
            if point.z.floor() != before.z.floor() {
                bounds.translate(-step);
                // Only a downward hit grounds the box; a ceiling just stops it.
                if step.z < 0.0 {
                    result.grounded = true;
                    result.ground_block = hit;
                }
                result.velocity.z = 0.0;
                result.impacted.z = true;
                step.z = 0.0;
            } else if point.x.floor() != before.x.floor() {
                bounds.translate(-step);
                let world_y = result.velocity.x * sin + result.velocity.y * cos;
                result.velocity.x = world_y * sin;
                result.velocity.y = world_y * cos;
                result.impacted.x = true;
                step.x = 0.0;
            } else if point.y.floor() != before.y.floor() {
                bounds.translate(-step);
                let world_x = result.velocity.x * cos - result.velocity.y * sin;
                result.velocity.x = world_x * cos;
                result.velocity.y = -world_x * sin;
                result.impacted.y = true;
                step.y = 0.0;
            } else {
                continue;
            }

            if step.magnitude2() == 0.0 {
                break 'sweep;
            }
            break;
        }
    }

    result.translation = bounds.mins - start.mins;
    result
}
