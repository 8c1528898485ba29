//! # Ray Casting
//!
//! Marches a segment through the voxel grid in fixed fractional steps and
//! reports the first visible cell it enters.
//!
//! The face that was hit is read off the local coordinates of the last two
//! cells visited. Lateral differences are taken modulo the chunk width, so a
//! step from x = 15 to x = 0 of the next chunk still reads as +1. When
//! several axes change in one step the first changed axis in the order z, x,
//! y wins.

use cgmath::{Point3, Vector3};

use crate::engine_state::voxels::active_chunks::{ActiveChunks, BlockLocation};
use crate::engine_state::voxels::block::block_definition::BlockRegistry;
use crate::engine_state::voxels::block::block_side::BlockSide;
use crate::engine_state::voxels::block::block_type::BlockType;
use crate::engine_state::voxels::chunk::{
    local_coords_from_index, BlockIndex, WorldCoords, CHUNK_SIZE_X, CHUNK_SIZE_Y,
};

/// Fraction of the whole segment covered by one step.
pub const RAYCAST_INCREMENT: f32 = 0.001;
const RAYCAST_STEPS: u32 = 1000;

/// The first visible cell along a ray.
#[derive(Clone, Debug, PartialEq)]
pub struct RaycastHit {
    /// First sample point that fell inside the hit cell.
    pub impact_point: WorldCoords,
    /// Integer minimum corner of the hit cell.
    pub impact_mins: Point3<f32>,
    /// Outward normal of the face the ray entered through.
    pub normal: Vector3<f32>,
    pub side: BlockSide,
    /// Corners of the entered face, in winding order, for outlining.
    pub face_corners: [WorldCoords; 4],
    pub location: BlockLocation,
    pub block_type: BlockType,
}

impl RaycastHit {
    /// Minimum corner of the empty cell in front of the hit face.
    pub fn adjacent_mins(&self) -> Point3<f32> {
        self.impact_mins + self.normal
    }
}

/// Which face of the current cell the ray came through, given the indices
/// of the previous and current cells.
fn entered_side(previous: BlockIndex, current: BlockIndex) -> BlockSide {
    let from = local_coords_from_index(previous);
    let to = local_coords_from_index(current);
    let dx = (to.x - from.x).rem_euclid(CHUNK_SIZE_X);
    let dy = (to.y - from.y).rem_euclid(CHUNK_SIZE_Y);

    if to.z > from.z {
        BlockSide::BOTTOM
    } else if to.z < from.z {
        BlockSide::TOP
    } else if dx == 1 {
        BlockSide::WEST
    } else if dx == CHUNK_SIZE_X - 1 {
        BlockSide::EAST
    } else if dy == 1 {
        BlockSide::SOUTH
    } else {
        BlockSide::NORTH
    }
}

/// The four corners of `side` of the unit cell at `mins`.
pub fn face_corners(mins: Point3<f32>, side: BlockSide) -> [WorldCoords; 4] {
    let (origin, steps) = match side {
        BlockSide::BOTTOM => (
            Vector3::new(1.0, 1.0, 0.0),
            [(0.0, -1.0, 0.0), (-1.0, -1.0, 0.0), (-1.0, 0.0, 0.0)],
        ),
        BlockSide::TOP => (
            Vector3::new(0.0, 1.0, 1.0),
            [(0.0, -1.0, 0.0), (1.0, -1.0, 0.0), (1.0, 0.0, 0.0)],
        ),
        BlockSide::WEST => (
            Vector3::new(0.0, 1.0, 0.0),
            [(0.0, -1.0, 0.0), (0.0, -1.0, 1.0), (0.0, 0.0, 1.0)],
        ),
        BlockSide::EAST => (
            Vector3::new(1.0, 0.0, 0.0),
            [(0.0, 1.0, 0.0), (0.0, 1.0, 1.0), (0.0, 0.0, 1.0)],
        ),
        BlockSide::SOUTH => (
            Vector3::new(0.0, 0.0, 0.0),
            [(1.0, 0.0, 0.0), (1.0, 0.0, 1.0), (0.0, 0.0, 1.0)],
        ),
        BlockSide::NORTH => (
            Vector3::new(1.0, 1.0, 0.0),
            [(-1.0, 0.0, 0.0), (-1.0, 0.0, 1.0), (0.0, 0.0, 1.0)],
        ),
    };
    let first = mins + origin;
    let [a, b, c] = steps.map(|(x, y, z)| first + Vector3::new(x, y, z));
    [first, a, b, c]
}

/// Casts a ray from `start` to `end`.
///
/// # Returns
/// `None` if the ray starts in an inactive chunk or inside a visible cell,
/// leaves the loaded world or the column height before hitting anything, or
/// reaches `end` without hitting anything.
pub fn raycast(
    chunks: &ActiveChunks,
    registry: &BlockRegistry,
    start: WorldCoords,
    end: WorldCoords,
) -> Option<RaycastHit> {
    let mut location = chunks.location_at_world(start)?;
    if registry.of(chunks.block(location)?).is_visible {
        return None;
    }

    let step = (end - start) * RAYCAST_INCREMENT;
    let mut point = start;
    let mut previous = location;

    for _ in 1..RAYCAST_STEPS {
        point += step;
        location = chunks.location_at_world(point)?;
        if location == previous {
            continue;
        }

        let block = chunks.block(location)?;
        if registry.of(block).is_visible {
            let side = entered_side(previous.index, location.index);
            let impact_mins = Point3::new(point.x.floor(), point.y.floor(), point.z.floor());
            return Some(RaycastHit {
                impact_point: point,
                impact_mins,
                normal: side.normal(),
                side,
                face_corners: face_corners(impact_mins, side),
                location,
                block_type: block.block_type(),
            });
        }
        previous = location;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::voxels::chunk::{index_from_local_coords, Chunk, LocalCoords};
    use cgmath::Point2;

    fn index(x: i32, y: i32, z: i32) -> BlockIndex {
        index_from_local_coords(LocalCoords::new(x, y, z)).unwrap()
    }

    fn world_with(cells: &[((i32, i32), (i32, i32, i32), BlockType)]) -> ActiveChunks {
        let mut chunks = ActiveChunks::new();
        for x in -1..=1 {
            for y in -1..=1 {
                chunks.insert(Chunk::empty(Point2::new(x, y)));
                chunks.link_neighbors(Point2::new(x, y));
            }
        }
        for &((cx, cy), (x, y, z), block_type) in cells {
            let chunk = chunks.get_mut(Point2::new(cx, cy)).unwrap();
            chunk.block_mut(index(x, y, z)).set_block_type(block_type);
        }
        chunks
    }

    #[test]
    fn side_follows_the_changed_axis() {
        assert_eq!(entered_side(index(3, 3, 3), index(3, 3, 4)), BlockSide::BOTTOM);
        assert_eq!(entered_side(index(3, 3, 4), index(3, 3, 3)), BlockSide::TOP);
        assert_eq!(entered_side(index(3, 3, 3), index(4, 3, 3)), BlockSide::WEST);
        assert_eq!(entered_side(index(4, 3, 3), index(3, 3, 3)), BlockSide::EAST);
        assert_eq!(entered_side(index(3, 3, 3), index(3, 4, 3)), BlockSide::SOUTH);
        assert_eq!(entered_side(index(3, 4, 3), index(3, 3, 3)), BlockSide::NORTH);
        // Chunk edge crossings wrap the raw index.
        assert_eq!(entered_side(index(15, 3, 3), index(0, 3, 3)), BlockSide::WEST);
        assert_eq!(entered_side(index(0, 3, 3), index(15, 3, 3)), BlockSide::EAST);
        assert_eq!(entered_side(index(3, 15, 3), index(3, 0, 3)), BlockSide::SOUTH);
        assert_eq!(entered_side(index(3, 0, 3), index(3, 15, 3)), BlockSide::NORTH);
    }

    #[test]
    fn diagonal_steps_prefer_z_then_x() {
        assert_eq!(entered_side(index(3, 3, 3), index(4, 3, 4)), BlockSide::BOTTOM);
        assert_eq!(entered_side(index(4, 3, 3), index(3, 3, 4)), BlockSide::BOTTOM);
        assert_eq!(entered_side(index(4, 3, 4), index(3, 3, 3)), BlockSide::TOP);
        assert_eq!(entered_side(index(15, 3, 3), index(0, 3, 4)), BlockSide::BOTTOM);
        assert_eq!(entered_side(index(0, 3, 4), index(15, 3, 3)), BlockSide::TOP);
        assert_eq!(entered_side(index(3, 3, 3), index(4, 4, 3)), BlockSide::WEST);
        assert_eq!(entered_side(index(0, 0, 3), index(15, 15, 3)), BlockSide::EAST);
        assert_eq!(entered_side(index(3, 15, 3), index(3, 0, 4)), BlockSide::BOTTOM);
    }

    #[test]
    fn hits_the_top_face_of_the_ground() {
        let chunks = world_with(&[((0, 0), (4, 5, 10), BlockType::STONE)]);
        let registry = BlockRegistry::default();
        let hit = raycast(
            &chunks,
            &registry,
            Point3::new(4.5, 5.5, 14.5),
            Point3::new(4.5, 5.5, 6.5),
        )
        .unwrap();

        assert_eq!(hit.side, BlockSide::TOP);
        assert_eq!(hit.normal, Vector3::new(0.0, 0.0, 1.0));
        assert_eq!(hit.impact_mins, Point3::new(4.0, 5.0, 10.0));
        assert_eq!(hit.adjacent_mins(), Point3::new(4.0, 5.0, 11.0));
        assert_eq!(hit.location, BlockLocation::new(Point2::new(0, 0), index(4, 5, 10)));
        assert_eq!(hit.block_type, BlockType::STONE);
        assert!(hit.face_corners.iter().all(|corner| corner.z == 11.0));
    }

    #[test]
    fn hits_across_a_chunk_edge() {
        let chunks = world_with(&[((-1, 0), (15, 2, 40), BlockType::DIRT)]);
        let registry = BlockRegistry::default();
        let hit = raycast(
            &chunks,
            &registry,
            Point3::new(3.5, 2.5, 40.5),
            Point3::new(-4.5, 2.5, 40.5),
        )
        .unwrap();

        assert_eq!(hit.side, BlockSide::EAST);
        assert_eq!(hit.impact_mins, Point3::new(-1.0, 2.0, 40.0));
        assert_eq!(hit.adjacent_mins(), Point3::new(0.0, 2.0, 40.0));
        assert!(hit.face_corners.iter().all(|corner| corner.x == 0.0));
    }

    #[test]
    fn starting_inside_a_visible_cell_fails() {
        let chunks = world_with(&[((0, 0), (1, 1, 1), BlockType::STONE)]);
        let registry = BlockRegistry::default();
        assert!(raycast(
            &chunks,
            &registry,
            Point3::new(1.5, 1.5, 1.5),
            Point3::new(1.5, 1.5, 9.5)
        )
        .is_none());
    }

    #[test]
    fn unloaded_space_and_empty_rays_fail() {
        let chunks = world_with(&[((1, 0), (2, 2, 2), BlockType::STONE)]);
        let registry = BlockRegistry::default();
        // Runs off the loaded 3x3 block of chunks before reaching anything.
        assert!(raycast(
            &chunks,
            &registry,
            Point3::new(20.5, 8.5, 50.0),
            Point3::new(60.5, 8.5, 50.0)
        )
        .is_none());
        // Starts outside the loaded world.
        assert!(raycast(
            &chunks,
            &registry,
            Point3::new(100.0, 0.0, 10.0),
            Point3::new(0.0, 0.0, 10.0)
        )
        .is_none());
        // Clear air the whole way.
        assert!(raycast(
            &chunks,
            &registry,
            Point3::new(0.5, 0.5, 60.0),
            Point3::new(8.5, 0.5, 60.0)
        )
        .is_none());
    }

    #[test]
    fn water_is_visible_to_rays() {
        let chunks = world_with(&[((0, 0), (8, 8, 30), BlockType::WATER)]);
        let registry = BlockRegistry::default();
        let hit = raycast(
            &chunks,
            &registry,
            Point3::new(8.5, 2.5, 30.5),
            Point3::new(8.5, 12.5, 30.5),
        )
        .unwrap();
        assert_eq!(hit.side, BlockSide::SOUTH);
        assert_eq!(hit.block_type, BlockType::WATER);
    }
}
