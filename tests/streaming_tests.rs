//! Chunk streaming around a moving viewer, neighbor links and persistence.

use std::path::Path;

use cgmath::{Point2, Point3};
use voxel_world::config::{GenerationConfig, GenerationMethod, WorldConfig};
use voxel_world::engine_state::voxels::block::block_side::BlockSide;
use voxel_world::engine_state::voxels::block::block_type::BlockType;
use voxel_world::engine_state::voxels::chunk::{chunk_distance_squared, ChunkCoords};
use voxel_world::engine_state::voxels::world::World;

fn world(dir: &Path, inner_radius: i32) -> World {
    World::new(&WorldConfig {
        data_dir: dir.to_path_buf(),
        inner_radius,
        generation: GenerationConfig {
            method: GenerationMethod::Flat { ground_height: 10 },
            ..GenerationConfig::default()
        },
        ..WorldConfig::default()
    })
    .unwrap()
}

fn viewer_at(coords: ChunkCoords) -> Point3<f32> {
    Point3::new(coords.x as f32 * 16.0 + 8.0, coords.y as f32 * 16.0 + 8.0, 40.0)
}

fn assert_links_symmetric(world: &World) {
    for chunk in world.chunks().iter() {
        for side in BlockSide::lateral() {
            let offset = side.offset();
            let across = Point2::new(chunk.position().x + offset.x, chunk.position().y + offset.y);
            let linked = chunk.neighbor(side);
            if world.chunks().contains(across) {
                assert_eq!(linked, Some(across));
                let back = world.chunks().get(across).unwrap().neighbor(side.opposite());
                assert_eq!(back, Some(chunk.position()));
            } else {
                assert_eq!(linked, None);
            }
        }
    }
}

#[test]
fn walking_viewer_respects_hysteresis() {
    let dir = tempfile::tempdir().unwrap();
    let mut world = world(dir.path(), 3);
    let inner_squared = world.inner_radius() * world.inner_radius();
    let outer_squared = world.outer_radius() * world.outer_radius();

    let path: Vec<ChunkCoords> = (0..12)
        .map(|step| Point2::new(step, step / 3))
        .collect();
    for &viewer in &path {
        for _ in 0..40 {
            let step = world.update_streaming(viewer_at(viewer)).unwrap();
            if let Some(activated) = step.activated {
                assert!(chunk_distance_squared(activated, viewer) < inner_squared);
            }
            if let Some(deactivated) = step.deactivated {
                assert!(chunk_distance_squared(deactivated, viewer) > outer_squared);
                assert_ne!(step.activated, Some(deactivated));
            }
            assert_links_symmetric(&world);
        }
        for coords in world.chunks().coords() {
            let distance = chunk_distance_squared(coords, viewer);
            assert!(distance <= outer_squared, "{coords:?} still active");
        }
    }
}

#[test]
fn chunks_in_the_band_are_left_alone() {
    let dir = tempfile::tempdir().unwrap();
    let mut world = world(dir.path(), 3);
    let origin = Point2::new(0, 0);
    while world.update_streaming(viewer_at(origin)).unwrap().activated.is_some() {}
    let before = world.chunks().len();

    // Chunks now at squared distance 9..=16 from the viewer sit between the
    // radii and must neither load nor unload.
    let step = world.update_streaming(viewer_at(Point2::new(1, 0))).unwrap();
    assert!(step.deactivated.is_none());
    let near_edge = Point2::new(-2, 0);
    assert!(world.chunks().contains(near_edge));
    assert_eq!(chunk_distance_squared(near_edge, Point2::new(1, 0)), 9);
    assert!(world.chunks().len() >= before);
}

#[test]
fn random_activation_keeps_links_symmetric() {
    let dir = tempfile::tempdir().unwrap();
    let mut world = world(dir.path(), 3);
    let mut rng = fastrand::Rng::with_seed(11);

    for _ in 0..60 {
        let coords = Point2::new(rng.i32(-3..=3), rng.i32(-3..=3));
        if world.chunks().contains(coords) {
            assert!(world.deactivate_chunk(coords).unwrap());
        } else {
            assert!(world.activate_chunk(coords));
        }
        assert_links_symmetric(&world);
    }
}

#[test]
fn edits_persist_across_a_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let mut first = world(dir.path(), 2);
    first.activate_chunk(Point2::new(-2, 3));
    let at = Point3::new(-20.5, 50.5, 11.5);
    assert!(first.place_block(at, BlockType::ICE));
    assert!(first.destroy_block(Point3::new(-20.5, 50.5, 10.5)));
    first.shutdown().unwrap();
    assert!(first.chunks().is_empty());

    let mut second = world(dir.path(), 2);
    second.activate_chunk(Point2::new(-2, 3));
    assert_eq!(second.block_at(at).unwrap().block_type(), BlockType::ICE);
    assert_eq!(
        second.block_at(Point3::new(-20.5, 50.5, 10.5)).unwrap().block_type(),
        BlockType::AIR
    );
    assert_eq!(
        second.block_at(Point3::new(-19.5, 50.5, 10.5)).unwrap().block_type(),
        BlockType::GRASS
    );
}

#[test]
fn failed_save_keeps_the_chunk_active() {
    let dir = tempfile::tempdir().unwrap();
    // A plain file where the data directory should be.
    let blocked = dir.path().join("chunks");
    std::fs::write(&blocked, b"not a directory").unwrap();
    let mut world = world(&blocked, 2);
    world.activate_chunk(Point2::new(0, 0));

    assert!(world.deactivate_chunk(Point2::new(0, 0)).is_err());
    assert!(world.chunks().contains(Point2::new(0, 0)));
    assert!(world.shutdown().is_err());
    assert!(world.chunks().contains(Point2::new(0, 0)));
}
