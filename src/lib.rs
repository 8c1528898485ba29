#![warn(rustdoc::missing_crate_level_docs)]
#![warn(rustdoc::invalid_rust_codeblocks)]

//! # Voxel World
//!
//! The simulation core of a voxel sandbox: a world of 16x16x128 chunk
//! columns streamed in and out around the player, saved to disk as
//! run-length encoded block types, lit by a flood-fill light engine, and
//! queried by ray casts and collision sweeps.
//!
//! ## Key Modules
//!
//! * `config` - JSON configuration with defaults for every value
//! * `engine_state` - The engine itself: world, player, physics and voxels
//! * `error` - The crate-level error type
//!
//! ## Usage
//!
//! ```ignore
//! fn main() {
//!     if let Err(err) = voxel_world::run() {
//!         eprintln!("{err}");
//!     }
//! }
//! ```
//!
//! Rendering, audio and input devices are left to the embedding
//! application. It drives [`engine_state::EngineState::step`] with the input
//! it collects and rebuilds the geometry of every chunk listed by
//! [`World::stale_chunks`](engine_state::voxels::world::World::stale_chunks).

use std::path::Path;

use log::{error, info};
use web_time::Duration;

use engine_state::{EngineState, PlayerAction};

pub mod config;
pub mod engine_state;
pub mod error;

pub use config::EngineConfig;
pub use error::EngineError;

/// Config file read by [`run`] from the working directory.
pub const CONFIG_FILE: &str = "voxel_world.json";

/// Steps simulated by the headless [`run`].
const HEADLESS_STEPS: u32 = 600;
const STEP_DURATION: Duration = Duration::from_micros(16_667);

/// Initializes logging, then simulates a standing player for a few seconds
/// so the world around the spawn point is generated, lit and saved.
pub fn run() -> Result<(), EngineError> {
    let mut log_builder = env_logger::Builder::new();
    log_builder
        .target(env_logger::Target::Stdout)
        .parse_env("RUST_LOG")
        .init();
    info!("Logger initialized");

    let config = EngineConfig::load_or_default(Path::new(CONFIG_FILE))?;
    let mut engine_state = EngineState::new(&config)?;

    simulate_headless(&mut engine_state, HEADLESS_STEPS)
}

/// Runs `steps` idle steps, then saves the world.
///
/// If a step fails, the world is still shut down so every chunk that can be
/// saved is, and the step's error is returned.
pub fn simulate_headless(engine_state: &mut EngineState, steps: u32) -> Result<(), EngineError> {
    let idle = PlayerAction::default();
    for _ in 0..steps {
        if let Err(err) = engine_state.step(STEP_DURATION, &idle) {
            error!("Step failed after {:?}: {}", engine_state.elapsed(), err);
            if let Err(shutdown_err) = engine_state.shutdown() {
                error!("Shutdown after the failed step also failed: {}", shutdown_err);
            }
            return Err(err);
        }
    }
    info!(
        "Simulated {:?}: {} chunks active, {} awaiting geometry, raining at player: {}",
        engine_state.elapsed(),
        engine_state.world.chunks().len(),
        engine_state.world.stale_chunks().len(),
        engine_state.is_raining_at_player()
    );

    engine_state.shutdown()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GenerationMethod;
    use cgmath::Point2;

    fn flat_engine(dir: &Path) -> EngineState {
        let mut config = EngineConfig::default();
        config.world.data_dir = dir.to_path_buf();
        config.world.inner_radius = 2;
        config.world.generation.method = GenerationMethod::Flat { ground_height: 20 };
        config.player.spawn_position = [4.2, 4.2, 21.0];
        EngineState::new(&config).unwrap()
    }

    #[test]
    fn headless_run_saves_the_world() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = flat_engine(dir.path());
        simulate_headless(&mut engine, 20).unwrap();

        assert!(engine.world.chunks().is_empty());
        assert!(dir.path().join("chunk_1_1.chunk").is_file());
    }

    #[test]
    fn failed_step_still_saves_what_it_can() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = flat_engine(dir.path());
        // A directory where the far chunk's file belongs makes its save fail.
        std::fs::create_dir(dir.path().join("chunk_5_5.chunk")).unwrap();
        engine.world.activate_chunk(Point2::new(5, 5));

        let err = simulate_headless(&mut engine, 20).unwrap_err();
        assert!(matches!(err, EngineError::Streaming(ref failed) if failed.failed == Point2::new(5, 5)));
        assert_eq!(engine.world.chunks().len(), 1);
        assert!(engine.world.chunks().contains(Point2::new(5, 5)));
        assert!(dir.path().join("chunk_0_0.chunk").is_file());
    }
}
