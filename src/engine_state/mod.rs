//! # Engine State Module
//!
//! The core engine module that owns the simulation and advances it one step
//! at a time.
//!
//! ## Key Components
//!
//! * `EngineState` - The main state container for the engine
//! * `physics` - Ray casting and collision sweeps against the voxel grid
//! * `player_state` - The player's body, camera and movement modes
//! * `voxels` - Blocks, chunks, streaming, persistence and lighting
//!
//! ## Simulation Step
//!
//! Each call to [`EngineState::step`] runs, in order:
//!
//! 1. Mode and debug toggles carried by the step's [`PlayerAction`]
//! 2. Chunk streaming around the player (at most one chunk in, one out)
//! 3. Player movement
//! 4. Block edits through the view ray
//! 5. A lighting drain, or a capture pass while lighting capture is on

use log::{debug, info, trace};
use web_time::{Duration, Instant};

use crate::config::EngineConfig;
use crate::error::EngineError;

use physics::collision::SweepResult;
use player_state::{MovementMode, PlayerState};
use voxels::block::block_type::BlockType;
use voxels::lighting::{LightingMode, LightingStats};
use voxels::world::{StreamingStep, World};

pub mod physics;
pub mod player_state;
pub mod voxels;

/// Flags controlling engine behavior and debug options
#[derive(Default, Debug)]
pub struct EngineFlags {
    /// Whether queued lighting work is parked for inspection instead of
    /// being drained
    pub lighting_capture: bool,
}

/// Represents player actions for one simulation step
///
/// Movement fields describe keys held during the step. The remaining fields
/// are one-shot requests.
#[derive(Default, Debug, Clone, PartialEq)]
pub struct PlayerAction {
    /// Movement actions - true while held
    pub move_forward: bool,
    pub move_backward: bool,
    pub move_left: bool,
    pub move_right: bool,
    /// Jump while walking, ascend while flying or swimming
    pub move_up: bool,
    pub move_down: bool,

    /// View rotation in look units, positive x turning right and positive y
    /// looking down
    pub rotate_view: Option<(f64, f64)>,

    pub toggle_running: bool,
    pub set_movement_mode: Option<MovementMode>,
    /// Place a block of this type in front of the targeted face
    pub place_block: Option<BlockType>,
    /// Destroy the targeted block
    pub destroy_block: bool,
    pub set_sky_light_level: Option<u8>,
    pub toggle_lighting_capture: bool,
    pub release_captured_lighting: bool,
}

/// What happened during one [`EngineState::step`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StepReport {
    pub streaming: StreamingStep,
    pub movement: Option<SweepResult>,
    pub edited: bool,
    pub lighting: LightingStats,
}

/// The main state container for the voxel engine
///
/// Owns the world and the player and coordinates their interactions.
///
/// # Examples
///
/// ```ignore
/// let mut engine_state = EngineState::new(&EngineConfig::default())?;
///
/// // Main loop
/// loop {
///     let actions = read_input();
///     engine_state.step(frame_time, &actions)?;
/// }
/// engine_state.shutdown()?;
/// ```
#[derive(Debug)]
pub struct EngineState {
    /// The voxel world containing all active chunk data
    pub world: World,
    /// The player's body and view
    pub player: PlayerState,
    /// Engine configuration flags
    flags: EngineFlags,
    /// How far block edits reach along the view ray
    reach: f32,
    /// Simulated time since startup
    elapsed: Duration,
}

impl EngineState {
    /// Creates a new engine state with an empty world and the player at the
    /// configured spawn point
    ///
    /// # Arguments
    ///
    /// * `config` - The engine configuration, validated before use
    ///
    /// # Returns
    ///
    /// The engine state, or the configuration or block table error that
    /// prevented it from starting
    pub fn new(config: &EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        let world = World::new(&config.world)?;
        let [x, y, z] = config.player.spawn_position;
        info!(
            "Engine ready: inner radius {}, chunks in {}",
            world.inner_radius(),
            world.data_dir().display()
        );

        Ok(Self {
            world,
            player: PlayerState::new(cgmath::Point3::new(x, y, z)),
            flags: EngineFlags::default(),
            reach: config.player.reach,
            elapsed: Duration::ZERO,
        })
    }

    pub fn flags(&self) -> &EngineFlags {
        &self.flags
    }

    /// Simulated time since startup
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    fn lighting_mode(&self) -> LightingMode {
        if self.flags.lighting_capture {
            LightingMode::Capture
        } else {
            LightingMode::Propagate
        }
    }

    /// Advances the simulation by `dt`
    ///
    /// # Arguments
    ///
    /// * `dt` - Simulated time covered by this step
    /// * `actions` - Input held or requested during the step
    ///
    /// # Returns
    ///
    /// A summary of the step, or the error of a chunk that could not be
    /// saved on its way out, in which case the rest of the step is skipped
    pub fn step(&mut self, dt: Duration, actions: &PlayerAction) -> Result<StepReport, EngineError> {
        let started = Instant::now();
        self.elapsed += dt;
        self.apply_toggles(actions);

        let streaming = self.world.update_streaming(self.player.eye_position())?;
        let movement = self.player.update(dt.as_secs_f32(), actions, &self.world);

        let mut edited = false;
        if actions.destroy_block {
            edited |= self.destroy_with_view_ray();
        }
        if let Some(block_type) = actions.place_block {
            edited |= self.place_with_view_ray(block_type);
        }

        let lighting = self.world.update_lighting(self.lighting_mode());

        trace!(
            "Step took {:?}: streamed {:?}, {} cells relit",
            started.elapsed(),
            streaming,
            lighting.processed
        );
        Ok(StepReport {
            streaming,
            movement,
            edited,
            lighting,
        })
    }

    fn apply_toggles(&mut self, actions: &PlayerAction) {
        if let Some(mode) = actions.set_movement_mode {
            self.player.set_mode(mode);
        }
        if actions.toggle_running {
            self.player.toggle_running();
        }
        if let Some(level) = actions.set_sky_light_level {
            self.world.set_sky_light_level(level);
        }
        if actions.toggle_lighting_capture {
            self.flags.lighting_capture = !self.flags.lighting_capture;
            debug!("Lighting capture {}", if self.flags.lighting_capture { "on" } else { "off" });
        }
        if actions.release_captured_lighting {
            let released = self.world.release_captured();
            debug!("Released {} captured cells", released);
        }
    }

    /// End of the view ray used for block targeting
    fn view_ray_end(&self) -> cgmath::Point3<f32> {
        self.player.eye_position() + self.player.view_direction() * self.reach
    }

    /// Destroys the block the player is looking at
    ///
    /// # Returns
    ///
    /// Whether a block was destroyed
    pub fn destroy_with_view_ray(&mut self) -> bool {
        let Some(hit) = self.world.raycast(self.player.eye_position(), self.view_ray_end()) else {
            return false;
        };
        let center = hit.impact_mins + cgmath::Vector3::new(0.5, 0.5, 0.5);
        self.world.destroy_block(center)
    }

    /// Places a block against the face the player is looking at
    ///
    /// The target is the cell in front of the hit face. Placement is refused
    /// if that cell is not air or overlaps the player's own box.
    ///
    /// # Returns
    ///
    /// Whether a block was placed
    pub fn place_with_view_ray(&mut self, block_type: BlockType) -> bool {
        let Some(hit) = self.world.raycast(self.player.eye_position(), self.view_ray_end()) else {
            return false;
        };
        let target = hit.adjacent_mins();
        let cell = cgmath::Point3::new(target.x as i32, target.y as i32, target.z as i32);
        if self.player.bounds().touches_cell(cell) {
            debug!("Refusing to place {:?} inside the player at {:?}", block_type, cell);
            return false;
        }

        let center = target + cgmath::Vector3::new(0.5, 0.5, 0.5);
        match self.world.block_at(center) {
            Some(block) if block.block_type() == BlockType::AIR => {
                self.world.place_block(center, block_type)
            }
            _ => false,
        }
    }

    /// Whether rain is falling where the player stands
    pub fn is_raining_at_player(&self) -> bool {
        self.world
            .generator()
            .is_raining_at(self.player.eye_position(), self.elapsed.as_secs_f64())
    }

    /// Saves every active chunk and empties the world
    pub fn shutdown(&mut self) -> Result<(), EngineError> {
        self.world.shutdown()?;
        info!("Shutdown complete after {:?} simulated", self.elapsed);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GenerationMethod, PlayerConfig};
    use cgmath::{Deg, Point3};

    fn flat_engine(dir: &std::path::Path) -> EngineState {
        let mut config = EngineConfig::default();
        config.world.data_dir = dir.to_path_buf();
        config.world.inner_radius = 2;
        config.world.generation.method = GenerationMethod::Flat { ground_height: 20 };
        config.player = PlayerConfig {
            spawn_position: [4.2, 4.2, 21.0],
            ..PlayerConfig::default()
        };
        EngineState::new(&config).unwrap()
    }

    fn settle(engine: &mut EngineState) {
        let idle = PlayerAction::default();
        for _ in 0..20 {
            engine.step(Duration::from_millis(20), &idle).unwrap();
        }
    }

    #[test]
    fn streams_in_around_the_player() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = flat_engine(dir.path());
        settle(&mut engine);

        assert_eq!(engine.world.chunks().len(), 9);
        assert!(engine.world.lighting().is_settled());
        assert!(engine.player.is_on_ground());
        assert_eq!(engine.elapsed(), Duration::from_millis(400));
    }

    #[test]
    fn edits_follow_the_view_ray() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = flat_engine(dir.path());
        settle(&mut engine);
        // Look down and ahead at the ground a couple of blocks away.
        engine.player.camera.pitch = Deg(-45.0).into();

        let place = PlayerAction {
            place_block: Some(BlockType::GLOWSTONE),
            ..PlayerAction::default()
        };
        let report = engine.step(Duration::from_millis(20), &place).unwrap();
        assert!(report.edited);
        let placed = Point3::new(6.5, 4.5, 21.5);
        assert_eq!(engine.world.block_at(placed).unwrap().block_type(), BlockType::GLOWSTONE);

        let destroy = PlayerAction {
            destroy_block: true,
            ..PlayerAction::default()
        };
        assert!(engine.step(Duration::from_millis(20), &destroy).unwrap().edited);
        assert_eq!(engine.world.block_at(placed).unwrap().block_type(), BlockType::AIR);
    }

    #[test]
    fn placement_inside_the_player_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = flat_engine(dir.path());
        settle(&mut engine);
        // Straight down: the cell above the hit face is where the player stands.
        engine.player.camera.pitch = Deg(-89.0).into();
        assert!(!engine.place_with_view_ray(BlockType::STONE));
    }

    #[test]
    fn capture_holds_lighting_until_toggled_off() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = flat_engine(dir.path());
        settle(&mut engine);

        let toggle = PlayerAction {
            toggle_lighting_capture: true,
            set_sky_light_level: Some(voxels::lighting::MOONLIGHT),
            ..PlayerAction::default()
        };
        let report = engine.step(Duration::from_millis(20), &toggle).unwrap();
        assert!(engine.flags().lighting_capture);
        assert_eq!(report.lighting.processed, 0);
        assert!(!engine.world.captured_positions().is_empty());

        let toggle = PlayerAction {
            toggle_lighting_capture: true,
            ..PlayerAction::default()
        };
        let report = engine.step(Duration::from_millis(20), &toggle).unwrap();
        assert!(report.lighting.processed > 0);
        assert!(engine.world.lighting().is_settled());
        let sky = engine.world.block_at(Point3::new(4.5, 4.5, 60.5)).unwrap();
        assert_eq!(sky.light_value(), voxels::lighting::MOONLIGHT);
    }

    #[test]
    fn shutdown_persists_the_world() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = flat_engine(dir.path());
        settle(&mut engine);
        engine.shutdown().unwrap();
        assert!(engine.world.chunks().is_empty());
        assert!(dir.path().join("chunk_0_0.chunk").is_file());
    }
}
