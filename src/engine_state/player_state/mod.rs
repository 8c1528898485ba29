//! # Player State Management
//!
//! The player's body and its movement through the world:
//! - An axis-aligned box that collides with solid blocks
//! - A first-person camera at eye height inside the box
//! - Velocity kept in the player's own frame (forward, left, up)
//! - Walking with gravity, flying, and no-clip movement modes
//!
//! Walking and flying move the box with a collision sweep. No-clip moves it
//! straight through everything.

use cgmath::{Deg, InnerSpace, Point3, Vector3, Zero};
use log::trace;

use crate::engine_state::physics::collision::{sweep_move, SweepResult};
use crate::engine_state::physics::Aabb3;
use crate::engine_state::voxels::block::block_type::BlockType;
use crate::engine_state::voxels::world::World;
use crate::engine_state::PlayerAction;

pub mod camera;

use camera::Camera;

/// Width and depth of the player's box.
pub const PLAYER_WIDTH: f32 = 0.6;
/// Height of the player's box.
pub const PLAYER_HEIGHT: f32 = 1.85;
/// Height of the eye above the bottom of the box.
pub const EYE_HEIGHT: f32 = 1.62;

const GRAVITY: f32 = 9.0;
const TERMINAL_VELOCITY: f32 = -10.0;
const JUMP_VELOCITY: f32 = 4.8;
const WATER_GRAVITY: f32 = 1.6;
const WATER_TERMINAL_VELOCITY: f32 = -0.25;
/// Upward kick when surfacing, enough to climb out onto a bank.
const WATER_EXIT_BOOST: f32 = 5.5;

const GROUND_ACCELERATION: f32 = 5.0;
const ICE_ACCELERATION: f32 = 1.4;
const AIR_ACCELERATION: f32 = 1.0;

const WALK_SPEED: f32 = 4.22;
const RUN_SPEED: f32 = 5.77;
const FLY_SPEED: f32 = 9.09;
const SWIM_SPEED: f32 = 3.0;
const NOCLIP_SPEED: f32 = 20.0;

/// Degrees turned per unit of view rotation input.
const LOOK_SENSITIVITY: f32 = 0.1;

/// How the player moves.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum MovementMode {
    /// Gravity and collision.
    #[default]
    WALKING,
    /// Collision without gravity.
    FLYING,
    /// Neither gravity nor collision.
    NOCLIP,
}

/// Combines two proportions so that either one alone gives its own value
/// and both together never exceed one.
fn asymptotic_sum(a: f32, b: f32) -> f32 {
    1.0 - (1.0 - a) * (1.0 - b)
}

/// Moves `value` toward `target` by at most `step`.
fn approach(value: f32, target: f32, step: f32) -> f32 {
    if value < target {
        (value + step).min(target)
    } else {
        (value - step).max(target)
    }
}

fn axis_input(positive: bool, negative: bool) -> f32 {
    match (positive, negative) {
        (true, false) => 1.0,
        (false, true) => -1.0,
        _ => 0.0,
    }
}

/// The player: body, view and movement state.
#[derive(Clone, Debug)]
pub struct PlayerState {
    pub camera: Camera,
    bounds: Aabb3,
    /// Forward, left and up, in the frame of the camera's heading.
    velocity: Vector3<f32>,
    mode: MovementMode,
    running: bool,
    on_ground: bool,
    on_ice: bool,
    in_water: bool,
}

impl PlayerState {
    /// A player standing with the bottom corner of its box at `spawn`.
    pub fn new(spawn: Point3<f32>) -> Self {
        let bounds = Aabb3::from_mins_and_size(
            spawn,
            Vector3::new(PLAYER_WIDTH, PLAYER_WIDTH, PLAYER_HEIGHT),
        );
        let mut player = PlayerState {
            camera: Camera::new(spawn, Deg(0.0), Deg(0.0)),
            bounds,
            velocity: Vector3::zero(),
            mode: MovementMode::default(),
            running: false,
            on_ground: false,
            on_ice: false,
            in_water: false,
        };
        player.sync_camera();
        player
    }

    pub fn bounds(&self) -> &Aabb3 {
        &self.bounds
    }

    /// Velocity in the player's frame: forward, left, up.
    pub fn velocity(&self) -> Vector3<f32> {
        self.velocity
    }

    pub fn mode(&self) -> MovementMode {
        self.mode
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_on_ground(&self) -> bool {
        self.on_ground
    }

    pub fn is_on_ice(&self) -> bool {
        self.on_ice
    }

    pub fn is_in_water(&self) -> bool {
        self.in_water
    }

    pub fn eye_position(&self) -> Point3<f32> {
        self.camera.position
    }

    pub fn view_direction(&self) -> Vector3<f32> {
        self.camera.get_view_vec()
    }

    /// Switches movement mode, stopping the player. Walking also drops back
    /// from running.
    pub fn set_mode(&mut self, mode: MovementMode) {
        if mode == self.mode {
            return;
        }
        trace!("Movement mode {:?} -> {:?}", self.mode, mode);
        self.mode = mode;
        self.velocity = Vector3::zero();
        if mode == MovementMode::WALKING {
            self.running = false;
        }
    }

    pub fn toggle_running(&mut self) {
        self.running = !self.running;
    }

    fn sync_camera(&mut self) {
        let mins = self.bounds.mins;
        self.camera.position = Point3::new(
            mins.x + PLAYER_WIDTH * 0.5,
            mins.y + PLAYER_WIDTH * 0.5,
            mins.z + EYE_HEIGHT,
        );
    }

    fn speed(&self) -> f32 {
        if self.in_water {
            return SWIM_SPEED;
        }
        match self.mode {
            MovementMode::WALKING if self.running => RUN_SPEED,
            MovementMode::WALKING => WALK_SPEED,
            MovementMode::FLYING => FLY_SPEED,
            MovementMode::NOCLIP => NOCLIP_SPEED,
        }
    }

    /// Advances the player by `dt` seconds.
    ///
    /// # Arguments
    /// * `dt` - Seconds since the last update
    /// * `actions` - Movement and look input held this step
    /// * `world` - Terrain to collide with
    ///
    /// # Returns
    /// The collision sweep's result, or `None` in no-clip mode.
    pub fn update(&mut self, dt: f32, actions: &PlayerAction, world: &World) -> Option<SweepResult> {
        if let Some((delta_x, delta_y)) = actions.rotate_view {
            self.camera.rotate(
                Deg(-delta_x as f32 * LOOK_SENSITIVITY).into(),
                Deg(-delta_y as f32 * LOOK_SENSITIVITY).into(),
            );
        }

        let walking = self.mode == MovementMode::WALKING;
        let acceleration = dt
            * if self.on_ice {
                ICE_ACCELERATION
            } else if walking && !self.on_ground {
                AIR_ACCELERATION
            } else {
                GROUND_ACCELERATION
            };

        self.velocity.x = approach(
            self.velocity.x,
            axis_input(actions.move_forward, actions.move_backward),
            acceleration,
        );
        self.velocity.y = approach(
            self.velocity.y,
            axis_input(actions.move_left, actions.move_right),
            acceleration,
        );

        if walking && !self.in_water {
            if actions.move_up && self.on_ground {
                self.velocity.z += JUMP_VELOCITY;
                self.on_ground = false;
            }
        } else if walking {
            if actions.move_up {
                self.velocity.z = (self.velocity.z + 2.0 * acceleration).min(1.0);
            }
            if actions.move_down {
                self.velocity.z = (self.velocity.z - acceleration).max(-1.0);
            }
        } else {
            self.velocity.z = approach(
                self.velocity.z,
                axis_input(actions.move_up, actions.move_down),
                acceleration,
            );
        }

        if walking {
            self.apply_gravity(dt, world);
        }

        let translation = self.translation(dt);
        let result = if self.mode == MovementMode::NOCLIP {
            self.bounds.translate(translation);
            None
        } else {
            let result = sweep_move(
                world.chunks(),
                world.registry(),
                &mut self.bounds,
                translation,
                self.velocity,
                self.camera.yaw,
            );
            if !result.aborted {
                self.velocity = result.velocity;
                if walking {
                    self.on_ground = result.grounded;
                    self.on_ice = result.landed_on_ice();
                }
            }
            Some(result)
        };

        self.sync_camera();
        result
    }

    fn apply_gravity(&mut self, dt: f32, world: &World) {
        if self.velocity.z < 0.0 {
            self.on_ground = false;
        }

        let eye_in_water = world
            .block_at(self.eye_position())
            .is_some_and(|block| block.block_type() == BlockType::WATER);
        if eye_in_water {
            self.in_water = true;
            self.on_ground = false;
            self.velocity.z = (self.velocity.z - WATER_GRAVITY * dt).max(WATER_TERMINAL_VELOCITY);
        } else if self.in_water {
            self.in_water = false;
            self.velocity.z += WATER_EXIT_BOOST;
        } else {
            self.velocity.z = (self.velocity.z - GRAVITY * dt).max(TERMINAL_VELOCITY);
        }
    }

    /// World-space displacement for this step.
    ///
    /// Horizontal input is capped so moving diagonally is no faster than
    /// moving straight. While walking on land the vertical component is the
    /// plain falling distance.
    fn translation(&self, dt: f32) -> Vector3<f32> {
        let mut translation =
            self.camera.forward() * self.velocity.x + self.camera.left() * self.velocity.y;
        let mut magnitude = asymptotic_sum(self.velocity.x.abs(), self.velocity.y.abs());

        let swimming_or_flying = self.mode != MovementMode::WALKING || self.in_water;
        if swimming_or_flying {
            translation.z = self.velocity.z;
            magnitude = asymptotic_sum(magnitude, self.velocity.z.abs());
        }
        if !translation.is_zero() {
            translation = translation.normalize_to(magnitude * dt * self.speed());
        }
        if !swimming_or_flying {
            translation.z = self.velocity.z * dt;
        }
        translation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GenerationConfig, GenerationMethod, WorldConfig};
    use crate::engine_state::voxels::lighting::LightingMode;
    use cgmath::Point2;

    fn flat_world(dir: &std::path::Path) -> World {
        let config = WorldConfig {
            data_dir: dir.to_path_buf(),
            inner_radius: 2,
            generation: GenerationConfig {
                method: GenerationMethod::Flat { ground_height: 20 },
                ..GenerationConfig::default()
            },
            ..WorldConfig::default()
        };
        let mut world = World::new(&config).unwrap();
        for x in -1..=1 {
            for y in -1..=1 {
                world.activate_chunk(Point2::new(x, y));
            }
        }
        world.update_lighting(LightingMode::Propagate);
        world
    }

    fn run(player: &mut PlayerState, world: &World, actions: &PlayerAction, steps: usize) {
        for _ in 0..steps {
            player.update(0.02, actions, world);
        }
    }

    #[test]
    fn asymptotic_sum_caps_diagonals() {
        assert_eq!(asymptotic_sum(1.0, 0.0), 1.0);
        assert_eq!(asymptotic_sum(0.0, 0.5), 0.5);
        assert_eq!(asymptotic_sum(1.0, 1.0), 1.0);
        assert!((asymptotic_sum(0.5, 0.5) - 0.75).abs() < 1e-6);
    }

    #[test]
    fn falls_and_lands_on_the_ground() {
        let dir = tempfile::tempdir().unwrap();
        let world = flat_world(dir.path());
        let mut player = PlayerState::new(Point3::new(4.2, 4.2, 25.0));

        run(&mut player, &world, &PlayerAction::default(), 100);
        assert!(player.is_on_ground());
        assert!(player.bounds().mins.z >= 21.0 && player.bounds().mins.z < 21.1);
        assert!((player.eye_position().z - player.bounds().mins.z - EYE_HEIGHT).abs() < 1e-5);
    }

    #[test]
    fn walks_forward_and_jumps() {
        let dir = tempfile::tempdir().unwrap();
        let world = flat_world(dir.path());
        let mut player = PlayerState::new(Point3::new(0.2, 0.2, 21.0));
        run(&mut player, &world, &PlayerAction::default(), 5);
        assert!(player.is_on_ground());

        let forward = PlayerAction {
            move_forward: true,
            ..PlayerAction::default()
        };
        run(&mut player, &world, &forward, 50);
        // Accelerated to full walking speed along +X within the second.
        assert!(player.bounds().mins.x > 2.0, "{}", player.bounds().mins.x);
        assert!((player.bounds().mins.y - 0.2).abs() < 1e-3);
        assert!((player.velocity().x - 1.0).abs() < 1e-6);

        let jump = PlayerAction {
            move_up: true,
            ..PlayerAction::default()
        };
        run(&mut player, &world, &jump, 10);
        assert!(player.bounds().mins.z > 21.5);
        assert!(!player.is_on_ground());
    }

    #[test]
    fn noclip_ignores_terrain() {
        let dir = tempfile::tempdir().unwrap();
        let world = flat_world(dir.path());
        let mut player = PlayerState::new(Point3::new(4.2, 4.2, 21.0));
        player.set_mode(MovementMode::NOCLIP);

        let down = PlayerAction {
            move_down: true,
            ..PlayerAction::default()
        };
        assert!(player.update(0.02, &down, &world).is_none());
        run(&mut player, &world, &down, 50);
        assert!(player.bounds().mins.z < 15.0);
    }

    #[test]
    fn flying_stops_at_the_ground() {
        let dir = tempfile::tempdir().unwrap();
        let world = flat_world(dir.path());
        let mut player = PlayerState::new(Point3::new(4.2, 4.2, 24.0));
        player.set_mode(MovementMode::FLYING);
        let down = PlayerAction {
            move_down: true,
            ..PlayerAction::default()
        };
        run(&mut player, &world, &down, 100);
        assert!(player.bounds().mins.z >= 21.0 && player.bounds().mins.z < 21.2);
    }

    #[test]
    fn mode_switch_resets_motion() {
        let mut player = PlayerState::new(Point3::new(0.0, 0.0, 80.0));
        player.set_mode(MovementMode::FLYING);
        player.toggle_running();
        player.velocity = Vector3::new(1.0, 0.5, 0.0);
        player.set_mode(MovementMode::WALKING);
        assert_eq!(player.velocity(), Vector3::zero());
        assert!(!player.is_running());
    }

    #[test]
    fn leaving_unloaded_space_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let world = flat_world(dir.path());
        let mut player = PlayerState::new(Point3::new(100.0, 100.0, 40.0));
        let result = player.update(0.02, &PlayerAction::default(), &world).unwrap();
        assert!(result.aborted);
        assert_eq!(player.bounds().mins, Point3::new(100.0, 100.0, 40.0));
    }
}
