pub mod linalg;

pub use linalg::*;

use nalgebra::{UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

/// One frame of body-tracking data from the host tracking adapter.
///
/// Produced fresh every tick and immutable within it. Bone positions are in
/// world space; a missing bone reports as the zero vector (nonhumanoid
/// avatars, three-point tracking).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TrackingSample {
    pub timestamp: f64,
    pub head_position: Vector3<f64>,
    pub head_rotation: UnitQuaternion<f64>,
    pub room_position: Vector3<f64>,
    pub room_rotation: UnitQuaternion<f64>,
    pub left_foot_position: Vector3<f64>,
    pub right_foot_position: Vector3<f64>,
    pub left_hip_position: Vector3<f64>,
    pub right_hip_position: Vector3<f64>,
    pub is_vr: bool,
}

/// Result of the downward surface query.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SurfaceContact {
    pub on_surface: bool,
    pub ground_point: Vector3<f64>,
    pub surface_id: String,
}

/// Analog/button input relayed from the host each tick.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct InputSample {
    /// Vertical move axis in [-1, 1].
    pub forward: f64,
    pub jump: bool,
}

/// Discrete skating intent derived from anterior vs momentum direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveState {
    Forward,
    Back,
    Left,
    Right,
}

impl MoveState {
    /// Left/Right are braking postures; Forward/Back glide.
    pub fn is_stopping(&self) -> bool {
        matches!(self, MoveState::Left | MoveState::Right)
    }
}

/// Hit reported by the host physics query.
#[derive(Clone, Debug)]
pub struct RayHit {
    pub point: Vector3<f64>,
    pub surface_id: String,
}

/// Ray query against the walkable environment, provided by the host.
pub trait Raycaster {
    fn cast(&self, origin: Vector3<f64>, dir: Vector3<f64>, max_dist: f64) -> Option<RayHit>;
}

/// The host character controller: speeds, velocity and the immobilized flag
/// that suppresses its own locomotion while skating drives position.
pub trait HostLocomotion {
    fn walk_speed(&self) -> f64;
    fn set_walk_speed(&mut self, value: f64);
    fn strafe_speed(&self) -> f64;
    fn set_strafe_speed(&mut self, value: f64);
    fn run_speed(&self) -> f64;
    fn set_run_speed(&mut self, value: f64);
    fn jump_impulse(&self) -> f64;
    fn set_jump_impulse(&mut self, value: f64);
    fn velocity(&self) -> Vector3<f64>;
    fn set_velocity(&mut self, value: Vector3<f64>);
    fn set_immobilized(&mut self, immobilized: bool);
}
