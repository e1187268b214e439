// rink.rs — Synthetic world for the demo binary and tests
//
// A flat square rink with an optional wall, a stub character controller,
// and a scripted skater that pumps their feet and carves slow turns. None
// of this touches the engine's internals; it feeds the same trait seams a
// real host integration would.

use nalgebra::{UnitQuaternion, Vector3};

use crate::types::{HostLocomotion, RayHit, Raycaster, TrackingSample};

const RAY_EPS: f64 = 1e-9;

// ─── FlatRink ────────────────────────────────────────────────────────────────

/// Square patch of surface at y = 0, `extent` meters from the origin on each
/// axis, plus an optional wall plane at a fixed z.
pub struct FlatRink {
    surface_id: String,
    extent: f64,
    wall_z: Option<f64>,
}

impl FlatRink {
    pub fn new(surface_id: &str, extent: f64) -> Self {
        Self { surface_id: surface_id.to_string(), extent, wall_z: None }
    }

    pub fn with_wall_z(mut self, z: f64) -> Self {
        self.wall_z = Some(z);
        self
    }
}

impl Raycaster for FlatRink {
    fn cast(&self, origin: Vector3<f64>, dir: Vector3<f64>, max_dist: f64) -> Option<RayHit> {
        // Floor first: downward probes must report the surface, not a wall.
        if dir.y < -RAY_EPS && origin.y >= 0.0 {
            let t = -origin.y / dir.y;
            if t <= max_dist {
                let point = origin + dir * t;
                if point.x.abs() <= self.extent && point.z.abs() <= self.extent {
                    return Some(RayHit { point, surface_id: self.surface_id.clone() });
                }
            }
        }

        if let Some(wall_z) = self.wall_z {
            if dir.z.abs() > RAY_EPS {
                let t = (wall_z - origin.z) / dir.z;
                if t >= 0.0 && t <= max_dist {
                    return Some(RayHit {
                        point: origin + dir * t,
                        surface_id: "wall".to_string(),
                    });
                }
            }
        }

        None
    }
}

// ─── SimHost ─────────────────────────────────────────────────────────────────

/// Stand-in character controller holding the values a real host would.
pub struct SimHost {
    walk: f64,
    strafe: f64,
    run: f64,
    jump: f64,
    velocity: Vector3<f64>,
    pub immobilized: bool,
}

impl Default for SimHost {
    fn default() -> Self {
        Self {
            walk: 2.0,
            strafe: 2.0,
            run: 4.0,
            jump: 3.0,
            velocity: Vector3::zeros(),
            immobilized: false,
        }
    }
}

impl HostLocomotion for SimHost {
    fn walk_speed(&self) -> f64 {
        self.walk
    }
    fn set_walk_speed(&mut self, value: f64) {
        self.walk = value;
    }
    fn strafe_speed(&self) -> f64 {
        self.strafe
    }
    fn set_strafe_speed(&mut self, value: f64) {
        self.strafe = value;
    }
    fn run_speed(&self) -> f64 {
        self.run
    }
    fn set_run_speed(&mut self, value: f64) {
        self.run = value;
    }
    fn jump_impulse(&self) -> f64 {
        self.jump
    }
    fn set_jump_impulse(&mut self, value: f64) {
        self.jump = value;
    }
    fn velocity(&self) -> Vector3<f64> {
        self.velocity
    }
    fn set_velocity(&mut self, value: Vector3<f64>) {
        self.velocity = value;
    }
    fn set_immobilized(&mut self, immobilized: bool) {
        self.immobilized = immobilized;
    }
}

// ─── SkaterSim ───────────────────────────────────────────────────────────────

/// Scripted full-body rig: feet oscillate apart and together at `pump_hz`
/// while the body yaws at `turn_rate_deg` per second. Positions are world
/// space; the room origin moves with the accumulated displacement like a
/// real playspace would.
pub struct SkaterSim {
    room: Vector3<f64>,
    heading_deg: f64,
    pub pump_hz: f64,
    pub turn_rate_deg: f64,
    pub height: f64,
    pub is_vr: bool,
}

impl SkaterSim {
    pub fn new() -> Self {
        Self {
            room: Vector3::zeros(),
            heading_deg: 0.0,
            pump_hz: 1.2,
            turn_rate_deg: 6.0,
            height: 1.7,
            is_vr: true,
        }
    }

    pub fn advance(&mut self, dt: f64) {
        self.heading_deg = (self.heading_deg + self.turn_rate_deg * dt) % 360.0;
    }

    pub fn apply_displacement(&mut self, displacement: Vector3<f64>) {
        self.room += displacement;
    }

    pub fn position(&self) -> Vector3<f64> {
        self.room
    }

    pub fn sample(&self, t: f64) -> TrackingSample {
        let yaw =
            UnitQuaternion::from_axis_angle(&Vector3::y_axis(), self.heading_deg.to_radians());
        let right = yaw * Vector3::x();

        // Stance oscillates 0.15 .. 0.45 m; the widening half of each cycle
        // is the power stroke.
        let half_stance =
            0.15 + 0.075 * (std::f64::consts::TAU * self.pump_hz * t).sin();
        let hip_y = self.height * 0.55;

        TrackingSample {
            timestamp: t,
            head_position: self.room + Vector3::new(0.0, self.height, 0.0),
            head_rotation: yaw,
            room_position: self.room,
            room_rotation: UnitQuaternion::identity(),
            left_foot_position: self.room - right * half_stance
                + Vector3::new(0.0, 0.05, 0.0),
            right_foot_position: self.room + right * half_stance
                + Vector3::new(0.0, 0.05, 0.0),
            left_hip_position: self.room - right * 0.17 + Vector3::new(0.0, hip_y, 0.0),
            right_hip_position: self.room + right * 0.17 + Vector3::new(0.0, hip_y, 0.0),
            is_vr: self.is_vr,
        }
    }
}

impl Default for SkaterSim {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_floor_hit_under_origin() {
        let rink = FlatRink::new("ice", 10.0);
        let hit = rink
            .cast(Vector3::new(2.0, 1.7, -3.0), -Vector3::y(), 25.0)
            .unwrap();
        assert_eq!(hit.surface_id, "ice");
        assert_relative_eq!(hit.point.x, 2.0);
        assert_relative_eq!(hit.point.y, 0.0);
        assert_relative_eq!(hit.point.z, -3.0);
    }

    #[test]
    fn test_miss_beyond_extent_and_range() {
        let rink = FlatRink::new("ice", 10.0);
        assert!(rink.cast(Vector3::new(11.0, 1.7, 0.0), -Vector3::y(), 25.0).is_none());
        assert!(rink.cast(Vector3::new(0.0, 30.0, 0.0), -Vector3::y(), 25.0).is_none());
        // Horizontal ray without a wall hits nothing.
        assert!(rink.cast(Vector3::new(0.0, 1.7, 0.0), Vector3::z(), 25.0).is_none());
    }

    #[test]
    fn test_wall_hit_honors_direction_and_range() {
        let rink = FlatRink::new("ice", 10.0).with_wall_z(0.1);
        let origin = Vector3::new(0.0, 1.7, 0.0);
        assert!(rink.cast(origin, Vector3::z(), 0.25).is_some());
        // Facing away from the wall.
        assert!(rink.cast(origin, -Vector3::z(), 0.25).is_none());
        // Wall out of range.
        let rink = FlatRink::new("ice", 10.0).with_wall_z(5.0);
        assert!(rink.cast(origin, Vector3::z(), 0.25).is_none());
    }

    #[test]
    fn test_skater_stance_oscillates() {
        let sim = SkaterSim::new();
        let dist = |t: f64| {
            let s = sim.sample(t);
            (s.left_foot_position - s.right_foot_position).norm()
        };
        // Quarter period of a 1.2 Hz pump is ~0.208 s.
        let quarter = 0.25 / sim.pump_hz;
        assert_relative_eq!(dist(0.0), 0.3, epsilon = 1e-9);
        assert_relative_eq!(dist(quarter), 0.45, epsilon = 1e-6);
        assert_relative_eq!(dist(3.0 * quarter), 0.15, epsilon = 1e-6);
    }

    #[test]
    fn test_skater_heading_rotates_rig() {
        let mut sim = SkaterSim::new();
        sim.turn_rate_deg = 90.0;
        sim.advance(1.0);
        let s = sim.sample(1.0);
        // After a 90° yaw the hip line runs along -z.
        let hip_line = s.right_hip_position - s.left_hip_position;
        assert_relative_eq!(hip_line.z, -0.34, epsilon = 1e-9);
        assert_relative_eq!(hip_line.x, 0.0, epsilon = 1e-9);
    }
}
