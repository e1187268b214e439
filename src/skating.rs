// skating.rs — Pure computation core of the locomotion override
//
// Everything in this module is independent of:
//   - the host engine's frame callback and render loop
//   - real tracking hardware and physics raycasts (trait seams)
//   - audio/VFX playback, UI, session recording
//
// It takes tracking samples in, produces a per-tick displacement and events
// out. That means the whole motion model can be unit-tested with synthetic
// samples and replayed from recorded sessions without a headset attached.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::facing::FacingEstimator;
use crate::height::HeightCalibrator;
use crate::inflection::InflectionDetector;
use crate::move_state::{classify, drag_for};
use crate::types::linalg::{clockwise_perp, flatten, flatten_unit, reflect, rotate_towards, Vec3};
use crate::types::{HostLocomotion, InputSample, MoveState, Raycaster, TrackingSample};

// ─── Configuration ───────────────────────────────────────────────────────────

/// Runtime-tunable parameters. All lengths in meters, times in seconds,
/// angles in degrees.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SkateConfig {
    /// Gain applied to foot-pump displacement and analog input.
    pub accel_scale: f64,
    /// Per-second decay while gliding (Forward/Back).
    pub drag_moving: f64,
    /// Per-second decay while braking (Left/Right).
    pub drag_stopping: f64,
    /// Body angular velocity above which a turn suspends updates (deg/s).
    pub inflection_threshold_deg: f64,
    /// How long the suspension window stays open.
    pub inflection_period_secs: f64,
    /// Total angular width of each lateral (braking) zone.
    pub stop_angle_range_deg: f64,
    /// Below this |momentum| a braking rider snaps to an effective stop.
    pub stop_min_momentum: f64,
    /// Foot-planted threshold as a portion of calibrated standing height.
    pub foot_height_threshold_portion: f64,
    /// How grippy a braking stop feels; scales the stopping-drift turn rate.
    pub surface_hardness: f64,
    /// Momentum below which a Back-state rider is reclassified Forward.
    pub forward_bias: f64,
    /// Attenuation on analog input that opposes current momentum.
    pub input_reverse_portion: f64,
    /// Height delta beyond which calibration snaps instead of blending.
    pub height_delta_threshold: f64,
    /// Hip-driven facing and foot pumping (off for three-point tracking).
    pub full_body_tracking: bool,
    /// Forward probe length for the obstacle guard.
    pub obstacle_distance: f64,
    /// Momentum left after an obstacle contact (avoids a dead-stop feel).
    pub obstacle_residual_momentum: f64,
    /// Identity the downward ray must report for a surface to be skateable.
    pub surface_id: String,
    /// Maximum downward ray length for the surface check.
    pub ray_max_dist: f64,
    /// Pump speed (m/s) a foot impulse must exceed to trigger the pump SFX.
    pub sfx_pump_threshold: f64,
    pub sfx_cooldown_vr: f64,
    pub sfx_cooldown_screen: f64,
}

impl Default for SkateConfig {
    fn default() -> Self {
        Self {
            accel_scale: 2.0,
            drag_moving: 0.05,
            drag_stopping: 1.0,
            inflection_threshold_deg: 270.0,
            inflection_period_secs: 0.4,
            stop_angle_range_deg: 90.0,
            stop_min_momentum: 0.05,
            foot_height_threshold_portion: 0.2,
            surface_hardness: 0.1,
            forward_bias: 0.5,
            input_reverse_portion: 0.3,
            height_delta_threshold: 0.1,
            full_body_tracking: true,
            obstacle_distance: 0.25,
            obstacle_residual_momentum: 0.1,
            surface_id: "ice".to_string(),
            ray_max_dist: 25.0,
            sfx_pump_threshold: 1.2,
            sfx_cooldown_vr: 0.5,
            sfx_cooldown_screen: 1.0,
        }
    }
}

// ─── Events ──────────────────────────────────────────────────────────────────

/// Discrete transitions emitted per tick, fire-and-forget. Effects and debug
/// consumers read these plus value snapshots; nothing reads back into the
/// engine.
#[derive(Clone, Debug)]
pub enum SkateEvent {
    SurfaceEntered { momentum: f64 },
    SurfaceExited { exit_speed: f64 },
    MoveStateChanged { state: MoveState },
    InflectionStarted,
    InflectionEnded { reversed: bool },
    FootImpulse { delta: f64 },
    InputImpulse { delta: f64 },
    ObstacleContact { clamped_from: f64 },
    EffectiveStop,
    HeightRecalibrated { height: f64 },
    StoppingDrift { blade: Vec3 },
}

// ─── Output snapshot ─────────────────────────────────────────────────────────

/// Read-only copy of the motion state, safe to hand to any collaborator.
#[derive(Clone, Debug)]
pub struct SkateSnapshot {
    pub running: bool,
    pub momentum: f64,
    pub direction: Vec3,
    pub move_state: MoveState,
    pub drag: f64,
    pub anterior: Vec3,
    pub height_calibration: f64,
    pub feet_distance: f64,
    pub inflection_end_time: f64,
    pub is_vr: bool,
}

/// Result of one simulation tick.
#[derive(Clone, Debug)]
pub struct TickOutput {
    /// Room-space positional correction the host should apply (the teleport).
    pub displacement: Vec3,
    pub events: Vec<SkateEvent>,
}

// ─── The engine ──────────────────────────────────────────────────────────────

pub struct SkateEngine {
    config: SkateConfig,

    // Estimators
    facing: FacingEstimator,
    height: HeightCalibrator,
    inflection: InflectionDetector,

    // Motion state
    running: bool,
    momentum: f64,
    direction: Vec3,
    move_state: MoveState,
    drag: f64,

    // Per-tick spatial snapshots
    anterior: Vec3,
    left_foot: Vec3,
    right_foot: Vec3,
    feet_dist_last: f64,
    is_vr: bool,

    // Host locomotion cache for lifecycle round-trip
    walk_cache: f64,
    strafe_cache: f64,
    run_cache: f64,
    jump_cache: f64,
}

impl SkateEngine {
    pub fn new(config: SkateConfig) -> Self {
        Self {
            facing: FacingEstimator::new(config.full_body_tracking),
            height: HeightCalibrator::new(config.height_delta_threshold),
            inflection: InflectionDetector::new(
                config.inflection_threshold_deg,
                config.inflection_period_secs,
            ),
            running: false,
            momentum: 0.0,
            direction: Vector3::z(),
            move_state: MoveState::Forward,
            drag: config.drag_moving,
            anterior: Vector3::z(),
            left_foot: Vector3::zeros(),
            right_foot: Vector3::zeros(),
            feet_dist_last: 0.0,
            is_vr: false,
            walk_cache: 0.0,
            strafe_cache: 0.0,
            run_cache: 0.0,
            jump_cache: 0.0,
            config,
        }
    }

    // ── Surface lifecycle ────────────────────────────────────────────────

    /// Surface-enter: capture host velocity as momentum, immobilize the
    /// host controller, zero its locomotion parameters, and seed spatial
    /// state so the first tick is well-defined.
    pub fn enable(
        &mut self,
        sample: &TrackingSample,
        host: &mut dyn HostLocomotion,
    ) -> Vec<SkateEvent> {
        let mut events = Vec::new();

        // Horizontal velocity becomes the momentum/direction pair; vertical
        // velocity stays with the host.
        let vel = host.velocity();
        let vel2d = flatten(&vel);
        self.momentum = vel2d.norm();
        host.set_velocity(Vector3::new(0.0, vel.y, 0.0));

        // Immobilize so host IK and input cannot fight the override.
        host.set_immobilized(true);
        log::debug!("immobilizing host controller, momentum captured at {:.2}", self.momentum);
        self.walk_cache = host.walk_speed();
        self.strafe_cache = host.strafe_speed();
        self.run_cache = host.run_speed();
        self.jump_cache = host.jump_impulse();
        host.set_walk_speed(0.0);
        host.set_strafe_speed(0.0);
        host.set_run_speed(0.0);
        host.set_jump_impulse(0.0);

        // Seed spatial state.
        self.is_vr = sample.is_vr;
        self.anterior = self.facing.anterior(sample);
        let rot = self.facing.rotation_from_room(&self.anterior, sample);
        self.inflection.reset(rot);
        self.height
            .update(sample.head_position.y - sample.room_position.y, 0.0);
        self.update_feet(sample);
        self.feet_dist_last = self.feet_distance();

        // A rider who steps on standing still has no velocity to aim with.
        self.direction = flatten_unit(&vel2d).unwrap_or(self.anterior);

        let state = classify(&self.anterior, &self.direction, self.config.stop_angle_range_deg);
        self.apply_move_state(state, &mut events);

        self.running = true;
        events.push(SkateEvent::SurfaceEntered { momentum: self.momentum });
        events
    }

    /// Surface-exit: convert momentum back into host velocity and restore
    /// every cached locomotion parameter exactly.
    pub fn disable(&mut self, host: &mut dyn HostLocomotion) -> Vec<SkateEvent> {
        host.set_immobilized(false);

        let mut vel = self.direction * self.momentum;
        vel.y += host.velocity().y;
        host.set_velocity(vel);

        host.set_walk_speed(self.walk_cache);
        host.set_strafe_speed(self.strafe_cache);
        host.set_run_speed(self.run_cache);
        host.set_jump_impulse(self.jump_cache);

        self.running = false;
        log::debug!("host controller restored, exit speed {:.2}", self.momentum);
        vec![SkateEvent::SurfaceExited { exit_speed: self.momentum }]
    }

    /// Jump passthrough: the live jump impulse is zeroed while skating, so a
    /// grounded jump press applies the cached impulse directly. The caller
    /// gates on groundedness.
    pub fn handle_jump(&mut self, host: &mut dyn HostLocomotion) {
        if !self.running {
            return;
        }
        let mut vel = host.velocity();
        vel.y += self.jump_cache;
        host.set_velocity(vel);
    }

    // ── Per-tick simulation ──────────────────────────────────────────────

    pub fn tick(
        &mut self,
        sample: &TrackingSample,
        input: &InputSample,
        obstacles: &dyn Raycaster,
        now: f64,
        dt: f64,
    ) -> TickOutput {
        let mut events = Vec::new();
        if !self.running {
            return TickOutput { displacement: Vector3::zeros(), events };
        }

        // Spatial derivations, in dependency order: anterior feeds the
        // room-relative rotation, which feeds the inflection detector.
        self.is_vr = sample.is_vr;
        self.anterior = self.facing.anterior(sample);
        let rot = self.facing.rotation_from_room(&self.anterior, sample);
        let head_height = sample.head_position.y - sample.room_position.y;
        if self.height.update(head_height, dt) {
            events.push(SkateEvent::HeightRecalibrated { height: self.height.estimate() });
        }

        let infl = self.inflection.update(rot, now, dt);
        if infl.ended {
            let reversed = self.momentum <= 0.0;
            if reversed {
                // Pending forward-bias reversal: flip both together so
                // momentum * direction is preserved.
                self.direction = -self.direction;
                self.momentum = -self.momentum;
            }
            let state =
                classify(&self.anterior, &self.direction, self.config.stop_angle_range_deg);
            self.apply_move_state(state, &mut events);
            events.push(SkateEvent::InflectionEnded { reversed });
        }
        if infl.started {
            events.push(SkateEvent::InflectionStarted);
        }

        if !infl.suspended {
            // Forward bias: a slow Back-state rider flips to Forward with
            // negated momentum, easing acceleration out of reverse.
            if self.move_state == MoveState::Back && self.momentum < self.config.forward_bias {
                self.move_state = MoveState::Forward;
                self.momentum = -self.momentum;
            }

            self.input_momentum(input.forward, dt, &mut events);

            self.update_feet(sample);
            if self.feet_planted(sample) {
                self.feet_momentum(&mut events);
            }

            // Direction last: the momentum paths above can change the state.
            self.update_direction(dt, &mut events);
        }

        // Drag always applies, after pumping and input.
        self.momentum *= 1.0 - self.drag * dt;

        self.obstacle_guard(sample, obstacles, &mut events);

        // Accumulated float error never leaves this method.
        self.direction = flatten_unit(&self.direction).unwrap_or(self.anterior);

        TickOutput { displacement: self.direction * self.momentum * dt, events }
    }

    // ── Momentum sources ─────────────────────────────────────────────────

    fn input_momentum(&mut self, vertical: f64, dt: f64, events: &mut Vec<SkateEvent>) {
        let mut input = vertical;
        if input == 0.0 || self.move_state.is_stopping() {
            return;
        }

        if self.move_state == MoveState::Forward {
            if input < 0.0 {
                if self.momentum <= 0.0 {
                    // Already drifting backward under forward bias: commit
                    // to the Back state coherently.
                    self.move_state = MoveState::Back;
                    self.momentum = -self.momentum;
                    input = -input;
                } else {
                    // Opposing input is a soft brake, not a hard reverse.
                    input *= self.config.input_reverse_portion * self.config.drag_stopping;
                }
            }
        } else {
            if input > 0.0 {
                if self.momentum <= 0.0 {
                    self.move_state = MoveState::Forward;
                    self.momentum = -self.momentum;
                } else {
                    input *= self.config.input_reverse_portion * self.config.drag_stopping;
                }
            }
            // In the Back state, backward input adds momentum.
            input = -input;
        }

        let delta = input * self.config.accel_scale * dt;
        self.momentum += delta;
        if delta > 0.0 {
            events.push(SkateEvent::InputImpulse { delta });
        }
    }

    fn update_feet(&mut self, sample: &TrackingSample) {
        self.left_foot = sample.left_foot_position;
        self.right_foot = sample.right_foot_position;
    }

    /// Both feet within the calibrated height threshold of the floor.
    fn feet_planted(&self, sample: &TrackingSample) -> bool {
        let threshold = self
            .height
            .foot_height_threshold(self.config.foot_height_threshold_portion);
        let floor = sample.room_position.y;
        self.left_foot.y - floor <= threshold && self.right_foot.y - floor <= threshold
    }

    fn feet_distance(&self) -> f64 {
        let dx = self.left_foot.x - self.right_foot.x;
        let dz = self.left_foot.z - self.right_foot.z;
        (dx * dx + dz * dz).sqrt()
    }

    /// Push-apart foot motion powers the skater. Shrinking distance
    /// contributes nothing; each positive delta is a discrete impulse with
    /// no dt factor.
    fn feet_momentum(&mut self, events: &mut Vec<SkateEvent>) {
        if !self.is_vr || !self.config.full_body_tracking {
            return;
        }

        let dist = self.feet_distance();
        let delta = dist - self.feet_dist_last;
        if delta > 0.0 {
            self.momentum += delta * self.config.accel_scale;
            events.push(SkateEvent::FootImpulse { delta });
        }
        self.feet_dist_last = dist;
    }

    // ── Direction resolution ─────────────────────────────────────────────

    fn update_direction(&mut self, dt: f64, events: &mut Vec<SkateEvent>) {
        match self.move_state {
            MoveState::Forward => {
                self.direction = self.anterior;
                return;
            }
            MoveState::Back => {
                self.direction = -self.anterior;
                return;
            }
            _ => {}
        }

        // Braking states model the blades dragging across the momentum line.
        let right = clockwise_perp(&self.anterior);
        let half = self.config.stop_angle_range_deg / 2.0;
        let blade_angle = crate::types::linalg::angle_deg(&right, &self.direction);

        // Blades drifted out of the lateral zone: the rider's posture now
        // implies a different intent, so reclassify.
        if blade_angle > half && blade_angle < 180.0 - half {
            let state =
                classify(&self.anterior, &self.direction, self.config.stop_angle_range_deg);
            self.apply_move_state(state, events);
            if self.move_state == MoveState::Forward {
                self.direction = self.anterior;
                return;
            }
            if self.move_state == MoveState::Back {
                self.direction = -self.anterior;
                return;
            }
        }

        // Slowed to an effective stop: kick back to Forward.
        if self.momentum.abs() < self.config.stop_min_momentum {
            self.apply_move_state(MoveState::Forward, events);
            self.direction = self.anterior;
            events.push(SkateEvent::EffectiveStop);
            return;
        }

        match self.move_state {
            MoveState::Right => self.direction = self.stopping_drift(right, dt, events),
            MoveState::Left => self.direction = self.stopping_drift(-right, dt, events),
            _ => self.direction = self.anterior,
        }
    }

    /// Bounded-rate drift of the momentum direction while braking: the
    /// blade line reflected across the travel direction, negated, is where
    /// non-perpendicular momentum leaks. Facing slightly backward while
    /// stopping drifts you slightly backward.
    fn stopping_drift(&self, blade: Vec3, dt: f64, events: &mut Vec<SkateEvent>) -> Vec3 {
        let drift_target = -reflect(&blade, &self.direction);
        let max_rate = std::f64::consts::FRAC_PI_2 * dt * self.config.surface_hardness;
        events.push(SkateEvent::StoppingDrift { blade });
        rotate_towards(&self.direction, &drift_target, max_rate)
    }

    // ── Obstacle guard ───────────────────────────────────────────────────

    /// Short probe along the travel direction. On contact, momentum clamps
    /// to a small residual rather than zero. Blunt by design; it prevents
    /// wall clipping, not realistic collision response.
    fn obstacle_guard(
        &mut self,
        sample: &TrackingSample,
        obstacles: &dyn Raycaster,
        events: &mut Vec<SkateEvent>,
    ) {
        let travel = if self.momentum < 0.0 { -self.direction } else { self.direction };
        if obstacles
            .cast(sample.head_position, travel, self.config.obstacle_distance)
            .is_some()
        {
            events.push(SkateEvent::ObstacleContact { clamped_from: self.momentum });
            self.momentum = self.config.obstacle_residual_momentum;
        }
    }

    // ── State application ────────────────────────────────────────────────

    fn apply_move_state(&mut self, state: MoveState, events: &mut Vec<SkateEvent>) {
        let changed = state != self.move_state;
        self.move_state = state;
        self.drag = drag_for(state, self.config.drag_moving, self.config.drag_stopping);
        if changed {
            events.push(SkateEvent::MoveStateChanged { state });
        }
    }

    // ── Queries ──────────────────────────────────────────────────────────

    pub fn snapshot(&self) -> SkateSnapshot {
        SkateSnapshot {
            running: self.running,
            momentum: self.momentum,
            direction: self.direction,
            move_state: self.move_state,
            drag: self.drag,
            anterior: self.anterior,
            height_calibration: self.height.estimate(),
            feet_distance: self.feet_dist_last,
            inflection_end_time: self.inflection.end_time(),
            is_vr: self.is_vr,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn momentum(&self) -> f64 {
        self.momentum
    }

    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    pub fn move_state(&self) -> MoveState {
        self.move_state
    }

    pub fn config(&self) -> &SkateConfig {
        &self.config
    }

    #[cfg(test)]
    pub(crate) fn force_motion(&mut self, momentum: f64, direction: Vec3, state: MoveState) {
        self.momentum = momentum;
        self.direction = direction;
        self.move_state = state;
        self.drag = drag_for(state, self.config.drag_moving, self.config.drag_stopping);
    }
}
