// surface.rs — Surface lifecycle around the skating engine
//
// Owns the enter/exit edge detection: a downward probe identifies the
// surface under the rider each frame, and transitions drive the engine's
// enable/disable. Also gates the jump passthrough on ground contact.

use nalgebra::Vector3;

use crate::skating::{SkateConfig, SkateEngine, SkateEvent, SkateSnapshot, TickOutput};
use crate::types::{HostLocomotion, InputSample, Raycaster, SurfaceContact, TrackingSample};

/// Everything one frame produces: where the ground is, how far to move the
/// rider, and what happened.
#[derive(Clone, Debug)]
pub struct FrameOutput {
    pub contact: SurfaceContact,
    pub displacement: Vector3<f64>,
    pub events: Vec<SkateEvent>,
}

pub struct SurfaceTracker {
    engine: SkateEngine,
    on_surface_last: bool,
    jump_held: bool,
}

impl SurfaceTracker {
    pub fn new(config: SkateConfig) -> Self {
        Self {
            engine: SkateEngine::new(config),
            on_surface_last: false,
            jump_held: false,
        }
    }

    /// Downward probe from the head. Whatever it hits is the ground point;
    /// only the configured surface identity counts as skateable.
    fn probe(&self, sample: &TrackingSample, world: &dyn Raycaster) -> SurfaceContact {
        match world.cast(
            sample.head_position,
            -Vector3::y(),
            self.engine.config().ray_max_dist,
        ) {
            Some(hit) => SurfaceContact {
                on_surface: hit.surface_id == self.engine.config().surface_id,
                ground_point: hit.point,
                surface_id: hit.surface_id,
            },
            None => SurfaceContact {
                on_surface: false,
                ground_point: sample.head_position
                    - Vector3::new(0.0, sample.head_position.y - sample.room_position.y, 0.0),
                surface_id: String::new(),
            },
        }
    }

    pub fn frame(
        &mut self,
        sample: &TrackingSample,
        input: &InputSample,
        world: &dyn Raycaster,
        host: &mut dyn HostLocomotion,
        now: f64,
        dt: f64,
    ) -> FrameOutput {
        let contact = self.probe(sample, world);
        let mut events = Vec::new();

        if contact.on_surface && !self.on_surface_last {
            log::info!("entering surface '{}'", contact.surface_id);
            events.extend(self.engine.enable(sample, host));
        } else if !contact.on_surface && self.on_surface_last {
            log::info!("leaving surface");
            events.extend(self.engine.disable(host));
        }
        self.on_surface_last = contact.on_surface;

        let mut displacement = Vector3::zeros();
        if self.engine.is_running() {
            // Jump passthrough fires on the press edge, grounded only.
            if input.jump && !self.jump_held && contact.on_surface {
                self.engine.handle_jump(host);
            }
            let TickOutput { displacement: d, events: tick_events } =
                self.engine.tick(sample, input, world, now, dt);
            displacement = d;
            events.extend(tick_events);
        }
        self.jump_held = input.jump;

        FrameOutput { contact, displacement, events }
    }

    /// Respawn failsafe: a teleport or respawn can skip the exit edge, which
    /// would leave the host immobilized forever. Force the exit path.
    pub fn reset(&mut self, host: &mut dyn HostLocomotion) -> Vec<SkateEvent> {
        self.on_surface_last = false;
        self.jump_held = false;
        if self.engine.is_running() {
            log::warn!("forced reset while skating, restoring host state");
            self.engine.disable(host)
        } else {
            Vec::new()
        }
    }

    pub fn is_on_surface(&self) -> bool {
        self.on_surface_last
    }

    pub fn snapshot(&self) -> SkateSnapshot {
        self.engine.snapshot()
    }

    pub fn engine(&self) -> &SkateEngine {
        &self.engine
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rink::{FlatRink, SimHost};
    use approx::assert_relative_eq;
    use nalgebra::UnitQuaternion;

    const DT: f64 = 1.0 / 90.0;

    fn sample_at(x: f64, t: f64) -> TrackingSample {
        TrackingSample {
            timestamp: t,
            head_position: Vector3::new(x, 1.7, 0.0),
            head_rotation: UnitQuaternion::identity(),
            room_position: Vector3::new(x, 0.0, 0.0),
            room_rotation: UnitQuaternion::identity(),
            left_foot_position: Vector3::new(x - 0.15, 0.05, 0.0),
            right_foot_position: Vector3::new(x + 0.15, 0.05, 0.0),
            left_hip_position: Vector3::new(x - 0.15, 0.9, 0.0),
            right_hip_position: Vector3::new(x + 0.15, 0.9, 0.0),
            is_vr: true,
        }
    }

    #[test]
    fn test_enter_and_exit_edges() {
        // Ice only out to |x| <= 5; past that the probe misses.
        let rink = FlatRink::new("ice", 5.0);
        let mut host = SimHost::default();
        host.set_walk_speed(2.0);
        let mut tracker = SurfaceTracker::new(SkateConfig::default());

        let out = tracker.frame(
            &sample_at(0.0, 0.0),
            &InputSample::default(),
            &rink,
            &mut host,
            0.0,
            DT,
        );
        assert!(out.contact.on_surface);
        assert!(out.events.iter().any(|e| matches!(e, SkateEvent::SurfaceEntered { .. })));
        assert!(host.immobilized);
        assert!(tracker.engine().is_running());

        // Still on ice: no second entry event.
        let out = tracker.frame(
            &sample_at(1.0, DT),
            &InputSample::default(),
            &rink,
            &mut host,
            DT,
            DT,
        );
        assert!(!out.events.iter().any(|e| matches!(e, SkateEvent::SurfaceEntered { .. })));

        // Off the edge.
        let out = tracker.frame(
            &sample_at(10.0, 2.0 * DT),
            &InputSample::default(),
            &rink,
            &mut host,
            2.0 * DT,
            DT,
        );
        assert!(!out.contact.on_surface);
        assert!(out.events.iter().any(|e| matches!(e, SkateEvent::SurfaceExited { .. })));
        assert!(!host.immobilized);
        assert_eq!(host.walk_speed(), 2.0);
        assert_relative_eq!(out.displacement.norm(), 0.0);
    }

    #[test]
    fn test_wrong_surface_identity_never_enters() {
        let rink = FlatRink::new("concrete", 50.0);
        let mut host = SimHost::default();
        let mut tracker = SurfaceTracker::new(SkateConfig::default());

        let out = tracker.frame(
            &sample_at(0.0, 0.0),
            &InputSample::default(),
            &rink,
            &mut host,
            0.0,
            DT,
        );
        assert!(!out.contact.on_surface);
        assert_eq!(out.contact.surface_id, "concrete");
        assert!(out.events.is_empty());
        assert!(!host.immobilized);
    }

    #[test]
    fn test_jump_fires_on_press_edge_only() {
        let rink = FlatRink::new("ice", 50.0);
        let mut host = SimHost::default();
        host.set_jump_impulse(3.0);
        let mut tracker = SurfaceTracker::new(SkateConfig::default());

        tracker.frame(&sample_at(0.0, 0.0), &InputSample::default(), &rink, &mut host, 0.0, DT);

        let jump = InputSample { forward: 0.0, jump: true };
        tracker.frame(&sample_at(0.0, DT), &jump, &rink, &mut host, DT, DT);
        assert_relative_eq!(host.velocity().y, 3.0, epsilon = 1e-12);

        // Held across the next frame: no second impulse.
        tracker.frame(&sample_at(0.0, 2.0 * DT), &jump, &rink, &mut host, 2.0 * DT, DT);
        assert_relative_eq!(host.velocity().y, 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_reset_restores_host_mid_session() {
        let rink = FlatRink::new("ice", 50.0);
        let mut host = SimHost::default();
        host.set_walk_speed(2.0);
        host.set_run_speed(4.0);
        let mut tracker = SurfaceTracker::new(SkateConfig::default());

        tracker.frame(&sample_at(0.0, 0.0), &InputSample::default(), &rink, &mut host, 0.0, DT);
        assert!(host.immobilized);

        let events = tracker.reset(&mut host);
        assert!(events.iter().any(|e| matches!(e, SkateEvent::SurfaceExited { .. })));
        assert!(!host.immobilized);
        assert_eq!(host.walk_speed(), 2.0);
        assert_eq!(host.run_speed(), 4.0);
        assert!(!tracker.engine().is_running());

        // Reset when already off is a no-op.
        assert!(tracker.reset(&mut host).is_empty());
    }

    #[test]
    fn test_ground_point_tracks_probe_hit() {
        let rink = FlatRink::new("ice", 50.0);
        let mut host = SimHost::default();
        let mut tracker = SurfaceTracker::new(SkateConfig::default());

        let out = tracker.frame(
            &sample_at(3.0, 0.0),
            &InputSample::default(),
            &rink,
            &mut host,
            0.0,
            DT,
        );
        assert_relative_eq!(out.contact.ground_point.x, 3.0, epsilon = 1e-9);
        assert_relative_eq!(out.contact.ground_point.y, 0.0, epsilon = 1e-9);
    }
}
