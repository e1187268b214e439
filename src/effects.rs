// effects.rs — Audio/VFX cue dispatch
//
// Translates engine events and value snapshots into playback cues. Purely
// reactive; nothing here feeds back into the motion model, so a missing or
// muted effects layer changes nothing about how the rider moves.

use crate::skating::{SkateConfig, SkateEvent, SkateSnapshot};
use crate::types::linalg::Vec3;

/// |momentum| at which the glide loop reaches full volume.
const GLIDE_FULL_SPEED: f64 = 8.0;

#[derive(Clone, Debug, PartialEq)]
pub enum EffectCue {
    /// One-shot skate-push sound. Intensity in [0, 1].
    PumpSound { intensity: f64 },
    /// Ice-spray particles while braking, oriented along the blade line.
    SprayStart { heading: Vec3 },
    SprayStop,
    /// Obstacle hit, scaled by the speed that was absorbed.
    ContactThud { speed: f64 },
}

/// Continuous glide-loop levels, resampled every frame.
#[derive(Clone, Copy, Debug)]
pub struct GlideLevels {
    pub volume: f64,
    pub pitch: f64,
}

pub struct EffectsDispatcher {
    pump_threshold: f64,
    cooldown_vr: f64,
    cooldown_screen: f64,
    pump_allowed_at: f64,
    spraying: bool,
    spray_heading: Vec3,
}

impl EffectsDispatcher {
    pub fn new(config: &SkateConfig) -> Self {
        Self {
            pump_threshold: config.sfx_pump_threshold,
            cooldown_vr: config.sfx_cooldown_vr,
            cooldown_screen: config.sfx_cooldown_screen,
            pump_allowed_at: 0.0,
            spraying: false,
            spray_heading: nalgebra::Vector3::z(),
        }
    }

    pub fn frame(
        &mut self,
        events: &[SkateEvent],
        snapshot: &SkateSnapshot,
        now: f64,
        dt: f64,
    ) -> Vec<EffectCue> {
        let mut cues = Vec::new();

        for event in events {
            match event {
                // Any positive momentum add is a push, whether it came from
                // the feet or the stick.
                SkateEvent::FootImpulse { delta } | SkateEvent::InputImpulse { delta } => {
                    if dt <= 0.0 {
                        continue;
                    }
                    // Gate on pump speed, not raw delta, so frame rate does
                    // not change which pushes are audible.
                    let speed = delta / dt;
                    if speed > self.pump_threshold && now >= self.pump_allowed_at {
                        let cooldown = if snapshot.is_vr {
                            self.cooldown_vr
                        } else {
                            self.cooldown_screen
                        };
                        self.pump_allowed_at = now + cooldown;
                        let intensity =
                            ((speed - self.pump_threshold) / self.pump_threshold).min(1.0);
                        cues.push(EffectCue::PumpSound { intensity });
                    }
                }
                SkateEvent::MoveStateChanged { state } => {
                    if state.is_stopping() && !self.spraying {
                        self.spraying = true;
                        self.spray_heading = snapshot.direction;
                        cues.push(EffectCue::SprayStart { heading: self.spray_heading });
                    } else if !state.is_stopping() && self.spraying {
                        self.spraying = false;
                        cues.push(EffectCue::SprayStop);
                    }
                }
                SkateEvent::StoppingDrift { blade } => {
                    // Keep the particle emitter aligned with the blade line.
                    self.spray_heading = *blade;
                }
                SkateEvent::ObstacleContact { clamped_from } => {
                    cues.push(EffectCue::ContactThud { speed: clamped_from.abs() });
                }
                SkateEvent::EffectiveStop | SkateEvent::SurfaceExited { .. } => {
                    if self.spraying {
                        self.spraying = false;
                        cues.push(EffectCue::SprayStop);
                    }
                }
                _ => {}
            }
        }

        cues
    }

    pub fn glide_levels(&self, snapshot: &SkateSnapshot) -> GlideLevels {
        if !snapshot.running {
            return GlideLevels { volume: 0.0, pitch: 1.0 };
        }
        let volume = (snapshot.momentum.abs() / GLIDE_FULL_SPEED).clamp(0.0, 1.0);
        GlideLevels { volume, pitch: 0.75 + 0.5 * volume }
    }

    pub fn is_spraying(&self) -> bool {
        self.spraying
    }

    pub fn spray_heading(&self) -> Vec3 {
        self.spray_heading
    }
}
