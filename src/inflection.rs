//! Turn-suppression window driven by body angular velocity.
//!
//! A fast body turn is ambiguous input: the rider is pivoting, not steering.
//! While the window is open the momentum integrator coasts; when it closes,
//! a pending forward-bias reversal is resolved and the move state is
//! re-evaluated. Windows are expiry timestamps checked each tick, never
//! scheduled callbacks, so the whole machine stays pollable and tick-rate
//! independent.

use crate::types::linalg::{quat_angle_deg, Quat};

/// What the detector decided this tick.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct InflectionUpdate {
    /// An inflection window closed this tick; the caller must resolve any
    /// pending reversal and re-run the classifier.
    pub ended: bool,
    /// Angular velocity crossed the threshold this tick; a new window opened.
    pub started: bool,
    /// Momentum and direction updates are frozen this tick.
    pub suspended: bool,
}

pub struct InflectionDetector {
    threshold_deg_per_sec: f64,
    period_secs: f64,
    end_time: f64,
    inflecting_last: bool,
    last_rotation: Option<Quat>,
}

impl InflectionDetector {
    pub fn new(threshold_deg_per_sec: f64, period_secs: f64) -> Self {
        Self {
            threshold_deg_per_sec,
            period_secs,
            end_time: 0.0,
            inflecting_last: false,
            last_rotation: None,
        }
    }

    /// Feed this tick's body-from-room rotation.
    ///
    /// `dt == 0` (first tick, paused host clock) reads as no turn.
    pub fn update(&mut self, rotation: Quat, now: f64, dt: f64) -> InflectionUpdate {
        let mut out = InflectionUpdate::default();

        if now < self.end_time {
            // Window still open; keep tracking rotation so the angular
            // velocity on exit is measured against the latest frame.
            self.last_rotation = Some(rotation);
            out.suspended = true;
            return out;
        }

        if self.inflecting_last {
            self.inflecting_last = false;
            out.ended = true;
        }

        if dt > 0.0 {
            if let Some(last) = self.last_rotation {
                let ang_vel = quat_angle_deg(&last, &rotation) / dt;
                if ang_vel > self.threshold_deg_per_sec {
                    self.inflecting_last = true;
                    self.end_time = now + self.period_secs;
                    out.started = true;
                }
            }
        }

        self.last_rotation = Some(rotation);
        out.suspended = !(now > self.end_time);
        out
    }

    /// Arm the detector at session start: prime the rotation reference and
    /// close any stale window so the first tick never reads as a turn.
    pub fn reset(&mut self, rotation: Quat) {
        self.end_time = 0.0;
        self.inflecting_last = false;
        self.last_rotation = Some(rotation);
    }

    pub fn is_inflecting(&self, now: f64) -> bool {
        now < self.end_time
    }

    pub fn end_time(&self) -> f64 {
        self.end_time
    }
}
