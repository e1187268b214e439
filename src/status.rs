use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};

use crate::skating::{SkateConfig, SkateEvent, SkateSnapshot};
use crate::types::{InputSample, TrackingSample};

/// Flat debug mirror of the simulation, written out as JSON for external
/// inspection while a session runs.
#[derive(Serialize, Deserialize, Clone)]
pub struct SkateStatus {
    pub timestamp: f64,
    pub uptime_seconds: f64,
    pub ticks: u64,
    // Motion state
    pub running: bool,
    pub momentum: f64,
    pub direction_x: f64,
    pub direction_z: f64,
    pub move_state: String,
    pub drag: f64,
    pub height_calibration: f64,
    pub feet_distance: f64,
    pub is_vr: bool,
    // Session counters
    pub surface_entries: u64,
    pub surface_exits: u64,
    pub foot_impulses: u64,
    pub input_impulses: u64,
    pub inflections: u64,
    pub obstacle_contacts: u64,
    pub effective_stops: u64,
    pub height_recalibrations: u64,
    pub distance_traveled: f64,
    pub peak_momentum: f64,
}

impl SkateStatus {
    pub fn new() -> Self {
        Self {
            timestamp: current_timestamp(),
            uptime_seconds: 0.0,
            ticks: 0,
            running: false,
            momentum: 0.0,
            direction_x: 0.0,
            direction_z: 1.0,
            move_state: "Forward".to_string(),
            drag: 0.0,
            height_calibration: 0.0,
            feet_distance: 0.0,
            is_vr: false,
            surface_entries: 0,
            surface_exits: 0,
            foot_impulses: 0,
            input_impulses: 0,
            inflections: 0,
            obstacle_contacts: 0,
            effective_stops: 0,
            height_recalibrations: 0,
            distance_traveled: 0.0,
            peak_momentum: 0.0,
        }
    }

    /// Fold one frame's results into the mirror.
    pub fn record(&mut self, snapshot: &SkateSnapshot, events: &[SkateEvent], displacement_norm: f64) {
        self.timestamp = current_timestamp();
        self.ticks += 1;
        self.running = snapshot.running;
        self.momentum = snapshot.momentum;
        self.direction_x = snapshot.direction.x;
        self.direction_z = snapshot.direction.z;
        self.move_state = format!("{:?}", snapshot.move_state);
        self.drag = snapshot.drag;
        self.height_calibration = snapshot.height_calibration;
        self.feet_distance = snapshot.feet_distance;
        self.is_vr = snapshot.is_vr;
        self.distance_traveled += displacement_norm;
        if snapshot.momentum.abs() > self.peak_momentum {
            self.peak_momentum = snapshot.momentum.abs();
        }

        for event in events {
            match event {
                SkateEvent::SurfaceEntered { .. } => self.surface_entries += 1,
                SkateEvent::SurfaceExited { .. } => self.surface_exits += 1,
                SkateEvent::FootImpulse { .. } => self.foot_impulses += 1,
                SkateEvent::InputImpulse { .. } => self.input_impulses += 1,
                SkateEvent::InflectionStarted => self.inflections += 1,
                SkateEvent::ObstacleContact { .. } => self.obstacle_contacts += 1,
                SkateEvent::EffectiveStop => self.effective_stops += 1,
                SkateEvent::HeightRecalibrated { .. } => self.height_recalibrations += 1,
                _ => {}
            }
        }
    }

    pub fn save(&self, path: &str) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

impl Default for SkateStatus {
    fn default() -> Self {
        Self::new()
    }
}

pub fn current_timestamp() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}

// ─── Session recording ───────────────────────────────────────────────────────

/// One recorded frame of inputs, enough to reproduce the tick exactly.
#[derive(Serialize, Deserialize, Clone)]
pub struct SessionTick {
    pub now: f64,
    pub dt: f64,
    pub sample: TrackingSample,
    pub input: InputSample,
}

/// A full recorded session: the config it ran with plus every tick's inputs.
/// Replaying it through a fresh engine reproduces the run bit for bit.
#[derive(Serialize, Deserialize, Clone)]
pub struct SessionRecord {
    pub config: SkateConfig,
    pub ticks: Vec<SessionTick>,
}

impl SessionRecord {
    pub fn new(config: SkateConfig) -> Self {
        Self { config, ticks: Vec::new() }
    }

    pub fn push(&mut self, now: f64, dt: f64, sample: &TrackingSample, input: &InputSample) {
        self.ticks.push(SessionTick {
            now,
            dt,
            sample: sample.clone(),
            input: input.clone(),
        });
    }

    /// Writes `.json.gz` compressed, anything else as plain JSON.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let file = File::create(path)?;
        if path.extension().map(|e| e == "gz").unwrap_or(false) {
            let mut gz = GzEncoder::new(BufWriter::new(file), Compression::default());
            serde_json::to_writer(&mut gz, self)?;
            gz.finish()?.flush()?;
        } else {
            serde_json::to_writer_pretty(BufWriter::new(file), self)?;
        }
        Ok(())
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let file = File::open(path)?;
        if path.extension().map(|e| e == "gz").unwrap_or(false) {
            let gz = GzDecoder::new(file);
            Ok(serde_json::from_reader(BufReader::new(gz))?)
        } else {
            Ok(serde_json::from_reader(BufReader::new(file))?)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MoveState;
    use nalgebra::{UnitQuaternion, Vector3};

    fn snapshot() -> SkateSnapshot {
        SkateSnapshot {
            running: true,
            momentum: 1.5,
            direction: Vector3::z(),
            move_state: MoveState::Forward,
            drag: 0.05,
            anterior: Vector3::z(),
            height_calibration: 1.7,
            feet_distance: 0.3,
            inflection_end_time: 0.0,
            is_vr: true,
        }
    }

    #[test]
    fn test_record_counts_events_and_distance() {
        let mut status = SkateStatus::new();
        let events = vec![
            SkateEvent::SurfaceEntered { momentum: 0.0 },
            SkateEvent::FootImpulse { delta: 0.1 },
            SkateEvent::FootImpulse { delta: 0.2 },
            SkateEvent::InflectionStarted,
        ];
        status.record(&snapshot(), &events, 0.05);
        status.record(&snapshot(), &[], 0.05);

        assert_eq!(status.ticks, 2);
        assert_eq!(status.surface_entries, 1);
        assert_eq!(status.foot_impulses, 2);
        assert_eq!(status.inflections, 1);
        assert_eq!(status.move_state, "Forward");
        assert!((status.distance_traveled - 0.1).abs() < 1e-12);
        assert!((status.peak_momentum - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_session_round_trip_plain_and_gz() {
        let sample = TrackingSample {
            timestamp: 0.0,
            head_position: Vector3::new(0.0, 1.7, 0.0),
            head_rotation: UnitQuaternion::identity(),
            room_position: Vector3::zeros(),
            room_rotation: UnitQuaternion::identity(),
            left_foot_position: Vector3::new(-0.15, 0.05, 0.0),
            right_foot_position: Vector3::new(0.15, 0.05, 0.0),
            left_hip_position: Vector3::new(-0.15, 0.9, 0.0),
            right_hip_position: Vector3::new(0.15, 0.9, 0.0),
            is_vr: true,
        };
        let mut record = SessionRecord::new(SkateConfig::default());
        record.push(0.0, 1.0 / 90.0, &sample, &InputSample::default());
        record.push(1.0 / 90.0, 1.0 / 90.0, &sample, &InputSample { forward: 1.0, jump: false });

        let dir = std::env::temp_dir();
        for name in ["skate_session_test.json", "skate_session_test.json.gz"] {
            let path = dir.join(name);
            record.save(&path).unwrap();
            let loaded = SessionRecord::load(&path).unwrap();
            assert_eq!(loaded.ticks.len(), 2);
            assert!((loaded.ticks[1].input.forward - 1.0).abs() < 1e-12);
            std::fs::remove_file(&path).unwrap();
        }
    }
}
