//! Anterior (torso facing) estimation from skeletal or head data.

use nalgebra::Vector3;

use crate::types::linalg::{
    anticlockwise_perp, flatten_unit, look_rotation_y, Quat, Vec3, DEGENERATE_EPS,
};
use crate::types::TrackingSample;

/// Computes the horizontal unit vector the rider's body faces.
///
/// Primary source is the hip line (right hip minus left hip, rotated 90°
/// anticlockwise in the XZ plane). Head-forward is the fallback when
/// full-body tracking is off, hip bones are missing, or the geometry is
/// degenerate. The last good anterior is kept so a single bad sample never
/// produces a zero or NaN facing.
pub struct FacingEstimator {
    full_body_tracking: bool,
    last_anterior: Vec3,
}

impl FacingEstimator {
    pub fn new(full_body_tracking: bool) -> Self {
        Self {
            full_body_tracking,
            last_anterior: Vector3::z(),
        }
    }

    /// Recompute the anterior from this tick's sample.
    pub fn anterior(&mut self, sample: &TrackingSample) -> Vec3 {
        let anterior = self
            .hip_anterior(sample)
            .or_else(|| self.head_forward(sample))
            .unwrap_or_else(|| {
                log::warn!("degenerate facing inputs, holding previous anterior");
                self.last_anterior
            });
        self.last_anterior = anterior;
        anterior
    }

    fn hip_anterior(&self, sample: &TrackingSample) -> Option<Vec3> {
        if !self.full_body_tracking {
            return None;
        }
        // A zeroed bone position means the skeleton has no such bone.
        if sample.left_hip_position.norm() < DEGENERATE_EPS
            || sample.right_hip_position.norm() < DEGENERATE_EPS
        {
            log::debug!("hip bones unavailable, falling back to head forward");
            return None;
        }

        let hip_line = sample.right_hip_position - sample.left_hip_position;
        flatten_unit(&anticlockwise_perp(&hip_line))
    }

    fn head_forward(&self, sample: &TrackingSample) -> Option<Vec3> {
        let fwd = sample.head_rotation * Vector3::z();
        flatten_unit(&fwd)
    }

    /// Body rotation relative to room space, fed to the inflection detector.
    ///
    /// In VR the room rig rotates independently of the body, so the room
    /// rotation is divided out; in screen mode the facing rotation alone is
    /// the signal.
    pub fn rotation_from_room(&self, anterior: &Vec3, sample: &TrackingSample) -> Quat {
        let anterior_rot = look_rotation_y(anterior);
        if sample.is_vr {
            anterior_rot * sample.room_rotation.inverse()
        } else {
            anterior_rot
        }
    }
}
