//! Horizontal-plane vector helpers for the skating model
//!
//! The rink lives in the XZ plane with Y up. Everything the motion model
//! reasons about (anterior, momentum direction, blade lines) is a unit
//! vector in that plane, so the helpers here flatten, rotate and compare
//! vectors with zero-length guards baked in.

use nalgebra::{UnitQuaternion, Vector3};

pub type Vec3 = Vector3<f64>;
pub type Quat = UnitQuaternion<f64>;

/// Below this magnitude a vector is treated as degenerate input.
pub const DEGENERATE_EPS: f64 = 1e-9;

/// Drop the vertical component.
pub fn flatten(v: &Vec3) -> Vec3 {
    Vector3::new(v.x, 0.0, v.z)
}

/// Drop the vertical component and normalize. `None` for degenerate input.
pub fn flatten_unit(v: &Vec3) -> Option<Vec3> {
    let flat = flatten(v);
    let norm = flat.norm();
    if norm < DEGENERATE_EPS {
        return None;
    }
    Some(flat / norm)
}

/// Anticlockwise perpendicular in the XZ plane: `(-z, 0, x)`.
///
/// Applied to the left-to-right hip line this yields the body's forward.
pub fn anticlockwise_perp(v: &Vec3) -> Vec3 {
    Vector3::new(-v.z, 0.0, v.x)
}

/// Clockwise perpendicular in the XZ plane: `(z, 0, -x)`.
///
/// Applied to the anterior this yields the rider's right.
pub fn clockwise_perp(v: &Vec3) -> Vec3 {
    Vector3::new(v.z, 0.0, -v.x)
}

/// Unsigned angle between two vectors in degrees, 0 for degenerate input.
pub fn angle_deg(a: &Vec3, b: &Vec3) -> f64 {
    let denom = a.norm() * b.norm();
    if denom < DEGENERATE_EPS {
        return 0.0;
    }
    let cos = (a.dot(b) / denom).clamp(-1.0, 1.0);
    cos.acos().to_degrees()
}

/// Reflect `v` across the plane whose unit normal is `normal`.
pub fn reflect(v: &Vec3, normal: &Vec3) -> Vec3 {
    v - normal * (2.0 * v.dot(normal))
}

/// Rotate `current` toward `target` by at most `max_radians`, preserving the
/// magnitude of `current`. Degenerate inputs return `current` unchanged.
pub fn rotate_towards(current: &Vec3, target: &Vec3, max_radians: f64) -> Vec3 {
    let cur_norm = current.norm();
    if cur_norm < DEGENERATE_EPS || target.norm() < DEGENERATE_EPS || max_radians <= 0.0 {
        return *current;
    }

    let angle = angle_deg(current, target).to_radians();
    if angle <= max_radians {
        return target.normalize() * cur_norm;
    }

    let mut axis = current.cross(target);
    if axis.norm() < DEGENERATE_EPS {
        // Antiparallel target: rotate about the world up axis.
        axis = Vector3::y();
    }
    let rot = UnitQuaternion::from_axis_angle(&nalgebra::Unit::new_normalize(axis), max_radians);
    rot * current
}

/// Rotation that looks along `forward` with Y up.
pub fn look_rotation_y(forward: &Vec3) -> Quat {
    UnitQuaternion::face_towards(forward, &Vector3::y())
}

/// Unsigned angle between two rotations in degrees.
pub fn quat_angle_deg(a: &Quat, b: &Quat) -> f64 {
    a.angle_to(b).to_degrees()
}
