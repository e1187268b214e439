//! Move-state classification: a fixed angular partition of the circle.
//!
//! Given the anterior and the momentum direction, the circle splits into
//! four zones. With the default 90° stop range: Forward is the frontal
//! quarter, Back everything beyond 135° from the anterior, Right within 45°
//! of the rider's right, Left within 45° of the rider's left. Boundary ties
//! resolve by the inclusive comparisons below, so Back and Right/Left win
//! over the Forward default.

use crate::types::linalg::{angle_deg, clockwise_perp, Vec3};
use crate::types::MoveState;

/// Bucket the motion intent. Pure function of the two unit vectors; total
/// over all inputs (degenerate vectors classify as Forward).
pub fn classify(anterior: &Vec3, direction: &Vec3, stop_angle_range_deg: f64) -> MoveState {
    let half = stop_angle_range_deg / 2.0;

    let from_anterior = angle_deg(anterior, direction);
    if from_anterior >= 90.0 + half {
        return MoveState::Back;
    }

    let right = clockwise_perp(anterior);
    let from_right = angle_deg(&right, direction);
    if from_right <= half {
        return MoveState::Right;
    }
    if from_right >= 180.0 - half {
        return MoveState::Left;
    }

    MoveState::Forward
}

/// Drag coefficient for a state: gliding states decay slowly, braking
/// states bite.
pub fn drag_for(state: MoveState, drag_moving: f64, drag_stopping: f64) -> f64 {
    if state.is_stopping() {
        drag_stopping
    } else {
        drag_moving
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;

    const RANGE: f64 = 90.0;

    fn dir(deg_from_z: f64) -> Vec3 {
        let rad = deg_from_z.to_radians();
        Vector3::new(rad.sin(), 0.0, rad.cos())
    }

    #[test]
    fn test_zone_centers() {
        let anterior = dir(0.0);
        assert_eq!(classify(&anterior, &dir(0.0), RANGE), MoveState::Forward);
        assert_eq!(classify(&anterior, &dir(180.0), RANGE), MoveState::Back);
        assert_eq!(classify(&anterior, &dir(90.0), RANGE), MoveState::Right);
        assert_eq!(classify(&anterior, &dir(-90.0), RANGE), MoveState::Left);
    }

    #[test]
    fn test_zone_boundaries_are_inclusive() {
        let anterior = dir(0.0);
        // Exactly 45° from right is still Right; exactly 135° from the
        // anterior is Back.
        assert_eq!(classify(&anterior, &dir(45.0), RANGE), MoveState::Right);
        assert_eq!(classify(&anterior, &dir(135.0), RANGE), MoveState::Back);
        assert_eq!(classify(&anterior, &dir(-45.0), RANGE), MoveState::Left);
        assert_eq!(classify(&anterior, &dir(-135.0), RANGE), MoveState::Back);
        // Just inside the frontal zone.
        assert_eq!(classify(&anterior, &dir(44.0), RANGE), MoveState::Forward);
        assert_eq!(classify(&anterior, &dir(-44.0), RANGE), MoveState::Forward);
    }

    #[test]
    fn test_back_check_beats_side_checks() {
        // 135° sits on both the Back and Right boundaries; Back runs first.
        let anterior = dir(0.0);
        assert_eq!(classify(&anterior, &dir(135.0), RANGE), MoveState::Back);
    }

    #[test]
    fn test_every_heading_classifies() {
        let anterior = dir(0.0);
        for i in 0..720 {
            let d = dir(i as f64 * 0.5);
            // Exhaustive sweep: the classifier is total and never panics.
            let _ = classify(&anterior, &d, RANGE);
        }
    }

    #[test]
    fn test_rotated_anterior_rotates_zones() {
        let anterior = dir(90.0);
        assert_eq!(classify(&anterior, &dir(90.0), RANGE), MoveState::Forward);
        assert_eq!(classify(&anterior, &dir(-90.0), RANGE), MoveState::Back);
        assert_eq!(classify(&anterior, &dir(180.0), RANGE), MoveState::Right);
        assert_eq!(classify(&anterior, &dir(0.0), RANGE), MoveState::Left);
    }

    #[test]
    fn test_narrow_stop_range() {
        let anterior = dir(0.0);
        // With a 30° range the side zones shrink to ±15° around the lateral
        // axes and Back starts at 105°.
        assert_eq!(classify(&anterior, &dir(80.0), 30.0), MoveState::Right);
        assert_eq!(classify(&anterior, &dir(60.0), 30.0), MoveState::Forward);
        assert_eq!(classify(&anterior, &dir(110.0), 30.0), MoveState::Back);
    }

    #[test]
    fn test_drag_mapping() {
        assert_eq!(drag_for(MoveState::Forward, 0.05, 1.0), 0.05);
        assert_eq!(drag_for(MoveState::Back, 0.05, 1.0), 0.05);
        assert_eq!(drag_for(MoveState::Left, 0.05, 1.0), 1.0);
        assert_eq!(drag_for(MoveState::Right, 0.05, 1.0), 1.0);
    }
}
