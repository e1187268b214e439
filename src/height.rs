/// Smoothed estimate of the user's standing head height above the room floor.
///
/// Foot-planted thresholds scale with this estimate so the pump detection
/// works across avatars of different proportions. Small frame-to-frame
/// changes blend in with `lerp(estimate, current, dt)` (a one-second time
/// constant, half-life ~0.69 s); a delta past the threshold snaps
/// immediately, which handles avatar swaps and teleports.
pub struct HeightCalibrator {
    estimate: f64,
    delta_threshold: f64,
    initialized: bool,
}

impl HeightCalibrator {
    pub fn new(delta_threshold: f64) -> Self {
        Self {
            estimate: 0.0,
            delta_threshold,
            initialized: false,
        }
    }

    /// Feed the current head-above-floor height. Returns true when the
    /// estimate snapped rather than blended.
    pub fn update(&mut self, current_height: f64, dt: f64) -> bool {
        if !self.initialized {
            self.initialized = true;
            self.estimate = current_height;
            return true;
        }

        let delta = (self.estimate - current_height).abs();
        if delta < self.delta_threshold {
            let weight = dt.clamp(0.0, 1.0);
            self.estimate += (current_height - self.estimate) * weight;
            false
        } else {
            self.estimate = current_height;
            true
        }
    }

    pub fn estimate(&self) -> f64 {
        self.estimate
    }

    /// World-space foot height below which a foot counts as planted.
    pub fn foot_height_threshold(&self, portion: f64) -> f64 {
        self.estimate * portion
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_first_sample_snaps() {
        let mut cal = HeightCalibrator::new(0.1);
        assert!(cal.update(1.7, 0.011));
        assert_relative_eq!(cal.estimate(), 1.7);
    }

    #[test]
    fn test_large_delta_snaps_without_lag() {
        let mut cal = HeightCalibrator::new(0.1);
        cal.update(1.7, 0.011);
        // 0.5 above the estimate exceeds the 0.1 threshold: exact snap.
        assert!(cal.update(2.2, 0.011));
        assert_relative_eq!(cal.estimate(), 2.2);
    }

    #[test]
    fn test_small_delta_blends_toward_current() {
        let mut cal = HeightCalibrator::new(0.1);
        cal.update(1.70, 0.011);
        let snapped = cal.update(1.75, 0.5);
        assert!(!snapped);
        // Halfway there with dt = 0.5.
        assert_relative_eq!(cal.estimate(), 1.725, epsilon = 1e-12);
        assert!(cal.estimate() < 1.75);
    }

    #[test]
    fn test_blend_converges() {
        let mut cal = HeightCalibrator::new(0.1);
        cal.update(1.70, 0.011);
        for _ in 0..2000 {
            cal.update(1.76, 0.011);
        }
        assert_relative_eq!(cal.estimate(), 1.76, epsilon = 1e-3);
    }

    #[test]
    fn test_foot_height_threshold_scales() {
        let mut cal = HeightCalibrator::new(0.1);
        cal.update(1.6, 0.011);
        assert_relative_eq!(cal.foot_height_threshold(0.2), 0.32, epsilon = 1e-12);
    }
}
