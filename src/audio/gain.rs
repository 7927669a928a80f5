/// Sensitivity scaling followed by a clamp to the unit interval.
pub struct GainStage {
    sensitivity: f32,
    levels: Vec<f32>,
}

impl GainStage {
    pub fn new(band_count: usize, sensitivity: f32) -> Self {
        Self {
            sensitivity,
            levels: vec![0.0; band_count],
        }
    }

    /// Every returned level lies in [0, 1].
    pub fn apply(&mut self, smoothed: &[f32]) -> &[f32] {
        debug_assert_eq!(smoothed.len(), self.levels.len());

        for (out, &level) in self.levels.iter_mut().zip(smoothed) {
            let scaled = level * self.sensitivity;
            // NaN collapses to silence rather than leaking to the renderer
            *out = if scaled.is_nan() { 0.0 } else { scaled.clamp(0.0, 1.0) };
        }
        &self.levels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scales_and_clamps() {
        let mut gain = GainStage::new(4, 10.0);
        let levels = gain.apply(&[0.0, 0.05, 0.1, 3.0]);
        assert_eq!(levels[0], 0.0);
        assert!((levels[1] - 0.5).abs() < 1e-6);
        assert_eq!(levels[2], 1.0);
        assert_eq!(levels[3], 1.0);
    }

    #[test]
    fn output_always_in_unit_interval() {
        let mut gain = GainStage::new(5, 10.0);
        let levels = gain.apply(&[-1.0, f32::NAN, f32::INFINITY, 1e-9, 0.07]);
        assert!(levels.iter().all(|&l| (0.0..=1.0).contains(&l)));
    }
}
