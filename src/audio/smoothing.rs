/// Per-band exponential moving average.
///
/// The state starts at zero and is only ever updated by [`smooth`](Self::smooth).
pub struct TemporalSmoother {
    alpha: f32,
    state: Vec<f32>,
}

impl TemporalSmoother {
    /// `alpha` is the weight given to the newest vector, in (0, 1].
    pub fn new(band_count: usize, alpha: f32) -> Self {
        Self {
            alpha,
            state: vec![0.0; band_count],
        }
    }

    pub fn state(&self) -> &[f32] {
        &self.state
    }

    /// `S[i] = S[i] * (1 - alpha) + raw[i] * alpha`, returning the updated state.
    pub fn smooth(&mut self, raw: &[f32]) -> &[f32] {
        debug_assert_eq!(raw.len(), self.state.len());

        let keep = 1.0 - self.alpha;
        for (s, &r) in self.state.iter_mut().zip(raw) {
            *s = *s * keep + r * self.alpha;
        }
        &self.state
    }

    /// Ticks needed for a constant input to come within `tolerance` of itself,
    /// starting from a state that is at most 1 away.
    pub fn ticks_to_converge(alpha: f32, tolerance: f64) -> usize {
        (tolerance.ln() / (1.0 - alpha as f64).ln()).ceil() as usize
    }
}
