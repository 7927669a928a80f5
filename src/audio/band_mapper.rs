use std::ops::RangeInclusive;

/// Reduces a magnitude spectrum to `band_count` mirrored, log-spaced bands.
///
/// Mirror index `i` (0..band_count/2) covers the frequency sub-range starting at
/// `t = 1 - i / (half - 1)` of the log span between `freq_min` and `freq_max`,
/// so index 0 reads the top of the span and the last mirror index reads the
/// bottom. Each level is written to both `i` and `band_count - 1 - i`.
///
/// The bin range of every mirror index depends only on the configuration, so
/// it is resolved once up front.
pub struct BandMapper {
    band_count: usize,
    spectrum_len: usize,
    ranges: Vec<Option<RangeInclusive<usize>>>,
    bands: Vec<f32>,
}

impl BandMapper {
    /// `band_count` must be even and at least 4 (checked at config validation).
    pub fn new(
        band_count: usize,
        spectrum_len: usize,
        sample_rate: u32,
        freq_min: f32,
        freq_max: f32,
    ) -> Self {
        debug_assert!(band_count >= 4 && band_count % 2 == 0);

        let half = band_count / 2;
        let bin_freq = sample_rate as f64 / (spectrum_len as f64 * 2.0);
        let log_min = (freq_min as f64).log10();
        let log_max = (freq_max as f64).log10();
        let last_bin = spectrum_len.saturating_sub(1);

        let ranges = (0..half)
            .map(|i| {
                let t = 1.0 - i as f64 / (half - 1) as f64;
                let log_start = log_min + (log_max - log_min) * t;
                let log_end = log_min + (log_max - log_min) * (t + 1.0 / half as f64);

                let start_bin = (10f64.powf(log_start) / bin_freq) as usize;
                let end_bin = ((10f64.powf(log_end) / bin_freq) as usize).min(last_bin);

                // An empty range yields a zero band
                (spectrum_len > 0 && start_bin <= end_bin).then_some(start_bin..=end_bin)
            })
            .collect();

        Self {
            band_count,
            spectrum_len,
            ranges,
            bands: vec![0.0; band_count],
        }
    }

    /// Inclusive bin range read by mirror index `i`, if any.
    pub fn bin_range(&self, mirror_index: usize) -> Option<RangeInclusive<usize>> {
        self.ranges.get(mirror_index).cloned().flatten()
    }

    /// Map `spectrum` to band levels. The returned slice is overwritten on the next call.
    pub fn map(&mut self, spectrum: &[f32]) -> &[f32] {
        debug_assert_eq!(spectrum.len(), self.spectrum_len);

        for (i, range) in self.ranges.iter().enumerate() {
            let level = match range {
                Some(range) => {
                    let count = range.end() - range.start() + 1;
                    let sum: f32 = spectrum[range.clone()].iter().sum();
                    sum / count.max(1) as f32
                }
                None => 0.0,
            };

            self.bands[i] = level;
            self.bands[self.band_count - 1 - i] = level;
        }

        &self.bands
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_mapper(band_count: usize) -> BandMapper {
        BandMapper::new(band_count, 1024, 44100, 20.0, 16000.0)
    }

    #[test]
    fn output_is_mirror_symmetric() {
        let mut mapper = default_mapper(200);
        let spectrum: Vec<f32> = (0..1024).map(|i| ((i * 37) % 101) as f32 / 100.0).collect();
        let bands = mapper.map(&spectrum);

        assert_eq!(bands.len(), 200);
        for i in 0..100 {
            assert_eq!(bands[i], bands[199 - i]);
        }
    }

    #[test]
    fn four_bands_resolve_expected_bin_ranges() {
        // bin width = 44100 / 2048 ≈ 21.53 Hz
        let mapper = default_mapper(4);
        // Mirror index 0 reads from 16 kHz up, clamped to the last bin
        assert_eq!(mapper.bin_range(0), Some(743..=1023));
        // Mirror index 1 reads 20 Hz .. sqrt(20 * 16000) Hz
        assert_eq!(mapper.bin_range(1), Some(0..=26));
    }

    #[test]
    fn low_frequency_spike_lands_in_the_centre_bars() {
        let mut mapper = default_mapper(4);
        let mut spectrum = vec![0.0; 1024];
        spectrum[10] = 27.0;

        let bands = mapper.map(&spectrum);
        assert_eq!(bands[0], 0.0);
        assert_eq!(bands[3], 0.0);
        assert!((bands[1] - 1.0).abs() < 1e-6);
        assert_eq!(bands[1], bands[2]);
    }

    #[test]
    fn high_frequency_spike_lands_in_the_edge_bars() {
        let mut mapper = default_mapper(4);
        let mut spectrum = vec![0.0; 1024];
        spectrum[900] = 281.0;

        let bands = mapper.map(&spectrum);
        assert!((bands[0] - 1.0).abs() < 1e-6);
        assert_eq!(bands[0], bands[3]);
        assert_eq!(bands[1], 0.0);
        assert_eq!(bands[2], 0.0);
    }

    #[test]
    fn zero_spectrum_maps_to_zero_bands() {
        let mut mapper = default_mapper(200);
        assert!(mapper.map(&vec![0.0; 1024]).iter().all(|&b| b == 0.0));
    }

    #[test]
    fn degenerate_ranges_stay_finite() {
        // Tiny spectrum: most sub-ranges collapse into the same or no bins
        let mut mapper = BandMapper::new(200, 4, 8000, 20.0, 16000.0);
        let bands = mapper.map(&[1.0, 2.0, 3.0, 4.0]);
        assert!(bands.iter().all(|b| b.is_finite() && *b >= 0.0));
        // Top of the span is above Nyquist, bottom collapses onto bin 0
        assert_eq!(bands[0], 0.0);
        assert_eq!(bands[99], 1.0);
        assert_eq!(bands[100], 1.0);

        // Range starting above the last bin yields an empty (zero) band
        let mut mapper = BandMapper::new(4, 4, 8000, 5000.0, 7000.0);
        assert_eq!(mapper.bin_range(0), None);
        assert_eq!(mapper.map(&[1.0, 1.0, 1.0, 1.0])[0], 0.0);
    }
}
