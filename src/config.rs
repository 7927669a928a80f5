use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Bytes in one captured sample (32-bit IEEE float).
pub const BYTES_PER_SAMPLE: usize = 4;

/// Configuration invariant violations. The pipeline refuses to start on any of these.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("fft_size must be a power of two >= 2, got {0}")]
    FftSizeNotPowerOfTwo(usize),

    #[error("bar_count must be even and at least 4, got {0}")]
    InvalidBarCount(usize),

    #[error("freq_min ({min}) must be positive and below freq_max ({max})")]
    InvalidFrequencyRange { min: f32, max: f32 },

    #[error("sample rate must be positive, got {0}")]
    InvalidSampleRate(u32),

    #[error("smoothing_factor must lie in (0, 1], got {0}")]
    InvalidSmoothingFactor(f32),

    #[error("sensitivity must be a positive finite number, got {0}")]
    InvalidSensitivity(f32),

    #[error("capture buffer capacity must be a non-zero multiple of 4 bytes, got {0}")]
    InvalidCaptureCapacity(usize),

    #[error("tick interval must be at least 1 ms")]
    InvalidTickInterval,
}

/// Static visualizer configuration, set once at startup.
///
/// Every field has a default, so a JSON file only needs to name the values it changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualizerConfig {
    pub bar_count: usize,
    pub fft_size: usize,
    pub smoothing_factor: f32,
    pub sensitivity: f32,
    pub freq_min: f32,
    pub freq_max: f32,
    /// Overrides the rate reported by the capture device.
    pub sample_rate: Option<u32>,
    pub capture_buffer_capacity_bytes: usize,
    pub tick_interval_ms: u64,

    // Bar geometry, consumed by the presentation layer only
    pub bar_spacing: f32,
    pub min_bar_width: f32,
    pub min_bar_height: f32,
    pub height_margin: f32,
}

impl Default for VisualizerConfig {
    fn default() -> Self {
        Self {
            bar_count: 200,
            fft_size: 2048,
            smoothing_factor: 0.3,
            sensitivity: 10.0,
            freq_min: 20.0,
            freq_max: 16000.0,
            sample_rate: None,
            capture_buffer_capacity_bytes: 1024 * 1024,
            tick_interval_ms: 16,

            bar_spacing: 6.0,
            min_bar_width: 6.0,
            min_bar_height: 10.0,
            height_margin: 20.0,
        }
    }
}

/// Checked pipeline parameters. Only obtainable through [`VisualizerConfig::validate`].
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineSettings {
    bar_count: usize,
    fft_size: usize,
    smoothing_factor: f32,
    sensitivity: f32,
    freq_min: f32,
    freq_max: f32,
    sample_rate: u32,
    capture_capacity: usize,
}

impl PipelineSettings {
    pub fn bar_count(&self) -> usize {
        self.bar_count
    }

    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    pub fn smoothing_factor(&self) -> f32 {
        self.smoothing_factor
    }

    pub fn sensitivity(&self) -> f32 {
        self.sensitivity
    }

    pub fn freq_min(&self) -> f32 {
        self.freq_min
    }

    pub fn freq_max(&self) -> f32 {
        self.freq_max
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn capture_capacity(&self) -> usize {
        self.capture_capacity
    }
}

impl VisualizerConfig {
    /// Load a config from a JSON file. Missing fields fall back to defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(&path).map_err(|e| {
            anyhow::anyhow!("Failed to read config {}: {}", path.as_ref().display(), e)
        })?;
        let config = serde_json::from_str(&text)?;
        Ok(config)
    }

    /// Check every invariant against the sample rate the capture source reports.
    /// `sample_rate` in the config, when set, wins over `device_sample_rate`.
    pub fn validate(&self, device_sample_rate: u32) -> Result<PipelineSettings, ConfigError> {
        if self.fft_size < 2 || !self.fft_size.is_power_of_two() {
            return Err(ConfigError::FftSizeNotPowerOfTwo(self.fft_size));
        }
        if self.bar_count < 4 || self.bar_count % 2 != 0 {
            return Err(ConfigError::InvalidBarCount(self.bar_count));
        }
        // Negated comparisons so NaN is rejected too
        if !(self.freq_min > 0.0 && self.freq_min < self.freq_max && self.freq_max.is_finite()) {
            return Err(ConfigError::InvalidFrequencyRange {
                min: self.freq_min,
                max: self.freq_max,
            });
        }
        let sample_rate = self.sample_rate.unwrap_or(device_sample_rate);
        if sample_rate == 0 {
            return Err(ConfigError::InvalidSampleRate(sample_rate));
        }
        if !(self.smoothing_factor > 0.0 && self.smoothing_factor <= 1.0) {
            return Err(ConfigError::InvalidSmoothingFactor(self.smoothing_factor));
        }
        if !(self.sensitivity > 0.0 && self.sensitivity.is_finite()) {
            return Err(ConfigError::InvalidSensitivity(self.sensitivity));
        }
        let capacity = self.capture_buffer_capacity_bytes;
        if capacity == 0 || capacity % BYTES_PER_SAMPLE != 0 {
            return Err(ConfigError::InvalidCaptureCapacity(capacity));
        }
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::InvalidTickInterval);
        }

        Ok(PipelineSettings {
            bar_count: self.bar_count,
            fft_size: self.fft_size,
            smoothing_factor: self.smoothing_factor,
            sensitivity: self.sensitivity,
            freq_min: self.freq_min,
            freq_max: self.freq_max,
            sample_rate,
            capture_capacity: capacity,
        })
    }
}
