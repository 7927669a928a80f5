use std::sync::Arc;

use log::debug;

use super::{BandMapper, CaptureBuffer, FrameAccumulator, GainStage, SpectralTransform, TemporalSmoother};
use crate::config::PipelineSettings;

/// Counters exposed for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PipelineStats {
    pub ticks: u64,
    pub frames_analyzed: u64,
    pub capture_bytes_dropped: u64,
}

/// The capture-to-bar-height chain, driven once per display tick.
///
/// Owns every stage and its state. The capture buffer is the only part
/// shared with another thread.
pub struct SpectrumPipeline {
    capture: Arc<CaptureBuffer>,
    accumulator: FrameAccumulator,
    transform: SpectralTransform,
    mapper: BandMapper,
    smoother: TemporalSmoother,
    gain: GainStage,
    silence: Vec<f32>,
    capture_stopped: bool,
    stats: PipelineStats,
}

impl SpectrumPipeline {
    /// Build a pipeline with a fresh capture buffer sized from `settings`.
    pub fn new(settings: &PipelineSettings) -> Self {
        let capture = Arc::new(CaptureBuffer::new(settings.capture_capacity()));
        Self::with_capture_buffer(settings, capture)
    }

    pub fn with_capture_buffer(settings: &PipelineSettings, capture: Arc<CaptureBuffer>) -> Self {
        let fft_size = settings.fft_size();
        let bar_count = settings.bar_count();
        let transform = SpectralTransform::new(fft_size);
        let mapper = BandMapper::new(
            bar_count,
            transform.spectrum_len(),
            settings.sample_rate(),
            settings.freq_min(),
            settings.freq_max(),
        );

        Self {
            capture,
            accumulator: FrameAccumulator::new(fft_size),
            transform,
            mapper,
            smoother: TemporalSmoother::new(bar_count, settings.smoothing_factor()),
            gain: GainStage::new(bar_count, settings.sensitivity()),
            silence: vec![0.0; bar_count],
            capture_stopped: false,
            stats: PipelineStats::default(),
        }
    }

    /// Handle for the capture producer to write into.
    pub fn capture_buffer(&self) -> Arc<CaptureBuffer> {
        Arc::clone(&self.capture)
    }

    /// From now on, ticks without a full frame decay the bars toward zero.
    pub fn mark_capture_stopped(&mut self) {
        self.capture_stopped = true;
    }

    pub fn stats(&self) -> PipelineStats {
        PipelineStats {
            capture_bytes_dropped: self.capture.dropped_bytes(),
            ..self.stats
        }
    }

    /// Run one tick.
    ///
    /// Every complete frame queued in the capture buffer is analysed and fed
    /// through the smoother, so the backlog never outgrows one frame. Returns
    /// the levels after the last of them (each in [0, 1]), or the decaying
    /// levels once capture has stopped. Returns `None` when no frame completed;
    /// the partial frame is kept for the next tick.
    pub fn tick(&mut self) -> Option<&[f32]> {
        self.stats.ticks += 1;
        if self.stats.ticks % 120 == 0 {
            debug!(
                "pipeline: {} ticks, {} frames analysed, {} capture bytes dropped",
                self.stats.ticks,
                self.stats.frames_analyzed,
                self.capture.dropped_bytes()
            );
        }

        let mut analysed = 0;
        while let Some(frame) = self.accumulator.pull(&self.capture) {
            let spectrum = self.transform.process(frame);
            let bands = self.mapper.map(spectrum);
            self.smoother.smooth(bands);
            analysed += 1;
        }
        self.stats.frames_analyzed += analysed;

        if analysed == 0 {
            if !self.capture_stopped {
                return None;
            }
            self.smoother.smooth(&self.silence);
        }

        Some(self.gain.apply(self.smoother.state()))
    }
}
