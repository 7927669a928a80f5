pub mod accumulator;
pub mod band_mapper;
pub mod capture;
pub mod capture_buffer;
pub mod fft;
pub mod gain;
#[cfg(feature = "loopback")]
pub mod loopback;
pub mod pipeline;
pub mod smoothing;
pub mod wav_replay;

pub use accumulator::FrameAccumulator;
pub use band_mapper::BandMapper;
pub use capture::{CaptureEvent, CaptureSource};
pub use capture_buffer::CaptureBuffer;
pub use fft::SpectralTransform;
pub use gain::GainStage;
#[cfg(feature = "loopback")]
pub use loopback::LoopbackCapture;
pub use pipeline::{PipelineStats, SpectrumPipeline};
pub use smoothing::TemporalSmoother;
pub use wav_replay::WavReplay;
