/// Notifications from a capture producer to the tick driver.
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureEvent {
    /// The device or stream failed; no more audio will arrive.
    Stopped(String),
    /// A finite source reached its end.
    Finished,
}

/// A producer of raw 32-bit float audio bytes.
///
/// Implementations write into a shared [`CaptureBuffer`](super::CaptureBuffer)
/// from their own context and report problems over a `CaptureEvent` channel.
/// They never run DSP work themselves.
pub trait CaptureSource {
    /// Sample rate of the delivered stream in Hz.
    fn sample_rate(&self) -> u32;

    /// Interleaved channel count of the delivered stream.
    fn channels(&self) -> u16;

    /// Human readable source name for logs.
    fn name(&self) -> &str;

    /// Stop producing. Safe to call more than once.
    fn stop(&mut self);
}
