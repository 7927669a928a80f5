use super::CaptureBuffer;
use crate::config::BYTES_PER_SAMPLE;

/// Decode native-endian 32-bit float samples. A trailing partial sample is skipped.
pub fn decode_samples(bytes: &[u8], out: &mut Vec<f32>) {
    out.extend(
        bytes
            .chunks_exact(BYTES_PER_SAMPLE)
            .map(|chunk| f32::from_ne_bytes([chunk[0], chunk[1], chunk[2], chunk[3]])),
    );
}

/// Assembles fixed-length analysis frames from the capture stream.
///
/// The partially filled frame and its fill offset survive across ticks.
/// Only the bytes needed to complete the current frame are taken from the
/// capture buffer; anything beyond that stays queued there for the next tick.
pub struct FrameAccumulator {
    frame: Vec<f32>,
    fill: usize,
    byte_scratch: Vec<u8>,
    sample_scratch: Vec<f32>,
}

impl FrameAccumulator {
    pub fn new(frame_len: usize) -> Self {
        Self {
            frame: vec![0.0; frame_len],
            fill: 0,
            byte_scratch: Vec::with_capacity(frame_len * BYTES_PER_SAMPLE),
            sample_scratch: Vec::with_capacity(frame_len),
        }
    }

    /// Current fill offset of the frame under construction.
    pub fn fill(&self) -> usize {
        self.fill
    }

    /// Pull samples from `source` into the current frame.
    ///
    /// Returns the completed frame once exactly `frame_len` samples have been
    /// gathered; the fill offset is reset so the next call starts a new frame.
    pub fn pull(&mut self, source: &CaptureBuffer) -> Option<&[f32]> {
        let needed = self.frame.len() - self.fill;
        let whole_samples = source.available_bytes() / BYTES_PER_SAMPLE;
        let take = needed.min(whole_samples);

        if take > 0 {
            self.byte_scratch.clear();
            source.read_into(&mut self.byte_scratch, take * BYTES_PER_SAMPLE);

            self.sample_scratch.clear();
            decode_samples(&self.byte_scratch, &mut self.sample_scratch);
            self.push_samples_from_scratch();
        }

        self.take_full_frame()
    }

    /// Push already decoded samples; returns how many were consumed.
    /// Samples past the end of the current frame are left for the caller.
    pub fn push_samples(&mut self, samples: &[f32]) -> usize {
        let take = samples.len().min(self.frame.len() - self.fill);
        self.frame[self.fill..self.fill + take].copy_from_slice(&samples[..take]);
        self.fill += take;
        take
    }

    /// Hand out the frame if it is full, resetting the fill offset.
    pub fn take_full_frame(&mut self) -> Option<&[f32]> {
        if self.fill == self.frame.len() {
            self.fill = 0;
            Some(&self.frame)
        } else {
            None
        }
    }

    fn push_samples_from_scratch(&mut self) {
        let samples = std::mem::take(&mut self.sample_scratch);
        self.push_samples(&samples);
        self.sample_scratch = samples;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_samples(buffer: &CaptureBuffer, samples: &[f32]) {
        for s in samples {
            buffer.write(&s.to_ne_bytes());
        }
    }

    #[test]
    fn decode_skips_trailing_partial_sample() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&1.5f32.to_ne_bytes());
        bytes.extend_from_slice(&(-0.25f32).to_ne_bytes());
        bytes.extend_from_slice(&[0xAB, 0xCD]);

        let mut out = Vec::new();
        decode_samples(&bytes, &mut out);
        assert_eq!(out, vec![1.5, -0.25]);
    }

    #[test]
    fn partial_frame_persists_across_pulls() {
        let buffer = CaptureBuffer::new(1024);
        let mut acc = FrameAccumulator::new(4);

        write_samples(&buffer, &[1.0, 2.0, 3.0]);
        assert!(acc.pull(&buffer).is_none());
        assert_eq!(acc.fill(), 3);

        write_samples(&buffer, &[4.0]);
        let frame = acc.pull(&buffer).unwrap().to_vec();
        assert_eq!(frame, vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(acc.fill(), 0);
    }

    #[test]
    fn excess_samples_are_deferred_not_dropped() {
        let buffer = CaptureBuffer::new(1024);
        let mut acc = FrameAccumulator::new(4);

        write_samples(&buffer, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(acc.pull(&buffer).unwrap(), &[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(buffer.available_bytes(), 8);

        write_samples(&buffer, &[7.0, 8.0]);
        assert_eq!(acc.pull(&buffer).unwrap(), &[5.0, 6.0, 7.0, 8.0]);
    }

    #[test]
    fn incomplete_sample_bytes_wait_in_buffer() {
        let buffer = CaptureBuffer::new(1024);
        let mut acc = FrameAccumulator::new(2);

        let bytes = 9.0f32.to_ne_bytes();
        buffer.write(&bytes[..2]);
        assert!(acc.pull(&buffer).is_none());
        assert_eq!(acc.fill(), 0);
        assert_eq!(buffer.available_bytes(), 2);

        buffer.write(&bytes[2..]);
        write_samples(&buffer, &[10.0]);
        assert_eq!(acc.pull(&buffer).unwrap(), &[9.0, 10.0]);
    }

    #[test]
    fn exact_multiple_of_frame_leaves_no_residue() {
        let frame_len = 8;
        let frames = 5;
        let buffer = CaptureBuffer::new(4096);
        let mut acc = FrameAccumulator::new(frame_len);

        let samples: Vec<f32> = (0..frame_len * frames).map(|i| i as f32).collect();
        write_samples(&buffer, &samples);

        let mut emitted = 0;
        for _ in 0..frames + 2 {
            if acc.pull(&buffer).is_some() {
                emitted += 1;
            }
        }
        assert_eq!(emitted, frames);
        assert_eq!(acc.fill(), 0);
        assert_eq!(buffer.available_bytes(), 0);
    }

    #[test]
    fn push_samples_stops_at_frame_end() {
        let mut acc = FrameAccumulator::new(3);
        assert_eq!(acc.push_samples(&[1.0, 2.0]), 2);
        assert_eq!(acc.push_samples(&[3.0, 4.0, 5.0]), 1);
        assert_eq!(acc.take_full_frame().unwrap(), &[1.0, 2.0, 3.0]);
        assert!(acc.take_full_frame().is_none());
    }
}
