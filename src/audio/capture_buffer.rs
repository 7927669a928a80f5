use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::config::BYTES_PER_SAMPLE;

/// Bounded FIFO byte queue between the capture callback and the tick.
///
/// Writes never block on space: when a write would overflow, the oldest
/// unread bytes are discarded (in whole samples, so the reader stays aligned).
/// The lock is only held for the memcpy on either side.
pub struct CaptureBuffer {
    inner: Mutex<Ring>,
    capacity: usize,
}

struct Ring {
    data: Box<[u8]>,
    head: usize,
    len: usize,
    dropped: u64,
}

impl Ring {
    fn discard(&mut self, count: usize) {
        let count = count.min(self.len);
        self.head = (self.head + count) % self.data.len();
        self.len -= count;
        self.dropped += count as u64;
    }

    fn push(&mut self, bytes: &[u8]) {
        let capacity = self.data.len();
        debug_assert!(self.len + bytes.len() <= capacity);

        let tail = (self.head + self.len) % capacity;
        let first = bytes.len().min(capacity - tail);
        self.data[tail..tail + first].copy_from_slice(&bytes[..first]);
        self.data[..bytes.len() - first].copy_from_slice(&bytes[first..]);
        self.len += bytes.len();
    }

    fn pop_into(&mut self, out: &mut Vec<u8>, count: usize) {
        let capacity = self.data.len();
        let first = count.min(capacity - self.head);
        out.extend_from_slice(&self.data[self.head..self.head + first]);
        out.extend_from_slice(&self.data[..count - first]);
        self.head = (self.head + count) % capacity;
        self.len -= count;
    }
}

fn round_up_to_sample(bytes: usize) -> usize {
    bytes.div_ceil(BYTES_PER_SAMPLE) * BYTES_PER_SAMPLE
}

impl CaptureBuffer {
    /// `capacity` must be a non-zero multiple of the sample size.
    pub fn new(capacity: usize) -> Self {
        assert!(
            capacity > 0 && capacity % BYTES_PER_SAMPLE == 0,
            "CaptureBuffer capacity must be a non-zero multiple of {} bytes, got {}",
            BYTES_PER_SAMPLE,
            capacity
        );

        Self {
            inner: Mutex::new(Ring {
                data: vec![0u8; capacity].into_boxed_slice(),
                head: 0,
                len: 0,
                dropped: 0,
            }),
            capacity,
        }
    }

    // Contents are plain bytes, so a panic elsewhere cannot leave them inconsistent
    fn lock(&self) -> MutexGuard<'_, Ring> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append captured bytes, discarding the oldest data on overflow.
    pub fn write(&self, bytes: &[u8]) {
        if bytes.is_empty() {
            return;
        }

        let mut ring = self.lock();

        // A single write larger than the buffer: keep only its most recent part
        let bytes = if bytes.len() > self.capacity {
            let skip = round_up_to_sample(bytes.len() - self.capacity);
            let held = ring.len;
            ring.discard(held);
            ring.dropped += skip as u64;
            &bytes[skip..]
        } else {
            bytes
        };

        let overflow = (ring.len + bytes.len()).saturating_sub(self.capacity);
        if overflow > 0 {
            ring.discard(round_up_to_sample(overflow));
        }

        ring.push(bytes);
    }

    /// Remove and return up to `max_bytes` of the oldest buffered data.
    pub fn read(&self, max_bytes: usize) -> Vec<u8> {
        let mut out = Vec::new();
        self.read_into(&mut out, max_bytes);
        out
    }

    /// Like [`read`](Self::read), but appends into a caller-owned buffer.
    /// Returns the number of bytes appended.
    pub fn read_into(&self, out: &mut Vec<u8>, max_bytes: usize) -> usize {
        let mut ring = self.lock();
        let count = max_bytes.min(ring.len);
        if count > 0 {
            ring.pop_into(out, count);
        }
        count
    }

    pub fn available_bytes(&self) -> usize {
        self.lock().len
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Total bytes discarded by overflow since creation.
    pub fn dropped_bytes(&self) -> u64 {
        self.lock().dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn reads_in_fifo_order() {
        let buffer = CaptureBuffer::new(16);
        buffer.write(&[1, 2, 3, 4]);
        buffer.write(&[5, 6, 7, 8]);

        assert_eq!(buffer.available_bytes(), 8);
        assert_eq!(buffer.read(3), vec![1, 2, 3]);
        assert_eq!(buffer.read(100), vec![4, 5, 6, 7, 8]);
        assert_eq!(buffer.available_bytes(), 0);
    }

    #[test]
    fn read_from_empty_returns_nothing() {
        let buffer = CaptureBuffer::new(8);
        assert!(buffer.read(4).is_empty());

        let mut out = vec![9];
        assert_eq!(buffer.read_into(&mut out, 4), 0);
        assert_eq!(out, vec![9]);
    }

    #[test]
    fn wraps_around_the_end() {
        let buffer = CaptureBuffer::new(8);
        buffer.write(&[1, 2, 3, 4, 5, 6]);
        assert_eq!(buffer.read(4), vec![1, 2, 3, 4]);
        buffer.write(&[7, 8, 9, 10, 11, 12]);

        assert_eq!(buffer.available_bytes(), 8);
        assert_eq!(buffer.read(8), vec![5, 6, 7, 8, 9, 10, 11, 12]);
        assert_eq!(buffer.dropped_bytes(), 0);
    }

    #[test]
    fn overflow_discards_oldest_whole_samples() {
        let buffer = CaptureBuffer::new(8);
        buffer.write(&[1, 2, 3, 4, 5, 6, 7, 8]);
        buffer.write(&[9, 10]);

        // Two bytes over capacity: one whole sample is dropped
        assert_eq!(buffer.dropped_bytes(), 4);
        assert_eq!(buffer.read(16), vec![5, 6, 7, 8, 9, 10]);
    }

    #[test]
    fn oversized_write_keeps_most_recent_bytes() {
        let buffer = CaptureBuffer::new(8);
        buffer.write(&[0, 0, 0, 0]);
        let bytes: Vec<u8> = (1..=12).collect();
        buffer.write(&bytes);

        assert_eq!(buffer.read(16), (5..=12).collect::<Vec<u8>>());
        assert_eq!(buffer.dropped_bytes(), 8);
    }

    #[test]
    #[should_panic(expected = "multiple of 4 bytes")]
    fn rejects_capacity_smaller_than_a_sample() {
        CaptureBuffer::new(1);
    }

    #[test]
    #[should_panic(expected = "multiple of 4 bytes")]
    fn rejects_unaligned_capacity() {
        CaptureBuffer::new(10);
    }

    #[test]
    fn single_sample_capacity_keeps_latest_sample() {
        let buffer = CaptureBuffer::new(4);
        buffer.write(&[1, 2, 3, 4]);
        buffer.write(&[5, 6, 7, 8]);
        assert_eq!(buffer.dropped_bytes(), 4);

        buffer.write(&[9, 10]);
        assert_eq!(buffer.read(8), vec![9, 10]);
        assert_eq!(buffer.dropped_bytes(), 8);
    }

    #[test]
    fn concurrent_writer_never_exceeds_capacity() {
        let buffer = Arc::new(CaptureBuffer::new(64));
        let writer = {
            let buffer = Arc::clone(&buffer);
            thread::spawn(move || {
                for i in 0..1000u32 {
                    buffer.write(&i.to_ne_bytes());
                }
            })
        };

        let mut received = 0usize;
        for _ in 0..200 {
            let chunk = buffer.read(12);
            assert!(chunk.len() <= 12);
            received += chunk.len();
            assert!(buffer.available_bytes() <= buffer.capacity());
        }
        writer.join().unwrap();
        received += buffer.read(usize::MAX).len();

        assert_eq!(received as u64 + buffer.dropped_bytes(), 4000);
    }
}
