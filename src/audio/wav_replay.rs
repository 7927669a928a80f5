use anyhow::Result;
use crossbeam_channel::Sender;
use log::{info, warn};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use super::{CaptureBuffer, CaptureEvent, CaptureSource};

/// Decoded WAV contents as one interleaved 32-bit float stream.
#[derive(Debug, Clone)]
pub struct WavAudio {
    pub sample_rate: u32,
    pub channels: u16,
    pub samples: Vec<f32>,
}

/// Read a WAV file into interleaved f32 samples. Integer PCM is scaled to [-1, 1].
pub fn read_wav<P: AsRef<Path>>(path: P) -> Result<WavAudio> {
    let mut reader = hound::WavReader::open(&path)
        .map_err(|e| anyhow::anyhow!("Failed to open {}: {}", path.as_ref().display(), e))?;
    let spec = reader.spec();

    let samples = match spec.sample_format {
        hound::SampleFormat::Float => reader.samples::<f32>().collect::<Result<Vec<_>, _>>()?,
        hound::SampleFormat::Int => {
            let scale = 1.0 / (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 * scale))
                .collect::<Result<Vec<_>, _>>()?
        }
    };

    Ok(WavAudio {
        sample_rate: spec.sample_rate,
        channels: spec.channels,
        samples,
    })
}

/// Replays a WAV file into the capture buffer at real-time pace.
///
/// Stands in for loopback capture when a deterministic source is wanted.
pub struct WavReplay {
    name: String,
    sample_rate: u32,
    channels: u16,
    stop_flag: Arc<AtomicBool>,
    thread_handle: Option<JoinHandle<()>>,
}

const CHUNK_MILLIS: u64 = 10;

impl WavReplay {
    pub fn new<P: AsRef<Path>>(
        path: P,
        buffer: Arc<CaptureBuffer>,
        events: Sender<CaptureEvent>,
    ) -> Result<Self> {
        let audio = read_wav(&path)?;
        let name = path.as_ref().display().to_string();
        info!(
            "Replaying {} ({} Hz, {} channels, {} samples)",
            name,
            audio.sample_rate,
            audio.channels,
            audio.samples.len()
        );

        let sample_rate = audio.sample_rate;
        let channels = audio.channels;
        let stop_flag = Arc::new(AtomicBool::new(false));
        let thread_stop = Arc::clone(&stop_flag);

        let thread_handle = thread::Builder::new()
            .name("wav-replay".to_string())
            .spawn(move || run_replay(audio, buffer, events, thread_stop))
            .map_err(|e| anyhow::anyhow!("Failed to spawn replay thread: {}", e))?;

        Ok(Self {
            name,
            sample_rate,
            channels,
            stop_flag,
            thread_handle: Some(thread_handle),
        })
    }
}

fn run_replay(
    audio: WavAudio,
    buffer: Arc<CaptureBuffer>,
    events: Sender<CaptureEvent>,
    stop: Arc<AtomicBool>,
) {
    let samples_per_chunk =
        (audio.sample_rate as u64 * audio.channels as u64 * CHUNK_MILLIS / 1000).max(1) as usize;
    let chunk_interval = Duration::from_millis(CHUNK_MILLIS);
    let mut next_deadline = Instant::now();

    for chunk in audio.samples.chunks(samples_per_chunk) {
        if stop.load(Ordering::Relaxed) {
            return;
        }
        buffer.write(bytemuck::cast_slice(chunk));

        // Pace against absolute deadlines so sleep jitter does not accumulate
        next_deadline += chunk_interval;
        if let Some(wait) = next_deadline.checked_duration_since(Instant::now()) {
            thread::sleep(wait);
        }
    }

    if events.send(CaptureEvent::Finished).is_err() {
        warn!("Replay finished but nobody is listening");
    }
}

impl CaptureSource for WavReplay {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn channels(&self) -> u16 {
        self.channels
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn stop(&mut self) {
        self.stop_flag.store(true, Ordering::Relaxed);
        if let Some(handle) = self.thread_handle.take() {
            if handle.join().is_err() {
                warn!("Replay thread panicked");
            }
            info!("Replay of {} stopped", self.name);
        }
    }
}

impl Drop for WavReplay {
    fn drop(&mut self) {
        self.stop();
    }
}
