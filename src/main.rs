use anyhow::Result;
use clap::Parser;
use crossbeam_channel::{Receiver, Sender};
use log::{error, info, warn};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;

use spectrum_overlay::audio::{CaptureBuffer, CaptureEvent, CaptureSource, SpectrumPipeline, WavReplay};
#[cfg(feature = "loopback")]
use spectrum_overlay::audio::LoopbackCapture;
use spectrum_overlay::config::VisualizerConfig;
use spectrum_overlay::ui::TerminalBars;

#[derive(Parser)]
#[command(name = "spectrum-overlay")]
#[command(about = "Live bar spectrum of the audio playing on this machine")]
struct Args {
    /// JSON config file; fields not given keep their defaults
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Replay a WAV file instead of capturing the output device
    #[arg(long)]
    wav: Option<PathBuf>,

    /// Number of bars (even, at least 4)
    #[arg(long)]
    bars: Option<usize>,

    /// Analysis frame length (power of two)
    #[arg(long)]
    fft_size: Option<usize>,

    /// Level multiplier applied before clamping
    #[arg(long)]
    sensitivity: Option<f32>,

    /// Weight of the newest frame in the smoothing filter
    #[arg(long)]
    smoothing: Option<f32>,

    /// Terminal columns used to draw the bars
    #[arg(long, default_value = "100")]
    columns: usize,
}

impl Args {
    fn load_config(&self) -> Result<VisualizerConfig> {
        let mut config = match &self.config {
            Some(path) => VisualizerConfig::load(path)?,
            None => VisualizerConfig::default(),
        };

        if let Some(bars) = self.bars {
            config.bar_count = bars;
        }
        if let Some(fft_size) = self.fft_size {
            config.fft_size = fft_size;
        }
        if let Some(sensitivity) = self.sensitivity {
            config.sensitivity = sensitivity;
        }
        if let Some(smoothing) = self.smoothing {
            config.smoothing_factor = smoothing;
        }
        Ok(config)
    }
}

fn open_source(
    args: &Args,
    buffer: Arc<CaptureBuffer>,
    events: Sender<CaptureEvent>,
) -> Result<Box<dyn CaptureSource>> {
    match &args.wav {
        Some(path) => Ok(Box::new(WavReplay::new(path, buffer, events)?)),
        None => open_loopback(buffer, events),
    }
}

#[cfg(feature = "loopback")]
fn open_loopback(
    buffer: Arc<CaptureBuffer>,
    events: Sender<CaptureEvent>,
) -> Result<Box<dyn CaptureSource>> {
    Ok(Box::new(LoopbackCapture::new(buffer, events)?))
}

#[cfg(not(feature = "loopback"))]
fn open_loopback(
    _buffer: Arc<CaptureBuffer>,
    _events: Sender<CaptureEvent>,
) -> Result<Box<dyn CaptureSource>> {
    Err(anyhow::anyhow!(
        "Built without loopback capture; pass --wav to replay a file"
    ))
}

fn drain_events(events: &Receiver<CaptureEvent>, pipeline: &mut SpectrumPipeline) {
    while let Ok(event) = events.try_recv() {
        match event {
            CaptureEvent::Stopped(reason) => warn!("Capture stopped: {}", reason),
            CaptureEvent::Finished => info!("Capture source finished"),
        }
        pipeline.mark_capture_stopped();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    info!("Starting spectrum overlay");

    let config = args.load_config()?;

    // Refuse to start on a bad config before touching any device
    config.validate(config.sample_rate.unwrap_or(44100))?;

    let capture = Arc::new(CaptureBuffer::new(config.capture_buffer_capacity_bytes));
    let (event_tx, event_rx) = crossbeam_channel::bounded(16);
    let mut source = open_source(&args, Arc::clone(&capture), event_tx)?;
    info!(
        "Capturing from {} ({} Hz, {} channels)",
        source.name(),
        source.sample_rate(),
        source.channels()
    );

    let settings = config.validate(source.sample_rate())?;
    let mut pipeline = SpectrumPipeline::with_capture_buffer(&settings, capture);
    let mut bars = TerminalBars::new(args.columns);

    let mut interval = tokio::time::interval(Duration::from_millis(config.tick_interval_ms));
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    info!(
        "Visualizer running: {} bars, {}-point FFT, tick every {} ms",
        settings.bar_count(),
        settings.fft_size(),
        config.tick_interval_ms
    );

    loop {
        tokio::select! {
            _ = interval.tick() => {
                drain_events(&event_rx, &mut pipeline);
                if let Some(levels) = pipeline.tick() {
                    if let Err(e) = bars.draw(levels) {
                        error!("Render error: {}", e);
                    }
                }
            }
            result = &mut ctrl_c => {
                if let Err(e) = result {
                    error!("Failed to listen for ctrl-c: {}", e);
                }
                info!("Shutdown requested");
                break;
            }
        }
    }

    source.stop();
    let stats = pipeline.stats();
    info!(
        "Stopped after {} ticks, {} frames analysed, {} capture bytes dropped",
        stats.ticks, stats.frames_analyzed, stats.capture_bytes_dropped
    );

    Ok(())
}
