use anyhow::Result;
use clap::Parser;
use log::info;
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use spectrum_overlay::audio::wav_replay::read_wav;
use spectrum_overlay::audio::SpectrumPipeline;
use spectrum_overlay::config::VisualizerConfig;
use spectrum_overlay::ui::{BarHeights, BarLayout};

#[derive(Parser)]
#[command(name = "spectrum-dump")]
#[command(about = "Run a WAV file through the spectrum pipeline and write the bar levels as JSON")]
struct Args {
    /// WAV file to analyse
    input_file: PathBuf,

    /// Output JSON file path
    #[arg(long, short, default_value = "spectrum_dump.json")]
    output: PathBuf,

    /// JSON config file; fields not given keep their defaults
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Include every emitted level vector (large files)
    #[arg(long)]
    frame_by_frame: bool,

    /// Canvas width in pixels used to lay out the bars
    #[arg(long, default_value = "1600")]
    canvas_width: f32,

    /// Canvas height in pixels used to size the bars
    #[arg(long, default_value = "200")]
    canvas_height: f32,
}

#[derive(Debug, Serialize)]
struct BandSummary {
    peak: f32,
    mean: f32,
    x: f32,
    peak_height: f32,
}

#[derive(Debug, Serialize)]
struct CanvasSummary {
    width: f32,
    height: f32,
    bar_width: f32,
}

#[derive(Debug, Serialize)]
struct DumpResults {
    input_file: String,
    sample_rate: u32,
    channels: u16,
    config: VisualizerConfig,
    ticks: u64,
    frames_analyzed: u64,
    emitted: usize,
    canvas: CanvasSummary,
    bands: Vec<BandSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    levels: Option<Vec<Vec<f32>>>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => VisualizerConfig::load(path)?,
        None => VisualizerConfig::default(),
    };

    info!("Reading {}", args.input_file.display());
    let audio = read_wav(&args.input_file)?;
    let settings = config.validate(audio.sample_rate)?;
    let mut pipeline = SpectrumPipeline::new(&settings);
    let capture = pipeline.capture_buffer();

    // Deliver the file in tick-sized pieces, the way live capture would arrive
    let samples_per_tick = (settings.sample_rate() as u64
        * audio.channels as u64
        * config.tick_interval_ms
        / 1000)
        .max(1) as usize;
    info!(
        "{} samples at {} Hz x {} channels, {} samples per tick",
        audio.samples.len(),
        audio.sample_rate,
        audio.channels,
        samples_per_tick
    );

    let bar_count = settings.bar_count();
    let mut peaks = vec![0.0f32; bar_count];
    let mut sums = vec![0.0f64; bar_count];
    let mut emitted = 0usize;
    let mut all_levels = Vec::new();

    let layout = BarLayout::from_config(&config);
    let mut heights = BarHeights::new(layout);
    let mut peak_heights = vec![0.0f32; bar_count];

    let mut record = |levels: &[f32]| {
        for (i, &level) in levels.iter().enumerate() {
            peaks[i] = peaks[i].max(level);
            sums[i] += level as f64;
        }
        for (peak, animation) in peak_heights
            .iter_mut()
            .zip(heights.update(levels, args.canvas_height))
        {
            *peak = peak.max(animation.to);
        }
        emitted += 1;
        if args.frame_by_frame {
            all_levels.push(levels.to_vec());
        }
    };

    for chunk in audio.samples.chunks(samples_per_tick) {
        capture.write(bytemuck::cast_slice(chunk));
        if let Some(levels) = pipeline.tick() {
            record(levels);
        }
    }

    // Flush whatever full frames are still queued
    while let Some(levels) = pipeline.tick() {
        record(levels);
    }

    let stats = pipeline.stats();
    let bands = peaks
        .iter()
        .zip(&sums)
        .zip(&peak_heights)
        .enumerate()
        .map(|(i, ((&peak, &sum), &peak_height))| BandSummary {
            peak,
            mean: if emitted > 0 { (sum / emitted as f64) as f32 } else { 0.0 },
            x: layout.bar_x(i, args.canvas_width),
            peak_height,
        })
        .collect();

    let results = DumpResults {
        input_file: args.input_file.display().to_string(),
        sample_rate: audio.sample_rate,
        channels: audio.channels,
        config,
        ticks: stats.ticks,
        frames_analyzed: stats.frames_analyzed,
        emitted,
        canvas: CanvasSummary {
            width: args.canvas_width,
            height: args.canvas_height,
            bar_width: layout.bar_width(args.canvas_width),
        },
        bands,
        levels: args.frame_by_frame.then_some(all_levels),
    };

    let writer = BufWriter::new(File::create(&args.output)?);
    serde_json::to_writer_pretty(writer, &results)?;

    info!(
        "Wrote {} level vectors from {} frames to {}",
        results.emitted,
        results.frames_analyzed,
        args.output.display()
    );
    Ok(())
}
