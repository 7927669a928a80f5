use anyhow::Result;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleFormat, Stream, StreamConfig};
use crossbeam_channel::Sender;
use log::{info, warn};
use std::sync::Arc;

use super::{CaptureBuffer, CaptureEvent, CaptureSource};

/// Captures whatever is playing on the default output device.
///
/// An input stream is opened on the output device (WASAPI loopback). The
/// data callback only copies bytes into the capture buffer.
pub struct LoopbackCapture {
    stream: Option<Stream>,
    name: String,
    sample_rate: u32,
    channels: u16,
}

impl LoopbackCapture {
    pub fn new(buffer: Arc<CaptureBuffer>, events: Sender<CaptureEvent>) -> Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| anyhow::anyhow!("No output device available for loopback"))?;

        let config = device
            .default_output_config()
            .map_err(|e| anyhow::anyhow!("Failed to get default output config: {}", e))?;

        let name = device.name().unwrap_or_else(|_| "Unknown".to_string());
        info!("Using loopback device: {}", name);
        info!("Audio config: {:?}", config);

        if config.sample_format() != SampleFormat::F32 {
            return Err(anyhow::anyhow!(
                "Unsupported loopback sample format {:?}, expected 32-bit float",
                config.sample_format()
            ));
        }

        let sample_rate = config.sample_rate().0;
        let channels = config.channels();

        let stream = Self::create_input_stream(&device, &config.into(), buffer, events)?;
        stream.play()?;

        Ok(Self {
            stream: Some(stream),
            name,
            sample_rate,
            channels,
        })
    }

    fn create_input_stream(
        device: &Device,
        config: &StreamConfig,
        buffer: Arc<CaptureBuffer>,
        events: Sender<CaptureEvent>,
    ) -> Result<Stream> {
        info!(
            "Creating loopback stream with {} channels at {} Hz",
            config.channels, config.sample_rate.0
        );

        let stream = device.build_input_stream(
            config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                buffer.write(bytemuck::cast_slice(data));
            },
            move |err| {
                warn!("Audio stream error: {}", err);
                if events.try_send(CaptureEvent::Stopped(err.to_string())).is_err() {
                    warn!("Failed to report capture stop");
                }
            },
            None,
        )?;

        Ok(stream)
    }
}

impl CaptureSource for LoopbackCapture {
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
        if let Some(stream) = self.stream.take() {
            if let Err(e) = stream.pause() {
                warn!("Failed to pause loopback stream: {}", e);
            }
            info!("Loopback capture stopped");
        }
    }
}

impl Drop for LoopbackCapture {
    fn drop(&mut self) {
        self.stop();
    }
}
