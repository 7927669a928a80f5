//! Real-time audio-to-spectrum pipeline for a bar-style overlay.
//!
//! Captured bytes flow through [`audio::CaptureBuffer`] into
//! [`audio::SpectrumPipeline`], which turns them into per-bar levels between
//! 0 and 1 once per display tick. [`ui`] holds the geometry that maps those
//! levels onto pixels.

pub mod audio;
pub mod config;
pub mod ui;
