//! # SWIRL Demo Runner
//!
//! Headless scenes for exercising the particle layer: a frame driver that
//! keeps the emitter-before-lifecycle order, and a handful of built-in
//! effects. The `swirl` binary wraps both in a CLI.

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod demos;
pub mod scene;

pub use demos::Demo;
pub use scene::{FrameReport, Launcher, Motion, Particle, Scene, Source, SourceId, WaveBuilder};
