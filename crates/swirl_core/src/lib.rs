//! # SWIRL Core
//!
//! Math, timing and randomness shared by the particle crates.
//!
//! ## CRITICAL RULE
//!
//! This crate must NEVER depend on:
//! - a windowing or rendering backend
//! - an entity store
//!
//! Everything in here is a plain value driven by the caller's `dt`.

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod cooldown;
pub mod easing;
pub mod error;
pub mod interp;
pub mod math;
pub mod random;

pub use cooldown::{Cooldown, Countdown};
pub use easing::{Ease, Easing};
pub use error::{CoreError, CoreResult};
pub use interp::{inverse_lerp, lerp, lerp_vec, remap};
pub use math::{Rect, Vec2};
pub use random::{EntropyRandom, FixedRandom, FnRandom, RandomSource, SeededRandom, SequenceRandom};
