//! dt-driven countdown timers.
//!
//! A countdown is **hot** while time remains and **cold** once it has run
//! out. Nothing here reads a wall clock: time only moves when the owner
//! calls [`Cooldown::advance`], which keeps simulations reproducible.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// The view of a countdown that emitters and particle lifecycles consume.
///
/// Lifetimes usually belong to an external entity store; anything exposing
/// these operations can drive a particle.
pub trait Countdown {
    /// True while time remains.
    fn is_hot(&self) -> bool;

    /// True once the countdown has expired.
    fn is_cold(&self) -> bool {
        !self.is_hot()
    }

    /// Elapsed fraction of the duration, clamped to `[0, 1]`.
    fn normalized(&self) -> f32;

    /// Re-arms the countdown with its configured duration.
    fn reset(&mut self);
}

/// A resettable countdown over a fixed duration (seconds).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cooldown {
    duration: f32,
    remaining: f32,
}

impl Cooldown {
    /// Creates a hot countdown with the full `duration` remaining.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidDuration`] for negative or non-finite durations.
    pub fn new(duration: f32) -> CoreResult<Self> {
        if !duration.is_finite() || duration < 0.0 {
            return Err(CoreError::InvalidDuration(duration));
        }
        Ok(Self {
            duration,
            remaining: duration,
        })
    }

    /// Creates a countdown that starts out already expired.
    ///
    /// # Errors
    ///
    /// Same as [`Cooldown::new`].
    pub fn new_cold(duration: f32) -> CoreResult<Self> {
        let mut cooldown = Self::new(duration)?;
        cooldown.remaining = 0.0;
        Ok(cooldown)
    }

    /// Counts down by `dt` seconds. Never goes below zero.
    #[inline]
    pub fn advance(&mut self, dt: f32) {
        self.remaining = (self.remaining - dt).max(0.0);
    }

    /// Configured duration.
    #[inline]
    #[must_use]
    pub const fn duration(&self) -> f32 {
        self.duration
    }

    /// Time left before the countdown goes cold.
    #[inline]
    #[must_use]
    pub const fn remaining(&self) -> f32 {
        self.remaining
    }

    /// Time spent since the last reset.
    #[inline]
    #[must_use]
    pub fn elapsed(&self) -> f32 {
        self.duration - self.remaining
    }

    /// Re-arms with a new duration.
    ///
    /// # Errors
    ///
    /// Same as [`Cooldown::new`]; the countdown is left untouched on error.
    pub fn reset_to(&mut self, duration: f32) -> CoreResult<()> {
        *self = Self::new(duration)?;
        Ok(())
    }

    /// Forces the countdown to expire.
    pub fn expire(&mut self) {
        self.remaining = 0.0;
    }
}

impl Countdown for Cooldown {
    #[inline]
    fn is_hot(&self) -> bool {
        self.remaining > 0.0
    }

    fn normalized(&self) -> f32 {
        if self.duration <= 0.0 {
            return 1.0;
        }
        (1.0 - self.remaining / self.duration).clamp(0.0, 1.0)
    }

    #[inline]
    fn reset(&mut self) {
        self.remaining = self.duration;
    }
}
