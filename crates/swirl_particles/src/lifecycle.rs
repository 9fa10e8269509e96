//! # Particle Lifecycle
//!
//! Each particle carries a [`Lifecycle`]: envelopes for size, alpha and
//! optionally rotation, sampled at the particle's normalized lifetime. The
//! lifetime countdown itself lives with the particle's owner and is only
//! read (and re-armed for cycling particles) through [`Countdown`].
//!
//! Rendering goes through the shared [`ImageCache`]: the current outputs
//! are rounded into an [`ImageKey`] and every particle in the same visual
//! state gets the same `Arc<Image>`.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use swirl_core::{lerp, Countdown, Ease, Rect, Vec2};

use crate::error::{ensure_finite, ParticleError, ParticleResult};
use crate::image::{Image, ImageFactory, MAX_IMAGE_SIZE};
use crate::image_cache::{ImageCache, ImageKey};

/// How an envelope behaves past its period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Repeat {
    /// Run once and hold the end value.
    #[default]
    Once,
    /// Jump back to the start after every period.
    Loop,
    /// Run forwards, then backwards.
    PingPong,
}

/// A `start -> end` ramp over the particle's life.
///
/// `period` is a fraction of the lifetime: `0.25` with [`Repeat::Loop`]
/// runs the ramp four times per life.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Envelope {
    /// Value at the start of each period.
    pub start: f32,
    /// Value at the end of each period.
    pub end: f32,
    /// Curve applied to the phase.
    #[serde(default)]
    pub easing: Ease,
    /// Behaviour past one period.
    #[serde(default)]
    pub repeat: Repeat,
    /// Period length as a fraction of the lifetime.
    #[serde(default = "full_life")]
    pub period: f32,
}

fn full_life() -> f32 {
    1.0
}

impl Envelope {
    /// Linear ramp over the whole life.
    #[must_use]
    pub const fn new(start: f32, end: f32) -> Self {
        Self {
            start,
            end,
            easing: Ease::Linear,
            repeat: Repeat::Once,
            period: 1.0,
        }
    }

    /// Holds one value.
    #[must_use]
    pub const fn constant(value: f32) -> Self {
        Self::new(value, value)
    }

    /// Sets the curve.
    #[must_use]
    pub const fn with_easing(mut self, easing: Ease) -> Self {
        self.easing = easing;
        self
    }

    /// Sets the repeat mode and period.
    #[must_use]
    pub const fn with_repeat(mut self, repeat: Repeat, period: f32) -> Self {
        self.repeat = repeat;
        self.period = period;
        self
    }

    /// # Errors
    ///
    /// `InvalidConfig` for non-finite bounds or a period that is not `> 0`.
    pub fn validate(&self, field: &'static str) -> ParticleResult<()> {
        ensure_finite(field, self.start)?;
        ensure_finite(field, self.end)?;
        if !self.period.is_finite() || self.period <= 0.0 {
            return Err(ParticleError::invalid(
                field,
                format!("period must be > 0, got {}", self.period),
            ));
        }
        Ok(())
    }

    /// Phase within the current period, before easing.
    #[must_use]
    pub fn phase(&self, t: f32) -> f32 {
        let local = t / self.period;
        match self.repeat {
            Repeat::Once => local.clamp(0.0, 1.0),
            Repeat::Loop => local.rem_euclid(1.0),
            Repeat::PingPong => {
                let m = local.rem_euclid(2.0);
                if m > 1.0 {
                    2.0 - m
                } else {
                    m
                }
            }
        }
    }

    /// Value at normalized lifetime `t`.
    #[must_use]
    pub fn sample(&self, t: f32) -> f32 {
        lerp(self.start, self.end, self.easing.apply(self.phase(t)))
    }
}

/// Data description of a lifecycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LifecycleConfig {
    /// Visual tag, handed to the image factory.
    pub tag: String,
    /// Edge length in pixels.
    #[serde(default = "default_size")]
    pub size: Envelope,
    /// Opacity `0..=255`.
    #[serde(default = "default_alpha")]
    pub alpha: Envelope,
    /// Rotation in degrees; `None` never rotates.
    #[serde(default)]
    pub rotation: Option<Envelope>,
    /// Re-arm the lifetime when it runs out.
    #[serde(default)]
    pub cycle: bool,
}

fn default_size() -> Envelope {
    Envelope::new(2.0, 32.0)
}

fn default_alpha() -> Envelope {
    Envelope::constant(255.0)
}

impl LifecycleConfig {
    /// Defaults: size 2 -> 32, fully opaque, no rotation, no cycling.
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            size: default_size(),
            alpha: default_alpha(),
            rotation: None,
            cycle: false,
        }
    }

    /// Sets the size envelope.
    #[must_use]
    pub fn with_size(mut self, size: Envelope) -> Self {
        self.size = size;
        self
    }

    /// Sets the alpha envelope.
    #[must_use]
    pub fn with_alpha(mut self, alpha: Envelope) -> Self {
        self.alpha = alpha;
        self
    }

    /// Adds a rotation envelope.
    #[must_use]
    pub fn with_rotation(mut self, rotation: Envelope) -> Self {
        self.rotation = Some(rotation);
        self
    }

    /// Enables cycling.
    #[must_use]
    pub fn cycling(mut self, cycle: bool) -> Self {
        self.cycle = cycle;
        self
    }

    /// # Errors
    ///
    /// `InvalidConfig` for an empty tag, an invalid envelope, or a size
    /// outside `0..=MAX_IMAGE_SIZE`.
    pub fn validate(&self) -> ParticleResult<()> {
        if self.tag.is_empty() {
            return Err(ParticleError::invalid("particle.tag", "must not be empty"));
        }
        self.size.validate("particle.size")?;
        let max = MAX_IMAGE_SIZE as f32;
        for bound in [self.size.start, self.size.end] {
            if !(0.0..=max).contains(&bound) {
                return Err(ParticleError::invalid(
                    "particle.size",
                    format!("must be in 0..={MAX_IMAGE_SIZE}, got {bound}"),
                ));
            }
        }
        self.alpha.validate("particle.alpha")?;
        if let Some(rotation) = &self.rotation {
            rotation.validate("particle.rotation")?;
        }
        Ok(())
    }
}

/// The externally read outputs of a lifecycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Visual {
    /// Edge length in pixels.
    pub size: f32,
    /// Opacity, nominally `0..=255`.
    pub alpha: f32,
    /// Degrees, counter-clockwise.
    pub rotation: f32,
}

/// Image plus where to draw it.
#[derive(Debug, Clone)]
pub struct ResolvedImage {
    /// Shared, transformed image.
    pub image: Arc<Image>,
    /// Image bounds centered on the particle.
    pub bounds: Rect,
    /// Cache key the image was found under.
    pub key: ImageKey,
}

/// Per-particle ramp state.
#[derive(Debug, Clone, PartialEq)]
pub struct Lifecycle {
    config: LifecycleConfig,
    t: f32,
    current: Visual,
}

impl Lifecycle {
    /// Builds a lifecycle, sampled at `t = 0`.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` from [`LifecycleConfig::validate`].
    pub fn new(config: LifecycleConfig) -> ParticleResult<Self> {
        config.validate()?;
        let mut lifecycle = Self {
            config,
            t: 0.0,
            current: Visual {
                size: 0.0,
                alpha: 0.0,
                rotation: 0.0,
            },
        };
        lifecycle.advance_to(0.0);
        Ok(lifecycle)
    }

    /// Re-arms the lifetime if this particle cycles and it has run out, then
    /// reads it and recomputes the outputs.
    ///
    /// A cycling particle therefore shows its start state on the frame it
    /// wraps, never its end state.
    pub fn advance<C: Countdown + ?Sized>(&mut self, lifetime: &mut C) -> Visual {
        if self.config.cycle && lifetime.is_cold() {
            lifetime.reset();
        }
        self.advance_to(lifetime.normalized())
    }

    /// Recomputes the outputs at normalized lifetime `t`.
    pub fn advance_to(&mut self, t: f32) -> Visual {
        self.t = t;
        self.current = Visual {
            size: self.config.size.sample(t),
            alpha: self.config.alpha.sample(t),
            rotation: self
                .config
                .rotation
                .as_ref()
                .map_or(0.0, |rotation| rotation.sample(t)),
        };
        self.current
    }

    /// Current outputs.
    #[must_use]
    pub const fn visual(&self) -> Visual {
        self.current
    }

    /// Current edge length.
    #[must_use]
    pub const fn size(&self) -> f32 {
        self.current.size
    }

    /// Current opacity.
    #[must_use]
    pub const fn alpha(&self) -> f32 {
        self.current.alpha
    }

    /// Current rotation.
    #[must_use]
    pub const fn rotation(&self) -> f32 {
        self.current.rotation
    }

    /// Normalized lifetime of the last advance.
    #[must_use]
    pub const fn t(&self) -> f32 {
        self.t
    }

    /// Visual tag.
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.config.tag
    }

    /// The configuration.
    #[must_use]
    pub const fn config(&self) -> &LifecycleConfig {
        &self.config
    }

    /// Cache key for the current outputs.
    #[must_use]
    pub fn image_key(&self) -> ImageKey {
        ImageKey::quantize(
            &self.config.tag,
            self.current.rotation,
            self.current.size,
            self.current.alpha,
        )
    }

    /// Looks up (or generates) the current image and centers it on `position`.
    ///
    /// # Errors
    ///
    /// [`ParticleError::ImageGeneration`] if the factory fails.
    pub fn resolve<F>(
        &self,
        position: Vec2,
        cache: &ImageCache,
        factory: &F,
    ) -> ParticleResult<ResolvedImage>
    where
        F: ImageFactory + ?Sized,
    {
        let key = self.image_key();
        let image = cache.get_or_generate(&key, factory)?;
        let bounds = Rect::from_center(position, image.width() as f32, image.height() as f32);
        Ok(ResolvedImage { image, bounds, key })
    }
}
