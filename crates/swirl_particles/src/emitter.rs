//! # Emitter
//!
//! Tick-based rate controller. Every `tick_interval` seconds the emitter
//! evaluates one batch: the spawn rate is eased and interpolated over the
//! emitter's normalized time, clamped, charged against the budget, and then
//! one spawn request per particle is handed to the caller's factory.
//!
//! ## State machine
//!
//! ```text
//!          tick cold: spawn one batch
//!   Idle ─────────────────────────────> Idle
//!    │                                   │
//!    │ budget == 0                       │ duration cold
//!    v                                   v
//!  Exhausted (no-op until reset_budget)  Finished
//! ```
//!
//! Spawning happens entirely inside [`Emitter::update`]; every call returns
//! with the emitter settled in one of the states above.
//!
//! The emitter never owns the particles it creates. The factory is passed
//! on every update, so the same emitter can feed different stores.

use std::fmt;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use swirl_core::{lerp, Cooldown, Countdown, Ease, Easing, Vec2};

use crate::error::{ensure_finite, ensure_non_negative, FactoryError, ParticleError, ParticleResult};
use crate::zone::Zone;

bitflags! {
    /// Which velocities a spawned particle inherits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MomentumInheritance: u8 {
        /// The emitter's own velocity.
        const EMITTER = 1;
        /// The velocity hint sampled from the zone.
        const ZONE = 2;
    }
}

impl Default for MomentumInheritance {
    fn default() -> Self {
        Self::all()
    }
}

/// Serializes [`MomentumInheritance`] as its raw bits, e.g. `inherit = 3`.
mod inheritance_bits {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::MomentumInheritance;

    pub fn serialize<S: Serializer>(flags: &MomentumInheritance, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u8(flags.bits())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<MomentumInheritance, D::Error> {
        let bits = u8::deserialize(d)?;
        MomentumInheritance::from_bits(bits)
            .ok_or_else(|| D::Error::custom(format!("unknown inheritance bits: {bits}")))
    }
}

/// Emitter configuration. Validated by [`Emitter::new`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EmitterConfig {
    /// Particles per tick at normalized time 0.
    pub spawn_rate_start: f32,
    /// Particles per tick at normalized time 1.
    pub spawn_rate_end: f32,
    /// Curve applied to the normalized time before interpolating the rate.
    pub rate_easing: Ease,
    /// Seconds between batch evaluations. Must be `> 0`.
    pub tick_interval: f32,
    /// Total spawns over the emitter's life. `None` is unlimited.
    pub total_emit_budget: Option<u32>,
    /// Seconds the emitter runs for. `None` takes normalized time from the
    /// caller's lifetime signal instead.
    pub duration: Option<f32>,
    /// Velocity inheritance policy.
    #[serde(rename = "inherit", with = "inheritance_bits")]
    pub momentum_inheritance: MomentumInheritance,
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self {
            spawn_rate_start: 1.0,
            spawn_rate_end: 1.0,
            rate_easing: Ease::Linear,
            tick_interval: 0.1,
            total_emit_budget: None,
            duration: None,
            momentum_inheritance: MomentumInheritance::all(),
        }
    }
}

impl EmitterConfig {
    /// Sets both rate bounds.
    #[must_use]
    pub const fn with_rates(mut self, start: f32, end: f32) -> Self {
        self.spawn_rate_start = start;
        self.spawn_rate_end = end;
        self
    }

    /// Sets the rate easing curve.
    #[must_use]
    pub const fn with_easing(mut self, ease: Ease) -> Self {
        self.rate_easing = ease;
        self
    }

    /// Sets the tick interval.
    #[must_use]
    pub const fn with_tick_interval(mut self, seconds: f32) -> Self {
        self.tick_interval = seconds;
        self
    }

    /// Caps the total number of spawns.
    #[must_use]
    pub const fn with_budget(mut self, budget: u32) -> Self {
        self.total_emit_budget = Some(budget);
        self
    }

    /// Bounds the emitter's run time.
    #[must_use]
    pub const fn with_duration(mut self, seconds: f32) -> Self {
        self.duration = Some(seconds);
        self
    }

    /// Sets the inheritance policy.
    #[must_use]
    pub const fn with_inheritance(mut self, flags: MomentumInheritance) -> Self {
        self.momentum_inheritance = flags;
        self
    }

    /// Checks every invariant the emitter relies on.
    ///
    /// # Errors
    ///
    /// [`ParticleError::InvalidConfig`] naming the first offending field.
    pub fn validate(&self) -> ParticleResult<()> {
        ensure_non_negative("spawn_rate_start", self.spawn_rate_start)?;
        ensure_non_negative("spawn_rate_end", self.spawn_rate_end)?;
        ensure_finite("tick_interval", self.tick_interval)?;
        if self.tick_interval <= 0.0 {
            return Err(ParticleError::invalid(
                "tick_interval",
                format!("must be > 0, got {}", self.tick_interval),
            ));
        }
        if let Some(duration) = self.duration {
            ensure_finite("duration", duration)?;
            if duration <= 0.0 {
                return Err(ParticleError::invalid(
                    "duration",
                    format!("must be > 0, got {duration}"),
                ));
            }
        }
        Ok(())
    }

    /// Largest batch the rate bounds allow.
    #[must_use]
    pub fn max_batch(&self) -> u32 {
        self.spawn_rate_start.max(self.spawn_rate_end).floor() as u32
    }
}

/// Per-update input from the owning entity.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EmitterContext {
    /// Emitter world position; added to every zone sample.
    pub position: Vec2,
    /// Emitter velocity, inherited with [`MomentumInheritance::EMITTER`].
    pub velocity: Option<Vec2>,
    /// Normalized lifetime of the owner, used when no duration is configured.
    pub lifetime: Option<f32>,
}

impl EmitterContext {
    /// Context for an emitter at `position`.
    #[must_use]
    pub const fn at(position: Vec2) -> Self {
        Self {
            position,
            velocity: None,
            lifetime: None,
        }
    }

    /// Adds the emitter's velocity.
    #[must_use]
    pub const fn with_velocity(mut self, velocity: Vec2) -> Self {
        self.velocity = Some(velocity);
        self
    }

    /// Adds the owner's normalized lifetime.
    #[must_use]
    pub const fn with_lifetime(mut self, t: f32) -> Self {
        self.lifetime = Some(t);
        self
    }
}

/// Everything a particle factory needs to create one particle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnRequest {
    /// Emitter's normalized time for this batch.
    pub t: f32,
    /// World position.
    pub position: Vec2,
    /// Initial velocity after inheritance.
    pub velocity: Vec2,
}

/// Creates particles in whatever store the caller uses.
pub trait ParticleFactory {
    /// What the store hands back for a new particle.
    type Handle;

    /// Creates one particle.
    ///
    /// # Errors
    ///
    /// Any [`FactoryError`]; the emitter abandons the rest of the batch.
    fn spawn(&mut self, request: SpawnRequest) -> Result<Self::Handle, FactoryError>;
}

impl<F, H> ParticleFactory for F
where
    F: FnMut(SpawnRequest) -> Result<H, FactoryError>,
{
    type Handle = H;

    #[inline]
    fn spawn(&mut self, request: SpawnRequest) -> Result<H, FactoryError> {
        self(request)
    }
}

/// Where the emitter is in its life.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EmitterState {
    /// Waiting for the next tick.
    Idle,
    /// Budget used up. Ticks are no-ops until [`Emitter::reset_budget`].
    Exhausted,
    /// Duration countdown expired.
    Finished,
}

/// What one call to [`Emitter::update`] did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    /// Tick still counting down; nothing evaluated.
    Cooling,
    /// Budget is spent; nothing spawned.
    Exhausted,
    /// Duration has run out; nothing spawned.
    Finished,
    /// A batch was evaluated. `count` may be zero.
    Emitted {
        /// Particles spawned.
        count: u32,
        /// Normalized time the batch was evaluated at.
        t: f32,
    },
}

impl TickOutcome {
    /// Particles spawned by this update.
    #[must_use]
    pub const fn count(&self) -> u32 {
        match self {
            Self::Emitted { count, .. } => *count,
            _ => 0,
        }
    }
}

/// Rate-controlled particle source.
pub struct Emitter {
    config: EmitterConfig,
    zone: Box<dyn Zone>,
    rate_easing: Box<dyn Easing>,
    tick: Cooldown,
    duration: Option<Cooldown>,
    remaining: Option<u32>,
    total_emitted: u64,
    state: EmitterState,
}

impl Emitter {
    /// Builds an emitter from a validated configuration.
    ///
    /// # Errors
    ///
    /// [`ParticleError::InvalidConfig`] if the configuration is invalid.
    pub fn new(config: EmitterConfig, zone: Box<dyn Zone>) -> ParticleResult<Self> {
        config.validate()?;
        let tick = Cooldown::new_cold(config.tick_interval)?;
        let duration = config.duration.map(Cooldown::new).transpose()?;
        let remaining = config.total_emit_budget;
        let state = if remaining == Some(0) {
            EmitterState::Exhausted
        } else {
            EmitterState::Idle
        };
        Ok(Self {
            rate_easing: Box::new(config.rate_easing),
            config,
            zone,
            tick,
            duration,
            remaining,
            total_emitted: 0,
            state,
        })
    }

    /// Replaces the rate curve with a custom one.
    #[must_use]
    pub fn with_rate_easing(mut self, easing: Box<dyn Easing>) -> Self {
        self.rate_easing = easing;
        self
    }

    /// Swaps the zone, e.g. to re-aim a directional effect.
    pub fn set_zone(&mut self, zone: Box<dyn Zone>) {
        self.zone = zone;
    }

    /// Advances the emitter by `dt` seconds and spawns the batch if one is due.
    ///
    /// Handles returned by the factory are dropped; use
    /// [`Emitter::update_collect`] to keep them.
    ///
    /// # Errors
    ///
    /// [`ParticleError::Factory`] if the factory fails. The tick reset and
    /// budget charge stay committed; the rest of the batch is dropped.
    pub fn update<F: ParticleFactory>(
        &mut self,
        dt: f32,
        ctx: &EmitterContext,
        factory: &mut F,
    ) -> ParticleResult<TickOutcome> {
        self.run(dt, ctx, factory, |_| {})
    }

    /// Like [`Emitter::update`], pushing every new handle into `handles`.
    ///
    /// # Errors
    ///
    /// Same as [`Emitter::update`]. Handles spawned before a failure are kept.
    pub fn update_collect<F: ParticleFactory>(
        &mut self,
        dt: f32,
        ctx: &EmitterContext,
        factory: &mut F,
        handles: &mut Vec<F::Handle>,
    ) -> ParticleResult<TickOutcome> {
        self.run(dt, ctx, factory, |h| handles.push(h))
    }

    fn run<F, S>(
        &mut self,
        dt: f32,
        ctx: &EmitterContext,
        factory: &mut F,
        mut sink: S,
    ) -> ParticleResult<TickOutcome>
    where
        F: ParticleFactory,
        S: FnMut(F::Handle),
    {
        self.tick.advance(dt);
        if let Some(duration) = self.duration.as_mut() {
            duration.advance(dt);
        }
        if self.tick.is_hot() {
            return Ok(TickOutcome::Cooling);
        }
        // No catch-up: a long frame still yields a single batch.
        self.tick.reset();

        if self.remaining == Some(0) {
            self.state = EmitterState::Exhausted;
            return Ok(TickOutcome::Exhausted);
        }

        let t = match &self.duration {
            Some(duration) if duration.is_cold() => {
                if self.state != EmitterState::Finished {
                    tracing::debug!(total_emitted = self.total_emitted, "emitter finished");
                }
                self.state = EmitterState::Finished;
                return Ok(TickOutcome::Finished);
            }
            Some(duration) => duration.normalized(),
            None => ctx.lifetime.map_or(0.0, |t| t.clamp(0.0, 1.0)),
        };

        let mut count = self.batch_size(t);
        if let Some(remaining) = self.remaining.as_mut() {
            count = count.min(*remaining);
            *remaining -= count;
        }
        tracing::trace!(count, t, remaining = ?self.remaining, "emitter batch");

        let flags = self.config.momentum_inheritance;
        for spawned in 0..count {
            let sample = self.zone.emit(Some(t));
            let mut velocity = Vec2::ZERO;
            if flags.contains(MomentumInheritance::EMITTER) {
                velocity += ctx.velocity.unwrap_or(Vec2::ZERO);
            }
            if flags.contains(MomentumInheritance::ZONE) {
                velocity += sample.velocity;
            }
            let request = SpawnRequest {
                t,
                position: ctx.position + sample.position,
                velocity,
            };
            match factory.spawn(request) {
                Ok(handle) => {
                    self.total_emitted += 1;
                    sink(handle);
                }
                Err(source) => {
                    tracing::warn!(spawned, requested = count, error = %source, "particle factory failed");
                    self.settle();
                    return Err(ParticleError::Factory {
                        spawned,
                        requested: count,
                        source,
                    });
                }
            }
        }
        self.settle();
        Ok(TickOutcome::Emitted { count, t })
    }

    /// Eased, floored and clamped rate for normalized time `t`.
    fn batch_size(&self, t: f32) -> u32 {
        let eased = self.rate_easing.ease(t);
        let raw = lerp(self.config.spawn_rate_start, self.config.spawn_rate_end, eased).floor();
        if !raw.is_finite() {
            return 0;
        }
        let max = self.config.spawn_rate_start.max(self.config.spawn_rate_end);
        raw.clamp(0.0, max).floor() as u32
    }

    fn settle(&mut self) {
        self.state = if self.remaining == Some(0) {
            tracing::debug!(total_emitted = self.total_emitted, "emitter budget exhausted");
            EmitterState::Exhausted
        } else {
            EmitterState::Idle
        };
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> EmitterState {
        self.state
    }

    /// Spawns left in the budget; `None` when unlimited.
    #[must_use]
    pub const fn remaining(&self) -> Option<u32> {
        self.remaining
    }

    /// True once the budget is spent.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.remaining == Some(0)
    }

    /// True once the duration countdown has expired.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.duration.is_some_and(|d| d.is_cold())
    }

    /// Particles successfully spawned since construction.
    #[must_use]
    pub const fn total_emitted(&self) -> u64 {
        self.total_emitted
    }

    /// The configuration the emitter was built from.
    #[must_use]
    pub const fn config(&self) -> &EmitterConfig {
        &self.config
    }

    /// Restores the configured budget.
    pub fn reset_budget(&mut self) {
        self.remaining = self.config.total_emit_budget;
        if self.state == EmitterState::Exhausted {
            self.state = EmitterState::Idle;
        }
        self.settle_finished();
    }

    /// Re-arms the duration and budget; the next update fires a batch.
    pub fn restart(&mut self) {
        if let Some(duration) = self.duration.as_mut() {
            duration.reset();
        }
        self.tick.expire();
        self.remaining = self.config.total_emit_budget;
        self.state = EmitterState::Idle;
        self.settle_finished();
    }

    fn settle_finished(&mut self) {
        if self.remaining == Some(0) {
            self.state = EmitterState::Exhausted;
        } else if self.is_finished() {
            self.state = EmitterState::Finished;
        }
    }
}

impl fmt::Debug for Emitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Emitter")
            .field("config", &self.config)
            .field("tick", &self.tick)
            .field("duration", &self.duration)
            .field("remaining", &self.remaining)
            .field("total_emitted", &self.total_emitted)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
