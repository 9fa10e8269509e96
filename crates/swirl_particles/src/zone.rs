//! # Spawn Zones
//!
//! A zone is the "shape" of an emitter. Each call to [`Zone::emit`] samples
//! one spawn position and one velocity hint, both relative to the zone's
//! anchor. The emitter adds its own world position on top.
//!
//! | Zone         | Position                                 | Velocity                          |
//! |--------------|------------------------------------------|-----------------------------------|
//! | [`ZonePoint`]  | origin                                 | `speed ± variance` at `[phi0, phi1]` |
//! | [`ZoneLine`]   | along `v`                              | `speed` scaled by `1 ± variance`  |
//! | [`ZoneCircle`] | radius `[r0, r1]`, angle `[phi0, phi1]` | same as position (radial)         |
//! | [`ZoneRect`]   | inside the rectangle                   | center -> position                |
//! | [`ZoneBeam`]   | along `v`, offset across by `width`    | the perpendicular offset          |
//!
//! Ranges may be given in either order: sampling uses `lerp`, which does not
//! care about direction. Angles are in degrees.

use serde::{Deserialize, Serialize};
use swirl_core::{lerp, EntropyRandom, RandomSource, SeededRandom, Vec2};

use crate::error::{ensure_finite, ensure_non_negative, ParticleResult};

/// One sample drawn from a zone.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ZoneSample {
    /// Spawn position relative to the zone anchor.
    pub position: Vec2,
    /// Velocity hint for the spawned particle.
    pub velocity: Vec2,
}

impl ZoneSample {
    /// Creates a sample.
    #[must_use]
    pub const fn new(position: Vec2, velocity: Vec2) -> Self {
        Self { position, velocity }
    }
}

/// A geometric sampler for spawn positions.
///
/// `t` is the emitter's normalized time, for zones that change shape over
/// the emission. The built-in zones ignore it.
pub trait Zone: Send {
    /// Draws one sample. Only side effect: consuming the random sources.
    fn emit(&mut self, t: Option<f32>) -> ZoneSample;
}

/// The two random sources every built-in zone samples from.
pub struct ZoneRandom {
    /// Position source.
    pub rnd_p: Box<dyn RandomSource>,
    /// Momentum source.
    pub rnd_m: Box<dyn RandomSource>,
}

impl ZoneRandom {
    /// Both sources drawn from one deterministic seed.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self {
            rnd_p: Box::new(SeededRandom::new(seed)),
            rnd_m: Box::new(SeededRandom::new(seed.wrapping_add(0x9E37_79B9_7F4A_7C15))),
        }
    }

    /// Explicit sources, e.g. fixed sequences in tests.
    pub fn new(rnd_p: impl RandomSource + 'static, rnd_m: impl RandomSource + 'static) -> Self {
        Self {
            rnd_p: Box::new(rnd_p),
            rnd_m: Box::new(rnd_m),
        }
    }

    #[inline]
    fn p(&mut self) -> f32 {
        self.rnd_p.sample()
    }

    #[inline]
    fn m(&mut self) -> f32 {
        self.rnd_m.sample()
    }
}

/// Entropy-seeded lazily, so a default that `with_random` replaces never
/// touches the operating system.
impl Default for ZoneRandom {
    fn default() -> Self {
        Self::new(EntropyRandom::new(), EntropyRandom::new())
    }
}

fn check_angles(phi0: f32, phi1: f32) -> ParticleResult<()> {
    ensure_finite("zone.phi0", phi0)?;
    ensure_finite("zone.phi1", phi1)
}

fn check_vector(field_x: &'static str, field_y: &'static str, v: Vec2) -> ParticleResult<()> {
    ensure_finite(field_x, v.x)?;
    ensure_finite(field_y, v.y)
}

fn check_point(speed: f32, variance: f32, phi0: f32, phi1: f32) -> ParticleResult<()> {
    ensure_finite("zone.speed", speed)?;
    ensure_non_negative("zone.variance", variance)?;
    check_angles(phi0, phi1)
}

fn check_line(v: Vec2, speed: Vec2, variance: f32) -> ParticleResult<()> {
    check_vector("zone.v.x", "zone.v.y", v)?;
    check_vector("zone.speed.x", "zone.speed.y", speed)?;
    ensure_non_negative("zone.variance", variance)
}

fn check_circle(r0: f32, r1: f32, phi0: f32, phi1: f32) -> ParticleResult<()> {
    ensure_non_negative("zone.r0", r0)?;
    ensure_non_negative("zone.r1", r1)?;
    check_angles(phi0, phi1)
}

fn check_rect(width: f32, height: f32) -> ParticleResult<()> {
    ensure_non_negative("zone.width", width)?;
    ensure_non_negative("zone.height", height)
}

fn check_beam(v: Vec2, width: f32) -> ParticleResult<()> {
    check_vector("zone.v.x", "zone.v.y", v)?;
    ensure_non_negative("zone.width", width)
}

// ============================================================================
// Point
// ============================================================================

/// Everything spawns at the anchor; only the velocity is random.
pub struct ZonePoint {
    speed: f32,
    variance: f32,
    phi0: f32,
    phi1: f32,
    random: ZoneRandom,
}

impl ZonePoint {
    /// Creates a point zone.
    ///
    /// Velocity magnitude is drawn from `[(1 - variance) * speed, (1 + variance) * speed]`,
    /// its angle from `[phi0, phi1]`.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` for non-finite values or a negative variance.
    pub fn new(speed: f32, variance: f32, phi0: f32, phi1: f32) -> ParticleResult<Self> {
        check_point(speed, variance, phi0, phi1)?;
        Ok(Self {
            speed,
            variance,
            phi0,
            phi1,
            random: ZoneRandom::default(),
        })
    }

    /// Replaces the random sources.
    #[must_use]
    pub fn with_random(mut self, random: ZoneRandom) -> Self {
        self.random = random;
        self
    }

    /// Re-aims the zone.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` for non-finite angles.
    pub fn set_angles(&mut self, phi0: f32, phi1: f32) -> ParticleResult<()> {
        check_angles(phi0, phi1)?;
        self.phi0 = phi0;
        self.phi1 = phi1;
        Ok(())
    }
}

impl Zone for ZonePoint {
    fn emit(&mut self, _t: Option<f32>) -> ZoneSample {
        let speed = lerp(
            (1.0 - self.variance) * self.speed,
            (1.0 + self.variance) * self.speed,
            self.random.m(),
        );
        let phi = lerp(self.phi0, self.phi1, self.random.m());
        ZoneSample::new(Vec2::ZERO, Vec2::from_polar(speed, phi))
    }
}

// ============================================================================
// Line
// ============================================================================

/// Spawns along the segment from the anchor to `v`.
pub struct ZoneLine {
    v: Vec2,
    speed: Vec2,
    variance: f32,
    random: ZoneRandom,
}

impl ZoneLine {
    /// Creates a line zone. Every particle gets the `speed` vector, scaled by
    /// a factor drawn from `[1 - variance, 1 + variance]`.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` for non-finite vectors or a negative variance.
    pub fn new(v: Vec2, speed: Vec2, variance: f32) -> ParticleResult<Self> {
        check_line(v, speed, variance)?;
        Ok(Self {
            v,
            speed,
            variance,
            random: ZoneRandom::default(),
        })
    }

    /// Replaces the random sources.
    #[must_use]
    pub fn with_random(mut self, random: ZoneRandom) -> Self {
        self.random = random;
        self
    }

    /// The segment vector.
    #[must_use]
    pub const fn vector(&self) -> Vec2 {
        self.v
    }
}

impl Zone for ZoneLine {
    fn emit(&mut self, _t: Option<f32>) -> ZoneSample {
        let position = self.v * self.random.p();
        let scale = lerp(1.0 - self.variance, 1.0 + self.variance, self.random.m());
        ZoneSample::new(position, self.speed * scale)
    }
}

// ============================================================================
// Circle / Ring
// ============================================================================

/// Spawns inside a ring segment; particles fly radially outwards.
pub struct ZoneCircle {
    r0: f32,
    r1: f32,
    phi0: f32,
    phi1: f32,
    random: ZoneRandom,
}

impl ZoneCircle {
    /// Creates a ring zone. `r0 == r1` gives a circle outline, `r0 == 0` a
    /// filled disc (not area-uniform: density is higher at the center).
    ///
    /// # Errors
    ///
    /// `InvalidConfig` for negative radii or non-finite values.
    pub fn new(r0: f32, r1: f32, phi0: f32, phi1: f32) -> ParticleResult<Self> {
        check_circle(r0, r1, phi0, phi1)?;
        Ok(Self {
            r0,
            r1,
            phi0,
            phi1,
            random: ZoneRandom::default(),
        })
    }

    /// A full circle of radius `[0, radius]`.
    ///
    /// # Errors
    ///
    /// Same as [`ZoneCircle::new`].
    pub fn disc(radius: f32) -> ParticleResult<Self> {
        Self::new(0.0, radius, 0.0, 360.0)
    }

    /// Replaces the random sources.
    #[must_use]
    pub fn with_random(mut self, random: ZoneRandom) -> Self {
        self.random = random;
        self
    }

    /// Re-aims the ring segment.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` for non-finite angles.
    pub fn set_angles(&mut self, phi0: f32, phi1: f32) -> ParticleResult<()> {
        check_angles(phi0, phi1)?;
        self.phi0 = phi0;
        self.phi1 = phi1;
        Ok(())
    }

    /// Outer radius, whichever of the two is larger.
    #[must_use]
    pub fn outer_radius(&self) -> f32 {
        self.r0.max(self.r1)
    }
}

impl Zone for ZoneCircle {
    fn emit(&mut self, _t: Option<f32>) -> ZoneSample {
        let r = lerp(self.r0, self.r1, self.random.p());
        let phi = lerp(self.phi0, self.phi1, self.random.p());
        let v = Vec2::from_polar(r, phi);
        ZoneSample::new(v, v)
    }
}

// ============================================================================
// Rect
// ============================================================================

/// Spawns uniformly inside a rectangle centered on the anchor; particles
/// fly away from the center.
pub struct ZoneRect {
    width: f32,
    height: f32,
    random: ZoneRandom,
}

impl ZoneRect {
    /// Creates a rectangle zone.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` for negative or non-finite extents.
    pub fn new(width: f32, height: f32) -> ParticleResult<Self> {
        check_rect(width, height)?;
        Ok(Self {
            width,
            height,
            random: ZoneRandom::default(),
        })
    }

    /// Replaces the random sources.
    #[must_use]
    pub fn with_random(mut self, random: ZoneRandom) -> Self {
        self.random = random;
        self
    }

    /// Half extents of the rectangle.
    #[must_use]
    pub fn half_extents(&self) -> Vec2 {
        Vec2::new(self.width * 0.5, self.height * 0.5)
    }
}

impl Zone for ZoneRect {
    fn emit(&mut self, _t: Option<f32>) -> ZoneSample {
        let half = self.half_extents();
        let x = lerp(-half.x, half.x, self.random.p());
        let y = lerp(-half.y, half.y, self.random.p());
        let v = Vec2::new(x, y);
        ZoneSample::new(v, v)
    }
}

// ============================================================================
// Beam
// ============================================================================

/// Spawns in a band of `width` around the segment from the anchor to `v`;
/// particles drift sideways, away from the beam's axis.
pub struct ZoneBeam {
    v: Vec2,
    width: f32,
    random: ZoneRandom,
}

impl ZoneBeam {
    /// Creates a beam zone. The perpendicular offset is drawn from
    /// `[-width / 2, width / 2]`.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` for a non-finite vector or a negative width.
    pub fn new(v: Vec2, width: f32) -> ParticleResult<Self> {
        check_beam(v, width)?;
        Ok(Self {
            v,
            width,
            random: ZoneRandom::default(),
        })
    }

    /// Replaces the random sources.
    #[must_use]
    pub fn with_random(mut self, random: ZoneRandom) -> Self {
        self.random = random;
        self
    }

    /// The beam's axis.
    #[must_use]
    pub const fn vector(&self) -> Vec2 {
        self.v
    }
}

impl Zone for ZoneBeam {
    fn emit(&mut self, _t: Option<f32>) -> ZoneSample {
        let along = self.v * self.random.p();
        let half = self.width * 0.5;
        let offset = self.v.perpendicular().normalize_or_zero() * lerp(-half, half, self.random.p());
        ZoneSample::new(along + offset, offset)
    }
}

// ============================================================================
// Data-driven zones
// ============================================================================

/// Zone description as it appears in presets, tagged by `kind`.
///
/// ```toml
/// [zone]
/// kind = "circle"
/// r0 = 0.0
/// r1 = 64.0
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ZoneShape {
    /// See [`ZonePoint`].
    Point {
        /// Mean speed.
        speed: f32,
        /// Relative speed spread.
        #[serde(default)]
        variance: f32,
        /// Angle range start (degrees).
        #[serde(default)]
        phi0: f32,
        /// Angle range end (degrees).
        #[serde(default = "full_turn")]
        phi1: f32,
    },
    /// See [`ZoneLine`].
    Line {
        /// Segment vector.
        v: [f32; 2],
        /// Velocity of every particle.
        speed: [f32; 2],
        /// Relative speed spread.
        #[serde(default)]
        variance: f32,
    },
    /// See [`ZoneCircle`].
    Circle {
        /// Radius range start.
        #[serde(default)]
        r0: f32,
        /// Radius range end.
        r1: f32,
        /// Angle range start (degrees).
        #[serde(default)]
        phi0: f32,
        /// Angle range end (degrees).
        #[serde(default = "full_turn")]
        phi1: f32,
    },
    /// See [`ZoneRect`].
    Rect {
        /// Width.
        width: f32,
        /// Height.
        height: f32,
    },
    /// See [`ZoneBeam`].
    Beam {
        /// Beam axis.
        v: [f32; 2],
        /// Band width.
        width: f32,
    },
}

fn full_turn() -> f32 {
    360.0
}

impl ZoneShape {
    /// Checks the parameters without building anything.
    ///
    /// # Errors
    ///
    /// `InvalidConfig`, exactly as the zone's constructor would report it.
    pub fn validate(&self) -> ParticleResult<()> {
        match *self {
            Self::Point { speed, variance, phi0, phi1 } => check_point(speed, variance, phi0, phi1),
            Self::Line { v, speed, variance } => {
                check_line(Vec2::from_array(v), Vec2::from_array(speed), variance)
            }
            Self::Circle { r0, r1, phi0, phi1 } => check_circle(r0, r1, phi0, phi1),
            Self::Rect { width, height } => check_rect(width, height),
            Self::Beam { v, width } => check_beam(Vec2::from_array(v), width),
        }
    }

    /// Builds the zone. `seed` makes it deterministic; `None` seeds from
    /// entropy.
    ///
    /// # Errors
    ///
    /// Whatever the zone's constructor rejects.
    pub fn build(&self, seed: Option<u64>) -> ParticleResult<Box<dyn Zone>> {
        let random = seed.map_or_else(ZoneRandom::default, ZoneRandom::seeded);
        let zone: Box<dyn Zone> = match *self {
            Self::Point { speed, variance, phi0, phi1 } => {
                Box::new(ZonePoint::new(speed, variance, phi0, phi1)?.with_random(random))
            }
            Self::Line { v, speed, variance } => Box::new(
                ZoneLine::new(Vec2::from_array(v), Vec2::from_array(speed), variance)?
                    .with_random(random),
            ),
            Self::Circle { r0, r1, phi0, phi1 } => {
                Box::new(ZoneCircle::new(r0, r1, phi0, phi1)?.with_random(random))
            }
            Self::Rect { width, height } => Box::new(ZoneRect::new(width, height)?.with_random(random)),
            Self::Beam { v, width } => {
                Box::new(ZoneBeam::new(Vec2::from_array(v), width)?.with_random(random))
            }
        };
        Ok(zone)
    }
}
