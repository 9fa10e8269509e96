//! # SWIRL Particles
//!
//! Emission scheduling, spawn zones, particle lifecycles and the shared
//! image cache.
//!
//! ## Frame order
//!
//! ```text
//! 1. Emitter::update(dt, ctx, factory)     -> SpawnRequests -> your store
//! 2. for each live particle:
//!      Lifecycle::advance(&mut lifetime)   -> size / alpha / rotation
//!      Lifecycle::resolve(pos, cache, f)   -> Arc<Image> + bounds
//! ```
//!
//! Particles created in step 1 are first advanced on the next frame.
//!
//! ## CRITICAL RULES
//!
//! - No entity storage in here. Particles live wherever the factory puts them.
//! - No wall clock. Time only moves through `dt`.
//! - No global state. Caches are `Arc`s handed to whoever shares them.

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod emitter;
pub mod error;
pub mod image;
pub mod image_cache;
pub mod lifecycle;
pub mod preset;
pub mod zone;

pub use self::emitter::{
    Emitter, EmitterConfig, EmitterContext, EmitterState, MomentumInheritance, ParticleFactory,
    SpawnRequest, TickOutcome,
};
pub use self::error::{FactoryError, ParticleError, ParticleResult};
pub use self::image::{
    BubbleImageFactory, Image, ImageFactory, Rgba, SolidImageFactory, SquabbleImageFactory,
    TaggedImageFactory, MAX_IMAGE_SIZE,
};
pub use self::image_cache::{CacheStats, ImageCache, ImageKey, SharedImageCache};
pub use self::lifecycle::{Envelope, Lifecycle, LifecycleConfig, Repeat, ResolvedImage, Visual};
pub use self::preset::{EffectPreset, ParticleSpec};
pub use self::zone::{
    Zone, ZoneBeam, ZoneCircle, ZoneLine, ZonePoint, ZoneRandom, ZoneRect, ZoneSample, ZoneShape,
};

/// Re-exported so callers need only one dependency.
pub use swirl_core;
