//! # Headless Scene
//!
//! A minimal frame driver for running effects without a window.
//!
//! ```text
//! step(dt):
//!   0. launchers that went cold add a wave of sources
//!   1. sources move and age               -> expired sources are retired
//!      emitters update                    -> new particles are STAGED
//!   2. live particles: lifetime, motion,
//!      lifecycle, image resolve          -> expired ones are dropped
//!   3. staged particles join the live set
//! ```
//!
//! Staging keeps the emitter-before-lifecycle order: a particle created in
//! frame N is advanced for the first time in frame N + 1.
//!
//! A source with a lifetime feeds its normalized age to the emitter as the
//! external lifetime, so rates ramp over the source's life, and is removed
//! once that lifetime runs out.
//!
//! The particle list is a plain `Vec`. Anything bigger belongs in a real
//! entity store behind a `ParticleFactory`.

use swirl_particles::swirl_core::{Cooldown, Countdown, Rect, Vec2};
use swirl_particles::{
    EffectPreset, Emitter, EmitterContext, FactoryError, ImageCache, ImageFactory, Lifecycle,
    ParticleError, ParticleResult, SharedImageCache, SpawnRequest, TaggedImageFactory,
};

/// Default live-particle cap.
pub const DEFAULT_MAX_PARTICLES: usize = 20_000;

/// Scene-unique source identifier, recorded on every particle it emits.
pub type SourceId = u32;

/// How a source moves between frames.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Motion {
    /// Stays put.
    Fixed,
    /// Moves with its velocity and bounces off the scene bounds.
    Drift,
    /// Circles a point.
    Orbit {
        /// Orbit center.
        center: Vec2,
        /// Orbit radius.
        radius: f32,
        /// Angular speed.
        degrees_per_second: f32,
        /// Current angle.
        angle: f32,
    },
}

/// An emitter plus everything needed to turn its spawn requests into
/// particles.
#[derive(Debug)]
pub struct Source {
    id: SourceId,
    name: String,
    emitter: Emitter,
    position: Vec2,
    velocity: Vec2,
    motion: Motion,
    template: Lifecycle,
    particle_lifetime: Cooldown,
    momentum_scale: f32,
    repeat: Option<Cooldown>,
    lifetime: Option<Cooldown>,
}

impl Source {
    /// A fixed source at `position`.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        emitter: Emitter,
        position: Vec2,
        template: Lifecycle,
        particle_lifetime: Cooldown,
    ) -> Self {
        Self {
            id: 0,
            name: name.into(),
            emitter,
            position,
            velocity: Vec2::ZERO,
            motion: Motion::Fixed,
            template,
            particle_lifetime,
            momentum_scale: 1.0,
            repeat: None,
            lifetime: None,
        }
    }

    /// Sets the motion.
    #[must_use]
    pub fn with_motion(mut self, motion: Motion) -> Self {
        self.motion = motion;
        self
    }

    /// Sets the velocity (used by [`Motion::Drift`] and inheritance).
    #[must_use]
    pub fn with_velocity(mut self, velocity: Vec2) -> Self {
        self.velocity = velocity;
        self
    }

    /// Restarts the emitter every `seconds`, for repeating bursts.
    ///
    /// # Errors
    ///
    /// [`ParticleError::Core`] for an invalid period.
    pub fn repeating(mut self, seconds: f32) -> ParticleResult<Self> {
        self.repeat = Some(Cooldown::new(seconds)?);
        Ok(self)
    }

    /// Gives the source a lifetime of `seconds`.
    ///
    /// Its normalized age drives the emitter's rate, and the scene removes
    /// the source when it runs out.
    ///
    /// # Errors
    ///
    /// [`ParticleError::Core`] for an invalid duration.
    pub fn with_lifetime(mut self, seconds: f32) -> ParticleResult<Self> {
        self.lifetime = Some(Cooldown::new(seconds)?);
        Ok(self)
    }

    /// Multiplies every spawned particle's velocity.
    #[must_use]
    pub fn with_momentum_scale(mut self, scale: f32) -> Self {
        self.momentum_scale = scale;
        self
    }

    /// Scene-assigned id; 0 until the source is added to a scene.
    #[must_use]
    pub const fn id(&self) -> SourceId {
        self.id
    }

    /// Source name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The emitter.
    #[must_use]
    pub const fn emitter(&self) -> &Emitter {
        &self.emitter
    }

    /// Current position.
    #[must_use]
    pub const fn position(&self) -> Vec2 {
        self.position
    }

    /// Current velocity.
    #[must_use]
    pub const fn velocity(&self) -> Vec2 {
        self.velocity
    }

    /// Normalized age, if the source has a lifetime.
    #[must_use]
    pub fn age(&self) -> Option<f32> {
        self.lifetime.as_ref().map(Countdown::normalized)
    }

    /// True once the source's lifetime has run out.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.lifetime.as_ref().is_some_and(Countdown::is_cold)
    }

    fn advance(&mut self, dt: f32, bounds: Rect) {
        match &mut self.motion {
            Motion::Fixed => {}
            Motion::Drift => {
                self.position += self.velocity * dt;
                if self.position.x < bounds.x || self.position.x > bounds.x + bounds.width {
                    self.velocity.x = -self.velocity.x;
                }
                if self.position.y < bounds.y || self.position.y > bounds.y + bounds.height {
                    self.velocity.y = -self.velocity.y;
                }
                self.position = Vec2::new(
                    self.position.x.clamp(bounds.x, bounds.x + bounds.width),
                    self.position.y.clamp(bounds.y, bounds.y + bounds.height),
                );
            }
            Motion::Orbit {
                center,
                radius,
                degrees_per_second,
                angle,
            } => {
                *angle = (*angle + *degrees_per_second * dt).rem_euclid(360.0);
                let next = *center + Vec2::from_polar(*radius, *angle);
                if dt > 0.0 {
                    self.velocity = (next - self.position) * (1.0 / dt);
                }
                self.position = next;
            }
        }

        if let Some(repeat) = self.repeat.as_mut() {
            repeat.advance(dt);
            if repeat.is_cold() {
                repeat.reset();
                self.emitter.restart();
                tracing::debug!(source = %self.name, "source restarted");
            }
        }
        if let Some(lifetime) = self.lifetime.as_mut() {
            lifetime.advance(dt);
        }
    }

    fn context(&self) -> EmitterContext {
        let ctx = EmitterContext::at(self.position).with_velocity(self.velocity);
        match self.age() {
            Some(age) => ctx.with_lifetime(age),
            None => ctx,
        }
    }
}

/// Builds one wave of sources. Receives the wave number, starting at 0.
pub type WaveBuilder = Box<dyn FnMut(u32) -> ParticleResult<Vec<Source>>>;

/// Adds a wave of sources every `period` seconds, starting on the first
/// frame.
pub struct Launcher {
    name: String,
    timer: Cooldown,
    waves: u32,
    build: WaveBuilder,
}

impl Launcher {
    /// A launcher firing every `period` seconds.
    ///
    /// # Errors
    ///
    /// [`ParticleError::Core`] for an invalid period.
    pub fn new(
        name: impl Into<String>,
        period: f32,
        build: impl FnMut(u32) -> ParticleResult<Vec<Source>> + 'static,
    ) -> ParticleResult<Self> {
        Ok(Self {
            name: name.into(),
            timer: Cooldown::new_cold(period)?,
            waves: 0,
            build: Box::new(build),
        })
    }

    /// Waves launched so far.
    #[must_use]
    pub const fn waves(&self) -> u32 {
        self.waves
    }

    fn poll(&mut self, dt: f32) -> ParticleResult<Option<Vec<Source>>> {
        self.timer.advance(dt);
        if self.timer.is_hot() {
            return Ok(None);
        }
        self.timer.reset();
        let wave = (self.build)(self.waves)?;
        tracing::debug!(
            launcher = %self.name,
            wave = self.waves,
            sources = wave.len(),
            "wave launched"
        );
        self.waves += 1;
        Ok(Some(wave))
    }
}

impl std::fmt::Debug for Launcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Launcher")
            .field("name", &self.name)
            .field("timer", &self.timer)
            .field("waves", &self.waves)
            .finish_non_exhaustive()
    }
}

/// One live particle.
#[derive(Debug, Clone)]
pub struct Particle {
    /// World position.
    pub position: Vec2,
    /// Pixels per second.
    pub velocity: Vec2,
    /// Lifetime countdown.
    pub lifetime: Cooldown,
    /// Size / alpha / rotation ramps.
    pub lifecycle: Lifecycle,
    /// The source that emitted this particle.
    pub source: SourceId,
}

/// What happened during one [`Scene::step`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameReport {
    /// Frame number, starting at 0.
    pub frame: u64,
    /// Particles spawned (staged) this frame.
    pub spawned: u32,
    /// Batches cut short by the particle cap.
    pub rejected_batches: u32,
    /// Particles dropped because their lifetime ran out.
    pub expired: usize,
    /// Sources added by launchers this frame.
    pub launched_sources: usize,
    /// Sources removed because their lifetime ran out.
    pub retired_sources: usize,
    /// Images resolved this frame.
    pub resolved: usize,
    /// Resolved images whose center is on screen.
    pub visible: usize,
    /// Live particles after the frame.
    pub live: usize,
}

/// Sources, particles and the shared image cache.
pub struct Scene {
    bounds: Rect,
    gravity: Vec2,
    max_particles: usize,
    sources: Vec<Source>,
    launchers: Vec<Launcher>,
    next_source_id: SourceId,
    particles: Vec<Particle>,
    staged: Vec<Particle>,
    cache: SharedImageCache,
    images: Box<dyn ImageFactory>,
    frame: u64,
}

impl Scene {
    /// An empty scene using the built-in tagged image factory.
    #[must_use]
    pub fn new(bounds: Rect) -> Self {
        Self {
            bounds,
            gravity: Vec2::ZERO,
            max_particles: DEFAULT_MAX_PARTICLES,
            sources: Vec::new(),
            launchers: Vec::new(),
            next_source_id: 0,
            particles: Vec::new(),
            staged: Vec::new(),
            cache: ImageCache::shared(),
            images: Box::new(TaggedImageFactory::default()),
            frame: 0,
        }
    }

    /// A scene running a single preset from the middle of `bounds`.
    ///
    /// # Errors
    ///
    /// Any build error from the preset.
    pub fn from_preset(preset: &EffectPreset, bounds: Rect) -> ParticleResult<Self> {
        let name = preset.name.clone().unwrap_or_else(|| "preset".to_owned());
        let source = Source::new(
            name,
            preset.build_emitter()?,
            bounds.center(),
            preset.build_lifecycle()?,
            preset.build_lifetime()?,
        );
        Ok(Self::new(bounds).with_source(source))
    }

    /// Sets a constant acceleration on every particle.
    #[must_use]
    pub fn with_gravity(mut self, gravity: Vec2) -> Self {
        self.gravity = gravity;
        self
    }

    /// Caps live plus staged particles.
    #[must_use]
    pub fn with_max_particles(mut self, max: usize) -> Self {
        self.max_particles = max;
        self
    }

    /// Shares an existing cache.
    #[must_use]
    pub fn with_cache(mut self, cache: SharedImageCache) -> Self {
        self.cache = cache;
        self
    }

    /// Replaces the image factory.
    #[must_use]
    pub fn with_images(mut self, images: Box<dyn ImageFactory>) -> Self {
        self.images = images;
        self
    }

    /// Adds a source.
    #[must_use]
    pub fn with_source(mut self, source: Source) -> Self {
        self.add_source(source);
        self
    }

    /// Adds a launcher.
    #[must_use]
    pub fn with_launcher(mut self, launcher: Launcher) -> Self {
        self.launchers.push(launcher);
        self
    }

    /// Adds a source, assigning it the next id.
    pub fn add_source(&mut self, mut source: Source) -> SourceId {
        source.id = self.next_source_id;
        self.next_source_id += 1;
        let id = source.id;
        self.sources.push(source);
        id
    }

    /// Runs one frame.
    ///
    /// A full particle store only cuts the batch short (logged, counted in
    /// the report); image generation errors abort the frame.
    ///
    /// # Errors
    ///
    /// Emitter errors other than factory failures, and image generation
    /// errors.
    pub fn step(&mut self, dt: f32) -> ParticleResult<FrameReport> {
        let mut report = FrameReport {
            frame: self.frame,
            ..FrameReport::default()
        };

        // 0. Launchers
        let mut launched = Vec::new();
        for launcher in &mut self.launchers {
            if let Some(wave) = launcher.poll(dt)? {
                launched.extend(wave);
            }
        }
        report.launched_sources = launched.len();
        for source in launched {
            self.add_source(source);
        }

        // 1. Emitters
        let bounds = self.bounds;
        let sources_before = self.sources.len();
        self.sources.retain_mut(|source| {
            source.advance(dt, bounds);
            if source.is_expired() {
                tracing::debug!(
                    source = %source.name,
                    emitted = source.emitter.total_emitted(),
                    "source retired"
                );
                return false;
            }
            true
        });
        report.retired_sources = sources_before - self.sources.len();

        let live = self.particles.len();
        let max_particles = self.max_particles;
        for source in &mut self.sources {
            let ctx = source.context();
            let template = &source.template;
            let lifetime = source.particle_lifetime;
            let id = source.id;
            let momentum_scale = source.momentum_scale;
            let staged = &mut self.staged;
            let mut factory = |req: SpawnRequest| -> Result<(), FactoryError> {
                if live + staged.len() >= max_particles {
                    return Err(FactoryError::new(format!(
                        "particle cap of {max_particles} reached"
                    )));
                }
                staged.push(Particle {
                    position: req.position,
                    velocity: req.velocity * momentum_scale,
                    lifetime,
                    lifecycle: template.clone(),
                    source: id,
                });
                Ok(())
            };
            match source.emitter.update(dt, &ctx, &mut factory) {
                Ok(outcome) => report.spawned += outcome.count(),
                Err(ParticleError::Factory { spawned, .. }) => {
                    report.spawned += spawned;
                    report.rejected_batches += 1;
                }
                Err(e) => return Err(e),
            }
        }

        // 2. Lifecycles
        let before = self.particles.len();
        self.particles.retain_mut(|p| {
            p.lifetime.advance(dt);
            p.lifetime.is_hot() || p.lifecycle.config().cycle
        });
        report.expired = before - self.particles.len();

        let gravity = self.gravity;
        for p in &mut self.particles {
            p.velocity += gravity * dt;
            p.position += p.velocity * dt;
            p.lifecycle.advance(&mut p.lifetime);
            let resolved = p.lifecycle.resolve(p.position, &self.cache, &*self.images)?;
            report.resolved += 1;
            if self.bounds.contains(resolved.bounds.center()) {
                report.visible += 1;
            }
        }

        // 3. Commit
        self.particles.append(&mut self.staged);
        report.live = self.particles.len();
        self.frame += 1;
        Ok(report)
    }

    /// Live particles.
    #[must_use]
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Sources.
    #[must_use]
    pub fn sources(&self) -> &[Source] {
        &self.sources
    }

    /// Launchers.
    #[must_use]
    pub fn launchers(&self) -> &[Launcher] {
        &self.launchers
    }

    /// The shared image cache.
    #[must_use]
    pub fn cache(&self) -> &SharedImageCache {
        &self.cache
    }

    /// Scene bounds.
    #[must_use]
    pub const fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Frames stepped so far.
    #[must_use]
    pub const fn frame(&self) -> u64 {
        self.frame
    }
}

impl std::fmt::Debug for Scene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scene")
            .field("bounds", &self.bounds)
            .field("sources", &self.sources.len())
            .field("launchers", &self.launchers.len())
            .field("particles", &self.particles.len())
            .field("cache", &self.cache)
            .field("frame", &self.frame)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use swirl_particles::{EmitterConfig, LifecycleConfig, ZonePoint, ZoneRandom};

    fn point_source(rate: f32) -> Source {
        let zone = ZonePoint::new(10.0, 0.0, 0.0, 360.0)
            .unwrap()
            .with_random(ZoneRandom::seeded(1));
        let config = EmitterConfig::default().with_rates(rate, rate).with_tick_interval(0.1);
        Source::new(
            "test",
            Emitter::new(config, Box::new(zone)).unwrap(),
            Vec2::new(50.0, 50.0),
            Lifecycle::new(LifecycleConfig::new("solid")).unwrap(),
            Cooldown::new(0.25).unwrap(),
        )
    }

    #[test]
    fn test_new_particles_wait_one_frame() {
        let mut scene = Scene::new(Rect::new(0.0, 0.0, 100.0, 100.0)).with_source(point_source(3.0));

        let first = scene.step(0.1).unwrap();
        assert_eq!(first.spawned, 3);
        assert_eq!(first.resolved, 0);
        assert_eq!(first.live, 3);
        assert!(scene.particles().iter().all(|p| p.lifecycle.t() == 0.0));

        let second = scene.step(0.1).unwrap();
        assert_eq!(second.resolved, 3);
        assert!(scene.particles()[..3].iter().all(|p| p.lifecycle.t() > 0.0));
    }

    #[test]
    fn test_expired_particles_are_dropped() {
        let mut scene = Scene::new(Rect::new(0.0, 0.0, 100.0, 100.0)).with_source(point_source(1.0));
        let mut expired = 0;
        for _ in 0..10 {
            expired += scene.step(0.1).unwrap().expired;
        }
        assert!(expired > 0);
        // 0.25s lifetime at 0.1s per frame: at most three generations alive.
        assert!(scene.particles().len() <= 3);
    }

    #[test]
    fn test_source_lifetime_drives_rate_and_retires() {
        let zone = ZonePoint::new(10.0, 0.0, 0.0, 360.0)
            .unwrap()
            .with_random(ZoneRandom::seeded(2));
        let config = EmitterConfig::default().with_rates(0.0, 10.0).with_tick_interval(0.1);
        let source = Source::new(
            "ramp",
            Emitter::new(config, Box::new(zone)).unwrap(),
            Vec2::new(50.0, 50.0),
            Lifecycle::new(LifecycleConfig::new("solid")).unwrap(),
            Cooldown::new(0.25).unwrap(),
        )
        .with_lifetime(1.0)
        .unwrap();
        let mut scene = Scene::new(Rect::new(0.0, 0.0, 100.0, 100.0)).with_source(source);

        // 0.25 of the source's life has passed when the first batch fires.
        let first = scene.step(0.25).unwrap();
        assert_eq!(first.spawned, 2);
        assert_eq!(scene.sources()[0].age(), Some(0.25));
        let second = scene.step(0.5).unwrap();
        assert_eq!(second.spawned, 7);

        let last = scene.step(0.5).unwrap();
        assert_eq!(last.spawned, 0);
        assert_eq!(last.retired_sources, 1);
        assert!(scene.sources().is_empty());
    }

    #[test]
    fn test_launcher_waves_get_fresh_ids() {
        let launcher =
            Launcher::new("waves", 1.0, |_wave| Ok(vec![point_source(2.0), point_source(2.0)])).unwrap();
        let mut scene = Scene::new(Rect::new(0.0, 0.0, 100.0, 100.0)).with_launcher(launcher);

        let first = scene.step(0.25).unwrap();
        assert_eq!(first.launched_sources, 2);
        assert_eq!(first.spawned, 4);
        let ids: Vec<SourceId> = scene.sources().iter().map(Source::id).collect();
        assert_eq!(ids, vec![0, 1]);
        assert_eq!(scene.particles().iter().filter(|p| p.source == 1).count(), 2);

        for _ in 0..3 {
            assert_eq!(scene.step(0.25).unwrap().launched_sources, 0);
        }
        let wave = scene.step(0.25).unwrap();
        assert_eq!(wave.launched_sources, 2);
        assert_eq!(scene.launchers()[0].waves(), 2);
        assert_eq!(scene.sources().last().map(Source::id), Some(3));
    }

    #[test]
    fn test_momentum_scale() {
        let zone = ZonePoint::new(10.0, 0.0, 0.0, 0.0)
            .unwrap()
            .with_random(ZoneRandom::seeded(1));
        let config = EmitterConfig::default().with_rates(1.0, 1.0);
        let source = Source::new(
            "fast",
            Emitter::new(config, Box::new(zone)).unwrap(),
            Vec2::new(50.0, 50.0),
            Lifecycle::new(LifecycleConfig::new("solid")).unwrap(),
            Cooldown::new(1.0).unwrap(),
        )
        .with_momentum_scale(3.0);
        let mut scene = Scene::new(Rect::new(0.0, 0.0, 100.0, 100.0)).with_source(source);
        scene.step(0.0).unwrap();
        assert_eq!(scene.particles()[0].velocity, Vec2::new(30.0, 0.0));
    }

    #[test]
    fn test_particle_cap_cuts_batches() {
        let mut scene = Scene::new(Rect::new(0.0, 0.0, 100.0, 100.0))
            .with_source(point_source(10.0))
            .with_max_particles(4);
        let report = scene.step(0.1).unwrap();
        assert_eq!(report.spawned, 4);
        assert_eq!(report.rejected_batches, 1);
        assert_eq!(report.live, 4);
    }
}
