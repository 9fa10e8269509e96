//! Built-in demo scenes.
//!
//! All scenes use an 800x600 y-down screen. On screen, positive angles turn
//! clockwise, so "up" is 270 degrees.

use swirl_particles::swirl_core::{Cooldown, Ease, RandomSource, Rect, SeededRandom, Vec2};
use swirl_particles::{
    Emitter, EmitterConfig, Envelope, Lifecycle, LifecycleConfig, MomentumInheritance,
    ParticleResult, Repeat, ZoneBeam, ZoneCircle, ZoneLine, ZonePoint, ZoneRandom, ZoneRect,
};

use crate::scene::{Launcher, Motion, Scene, Source};

/// Screen the demos are laid out for.
pub const SCREEN: Rect = Rect::new(0.0, 0.0, 800.0, 600.0);

/// The built-in scenes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum Demo {
    /// Bubbles spraying upwards from a point, pulled back down by gravity.
    Point,
    /// Spinning squares shed along a horizontal beam.
    Beam,
    /// Repeating radial bursts from an orbiting emitter.
    Ring,
    /// Slanted rain falling from a line across the top.
    Rain,
    /// Ripples that grow, fade and start over forever.
    Pond,
    /// Three blasts of growing size, set off every five seconds.
    Explosions,
    /// A volley of five shots every second, each trailing wider smoke.
    Bullet,
}

impl Demo {
    /// Every demo, in menu order.
    pub const ALL: [Self; 7] = [
        Self::Point,
        Self::Beam,
        Self::Ring,
        Self::Rain,
        Self::Pond,
        Self::Explosions,
        Self::Bullet,
    ];

    /// Lower-case name, as accepted on the command line.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Point => "point",
            Self::Beam => "beam",
            Self::Ring => "ring",
            Self::Rain => "rain",
            Self::Pond => "pond",
            Self::Explosions => "explosions",
            Self::Bullet => "bullet",
        }
    }

    /// Builds the scene. The same seed gives the same run.
    ///
    /// # Errors
    ///
    /// Only on invalid built-in parameters.
    pub fn build(self, seed: u64) -> ParticleResult<Scene> {
        match self {
            Self::Point => point(seed),
            Self::Beam => beam(seed),
            Self::Ring => ring(seed),
            Self::Rain => rain(seed),
            Self::Pond => pond(seed),
            Self::Explosions => explosions(seed),
            Self::Bullet => bullet(seed),
        }
    }
}

fn point(seed: u64) -> ParticleResult<Scene> {
    let zone = ZonePoint::new(260.0, 0.3, 250.0, 290.0)?.with_random(ZoneRandom::seeded(seed));
    let config = EmitterConfig::default()
        .with_rates(2.0, 2.0)
        .with_tick_interval(0.02)
        .with_inheritance(MomentumInheritance::ZONE);
    let particle = LifecycleConfig::new("bubble")
        .with_size(Envelope::new(4.0, 16.0).with_easing(Ease::OutCubic))
        .with_alpha(Envelope::new(255.0, 0.0).with_easing(Ease::InQuad));

    let source = Source::new(
        "fountain",
        Emitter::new(config, Box::new(zone))?,
        Vec2::new(400.0, 560.0),
        Lifecycle::new(particle)?,
        Cooldown::new(2.0)?,
    );
    Ok(Scene::new(SCREEN)
        .with_gravity(Vec2::new(0.0, 220.0))
        .with_source(source))
}

fn beam(seed: u64) -> ParticleResult<Scene> {
    let zone = ZoneBeam::new(Vec2::new(600.0, 0.0), 12.0)?.with_random(ZoneRandom::seeded(seed));
    let config = EmitterConfig::default().with_rates(6.0, 6.0).with_tick_interval(0.05);
    let particle = LifecycleConfig::new("squabble")
        .with_size(Envelope::new(8.0, 2.0))
        .with_alpha(Envelope::new(255.0, 0.0))
        .with_rotation(Envelope::new(0.0, 360.0).with_easing(Ease::OutQuad));

    let source = Source::new(
        "beam",
        Emitter::new(config, Box::new(zone))?,
        Vec2::new(100.0, 300.0),
        Lifecycle::new(particle)?,
        Cooldown::new(1.0)?,
    )
    .with_velocity(Vec2::new(0.0, 40.0))
    .with_motion(Motion::Drift);
    Ok(Scene::new(SCREEN).with_source(source))
}

fn ring(seed: u64) -> ParticleResult<Scene> {
    let zone = ZoneCircle::new(0.0, 90.0, 0.0, 360.0)?.with_random(ZoneRandom::seeded(seed));
    let config = EmitterConfig::default()
        .with_rates(40.0, 0.0)
        .with_easing(Ease::OutQuad)
        .with_tick_interval(0.05)
        .with_duration(0.5)
        .with_budget(150);
    let particle = LifecycleConfig::new("solid")
        .with_size(Envelope::new(6.0, 1.0))
        .with_alpha(Envelope::new(255.0, 0.0).with_easing(Ease::OutSine));

    let source = Source::new(
        "burst",
        Emitter::new(config, Box::new(zone))?,
        SCREEN.center(),
        Lifecycle::new(particle)?,
        Cooldown::new(1.2)?,
    )
    .with_motion(Motion::Orbit {
        center: SCREEN.center(),
        radius: 150.0,
        degrees_per_second: 45.0,
        angle: 0.0,
    })
    .repeating(2.0)?;
    Ok(Scene::new(SCREEN).with_source(source))
}

fn rain(seed: u64) -> ParticleResult<Scene> {
    let zone = ZoneLine::new(Vec2::new(800.0, 0.0), Vec2::new(40.0, 420.0), 0.25)?
        .with_random(ZoneRandom::seeded(seed));
    let config = EmitterConfig::default()
        .with_rates(8.0, 8.0)
        .with_tick_interval(0.02)
        .with_inheritance(MomentumInheritance::ZONE);
    let particle = LifecycleConfig::new("solid")
        .with_size(Envelope::constant(3.0))
        .with_alpha(Envelope::new(200.0, 120.0));

    let source = Source::new(
        "clouds",
        Emitter::new(config, Box::new(zone))?,
        Vec2::new(-40.0, -10.0),
        Lifecycle::new(particle)?,
        Cooldown::new(1.5)?,
    );
    Ok(Scene::new(SCREEN).with_source(source))
}

/// Number of ripples in the pond.
pub const POND_RIPPLES: u32 = 12;

fn pond(seed: u64) -> ParticleResult<Scene> {
    let zone = ZoneRect::new(500.0, 300.0)?.with_random(ZoneRandom::seeded(seed));
    let config = EmitterConfig::default()
        .with_rates(1.0, 1.0)
        .with_tick_interval(0.4)
        .with_budget(POND_RIPPLES)
        .with_inheritance(MomentumInheritance::empty());
    let particle = LifecycleConfig::new("bubble")
        .with_size(Envelope::new(2.0, 48.0).with_easing(Ease::OutSine))
        .with_alpha(Envelope::new(255.0, 0.0))
        .cycling(true);

    let source = Source::new(
        "raindrops",
        Emitter::new(config, Box::new(zone))?,
        SCREEN.center(),
        Lifecycle::new(particle)?,
        Cooldown::new(3.0)?,
    );
    Ok(Scene::new(SCREEN).with_source(source))
}

/// Blasts per explosions wave.
pub const EXPLOSION_BLASTS: u32 = 3;

fn explosions(seed: u64) -> ParticleResult<Scene> {
    let step = SCREEN.width / 6.0;
    let launcher = Launcher::new("detonator", 5.0, move |wave| {
        (0..EXPLOSION_BLASTS)
            .map(|i| -> ParticleResult<Source> {
                // 8, 16, 32
                let max_size = (8_u32 << i) as f32;
                let zone = ZoneCircle::disc(2.0 * max_size)?.with_random(ZoneRandom::seeded(
                    seed ^ ((u64::from(wave) << 8) | u64::from(i)),
                ));
                let config = EmitterConfig::default().with_rates(2.0, 5.0).with_tick_interval(0.1);
                let particle = LifecycleConfig::new("bubble")
                    .with_size(Envelope::new(4.0, 2.0 * max_size).with_easing(Ease::OutQuint))
                    .with_alpha(Envelope::new(255.0, 0.0).with_easing(Ease::OutQuint));

                Source::new(
                    format!("blast-{i}"),
                    Emitter::new(config, Box::new(zone))?,
                    Vec2::new(step + 2.0 * step * i as f32, SCREEN.center().y),
                    Lifecycle::new(particle)?,
                    Cooldown::new(2.0)?,
                )
                .with_momentum_scale(3.0)
                .with_lifetime(1.0)
            })
            .collect()
    })?;
    Ok(Scene::new(SCREEN).with_launcher(launcher))
}

/// Shots per bullet volley.
pub const BULLET_SHOTS: u32 = 5;

fn bullet(seed: u64) -> ParticleResult<Scene> {
    let step = SCREEN.height / BULLET_SHOTS as f32;
    let mut jitter = SeededRandom::new(seed);
    let launcher = Launcher::new("gun", 1.0, move |wave| {
        // Triangular on [-25, 25], peaking at 0.
        let dy = 50.0 * ((jitter.sample() + jitter.sample()) / 2.0 - 0.5);
        (0..BULLET_SHOTS)
            .map(|i| -> ParticleResult<Source> {
                let max_size = 10.0 * (i + 1) as f32;
                let zone = ZoneCircle::disc(5.0 * i as f32)?.with_random(ZoneRandom::seeded(
                    seed ^ ((u64::from(wave) << 8) | u64::from(i)),
                ));
                let config = EmitterConfig::default().with_rates(1.0, 1.0);
                let particle = LifecycleConfig::new("squabble")
                    .with_size(
                        Envelope::new((max_size / 8.0).max(2.0), max_size)
                            .with_repeat(Repeat::Once, 0.75),
                    )
                    .with_alpha(Envelope::new(255.0, 0.0).with_repeat(Repeat::Once, 0.75));

                Source::new(
                    format!("shot-{i}"),
                    Emitter::new(config, Box::new(zone))?,
                    Vec2::new(50.0, (i as f32 + 0.5) * step + dy),
                    Lifecycle::new(particle)?,
                    Cooldown::new(1.0)?,
                )
                .with_velocity(Vec2::new(100.0, 0.0))
                .with_motion(Motion::Drift)
                .with_lifetime(5.0)
            })
            .collect()
    })?;
    Ok(Scene::new(SCREEN).with_launcher(launcher))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip_through_clap() {
        use clap::ValueEnum;
        for demo in Demo::ALL {
            assert_eq!(Demo::from_str(demo.name(), false), Ok(demo));
        }
    }

    #[test]
    fn test_every_demo_builds() {
        for demo in Demo::ALL {
            let scene = demo.build(1).unwrap();
            assert_eq!(
                scene.sources().len() + scene.launchers().len(),
                1,
                "{}",
                demo.name()
            );
        }
    }
}
