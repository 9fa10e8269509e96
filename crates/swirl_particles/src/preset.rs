//! # Effect Presets
//!
//! A complete effect (emitter, zone, particle look) described in TOML:
//!
//! ```toml
//! name = "fountain"
//! seed = 7
//!
//! [emitter]
//! spawn_rate_start = 2.0
//! spawn_rate_end = 6.0
//! rate_easing = "out_quad"
//! tick_interval = 0.05
//! total_emit_budget = 400
//! inherit = 3
//!
//! [zone]
//! kind = "point"
//! speed = 120.0
//! variance = 0.25
//! phi0 = 250.0
//! phi1 = 290.0
//!
//! [particle]
//! lifetime = 1.5
//! tag = "bubble"
//! size = { start = 4.0, end = 16.0, easing = "out_cubic" }
//! alpha = { start = 255.0, end = 0.0 }
//! ```
//!
//! Everything is validated on load, so a preset that parses also builds.

use std::path::Path;

use serde::{Deserialize, Serialize};
use swirl_core::Cooldown;

use crate::emitter::{Emitter, EmitterConfig};
use crate::error::{ParticleError, ParticleResult};
use crate::lifecycle::{Lifecycle, LifecycleConfig};
use crate::zone::ZoneShape;

/// The `[particle]` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticleSpec {
    /// Seconds each particle lives (one cycle for cycling particles).
    #[serde(default = "default_lifetime")]
    pub lifetime: f32,
    /// Envelopes and tag.
    #[serde(flatten)]
    pub lifecycle: LifecycleConfig,
}

fn default_lifetime() -> f32 {
    1.0
}

/// A complete effect description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EffectPreset {
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
    /// Seed for the zone's random sources; `None` seeds from entropy.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Rate controller settings.
    #[serde(default)]
    pub emitter: EmitterConfig,
    /// Spawn shape.
    pub zone: ZoneShape,
    /// Particle look.
    pub particle: ParticleSpec,
}

impl EffectPreset {
    /// Parses and validates a preset.
    ///
    /// # Errors
    ///
    /// [`ParticleError::PresetParse`] for malformed TOML, otherwise the first
    /// validation error.
    pub fn from_toml_str(source: &str) -> ParticleResult<Self> {
        let preset: Self =
            toml::from_str(source).map_err(|e| ParticleError::PresetParse(e.to_string()))?;
        preset.validate()?;
        Ok(preset)
    }

    /// Reads, parses and validates a preset file.
    ///
    /// # Errors
    ///
    /// [`ParticleError::Io`] if the file cannot be read, then as
    /// [`EffectPreset::from_toml_str`].
    pub fn from_file(path: impl AsRef<Path>) -> ParticleResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .map_err(|e| ParticleError::Io(format!("{}: {e}", path.display())))?;
        let preset = Self::from_toml_str(&source)?;
        tracing::info!(
            path = %path.display(),
            name = preset.name.as_deref().unwrap_or("unnamed"),
            "effect preset loaded"
        );
        Ok(preset)
    }

    /// Checks every section.
    ///
    /// # Errors
    ///
    /// [`ParticleError::InvalidConfig`] naming the offending field.
    pub fn validate(&self) -> ParticleResult<()> {
        self.emitter.validate()?;
        self.zone.validate()?;
        self.particle.lifecycle.validate()?;
        let lifetime = self.particle.lifetime;
        if !lifetime.is_finite() || lifetime <= 0.0 {
            return Err(ParticleError::invalid(
                "particle.lifetime",
                format!("must be > 0, got {lifetime}"),
            ));
        }
        Ok(())
    }

    /// Builds the emitter with its zone.
    ///
    /// # Errors
    ///
    /// Validation errors from the zone or emitter.
    pub fn build_emitter(&self) -> ParticleResult<Emitter> {
        let zone = self.zone.build(self.seed)?;
        Emitter::new(self.emitter.clone(), zone)
    }

    /// Builds a fresh lifecycle for one particle.
    ///
    /// # Errors
    ///
    /// Validation errors from the envelopes.
    pub fn build_lifecycle(&self) -> ParticleResult<Lifecycle> {
        Lifecycle::new(self.particle.lifecycle.clone())
    }

    /// Builds a fresh lifetime countdown for one particle.
    ///
    /// # Errors
    ///
    /// [`ParticleError::Core`] for an invalid lifetime.
    pub fn build_lifetime(&self) -> ParticleResult<Cooldown> {
        Ok(Cooldown::new(self.particle.lifetime)?)
    }

    /// The tag particles of this effect render with.
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.particle.lifecycle.tag
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emitter::MomentumInheritance;
    use crate::lifecycle::{Envelope, Repeat};
    use swirl_core::Ease;

    const FOUNTAIN: &str = r#"
        name = "fountain"
        seed = 7

        [emitter]
        spawn_rate_start = 2.0
        spawn_rate_end = 6
        rate_easing = "out_quad"
        tick_interval = 0.05
        total_emit_budget = 400
        inherit = 2

        [zone]
        kind = "point"
        speed = 120.0
        variance = 0.25
        phi0 = 250.0
        phi1 = 290.0

        [particle]
        lifetime = 1.5
        tag = "bubble"
        size = { start = 4.0, end = 16.0, easing = "out_cubic" }
        alpha = { start = 255.0, end = 0.0, repeat = "ping_pong", period = 0.5 }
    "#;

    #[test]
    fn test_parse_full_preset() {
        let preset = EffectPreset::from_toml_str(FOUNTAIN).unwrap();
        assert_eq!(preset.name.as_deref(), Some("fountain"));
        assert_eq!(preset.emitter.spawn_rate_end, 6.0);
        assert_eq!(preset.emitter.rate_easing, Ease::OutQuad);
        assert_eq!(preset.emitter.total_emit_budget, Some(400));
        assert_eq!(preset.emitter.momentum_inheritance, MomentumInheritance::ZONE);
        assert_eq!(
            preset.zone,
            ZoneShape::Point {
                speed: 120.0,
                variance: 0.25,
                phi0: 250.0,
                phi1: 290.0
            }
        );
        assert_eq!(preset.particle.lifetime, 1.5);
        assert_eq!(preset.tag(), "bubble");
        assert_eq!(
            preset.particle.lifecycle.alpha,
            Envelope::new(255.0, 0.0).with_repeat(Repeat::PingPong, 0.5)
        );

        let emitter = preset.build_emitter().unwrap();
        assert_eq!(emitter.remaining(), Some(400));
        let lifecycle = preset.build_lifecycle().unwrap();
        assert_eq!(lifecycle.size(), 4.0);
        assert_eq!(preset.build_lifetime().unwrap().duration(), 1.5);
    }

    #[test]
    fn test_defaults() {
        let preset = EffectPreset::from_toml_str(
            r#"
            [zone]
            kind = "circle"
            r1 = 32.0

            [particle]
            tag = "solid"
            "#,
        )
        .unwrap();
        assert_eq!(preset.emitter, EmitterConfig::default());
        assert_eq!(
            preset.zone,
            ZoneShape::Circle {
                r0: 0.0,
                r1: 32.0,
                phi0: 0.0,
                phi1: 360.0
            }
        );
        assert_eq!(preset.particle.lifetime, 1.0);
        assert_eq!(preset.particle.lifecycle, LifecycleConfig::new("solid"));
    }

    #[test]
    fn test_rejects_bad_documents() {
        let parse_errors = [
            // unknown zone kind
            "[zone]\nkind = \"spiral\"\n[particle]\ntag = \"solid\"",
            // unknown emitter field
            "[emitter]\nrate = 3\n[zone]\nkind = \"rect\"\nwidth = 1\nheight = 1\n[particle]\ntag = \"solid\"",
            // inheritance bit out of range
            "[emitter]\ninherit = 4\n[zone]\nkind = \"rect\"\nwidth = 1\nheight = 1\n[particle]\ntag = \"solid\"",
        ];
        for doc in parse_errors {
            assert!(
                matches!(EffectPreset::from_toml_str(doc), Err(ParticleError::PresetParse(_))),
                "{doc}"
            );
        }

        let invalid = [
            "[emitter]\ntick_interval = 0.0\n[zone]\nkind = \"rect\"\nwidth = 1\nheight = 1\n[particle]\ntag = \"solid\"",
            "[zone]\nkind = \"rect\"\nwidth = -1\nheight = 1\n[particle]\ntag = \"solid\"",
            "[zone]\nkind = \"rect\"\nwidth = 1\nheight = 1\n[particle]\ntag = \"solid\"\nlifetime = 0.0",
        ];
        for doc in invalid {
            assert!(
                matches!(
                    EffectPreset::from_toml_str(doc),
                    Err(ParticleError::InvalidConfig { .. })
                ),
                "{doc}"
            );
        }
    }

    #[test]
    fn test_missing_file() {
        let err = EffectPreset::from_file("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, ParticleError::Io(_)));
    }
}
