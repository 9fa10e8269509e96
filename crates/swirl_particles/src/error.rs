//! # Particle Error Types
//!
//! All errors that can occur while configuring or running particle effects.
//! Budget exhaustion is NOT an error; see `TickOutcome::Exhausted`.

use swirl_core::CoreError;
use thiserror::Error;

/// Failure reported by an external collaborator (particle or image factory).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct FactoryError {
    message: String,
}

impl FactoryError {
    /// Creates a factory error with a human-readable reason.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The reason given by the factory.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Errors that can occur in the particle system.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParticleError {
    /// Invalid construction parameters. Raised at build time, never per tick.
    #[error("invalid configuration: {field}: {reason}")]
    InvalidConfig {
        /// The offending parameter.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },

    /// The particle factory failed mid-batch. Earlier spawns of the batch
    /// stand; the rest of the batch is abandoned.
    #[error("particle factory failed after {spawned} of {requested} spawns: {source}")]
    Factory {
        /// Spawns that succeeded before the failure.
        spawned: u32,
        /// Size of the batch.
        requested: u32,
        /// The factory's error.
        #[source]
        source: FactoryError,
    },

    /// The image factory failed; nothing was inserted into the cache.
    #[error("image generation failed for tag '{tag}': {source}")]
    ImageGeneration {
        /// Visual tag of the particle family.
        tag: String,
        /// The factory's error.
        #[source]
        source: FactoryError,
    },

    /// Error bubbled up from the core primitives.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Preset file could not be parsed.
    #[error("preset parse error: {0}")]
    PresetParse(String),

    /// Preset file could not be read.
    #[error("preset i/o error: {0}")]
    Io(String),
}

impl ParticleError {
    /// Shorthand for [`ParticleError::InvalidConfig`].
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field,
            reason: reason.into(),
        }
    }
}

/// Result type for particle operations.
pub type ParticleResult<T> = Result<T, ParticleError>;

/// Fails with [`ParticleError::InvalidConfig`] unless `value` is finite.
pub(crate) fn ensure_finite(field: &'static str, value: f32) -> ParticleResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ParticleError::invalid(field, format!("must be finite, got {value}")))
    }
}

/// Fails with [`ParticleError::InvalidConfig`] unless `value` is finite and `>= 0`.
pub(crate) fn ensure_non_negative(field: &'static str, value: f32) -> ParticleResult<()> {
    ensure_finite(field, value)?;
    if value < 0.0 {
        return Err(ParticleError::invalid(field, format!("must be >= 0, got {value}")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = ParticleError::Factory {
            spawned: 2,
            requested: 5,
            source: FactoryError::new("store full"),
        };
        assert_eq!(
            err.to_string(),
            "particle factory failed after 2 of 5 spawns: store full"
        );

        let err = ParticleError::invalid("tick_interval", "must be > 0");
        assert_eq!(err.to_string(), "invalid configuration: tick_interval: must be > 0");
    }

    #[test]
    fn test_validation_helpers() {
        assert!(ensure_finite("x", 1.0).is_ok());
        assert!(ensure_finite("x", f32::NAN).is_err());
        assert!(ensure_non_negative("x", 0.0).is_ok());
        assert!(ensure_non_negative("x", -0.1).is_err());
    }
}
