//! Pluggable random sources.
//!
//! Zones pull every random number through [`RandomSource`], one source for
//! positions and one for momentum. Swapping a source changes the
//! distribution (or makes a test deterministic) without touching the zone.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// A zero-argument source of samples in `[0, 1)`.
pub trait RandomSource: Send {
    /// Returns the next sample.
    fn sample(&mut self) -> f32;
}

/// Uniform samples from a ChaCha8 stream.
///
/// Same seed, same sequence, on every platform.
#[derive(Debug, Clone)]
pub struct SeededRandom {
    rng: ChaCha8Rng,
}

impl SeededRandom {
    /// Creates a deterministic source.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Creates a source seeded from operating system entropy.
    #[must_use]
    pub fn from_entropy() -> Self {
        Self {
            rng: ChaCha8Rng::from_entropy(),
        }
    }
}

impl Default for SeededRandom {
    fn default() -> Self {
        Self::from_entropy()
    }
}

impl RandomSource for SeededRandom {
    #[inline]
    fn sample(&mut self) -> f32 {
        self.rng.gen::<f32>()
    }
}

/// Seeded from operating system entropy on the first sample, not before.
///
/// Lets a zone carry a ready-to-use default source that costs nothing when
/// it is replaced before use.
#[derive(Debug, Clone, Default)]
pub struct EntropyRandom {
    inner: Option<SeededRandom>,
}

impl EntropyRandom {
    /// An unseeded source.
    #[must_use]
    pub const fn new() -> Self {
        Self { inner: None }
    }

    /// True once the first sample has been drawn.
    #[must_use]
    pub const fn is_seeded(&self) -> bool {
        self.inner.is_some()
    }
}

impl RandomSource for EntropyRandom {
    #[inline]
    fn sample(&mut self) -> f32 {
        self.inner
            .get_or_insert_with(SeededRandom::from_entropy)
            .sample()
    }
}

/// Always returns the same value. Clamped into `[0, 1)` at construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedRandom(f32);

impl FixedRandom {
    /// Largest value below one.
    const MAX: f32 = 1.0 - f32::EPSILON;

    /// Creates a constant source.
    #[must_use]
    pub fn new(value: f32) -> Self {
        Self(value.clamp(0.0, Self::MAX))
    }
}

impl RandomSource for FixedRandom {
    #[inline]
    fn sample(&mut self) -> f32 {
        self.0
    }
}

/// Replays a fixed list of samples, wrapping around at the end.
#[derive(Debug, Clone, PartialEq)]
pub struct SequenceRandom {
    values: Vec<f32>,
    cursor: usize,
}

impl SequenceRandom {
    /// Creates a replaying source. An empty list yields zeros.
    #[must_use]
    pub fn new(values: impl Into<Vec<f32>>) -> Self {
        let values = values
            .into()
            .into_iter()
            .map(|v| v.clamp(0.0, FixedRandom::MAX))
            .collect();
        Self { values, cursor: 0 }
    }
}

impl RandomSource for SequenceRandom {
    fn sample(&mut self) -> f32 {
        let Some(&value) = self.values.get(self.cursor) else {
            return 0.0;
        };
        self.cursor = (self.cursor + 1) % self.values.len();
        value
    }
}

/// Adapts a closure into a [`RandomSource`], e.g. for non-uniform
/// distributions.
pub struct FnRandom<F>(pub F);

impl<F> RandomSource for FnRandom<F>
where
    F: FnMut() -> f32 + Send,
{
    #[inline]
    fn sample(&mut self) -> f32 {
        (self.0)()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_is_deterministic() {
        let mut a = SeededRandom::new(42);
        let mut b = SeededRandom::new(42);
        for _ in 0..100 {
            let (x, y) = (a.sample(), b.sample());
            assert_eq!(x, y);
            assert!((0.0..1.0).contains(&x));
        }
    }

    #[test]
    fn test_entropy_seeds_on_first_sample() {
        let mut src = EntropyRandom::new();
        assert!(!src.is_seeded());
        assert!((0.0..1.0).contains(&src.sample()));
        assert!(src.is_seeded());
    }

    #[test]
    fn test_fixed_is_clamped() {
        assert_eq!(FixedRandom::new(0.25).sample(), 0.25);
        assert_eq!(FixedRandom::new(-4.0).sample(), 0.0);
        assert!(FixedRandom::new(1.0).sample() < 1.0);
    }

    #[test]
    fn test_sequence_wraps() {
        let mut seq = SequenceRandom::new(vec![0.1, 0.2]);
        assert_eq!(seq.sample(), 0.1);
        assert_eq!(seq.sample(), 0.2);
        assert_eq!(seq.sample(), 0.1);

        let mut empty = SequenceRandom::new(Vec::new());
        assert_eq!(empty.sample(), 0.0);
    }

    #[test]
    fn test_closure_source() {
        let mut n = 0.0;
        let mut src = FnRandom(move || {
            n += 0.5;
            n % 1.0
        });
        assert_eq!(src.sample(), 0.5);
        assert_eq!(src.sample(), 0.0);
    }
}
