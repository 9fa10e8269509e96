//! # Image Cache
//!
//! Particles of one family share a handful of visual states. The cache keys
//! every transformed image by a rounded signature, so thousands of
//! particles end up pointing at a few dozen `Arc<Image>`s.
//!
//! ## Guarantees
//!
//! - At most one generation per distinct [`ImageKey`] per cache.
//! - One base render per tag, reused by every variant of that tag.
//! - A failed generation inserts nothing; the next lookup retries.
//!
//! The whole check-then-generate runs under one lock. Generation is cheap
//! (small rasters) and lookups are hits almost all the time.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::{ParticleError, ParticleResult};
use crate::image::{Image, ImageFactory, MAX_IMAGE_SIZE};

/// Shared handle to one cache.
pub type SharedImageCache = Arc<ImageCache>;

/// Discretized transform signature.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageKey {
    /// Visual tag of the particle family.
    pub tag: String,
    /// Rotation in whole degrees, `0..360`.
    pub rotation: u16,
    /// Edge length in whole pixels, `1..=MAX_IMAGE_SIZE`.
    pub scale: u32,
    /// Opacity, `0..=255`.
    pub alpha: u8,
}

impl ImageKey {
    /// Rounds continuous lifecycle outputs into a key.
    ///
    /// Non-finite inputs fall back to the neutral bucket (0 degrees, 1 pixel,
    /// transparent). Scale is capped at [`MAX_IMAGE_SIZE`].
    #[must_use]
    pub fn quantize(tag: &str, rotation: f32, size: f32, alpha: f32) -> Self {
        let rotation = if rotation.is_finite() {
            rotation.round().rem_euclid(360.0) as u16 % 360
        } else {
            0
        };
        let scale = if size.is_finite() {
            size.round().clamp(1.0, MAX_IMAGE_SIZE as f32) as u32
        } else {
            1
        };
        let alpha = if alpha.is_finite() {
            alpha.round().clamp(0.0, 255.0) as u8
        } else {
            0
        };
        Self {
            tag: tag.to_owned(),
            rotation,
            scale,
            alpha,
        }
    }
}

/// Counters since construction (or the last [`ImageCache::clear`]).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups served from the cache.
    pub hits: u64,
    /// Lookups that had to generate.
    pub misses: u64,
    /// Base images rendered by a factory.
    pub base_generations: u64,
    /// Transformed variants derived from a base.
    pub variant_generations: u64,
    /// Generations that failed.
    pub failures: u64,
}

#[derive(Default)]
struct CacheInner {
    bases: HashMap<String, Arc<Image>>,
    variants: HashMap<ImageKey, Arc<Image>>,
    stats: CacheStats,
}

/// Lazily populated, never auto-evicted image cache.
#[derive(Default)]
pub struct ImageCache {
    inner: Mutex<CacheInner>,
}

impl ImageCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty cache behind an `Arc`.
    #[must_use]
    pub fn shared() -> SharedImageCache {
        Arc::new(Self::new())
    }

    /// Returns the image for `key`, generating it on first use.
    ///
    /// # Errors
    ///
    /// [`ParticleError::ImageGeneration`] if the factory fails. Nothing is
    /// cached for the key or its tag.
    pub fn get_or_generate<F>(&self, key: &ImageKey, factory: &F) -> ParticleResult<Arc<Image>>
    where
        F: ImageFactory + ?Sized,
    {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        if let Some(image) = inner.variants.get(key) {
            inner.stats.hits += 1;
            return Ok(Arc::clone(image));
        }
        inner.stats.misses += 1;

        let base = match inner.bases.get(&key.tag).cloned() {
            Some(base) => base,
            None => {
                let rendered = match factory.render_base(&key.tag) {
                    Ok(image) => image,
                    Err(source) => {
                        inner.stats.failures += 1;
                        tracing::warn!(tag = %key.tag, error = %source, "image generation failed");
                        return Err(ParticleError::ImageGeneration {
                            tag: key.tag.clone(),
                            source,
                        });
                    }
                };
                let base = Arc::new(rendered);
                inner.bases.insert(key.tag.clone(), Arc::clone(&base));
                inner.stats.base_generations += 1;
                tracing::debug!(tag = %key.tag, "base image generated");
                base
            }
        };

        let variant = Arc::new(
            base.scaled_to(key.scale)
                .rotated(f32::from(key.rotation))
                .with_alpha(key.alpha),
        );
        inner.variants.insert(key.clone(), Arc::clone(&variant));
        inner.stats.variant_generations += 1;
        tracing::trace!(
            tag = %key.tag,
            rotation = key.rotation,
            scale = key.scale,
            alpha = key.alpha,
            "image variant generated"
        );
        Ok(variant)
    }

    /// Cached image for `key`, without generating.
    #[must_use]
    pub fn get(&self, key: &ImageKey) -> Option<Arc<Image>> {
        self.inner.lock().variants.get(key).cloned()
    }

    /// True if `key` is cached.
    #[must_use]
    pub fn contains(&self, key: &ImageKey) -> bool {
        self.inner.lock().variants.contains_key(key)
    }

    /// Number of cached variants.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().variants.len()
    }

    /// True if no variant is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().variants.is_empty()
    }

    /// Number of cached base images.
    #[must_use]
    pub fn base_count(&self) -> usize {
        self.inner.lock().bases.len()
    }

    /// Snapshot of the counters.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        self.inner.lock().stats
    }

    /// Drops every entry and resets the counters.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        let dropped = inner.variants.len();
        *inner = CacheInner::default();
        tracing::debug!(dropped, "image cache cleared");
    }
}

impl std::fmt::Debug for ImageCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("ImageCache")
            .field("bases", &inner.bases.len())
            .field("variants", &inner.variants.len())
            .field("stats", &inner.stats)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FactoryError;
    use crate::image::{SolidImageFactory, WHITE};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingFactory {
        calls: AtomicUsize,
    }

    impl ImageFactory for CountingFactory {
        fn render_base(&self, _tag: &str) -> Result<Image, FactoryError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Image::filled(8, 8, WHITE))
        }
    }

    #[test]
    fn test_quantize() {
        let key = ImageKey::quantize("bubble", 359.6, 12.4, 254.7);
        assert_eq!((key.rotation, key.scale, key.alpha), (0, 12, 255));

        let key = ImageKey::quantize("bubble", -90.2, 0.2, 300.0);
        assert_eq!((key.rotation, key.scale, key.alpha), (270, 1, 255));

        let key = ImageKey::quantize("bubble", f32::NAN, f32::INFINITY, -4.0);
        assert_eq!((key.rotation, key.scale, key.alpha), (0, 1, 0));
    }

    #[test]
    fn test_huge_size_is_capped() {
        let key = ImageKey::quantize("solid", 0.0, 1.0e6, 255.0);
        assert_eq!(key.scale, MAX_IMAGE_SIZE);

        let cache = ImageCache::new();
        let image = cache
            .get_or_generate(&key, &SolidImageFactory::default())
            .unwrap();
        assert_eq!((image.width(), image.height()), (MAX_IMAGE_SIZE, MAX_IMAGE_SIZE));
    }

    #[test]
    fn test_one_generation_per_key() {
        let cache = ImageCache::new();
        let factory = CountingFactory {
            calls: AtomicUsize::new(0),
        };
        let a = ImageKey::quantize("dot", 0.0, 8.0, 255.0);
        let b = ImageKey::quantize("dot", 45.0, 8.0, 128.0);

        let first = cache.get_or_generate(&a, &factory).unwrap();
        let again = cache.get_or_generate(&a, &factory).unwrap();
        assert!(Arc::ptr_eq(&first, &again));

        cache.get_or_generate(&b, &factory).unwrap();
        assert_eq!(factory.calls.load(Ordering::SeqCst), 1, "base rendered once per tag");

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 2);
        assert_eq!(stats.base_generations, 1);
        assert_eq!(stats.variant_generations, 2);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.base_count(), 1);
    }

    #[test]
    fn test_variant_is_transformed() {
        let cache = ImageCache::new();
        let key = ImageKey::quantize("solid", 90.0, 4.0, 128.0);
        let image = cache
            .get_or_generate(&key, &SolidImageFactory::default())
            .unwrap();
        assert_eq!((image.width(), image.height()), (4, 4));
        assert!(image.pixels().all(|p| p[3] == 128));
    }

    #[test]
    fn test_failure_leaves_nothing() {
        let cache = ImageCache::new();
        let failing = |_: &str| -> Result<Image, FactoryError> { Err(FactoryError::new("gpu lost")) };
        let key = ImageKey::quantize("dot", 0.0, 8.0, 255.0);

        let err = cache.get_or_generate(&key, &failing).unwrap_err();
        assert!(matches!(err, ParticleError::ImageGeneration { ref tag, .. } if tag == "dot"));
        assert!(cache.is_empty());
        assert_eq!(cache.base_count(), 0);
        assert_eq!(cache.stats().failures, 1);

        let image = cache
            .get_or_generate(&key, &SolidImageFactory::default())
            .unwrap();
        assert_eq!(image.width(), 8);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_clear() {
        let cache = ImageCache::shared();
        let key = ImageKey::quantize("solid", 0.0, 8.0, 255.0);
        cache.get_or_generate(&key, &SolidImageFactory::default()).unwrap();
        assert!(cache.contains(&key));
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.stats(), CacheStats::default());
        assert!(cache.get(&key).is_none());
    }
}
