//! # Image Cache Integration Test
//!
//! Many particles, one cache: generations must stay at one per signature,
//! including when lookups race from several threads or a factory fails.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use proptest::prelude::*;
use swirl_particles::swirl_core::{Cooldown, Vec2};
use swirl_particles::{
    BubbleImageFactory, Envelope, FactoryError, Image, ImageCache, ImageFactory, ImageKey,
    Lifecycle, LifecycleConfig, ParticleError, TaggedImageFactory,
};
use swirl_particles::image::{TRANSPARENT, WHITE};

/// Counts base renders; fails while `failures_left > 0`.
struct FlakyFactory {
    renders: AtomicUsize,
    failures_left: AtomicUsize,
}

impl FlakyFactory {
    fn new(failures: usize) -> Self {
        Self {
            renders: AtomicUsize::new(0),
            failures_left: AtomicUsize::new(failures),
        }
    }
}

impl ImageFactory for FlakyFactory {
    fn render_base(&self, _tag: &str) -> Result<Image, FactoryError> {
        let left = self.failures_left.load(Ordering::SeqCst);
        if left > 0 {
            self.failures_left.store(left - 1, Ordering::SeqCst);
            return Err(FactoryError::new("transient"));
        }
        self.renders.fetch_add(1, Ordering::SeqCst);
        Ok(Image::filled(16, 16, WHITE))
    }
}

/// Test: a thousand fading particles share a small set of images.
#[test]
fn test_particles_share_images() {
    let cache = ImageCache::shared();
    let factory = TaggedImageFactory::default();
    let config = LifecycleConfig::new("bubble")
        .with_size(Envelope::new(4.0, 12.0))
        .with_alpha(Envelope::new(255.0, 0.0));

    let mut particles: Vec<(Lifecycle, Cooldown)> = (0..1000)
        .map(|i| {
            let mut lifetime = Cooldown::new(1.0).unwrap();
            lifetime.advance((i % 10) as f32 * 0.1);
            (Lifecycle::new(config.clone()).unwrap(), lifetime)
        })
        .collect();

    for (lifecycle, lifetime) in &mut particles {
        lifecycle.advance(lifetime);
        let resolved = lifecycle.resolve(Vec2::ZERO, &cache, &factory).unwrap();
        assert_eq!(resolved.bounds.center(), Vec2::ZERO);
    }

    let stats = cache.stats();
    assert_eq!(stats.base_generations, 1);
    assert!(cache.len() <= 10, "{} variants", cache.len());
    assert_eq!(stats.variant_generations, cache.len() as u64);
    assert_eq!(stats.hits + stats.misses, 1000);
}

/// Test: concurrent lookups of one key generate exactly once.
#[test]
fn test_concurrent_lookups_generate_once() {
    let cache = ImageCache::shared();
    let factory = Arc::new(FlakyFactory::new(0));
    let key = ImageKey::quantize("bubble", 30.0, 12.0, 200.0);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let cache = Arc::clone(&cache);
            let factory = Arc::clone(&factory);
            let key = key.clone();
            thread::spawn(move || {
                (0..100)
                    .map(|_| cache.get_or_generate(&key, factory.as_ref()).unwrap())
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let images: Vec<Arc<Image>> = handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect();
    assert!(images.iter().all(|img| Arc::ptr_eq(img, &images[0])));
    assert_eq!(factory.renders.load(Ordering::SeqCst), 1);
    assert_eq!(cache.stats().variant_generations, 1);
}

/// Test: the built-in bubble survives the full transform chain.
#[test]
fn test_bubble_variant_dimensions() {
    let cache = ImageCache::new();
    let key = ImageKey::quantize("bubble", 0.0, 16.0, 255.0);
    let image = cache
        .get_or_generate(&key, &BubbleImageFactory::default())
        .unwrap();
    assert_eq!((image.width(), image.height()), (16, 16));
    assert_eq!(image.pixel(0, 0), Some(TRANSPARENT));
}

proptest! {
    /// Test: any number of failed generations followed by a success leaves
    /// exactly the successful entry behind.
    #[test]
    fn prop_failed_generation_then_retry(
        failures in 0usize..5,
        rotation in -720.0f32..720.0,
        size in 0.0f32..64.0,
        alpha in -10.0f32..300.0,
    ) {
        let cache = ImageCache::new();
        let factory = FlakyFactory::new(failures);
        let key = ImageKey::quantize("dot", rotation, size, alpha);

        for _ in 0..failures {
            let err = cache.get_or_generate(&key, &factory).unwrap_err();
            let is_generation_error = matches!(err, ParticleError::ImageGeneration { .. });
            prop_assert!(is_generation_error);
            prop_assert!(cache.is_empty());
            prop_assert_eq!(cache.base_count(), 0);
        }

        let image = cache.get_or_generate(&key, &factory).unwrap();
        prop_assert_eq!(cache.len(), 1);
        prop_assert_eq!(cache.base_count(), 1);
        prop_assert_eq!(factory.renders.load(Ordering::SeqCst), 1);
        prop_assert!(image.width().max(image.height()) >= key.scale);
        prop_assert!(image.pixels().all(|p| p[3] == key.alpha || p[3] == 0));

        let again = cache.get_or_generate(&key, &factory).unwrap();
        prop_assert!(Arc::ptr_eq(&image, &again));
        prop_assert_eq!(cache.stats().failures, failures as u64);
    }

    /// Test: quantized keys always land in their documented ranges.
    #[test]
    fn prop_key_ranges(rotation in any::<f32>(), size in any::<f32>(), alpha in any::<f32>()) {
        let key = ImageKey::quantize("x", rotation, size, alpha);
        prop_assert!(key.rotation < 360);
        prop_assert!(key.scale >= 1);
    }
}
