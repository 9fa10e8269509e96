//! Benchmark for image cache lookups.
//!
//! TARGET: hits in well under a microsecond; misses dominated by the raster transform
//!
//! Run with: cargo bench --package swirl_particles --bench image_cache_benchmark

#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use swirl_particles::{ImageCache, ImageKey, TaggedImageFactory};

fn benchmark_hits(c: &mut Criterion) {
    let cache = ImageCache::new();
    let factory = TaggedImageFactory::default();
    let key = ImageKey::quantize("bubble", 45.0, 24.0, 180.0);
    cache.get_or_generate(&key, &factory).unwrap();

    c.bench_function("cache_hit", |b| {
        b.iter(|| black_box(cache.get_or_generate(black_box(&key), &factory).unwrap()));
    });
}

fn benchmark_miss(c: &mut Criterion) {
    let factory = TaggedImageFactory::default();

    c.bench_function("cache_miss_rotate_scale_fade", |b| {
        let mut i = 0u32;
        b.iter(|| {
            let cache = ImageCache::new();
            i = i.wrapping_add(7);
            let key = ImageKey::quantize("squabble", (i % 360) as f32, 32.0, 128.0);
            black_box(cache.get_or_generate(&key, &factory).unwrap())
        });
    });
}

criterion_group!(benches, benchmark_hits, benchmark_miss);
criterion_main!(benches);
