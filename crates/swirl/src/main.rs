//! # swirl
//!
//! Runs a particle effect headlessly and reports on it.
//!
//! ```bash
//! swirl ring --seconds 10
//! swirl --preset crates/swirl/presets/fountain.toml --fps 30
//! RUST_LOG=swirl_particles=debug swirl pond
//! ```

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::Parser;
use swirl::{Demo, Scene};
use swirl_particles::EffectPreset;
use tracing_subscriber::EnvFilter;

use swirl::demos::SCREEN;

#[derive(Parser, Debug)]
#[command(name = "swirl")]
#[command(about = "Headless particle effect runner")]
#[command(version)]
struct Cli {
    /// Built-in scene to run
    #[arg(value_enum)]
    scene: Option<Demo>,

    /// Run a TOML effect preset instead of a built-in scene
    #[arg(short, long, conflicts_with = "scene")]
    preset: Option<PathBuf>,

    /// Simulated seconds
    #[arg(short, long, default_value_t = 5.0)]
    seconds: f32,

    /// Frames per simulated second
    #[arg(long, default_value_t = 60)]
    fps: u32,

    /// Seed for built-in scenes
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    if cli.fps == 0 {
        bail!("--fps must be at least 1");
    }
    if !cli.seconds.is_finite() || cli.seconds < 0.0 {
        bail!("--seconds must be a non-negative number");
    }

    let (label, mut scene) = match &cli.preset {
        Some(path) => {
            let preset = EffectPreset::from_file(path)
                .with_context(|| format!("loading preset {}", path.display()))?;
            let scene = Scene::from_preset(&preset, SCREEN).context("building preset scene")?;
            (path.display().to_string(), scene)
        }
        None => {
            let demo = cli.scene.unwrap_or(Demo::Point);
            let scene = demo
                .build(cli.seed)
                .with_context(|| format!("building scene '{}'", demo.name()))?;
            (demo.name().to_owned(), scene)
        }
    };

    run(&label, &mut scene, cli.seconds, cli.fps)
}

fn run(label: &str, scene: &mut Scene, seconds: f32, fps: u32) -> Result<()> {
    let dt = 1.0 / fps as f32;
    let frames = (seconds * fps as f32).round() as u64;
    tracing::info!(scene = label, frames, dt, "running");

    let started = Instant::now();
    let mut spawned_this_second = 0u32;
    let mut rejected = 0u32;
    let mut generations_at_last_report = 0u64;

    for frame in 1..=frames {
        let report = scene
            .step(dt)
            .with_context(|| format!("frame {frame}"))?;
        spawned_this_second += report.spawned;
        rejected += report.rejected_batches;

        if frame % u64::from(fps) == 0 {
            let stats = scene.cache().stats();
            let generations = stats.base_generations + stats.variant_generations;
            tracing::info!(
                second = frame / u64::from(fps),
                live = report.live,
                visible = report.visible,
                spawned = spawned_this_second,
                cache_entries = scene.cache().len(),
                generations = generations - generations_at_last_report,
                "tick"
            );
            spawned_this_second = 0;
            generations_at_last_report = generations;
        }
    }

    let stats = scene.cache().stats();
    let lookups = stats.hits + stats.misses;
    let hit_rate = if lookups == 0 {
        0.0
    } else {
        stats.hits as f64 / lookups as f64 * 100.0
    };
    tracing::info!(
        frames,
        live = scene.particles().len(),
        cache_entries = scene.cache().len(),
        base_images = scene.cache().base_count(),
        hit_rate = %format!("{hit_rate:.1}%"),
        rejected_batches = rejected,
        wall_ms = started.elapsed().as_millis() as u64,
        "done"
    );
    for source in scene.sources() {
        tracing::info!(
            source = source.name(),
            emitted = source.emitter().total_emitted(),
            state = ?source.emitter().state(),
            "source summary"
        );
    }
    for launcher in scene.launchers() {
        tracing::info!(waves = launcher.waves(), "launcher summary");
    }
    Ok(())
}
