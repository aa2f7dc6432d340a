use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

use meringue::core::medium::Medium;
use meringue::core::rng::LcgRng;
use meringue::core::sampler::SampleGenerator;
use meringue::core::scene::Scene;
use meringue::core::volume::Volume;
use meringue::core::volume_sampler::VolumeSampler;
use meringue::math::constants::{Float, Vector3f};
use meringue::tracking::TransmittanceEstimator;
use meringue::volumes::grid_volume::GridVolume;

/// Prints statistics of a Mitsuba .vol grid and the transmittance through
/// its center along +z.
#[derive(Parser, Debug)]
#[command(about)]
struct Args {
    volume: PathBuf,
    /// Density scale applied before tracking.
    #[arg(long, default_value_t = 1.0)]
    scale: Float,
    /// Estimates per estimator; 0 skips the transmittance check.
    #[arg(long, default_value_t = 4096)]
    samples: usize,
    #[arg(long, default_value_t = 0)]
    seed: u64,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let grid = GridVolume::from_file(&args.volume)
        .with_context(|| format!("failed to load {}", args.volume.display()))?;
    let (xres, yres, zres) = grid.resolution();
    println!("Resolution: {}x{}x{} ({} channels)", xres, yres, zres, grid.channels());
    println!("Max density: {:.6}", grid.max_value());
    println!("Mean density: {:.6}", grid.mean_value());
    if let Some(bbox) = grid.bbox() {
        println!("Bounds: {:?} - {:?}", bbox.p_min.as_slice(), bbox.p_max.as_slice());
    }

    if args.samples == 0 {
        return Ok(());
    }

    let medium = Medium::new(Arc::new(grid)).with_scale(args.scale);
    let center = medium.bbox().center();
    let origin = Vector3f::new(center.x, center.y, medium.bbox().p_min.z - 1.0);
    let dir = Vector3f::new(0.0, 0.0, 1.0);
    let mut scene = Scene::new();
    scene.add_medium(medium);

    for estimator in [TransmittanceEstimator::DeltaTracking, TransmittanceEstimator::RatioTracking].iter() {
        let sampler = VolumeSampler::new(&scene, *estimator);
        let mut rng = LcgRng::seeded(args.seed);
        let mut sum = 0.0f64;
        let mut sum_sq = 0.0f64;
        for _ in 0..args.samples {
            let tr = sampler.eval_transmittance(origin, dir, 0.0, Float::MAX, &mut rng) as f64;
            sum += tr;
            sum_sq += tr * tr;
        }
        let n = args.samples as f64;
        let mean = sum / n;
        let var = (sum_sq / n - mean * mean).max(0.0);
        println!("Transmittance ({}): {:.6} +- {:.6}", estimator, mean, (var / n).sqrt());
    }
    Ok(())
}
