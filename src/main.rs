// Copyright 2020 TwoCookingMice

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use meringue::core::rng::{HashRng, LcgRng, StreamRng};
use meringue::core::sampler::SampleGenerator;
use meringue::core::scene::Scene;
use meringue::core::scene_loader::load_scene_with_settings;
use meringue::integrators::IntegratorKind;
use meringue::io::exr_utils;
use meringue::math::bitmap::Bitmap;
use meringue::renderers::simple::{Renderer, SimpleRenderer};
use meringue::tracking::TransmittanceEstimator;
use meringue::volumes::SceneVolume;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum RngKind {
    Lcg,
    Hash,
    Stream,
}

/// Renders participating media described by a Mitsuba-style scene file.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Scene description (.xml).
    scene: PathBuf,
    /// Output image (.exr).
    output: PathBuf,
    /// Samples per pixel, overrides the scene's sample_count.
    #[arg(long)]
    spp: Option<u32>,
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Sensor index inside the scene.
    #[arg(long, default_value_t = 0)]
    camera: usize,
    /// Transmittance estimator: delta or ratio. Defaults to the build-time choice.
    #[arg(long)]
    estimator: Option<TransmittanceEstimator>,
    /// Integrator: transmittance or single_scatter, overrides the scene.
    #[arg(long)]
    integrator: Option<IntegratorKind>,
    #[arg(long, value_enum, default_value_t = RngKind::Lcg)]
    rng: RngKind,
}

fn render_with<S: SampleGenerator>(args: &Args, scene: &Scene<SceneVolume>, kind: IntegratorKind,
                                   spp: u32, estimator: TransmittanceEstimator) -> Bitmap {
    let integrator = kind.build::<SceneVolume, S>(spp, estimator);
    let renderer: SimpleRenderer<SceneVolume, S> = SimpleRenderer::new(integrator, args.camera, args.seed);
    renderer.render(scene)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let load_result = load_scene_with_settings(&args.scene)
        .with_context(|| format!("failed to load scene {}", args.scene.display()))?;

    let scene = load_result.scene;
    let spp = args.spp.or(load_result.samples_per_pixel).unwrap_or(1);
    let kind = args.integrator.or(load_result.integrator).unwrap_or(IntegratorKind::Transmittance);
    let estimator = args.estimator.unwrap_or_else(TransmittanceEstimator::build_default);
    log::debug!("Integrator {}, estimator {}, sampler {:?}.", kind, estimator, args.rng);

    let image = match args.rng {
        RngKind::Lcg => render_with::<LcgRng>(&args, &scene, kind, spp, estimator),
        RngKind::Hash => render_with::<HashRng>(&args, &scene, kind, spp, estimator),
        RngKind::Stream => render_with::<StreamRng>(&args, &scene, kind, spp, estimator),
    };
    if image.width() == 0 || image.height() == 0 {
        anyhow::bail!("sensor {} produced an empty image", args.camera);
    }

    let mean = image.mean();
    log::info!("Mean pixel value: ({:.6}, {:.6}, {:.6}).", mean.x, mean.y, mean.z);

    exr_utils::write_exr_to_file(&image, &args.output)
        .with_context(|| format!("failed to write {}", args.output.display()))?;
    log::info!("EXR written to: {}.", args.output.display());
    Ok(())
}
