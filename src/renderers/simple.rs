// Copyright @yucwang 2021

use crate::core::integrator::Integrator;
use crate::core::sampler::SampleGenerator;
use crate::core::scene::Scene;
use crate::core::sensor::Sensor;
use crate::core::volume::Volume;
use crate::math::bitmap::Bitmap;
use crate::math::constants::{Float, Vector2f, Vector3f};
use indicatif::{ProgressBar, ProgressStyle};
use std::marker::PhantomData;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::thread;
use std::time::Instant;

pub use super::renderer::Renderer;

const BLOCK_SIZE: usize = 32;

/// Splits the film into square blocks and hands them out to a pool of
/// scoped worker threads. Each pixel owns its own sample generator seeded
/// from the render seed and the pixel coordinates, so the image does not
/// depend on the thread count.
pub struct SimpleRenderer<V: Volume, S: SampleGenerator> {
    integrator: Box<dyn Integrator<V, S>>,
    camera_id: usize,
    seed: u64,
    show_progress: bool,
    _sampler: PhantomData<fn() -> S>,
}

impl<V: Volume, S: SampleGenerator> SimpleRenderer<V, S> {
    pub fn new(integrator: Box<dyn Integrator<V, S>>, camera_id: usize, seed: u64) -> Self {
        Self {
            integrator,
            camera_id,
            seed,
            show_progress: true,
            _sampler: PhantomData,
        }
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    fn pixel_seed(&self, x: usize, y: usize) -> u64 {
        (self.seed << 40) ^ (((y as u64) & 0xFFFFF) << 20) ^ ((x as u64) & 0xFFFFF)
    }

    fn render_block(&self, scene: &Scene<V>, sensor: &dyn Sensor, spp: u32,
                    x0: usize, y0: usize, x1: usize, y1: usize) -> Vec<Vector3f> {
        let inv_spp = 1.0 / (spp as Float);
        let mut block = vec![Vector3f::zeros(); (x1 - x0) * (y1 - y0)];
        for y in y0..y1 {
            for x in x0..x1 {
                let pixel = Vector2f::new(x as Float, y as Float);
                let mut sampler = S::seeded(self.pixel_seed(x, y));
                let mut color = Vector3f::zeros();
                for _sample in 0..spp {
                    color += self.integrator.trace_ray_forward(scene, sensor, pixel, &mut sampler);
                }
                block[(x - x0) + (x1 - x0) * (y - y0)] = color * inv_spp;
            }
        }
        block
    }
}

impl<V: Volume, S: SampleGenerator> Renderer<V> for SimpleRenderer<V, S> {
    fn render(&self, scene: &Scene<V>) -> Bitmap {
        let sensor = match scene.sensor(self.camera_id) {
            Some(sensor) => sensor,
            None => {
                log::warn!("Scene has no sensor {}, nothing to render.", self.camera_id);
                return Bitmap::new(0, 0);
            }
        };

        let (width, height) = (sensor.width(), sensor.height());
        if width == 0 || height == 0 {
            return Bitmap::new(0, 0);
        }
        let spp = self.integrator.samples_per_pixel().max(1);

        let blocks_x = (width + BLOCK_SIZE - 1) / BLOCK_SIZE;
        let blocks_y = (height + BLOCK_SIZE - 1) / BLOCK_SIZE;
        let total_blocks = blocks_x * blocks_y;

        let progress = if self.show_progress {
            ProgressBar::new(total_blocks as u64)
        } else {
            ProgressBar::hidden()
        };
        progress.set_style(
            ProgressStyle::with_template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} blocks")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );

        let thread_count = thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
            .min(total_blocks);
        log::info!(
            "Rendering {}x{} at {} spp with {} on {} threads.",
            width,
            height,
            spp,
            self.integrator.describe(),
            thread_count
        );
        log::debug!("Sensor: {}", sensor.describe());
        let start = Instant::now();

        let next_block = AtomicUsize::new(0);
        let (tx, rx) = mpsc::channel::<(usize, usize, usize, usize, Vec<Vector3f>)>();
        let mut bitmap = Bitmap::new(width, height);

        thread::scope(|scope| {
            for _ in 0..thread_count {
                let next_block = &next_block;
                let tx = tx.clone();
                scope.spawn(move || loop {
                    let block_index = next_block.fetch_add(1, Ordering::Relaxed);
                    if block_index >= total_blocks {
                        break;
                    }

                    let x0 = (block_index % blocks_x) * BLOCK_SIZE;
                    let y0 = (block_index / blocks_x) * BLOCK_SIZE;
                    let x1 = (x0 + BLOCK_SIZE).min(width);
                    let y1 = (y0 + BLOCK_SIZE).min(height);

                    let block = self.render_block(scene, sensor, spp, x0, y0, x1, y1);
                    if tx.send((x0, y0, x1, y1, block)).is_err() {
                        break;
                    }
                });
            }

            drop(tx);
            for (x0, y0, x1, y1, block) in rx.iter() {
                for y in y0..y1 {
                    for x in x0..x1 {
                        bitmap[(x, y)] = block[(x - x0) + (x1 - x0) * (y - y0)];
                    }
                }
                progress.inc(1);
            }
        });
        progress.finish_and_clear();
        log::info!("Render finished in {:.2?}.", start.elapsed());
        bitmap
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::medium::Medium;
    use crate::core::rng::HashRng;
    use crate::integrators::transmittance::TransmittanceIntegrator;
    use crate::math::aabb::AABB;
    use crate::sensors::perspective::PerspectiveCamera;
    use crate::tracking::TransmittanceEstimator;
    use crate::volumes::const_volume::ConstantVolume;
    use std::sync::Arc;

    fn scene(width: usize, height: usize) -> Scene<ConstantVolume> {
        let bbox = AABB::new(Vector3f::new(-1.0, -1.0, -1.0), Vector3f::new(1.0, 1.0, 1.0));
        let mut scene = Scene::new();
        scene.add_medium(Medium::new(Arc::new(ConstantVolume::new(0.8).with_bbox(Some(bbox)))));
        scene.add_sensor(Box::new(PerspectiveCamera::new(
            Vector3f::new(0.0, 0.0, -5.0),
            Vector3f::zeros(),
            Vector3f::new(0.0, 1.0, 0.0),
            0.8,
            width,
            height,
            0.01,
            100.0,
        )));
        scene
    }

    fn renderer(spp: u32, seed: u64) -> SimpleRenderer<ConstantVolume, HashRng> {
        let integrator = TransmittanceIntegrator::new(spp, TransmittanceEstimator::RatioTracking);
        SimpleRenderer::new(Box::new(integrator), 0, seed).with_progress(false)
    }

    #[test]
    fn test_render_is_deterministic() {
        let scene = scene(40, 36);
        let a = renderer(4, 7).render(&scene);
        let b = renderer(4, 7).render(&scene);
        assert_eq!(a.width(), 40);
        assert_eq!(a.height(), 36);
        for y in 0..36 {
            for x in 0..40 {
                assert_eq!(a[(x, y)], b[(x, y)]);
            }
        }
    }

    #[test]
    fn test_render_darkens_center() {
        let scene = scene(16, 16);
        let image = renderer(64, 1).render(&scene);
        // Corner rays miss the cube entirely.
        assert_eq!(image[(0, 0)], Vector3f::new(1.0, 1.0, 1.0));
        assert!(image[(8, 8)].x < 0.5);
        for v in image.raw_copy() {
            assert!(v.0 >= 0.0 && v.0 <= 1.0);
        }
    }

    #[test]
    fn test_missing_sensor_renders_nothing() {
        let scene: Scene<ConstantVolume> = Scene::new();
        let image = renderer(1, 0).render(&scene);
        assert_eq!(image.width(), 0);
    }
}
