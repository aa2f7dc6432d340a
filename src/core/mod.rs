// Copyright @yucwang 2021

pub mod integrator;
pub mod medium;
pub mod phase;
pub mod rng;
pub mod sampler;
pub mod scene;
pub mod scene_loader;
pub mod sensor;
pub mod volume;
pub mod volume_sampler;
