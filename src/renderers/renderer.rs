// Copyright @yucwang 2021

use crate::core::scene::Scene;
use crate::core::volume::Volume;
use crate::math::bitmap::Bitmap;

pub trait Renderer<V: Volume> {
    fn render(&self, scene: &Scene<V>) -> Bitmap;
}
