// Copyright 2020 @TwoCookingMice

use super::constants::{ Float, Vector3f };

use std::ops;
use std::vec::Vec;

#[derive(Debug, Clone)]
pub struct Bitmap {
    data: Vec<Vector3f>,
    height: usize,
    width: usize
}

impl ops::Index<(usize, usize)> for Bitmap {
    type Output = Vector3f;

    fn index(&self, index: (usize, usize)) -> &Vector3f {
        &self.data[index.0 + self.width * index.1]
    }
}

impl ops::IndexMut<(usize, usize)> for Bitmap {
    fn index_mut(&mut self, index: (usize, usize)) -> &mut Vector3f {
        &mut self.data[index.0 + self.width * index.1]
    }
}

impl Bitmap {
    pub fn new(width: usize, height: usize) -> Self {
        let pixel_number = width * height;
        Self { data: vec!(Vector3f::new(0.0, 0.0, 0.0); 
                          pixel_number),
               width: width,
               height: height }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn raw_copy(&self) -> Vec<(Float, Float, Float)> {
        self.data.iter().map(|v| (v.x, v.y, v.z)).collect()
    }

    pub fn mean(&self) -> Vector3f {
        if self.data.is_empty() {
            return Vector3f::zeros();
        }
        let sum = self.data.iter().fold(Vector3f::zeros(), |acc, v| acc + v);
        sum / self.data.len() as Float
    }
}

/* Test for Bitmap */
#[cfg(test)]
mod tests {
    use super::Bitmap;
    use super::{ Vector3f };

    #[test]
    fn test_bitmap_basic_functions() {
        let mut bitmap = Bitmap::new(4usize, 2usize);
        assert_eq!(bitmap.width(), 4);
        assert_eq!(bitmap.height(), 2);

        bitmap[(3, 1)] = Vector3f::new(1.0, 0.5, 0.6);
        assert_eq!(bitmap[(3, 1)], Vector3f::new(1.0, 0.5, 0.6));
        assert_eq!(bitmap[(2, 1)], Vector3f::zeros());
        assert_eq!(bitmap.raw_copy()[7], (1.0, 0.5, 0.6));
        assert!((bitmap.mean().x - 0.125).abs() < 1e-6);
    }
}
