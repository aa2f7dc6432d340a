/* Copyright 2020 @TwoCookingMice */

use crate::math::bitmap::Bitmap;
use std::path::Path;

use exr::error::UnitResult;
use exr::prelude::*;

/// Writes `image` as a 32-bit float RGB OpenEXR file.
pub fn write_exr_to_file<P: AsRef<Path>>(image: &Bitmap, file_path: P) -> UnitResult {
    let file_path = file_path.as_ref();
    log::info!("Starting writing openexr images: {}.", file_path.display());

    write_rgb_file(file_path, image.width(), image.height(), |x, y| {
        let v = image[(x, y)];
        (v.x, v.y, v.z)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::constants::Vector3f;

    #[test]
    fn test_write_exr() {
        let mut image = Bitmap::new(3, 2);
        image[(1, 1)] = Vector3f::new(0.25, 0.5, 1.0);
        let path = std::env::temp_dir().join(format!("meringue_write_{}.exr", std::process::id()));
        write_exr_to_file(&image, &path).unwrap();
        assert!(std::fs::metadata(&path).map(|m| m.len() > 0).unwrap_or(false));
        let _ = std::fs::remove_file(&path);
    }
}
