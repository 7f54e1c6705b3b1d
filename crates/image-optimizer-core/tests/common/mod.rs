//! Helpers shared by integration tests. Fixture images are generated on the
//! fly so the repository carries no binary test data.

use std::path::{Path, PathBuf};

use image::{DynamicImage, RgbaImage};

/// Write a small gradient PNG into `dir` and return its path
pub fn write_png(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    let img = RgbaImage::from_fn(width, height, |x, y| {
        image::Rgba([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8, 255])
    });
    let path = dir.join(name);
    DynamicImage::ImageRgba8(img)
        .save_with_format(&path, image::ImageFormat::Png)
        .expect("write test png");
    path
}

/// Write a file with a .png extension that is not a PNG
pub fn write_garbage(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, b"this is not image data").expect("write garbage file");
    path
}
