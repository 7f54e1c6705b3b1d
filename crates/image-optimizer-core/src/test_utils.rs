//! Shared fixtures for unit tests. Images are generated in memory so the
//! suite needs no files on disk.

use image::{DynamicImage, RgbaImage};

use crate::codec;
use crate::types::{ImageFormat, SourceImage};

/// A valid PNG source image with a simple gradient fill
pub fn png_source(name: &str, width: u32, height: u32) -> SourceImage {
    let img = RgbaImage::from_fn(width, height, |x, y| {
        image::Rgba([(x % 256) as u8, (y % 256) as u8, ((x * y) % 256) as u8, 255])
    });
    let data = codec::encode(&DynamicImage::ImageRgba8(img), ImageFormat::Png, 1.0)
        .expect("test fixture encode");
    SourceImage::new(name, "image/png", data)
}

/// Bytes that no decoder will accept
pub fn corrupt_source(name: &str) -> SourceImage {
    SourceImage::new(name, "image/png", vec![0xDE, 0xAD, 0xBE, 0xEF, 0, 0, 0, 0])
}
