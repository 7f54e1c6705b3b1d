//! Codec adapter: byte buffers in, pixel buffers out, and back again.
//!
//! Decoding sniffs the real format from the byte stream; the caller's
//! declared MIME type is only cross-checked for logging. Encoding produces a
//! fresh buffer and performs no disk or network I/O.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ColorType, DynamicImage, ImageEncoder};
use log::warn;

use crate::error::{Error, Result};
use crate::types::ImageFormat;

/// Identify the format of an encoded byte stream
pub fn detect_format(bytes: &[u8]) -> Result<ImageFormat> {
    let guessed = image::guess_format(bytes)
        .map_err(|e| Error::UnsupportedFormat(format!("unrecognized byte stream: {}", e)))?;

    match guessed {
        image::ImageFormat::Jpeg => Ok(ImageFormat::Jpeg),
        image::ImageFormat::Png => Ok(ImageFormat::Png),
        image::ImageFormat::WebP => Ok(ImageFormat::WebP),
        other => Err(Error::UnsupportedFormat(format!("{:?}", other))),
    }
}

/// Decode an image blob into pixel data.
///
/// Fails with `UnsupportedFormat` when the detected format is not a
/// supported raster format and `CorruptImage` when structural validation of
/// the stream fails.
pub fn decode(bytes: &[u8], declared_mime: &str) -> Result<DynamicImage> {
    let format = detect_format(bytes)?;

    if format.mime_type() != declared_mime.to_lowercase() {
        warn!(
            "declared MIME type {} does not match detected format {}",
            declared_mime,
            format.mime_type()
        );
    }

    image::load_from_memory_with_format(bytes, to_image_format(format))
        .map_err(|e| Error::CorruptImage(e.to_string()))
}

/// Encode pixel data to `format` at `quality` (0.0-1.0).
///
/// Quality drives the JPEG and WebP encoders. PNG is lossless: the value is
/// accepted for a uniform call shape but has no numeric effect.
pub fn encode(img: &DynamicImage, format: ImageFormat, quality: f32) -> Result<Vec<u8>> {
    match format {
        ImageFormat::Jpeg => encode_jpeg(img, quality_to_percent(quality)),
        ImageFormat::Png => encode_png(img),
        ImageFormat::WebP => encode_webp(img, quality),
    }
}

fn quality_to_percent(quality: f32) -> u8 {
    (quality * 100.0).round().clamp(1.0, 100.0) as u8
}

fn encode_jpeg(img: &DynamicImage, quality: u8) -> Result<Vec<u8>> {
    // JPEG has no alpha channel
    let rgb = img.to_rgb8();

    let mut buffer = Vec::new();
    let encoder = JpegEncoder::new_with_quality(Cursor::new(&mut buffer), quality);
    encoder
        .write_image(rgb.as_raw(), rgb.width(), rgb.height(), ColorType::Rgb8)
        .map_err(|e| Error::EncodeFailure(e.to_string()))?;

    Ok(buffer)
}

fn encode_png(img: &DynamicImage) -> Result<Vec<u8>> {
    let rgba = img.to_rgba8();

    let mut buffer = Vec::new();
    let encoder = PngEncoder::new(Cursor::new(&mut buffer));
    encoder
        .write_image(rgba.as_raw(), rgba.width(), rgba.height(), ColorType::Rgba8)
        .map_err(|e| Error::EncodeFailure(e.to_string()))?;

    Ok(buffer)
}

fn encode_webp(img: &DynamicImage, quality: f32) -> Result<Vec<u8>> {
    // The webp crate only accepts RGB8/RGBA8 pixel layouts
    let rgba = DynamicImage::ImageRgba8(img.to_rgba8());
    let encoder =
        webp::Encoder::from_image(&rgba).map_err(|e| Error::EncodeFailure(e.to_string()))?;

    let memory = encoder.encode(quality * 100.0);
    Ok(memory.to_vec())
}

fn to_image_format(format: ImageFormat) -> image::ImageFormat {
    match format {
        ImageFormat::Jpeg => image::ImageFormat::Jpeg,
        ImageFormat::Png => image::ImageFormat::Png,
        ImageFormat::WebP => image::ImageFormat::WebP,
    }
}
