//! Deterministic optimization engine.
//!
//! Composes the resize policy and the codec adapter into the single-image
//! transform: decode, constrain dimensions, re-encode, measure.

use std::time::Duration;

use image::imageops::FilterType;
use image::DynamicImage;
use log::debug;

use crate::codec;
use crate::error::Result;
use crate::resize::compute_target_size;
use crate::timeout::run_with_timeout;
use crate::types::{OptimizationOptions, OptimizationResult, SourceImage};

/// Transcode one image according to `options`.
///
/// Codec failures propagate unchanged; the engine performs no retries.
/// When `options.codec_timeout_secs` is set, decode and re-encode run on a
/// worker thread bounded by that deadline.
pub fn optimize(image: &SourceImage, options: &OptimizationOptions) -> Result<OptimizationResult> {
    match options.codec_timeout_secs {
        Some(secs) => {
            let image = image.clone();
            let options = options.clone();
            run_with_timeout("transcode", Duration::from_secs(secs), move || {
                transcode(&image, &options)
            })
        }
        None => transcode(image, options),
    }
}

fn transcode(image: &SourceImage, options: &OptimizationOptions) -> Result<OptimizationResult> {
    let decoded = codec::decode(&image.data, &image.mime_type)?;
    conform(&image.file_name, decoded, image.len(), options)
}

/// Constrain a decoded image to the configured bounds and re-encode it into
/// the target format. Shared by the deterministic path and the gateway's
/// normalization of enhanced payloads.
pub(crate) fn conform(
    label: &str,
    decoded: DynamicImage,
    original_size: u64,
    options: &OptimizationOptions,
) -> Result<OptimizationResult> {
    let (native_width, native_height) = (decoded.width(), decoded.height());

    let (width, height) = compute_target_size(
        native_width,
        native_height,
        options.max_width,
        options.max_height,
    )?;

    let resampled = if (width, height) != (native_width, native_height) {
        debug!(
            "{}: resampling {}x{} -> {}x{}",
            label, native_width, native_height, width, height
        );
        decoded.resize_exact(width, height, FilterType::Lanczos3)
    } else {
        decoded
    };

    let data = codec::encode(&resampled, options.format, options.quality)?;
    let optimized_size = data.len() as u64;

    let result = OptimizationResult {
        data,
        format: options.format,
        width,
        height,
        original_size,
        optimized_size,
    };

    debug!(
        "{}: {} -> {} bytes ({:.1}% reduction)",
        label,
        result.original_size,
        result.optimized_size,
        result.compression_ratio()
    );

    Ok(result)
}
