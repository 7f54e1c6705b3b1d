//! Bounding-box resize policy.
//!
//! Computes target dimensions from an image's native size and optional
//! maximum-width/maximum-height constraints, preserving aspect ratio and
//! never upscaling.

use crate::error::{Error, Result};

/// Compute the output dimensions for an image.
///
/// An absent bound leaves that axis unconstrained. When the image already
/// fits within both bounds the native size is returned unchanged. Scaling
/// uses exact integer arithmetic so the binding axis lands precisely on its
/// bound and the other axis is the floor of the true rational scale.
pub fn compute_target_size(
    native_width: u32,
    native_height: u32,
    max_width: Option<u32>,
    max_height: Option<u32>,
) -> Result<(u32, u32)> {
    if native_width == 0 || native_height == 0 {
        return Err(Error::InvalidDimensions {
            width: native_width,
            height: native_height,
        });
    }

    let width_constrained = max_width.is_some_and(|w| w < native_width);
    let height_constrained = max_height.is_some_and(|h| h < native_height);

    // Already fits, or no bounds at all: never upscale
    if !width_constrained && !height_constrained {
        return Ok((native_width, native_height));
    }

    // Pick the smaller scale factor max/native by cross-multiplying, which
    // avoids floating point entirely
    let binding_w = if width_constrained { max_width } else { None };
    let binding_h = if height_constrained { max_height } else { None };
    let width_binds = match (binding_w, binding_h) {
        (Some(mw), Some(mh)) => {
            (mw as u64 * native_height as u64) <= (mh as u64 * native_width as u64)
        }
        (Some(_), None) => true,
        (None, _) => false,
    };

    let (width, height) = if width_binds {
        let mw = max_width.expect("width binds only when bounded");
        let scaled_h = native_height as u64 * mw as u64 / native_width as u64;
        (mw, scaled_h as u32)
    } else {
        let mh = max_height.expect("height binds only when bounded");
        let scaled_w = native_width as u64 * mh as u64 / native_height as u64;
        (scaled_w as u32, mh)
    };

    Ok((width.max(1), height.max(1)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fits_within_bounds_returns_native_size() {
        assert_eq!(
            compute_target_size(800, 600, Some(1920), Some(1080)).unwrap(),
            (800, 600)
        );
    }

    #[test]
    fn no_bounds_returns_native_size() {
        assert_eq!(compute_target_size(5000, 4000, None, None).unwrap(), (5000, 4000));
    }

    #[test]
    fn width_limited_image_scales_by_width() {
        // 3000x1000 into 1920x1080: width is the binding constraint
        assert_eq!(
            compute_target_size(3000, 1000, Some(1920), Some(1080)).unwrap(),
            (1920, 640)
        );
    }

    #[test]
    fn height_limited_image_scales_by_height() {
        assert_eq!(
            compute_target_size(1000, 3000, Some(1920), Some(1080)).unwrap(),
            (360, 1080)
        );
    }

    #[test]
    fn absent_bound_is_unconstrained() {
        // Only width given: height follows the aspect ratio
        assert_eq!(
            compute_target_size(4000, 2000, Some(2000), None).unwrap(),
            (2000, 1000)
        );
        // Only height given
        assert_eq!(
            compute_target_size(4000, 2000, None, Some(1000)).unwrap(),
            (2000, 1000)
        );
    }

    #[test]
    fn one_constrained_axis_still_respects_the_other_bound() {
        // Width fits but height does not
        assert_eq!(
            compute_target_size(1000, 2000, Some(1920), Some(1000)).unwrap(),
            (500, 1000)
        );
    }

    #[test]
    fn never_exceeds_either_bound() {
        for (w, h) in [(3000, 2000), (123, 4567), (1921, 1081), (9999, 1), (2, 9999)] {
            let (tw, th) = compute_target_size(w, h, Some(1920), Some(1080)).unwrap();
            assert!(tw <= 1920, "{}x{} -> width {}", w, h, tw);
            assert!(th <= 1080, "{}x{} -> height {}", w, h, th);
            assert!(tw <= w && th <= h, "upscaled {}x{} -> {}x{}", w, h, tw, th);
        }
    }

    #[test]
    fn preserves_aspect_ratio_within_rounding() {
        let (tw, th) = compute_target_size(3872, 2592, Some(1920), Some(1080)).unwrap();
        assert_eq!(th, 1080);
        // floor(3872 * 1080 / 2592) = 1613
        assert_eq!(tw, 1613);
        let native_ratio = 3872.0 / 2592.0;
        let target_ratio = tw as f64 / th as f64;
        assert!((native_ratio - target_ratio).abs() < 1.0 / th as f64);
    }

    #[test]
    fn extreme_aspect_ratio_clamps_to_one_pixel() {
        let (tw, th) = compute_target_size(10000, 2, Some(100), Some(100)).unwrap();
        assert_eq!(tw, 100);
        assert_eq!(th, 1);
    }

    #[test]
    fn zero_dimension_is_rejected() {
        assert!(matches!(
            compute_target_size(0, 100, Some(10), Some(10)),
            Err(Error::InvalidDimensions { .. })
        ));
        assert!(matches!(
            compute_target_size(100, 0, None, None),
            Err(Error::InvalidDimensions { .. })
        ));
    }
}
