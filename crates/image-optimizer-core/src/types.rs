use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result};

/// Supported target formats for re-encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Jpeg,
    Png,
    WebP,
}

impl ImageFormat {
    /// Determine format from file extension
    pub fn from_extension(ext: &str) -> Result<Self> {
        match ext.to_lowercase().as_str() {
            "jpg" | "jpeg" => Ok(Self::Jpeg),
            "png" => Ok(Self::Png),
            "webp" => Ok(Self::WebP),
            other => Err(Error::UnsupportedFormat(other.to_string())),
        }
    }

    /// Determine format from a MIME type string
    pub fn from_mime_type(mime: &str) -> Result<Self> {
        match mime.to_lowercase().as_str() {
            "image/jpeg" | "image/jpg" => Ok(Self::Jpeg),
            "image/png" => Ok(Self::Png),
            "image/webp" => Ok(Self::WebP),
            other => Err(Error::UnsupportedFormat(other.to_string())),
        }
    }

    /// Canonical file extension for the format
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::WebP => "webp",
        }
    }

    /// MIME type string for the format
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::WebP => "image/webp",
        }
    }

    /// Whether the encoder discards information at reduced quality.
    /// PNG is lossless; its encoder accepts a quality value but ignores it.
    pub fn is_lossy(&self) -> bool {
        !matches!(self, Self::Png)
    }
}

/// An input image as submitted by the caller. The pipeline only reads it.
#[derive(Debug, Clone)]
pub struct SourceImage {
    /// Original filename, used to derive output names
    pub file_name: String,

    /// MIME type declared by the caller (verified against the byte stream)
    pub mime_type: String,

    /// Raw encoded bytes
    pub data: Vec<u8>,
}

impl SourceImage {
    pub fn new(file_name: impl Into<String>, mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            data,
        }
    }

    /// Load an image from disk, deriving the MIME type from the extension
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| Error::Configuration(format!("not a file: {}", path.display())))?;
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_default();
        let format = ImageFormat::from_extension(&ext)?;
        let data = std::fs::read(path)?;

        Ok(Self {
            file_name,
            mime_type: format.mime_type().to_string(),
            data,
        })
    }

    /// Original size in bytes
    pub fn len(&self) -> u64 {
        self.data.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Filename without its extension
    pub fn stem(&self) -> &str {
        Path::new(&self.file_name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(&self.file_name)
    }
}

/// Per-run optimization parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationOptions {
    /// Encoding quality in [0.0, 1.0]; only meaningful for lossy formats
    pub quality: f32,

    /// Target output format
    pub format: ImageFormat,

    /// Maximum output width in pixels; `None` leaves the axis unconstrained
    pub max_width: Option<u32>,

    /// Maximum output height in pixels; `None` leaves the axis unconstrained
    pub max_height: Option<u32>,

    /// Deadline in seconds for decoding and re-encoding one image;
    /// `None` leaves codec work unbounded
    #[serde(default = "default_codec_timeout")]
    pub codec_timeout_secs: Option<u64>,
}

fn default_codec_timeout() -> Option<u64> {
    Some(30)
}

impl Default for OptimizationOptions {
    fn default() -> Self {
        Self {
            quality: 0.8,
            format: ImageFormat::Jpeg,
            max_width: Some(1920),
            max_height: Some(1080),
            codec_timeout_secs: default_codec_timeout(),
        }
    }
}

impl OptimizationOptions {
    /// Build options from a 0-100 quality scale as used at the CLI boundary
    pub fn with_quality_percent(mut self, percent: f32) -> Self {
        self.quality = percent / 100.0;
        self
    }

    /// Reject out-of-range values before any image is touched
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.quality) || !self.quality.is_finite() {
            return Err(Error::Configuration(format!(
                "quality must be within [0.0, 1.0], got {}",
                self.quality
            )));
        }
        if self.max_width == Some(0) || self.max_height == Some(0) {
            return Err(Error::Configuration(
                "maximum dimensions must be positive".to_string(),
            ));
        }
        if self.codec_timeout_secs == Some(0) {
            return Err(Error::Configuration(
                "codec_timeout_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Output of a single transcode
#[derive(Debug, Clone)]
pub struct OptimizationResult {
    /// Newly encoded bytes, exclusively owned by this result
    pub data: Vec<u8>,

    /// Format of the encoded bytes
    pub format: ImageFormat,

    /// Output dimensions after the resize policy was applied
    pub width: u32,
    pub height: u32,

    /// Size of the source bytes
    pub original_size: u64,

    /// Size of the encoded output bytes
    pub optimized_size: u64,
}

impl OptimizationResult {
    /// Percentage reduction in byte size. Negative when optimization grew
    /// the file; callers surface that rather than hiding it.
    pub fn compression_ratio(&self) -> f64 {
        if self.original_size == 0 {
            return 0.0;
        }
        (1.0 - self.optimized_size as f64 / self.original_size as f64) * 100.0
    }
}

/// Lifecycle state of one item in a batch run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemState {
    Pending,
    Processing,
    Succeeded,
    Failed,
}

/// Processing path selected for a batch run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// Deterministic optimization only
    Default,

    /// Try the AI enhancement service, fall back to the deterministic path
    AiWithFallback,
}

/// One image tracked through the batch state machine
#[derive(Debug, Clone)]
pub struct ProcessedImage {
    /// The caller's input, unmodified
    pub source: SourceImage,

    /// Terminal or in-flight state of this item
    pub state: ItemState,

    /// Populated only after a successful run for this item
    pub result: Option<OptimizationResult>,

    /// True when the AI path produced the result
    pub ai_optimized: bool,

    /// Failure reason when `state` is `Failed`
    pub error: Option<String>,
}

impl ProcessedImage {
    pub fn new(source: SourceImage) -> Self {
        Self {
            source,
            state: ItemState::Pending,
            result: None,
            ai_optimized: false,
            error: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_from_extension_is_case_insensitive() {
        assert_eq!(ImageFormat::from_extension("JPG").unwrap(), ImageFormat::Jpeg);
        assert_eq!(ImageFormat::from_extension("jpeg").unwrap(), ImageFormat::Jpeg);
        assert_eq!(ImageFormat::from_extension("WebP").unwrap(), ImageFormat::WebP);
    }

    #[test]
    fn format_from_mime_type_accepts_the_usual_aliases() {
        assert_eq!(ImageFormat::from_mime_type("image/jpeg").unwrap(), ImageFormat::Jpeg);
        assert_eq!(ImageFormat::from_mime_type("image/jpg").unwrap(), ImageFormat::Jpeg);
        assert_eq!(ImageFormat::from_mime_type("image/webp").unwrap(), ImageFormat::WebP);
        assert!(ImageFormat::from_mime_type("image/gif").is_err());
    }

    #[test]
    fn unknown_extension_is_rejected() {
        assert!(matches!(
            ImageFormat::from_extension("heic"),
            Err(Error::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn compression_ratio_matches_formula() {
        let result = OptimizationResult {
            data: vec![],
            format: ImageFormat::Jpeg,
            width: 1,
            height: 1,
            original_size: 1000,
            optimized_size: 250,
        };
        assert_eq!(result.compression_ratio(), 75.0);
    }

    #[test]
    fn compression_ratio_is_negative_when_output_grows() {
        let result = OptimizationResult {
            data: vec![],
            format: ImageFormat::Png,
            width: 1,
            height: 1,
            original_size: 100,
            optimized_size: 150,
        };
        assert_eq!(result.compression_ratio(), -50.0);
    }

    #[test]
    fn quality_outside_unit_interval_is_rejected() {
        let options = OptimizationOptions {
            quality: 1.5,
            ..Default::default()
        };
        assert!(options.validate().is_err());

        let options = OptimizationOptions {
            quality: -0.1,
            ..Default::default()
        };
        assert!(options.validate().is_err());
    }

    #[test]
    fn zero_codec_timeout_is_rejected() {
        let options = OptimizationOptions {
            codec_timeout_secs: Some(0),
            ..Default::default()
        };
        assert!(options.validate().is_err());

        let options = OptimizationOptions {
            codec_timeout_secs: None,
            ..Default::default()
        };
        assert!(options.validate().is_ok());
    }

    #[test]
    fn quality_percent_rescales_to_unit_interval() {
        let options = OptimizationOptions::default().with_quality_percent(85.0);
        assert!((options.quality - 0.85).abs() < f32::EPSILON);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn stem_drops_the_extension() {
        let image = SourceImage::new("holiday.photo.jpg", "image/jpeg", vec![1, 2, 3]);
        assert_eq!(image.stem(), "holiday.photo");
        assert_eq!(image.len(), 3);
    }
}
