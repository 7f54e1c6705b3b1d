//! Output sinks for processed images.
//!
//! Local export writes result bytes next to a deterministic filename derived
//! from the source stem and the target format. Remote storage is an opaque
//! collaborator behind the `StorageSink` trait.

use std::path::{Path, PathBuf};

use log::info;

use crate::error::{Error, Result};
use crate::types::{ImageFormat, ProcessedImage, SourceImage};

/// Deterministic output name: original stem plus the target extension
pub fn output_file_name(source: &SourceImage, format: ImageFormat) -> String {
    format!("{}.{}", source.stem(), format.extension())
}

/// Write a successfully processed image into `dir`, creating it if needed.
/// Returns the path written. Items without a result are rejected.
pub fn write_to_dir(item: &ProcessedImage, dir: impl AsRef<Path>) -> Result<PathBuf> {
    let result = item.result.as_ref().ok_or_else(|| {
        Error::Configuration(format!(
            "{} has no optimization result to export",
            item.source.file_name
        ))
    })?;

    let dir = dir.as_ref();
    std::fs::create_dir_all(dir)?;

    let path = dir.join(output_file_name(&item.source, result.format));
    std::fs::write(&path, &result.data)?;

    info!(
        "exported {} ({} bytes, {:.1}% reduction)",
        path.display(),
        result.optimized_size,
        result.compression_ratio()
    );
    Ok(path)
}

/// Remote storage collaborator: accepts bytes and a filename, reports
/// success or failure. Implementations live outside this crate.
pub trait StorageSink {
    fn store(&self, file_name: &str, bytes: &[u8]) -> Result<()>;
}

/// Push a successfully processed image to a remote sink
pub fn upload(item: &ProcessedImage, sink: &dyn StorageSink) -> Result<()> {
    let result = item.result.as_ref().ok_or_else(|| {
        Error::Configuration(format!(
            "{} has no optimization result to upload",
            item.source.file_name
        ))
    })?;
    sink.store(&output_file_name(&item.source, result.format), &result.data)
}
