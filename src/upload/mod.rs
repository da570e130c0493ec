//! App packaging before upload
//!
//! The upload endpoint takes a single file. Plain files (ipa, apk, zip)
//! pass through untouched; a macOS/iOS `.app` directory bundle is archived
//! next to itself first.

use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::File;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// App packaging errors
#[derive(Error, Debug)]
pub enum PackageError {
    #[error("{0} does not exist")]
    NotFound(String),

    #[error("{0} is not a file but a directory")]
    UnexpectedDirectory(String),

    #[error("failed to archive app bundle: {0}")]
    Archive(#[from] std::io::Error),
}

/// Resolve the actual file to upload for the given app path.
///
/// A directory is only accepted when it ends in `.app`; it is archived to
/// `<path>.tar.gz` beside itself, replacing any stale archive.
pub fn package_app(app_path: &Path) -> Result<PathBuf, PackageError> {
    let display = app_path.display().to_string();
    let metadata = std::fs::metadata(app_path).map_err(|_| PackageError::NotFound(display.clone()))?;

    if !metadata.is_dir() {
        return Ok(app_path.to_path_buf());
    }
    if app_path.extension().map(|e| e == "app").unwrap_or(false) {
        archive_app_dir(app_path)
    } else {
        Err(PackageError::UnexpectedDirectory(display))
    }
}

/// Archive an `.app` directory bundle to `<path>.tar.gz`
fn archive_app_dir(dir_path: &Path) -> Result<PathBuf, PackageError> {
    let mut archive_path = dir_path.as_os_str().to_owned();
    archive_path.push(".tar.gz");
    let archive_path = PathBuf::from(archive_path);

    if archive_path.exists() {
        std::fs::remove_file(&archive_path)?;
    }

    debug!("archiving {} to {}", dir_path.display(), archive_path.display());
    let file = File::create(&archive_path)?;
    let encoder = GzEncoder::new(file, Compression::default());
    let mut builder = tar::Builder::new(encoder);

    let bundle_name = dir_path.file_name().unwrap_or(dir_path.as_os_str());
    builder.append_dir_all(bundle_name, dir_path)?;
    builder.into_inner()?.finish()?;

    Ok(archive_path)
}
