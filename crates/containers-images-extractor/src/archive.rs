//! Scan paths given as tar archives

use crate::error::{ExtractError, Result};
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tar::Archive;

enum Compression {
    None,
    Gzip,
}

fn compression_of(path: &Path) -> Option<Compression> {
    let name = path.file_name()?.to_str()?.to_ascii_lowercase();

    if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
        Some(Compression::Gzip)
    } else if name.ends_with(".tar") {
        Some(Compression::None)
    } else {
        None
    }
}

/// Whether `path` names an archive [`unpack_archive`] understands
pub fn is_archive(path: &Path) -> bool {
    compression_of(path).is_some()
}

/// Unpacks a `.tar`, `.tar.gz` or `.tgz` archive into `destination`
///
/// Entries escaping the destination (`..`, absolute paths) are skipped by `tar`.
pub fn unpack_archive(archive: &Path, destination: &Path) -> Result<()> {
    let compression = compression_of(archive)
        .ok_or_else(|| ExtractError::UnsupportedScanPath(archive.to_path_buf()))?;

    tracing::debug!(
        "Unpacking {} into {}",
        archive.display(),
        destination.display()
    );

    let file = File::open(archive)?;
    let reader: Box<dyn Read> = match compression {
        Compression::Gzip => Box::new(GzDecoder::new(file)),
        Compression::None => Box::new(file),
    };

    Archive::new(reader)
        .unpack(destination)
        .map_err(|e| ExtractError::Archive {
            path: archive.to_path_buf(),
            message: e.to_string(),
        })
}
