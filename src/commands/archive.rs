use std::fs;
use std::path::Path;

use log::info;

use crate::core::compression::{
    ArchiveFormat, CompressToArchive, CompressToArchiveOptions, DecompressArchive, DecompressArchiveOptions,
    TarCompression,
};
use crate::core::filter::Filter;
use crate::models::Value;

/// Compress a directory, a file or literal text into an archive
///
/// # Arguments
/// * `source` - Directory or file path; anything else is taken as entry contents
/// * `archive` - Archive to create or replace
/// * `file_name` - Entry name used when `source` is literal text
///
/// # Returns
/// * Path of the written archive
pub fn compress(
    source: &str,
    archive: &Path,
    adapter: ArchiveFormat,
    mode: TarCompression,
    file_name: Option<String>,
) -> Result<String, String> {
    let options = CompressToArchiveOptions {
        archive: archive.to_string_lossy().into_owned(),
        adapter,
        mode,
        file_name,
    };
    let filter = CompressToArchive::new(options)?;

    let result = filter.filter(Value::from(source))?;
    let written = result
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| format!("Nothing was compressed from {}", source))?;

    info!("Compressed {} into {}", source, written);
    Ok(written)
}

/// Expand an archive into a directory, creating the directory if needed
///
/// # Returns
/// * The target directory
pub fn decompress(archive: &Path, target: &Path) -> Result<String, String> {
    if !archive.is_file() {
        return Err(format!("An archive does not exist at {}", archive.display()));
    }
    fs::create_dir_all(target)
        .map_err(|e| format!("Failed to create target directory {}: {}", target.display(), e))?;

    let filter = DecompressArchive::new(DecompressArchiveOptions {
        target: target.to_string_lossy().into_owned(),
    })?;

    let input = Value::from(archive.to_string_lossy().as_ref());
    let result = filter.filter(input.clone())?;
    if result == input {
        return Err(format!("Cannot determine the archive format of {}", archive.display()));
    }

    info!("Expanded {} into {}", archive.display(), target.display());
    Ok(target.to_string_lossy().into_owned())
}
