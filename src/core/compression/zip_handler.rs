use std::fs::{self, File};
use std::io::{self, Read};
use std::path::Path;

use log::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::core::compression::common::{ArchiveAdapter, ArchiveKind};
use crate::core::file_ops::StagingArea;
use crate::models::{ArchiveEntry, FilterError};

/// ZIP archives (deflate)
#[derive(Debug, Clone, Copy, Default)]
pub struct ZipAdapter;

impl ZipAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl ArchiveAdapter for ZipAdapter {
    fn kind(&self) -> ArchiveKind {
        ArchiveKind::Zip
    }

    /// # Behavior
    /// - Already-compressed formats (PNG, JPG, MP3…) are stored without re-compression
    /// - Everything else is deflated
    fn write_entries(&self, out: &mut File, entries: Vec<ArchiveEntry>) -> Result<(), FilterError> {
        let mut zip = ZipWriter::new(out);

        let stored_opts = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Stored)
            .unix_permissions(0o644);
        let deflated_opts = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .unix_permissions(0o644);

        for entry in entries {
            let opts = if is_already_compressed(&entry.name) {
                stored_opts
            } else {
                deflated_opts
            };

            zip.start_file(entry.name.as_str(), opts).map_err(|e| {
                FilterError::Archive(format!("Failed to start file {} in archive: {}", entry.name, e))
            })?;

            io::copy(&mut io::Cursor::new(&entry.data), &mut zip).map_err(|e| {
                FilterError::Archive(format!("Failed to write file {} to archive: {}", entry.name, e))
            })?;
        }

        zip.finish()
            .map_err(|e| FilterError::Archive(format!("Failed to finalize ZIP archive: {}", e)))?;

        Ok(())
    }

    /// # Behavior
    /// - Preserves directory hierarchy
    /// - Restores file permissions on Unix systems
    fn extract_entries(&self, archive: &Path, staging: &StagingArea) -> Result<(), FilterError> {
        let file = File::open(archive).map_err(|e| {
            FilterError::Archive(format!("Failed to open ZIP archive {}: {}", archive.display(), e))
        })?;

        let mut zip = ZipArchive::new(file)
            .map_err(|e| FilterError::CorruptedArchive(format!("Failed to read ZIP archive: {}", e)))?;

        for i in 0..zip.len() {
            let mut file = zip.by_index(i).map_err(|e| {
                FilterError::CorruptedArchive(format!("Failed to read file at index {}: {}", i, e))
            })?;
            let name = file.name().to_string();

            if file.is_dir() {
                staging.create_dir_entry(&name)?;
                continue;
            }

            let mut data = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut data).map_err(|e| {
                FilterError::CorruptedArchive(format!("Failed to extract file {}: {}", name, e))
            })?;
            staging.write_entry(&name, &data)?;

            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                if let Some(mode) = file.unix_mode() {
                    // Keep the owner able to move the file into place
                    let mode = (mode & 0o777) | 0o600;
                    fs::set_permissions(staging.entry_path(&name)?, fs::Permissions::from_mode(mode))?;
                }
            }
        }

        debug!("Read {} ZIP entries from {}", zip.len(), archive.display());
        Ok(())
    }
}

/// Formats that won't benefit from deflate
fn is_already_compressed(name: &str) -> bool {
    let ext = name.rsplit('.').next().unwrap_or("").to_ascii_lowercase();
    matches!(
        ext.as_str(),
        "png" | "jpg" | "jpeg" | "gif" | "webp"
            | "mp3" | "mp4" | "ogg" | "aac" | "flac"
            | "zip" | "7z" | "gz" | "bz2" | "tgz"
    )
}
