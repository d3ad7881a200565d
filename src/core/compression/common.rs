// Archive adapter trait shared by every archive format

use std::fmt;
use std::fs::{self, File};
use std::path::Path;

use log::info;
use serde::Deserialize;
use tempfile::NamedTempFile;

use crate::core::file_ops::{DirectoryScanner, StagingArea};
use crate::models::{ArchiveEntry, FilterError};
use crate::utils::parallel::ParallelReader;

/// Stream compression wrapped around a tarball
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TarCompression {
    None,
    #[default]
    Gz,
    Bz2,
}

/// Archive formats the crate can read and write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    Zip,
    Tar(TarCompression),
    SevenZ,
}

impl fmt::Display for ArchiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArchiveKind::Zip => write!(f, "zip"),
            ArchiveKind::Tar(TarCompression::None) => write!(f, "tar"),
            ArchiveKind::Tar(TarCompression::Gz) => write!(f, "tar.gz"),
            ArchiveKind::Tar(TarCompression::Bz2) => write!(f, "tar.bz2"),
            ArchiveKind::SevenZ => write!(f, "7z"),
        }
    }
}

/// A readable and writable archive format
///
/// Implementors supply the format-specific `write_entries` and
/// `extract_entries`; the four archive operations are built on top of them.
pub trait ArchiveAdapter: Send + Sync {
    fn kind(&self) -> ArchiveKind;

    /// Write `entries` as a complete archive into `out`
    fn write_entries(&self, out: &mut File, entries: Vec<ArchiveEntry>) -> Result<(), FilterError>;

    /// Expand every entry of `archive` into the staging area
    fn extract_entries(&self, archive: &Path, staging: &StagingArea) -> Result<(), FilterError>;

    /// Archive a single file under its base name
    fn compress_file(&self, archive: &Path, file: &Path) -> Result<(), FilterError> {
        if !file.is_file() {
            return Err(FilterError::InvalidArgument(format!(
                "The file {} does not exist",
                file.display()
            )));
        }
        let data = fs::read(file)
            .map_err(|e| FilterError::Archive(format!("Failed to read file {}: {}", file.display(), e)))?;
        let entry = ArchiveEntry::new(base_name(&file.to_string_lossy()), data);
        write_archive(self, archive, vec![entry])
    }

    /// Archive `contents` as an entry named after `file_name`'s base name
    fn compress_string_to_file(&self, archive: &Path, file_name: &str, contents: &[u8]) -> Result<(), FilterError> {
        let name = base_name(file_name);
        if name.is_empty() {
            return Err(FilterError::InvalidArgument(format!(
                "'{}' is not a usable file name",
                file_name
            )));
        }
        write_archive(self, archive, vec![ArchiveEntry::new(name, contents.to_vec())])
    }

    /// Archive every regular file below `directory` under its relative name
    fn compress_directory_contents(&self, archive: &Path, directory: &Path) -> Result<(), FilterError> {
        if !directory.is_dir() {
            return Err(FilterError::InvalidArgument(
                "The directory argument is not a directory".into(),
            ));
        }
        let files = DirectoryScanner::new().scan(directory)?;
        let entries = ParallelReader::new().read_entries(&files)?;
        write_archive(self, archive, entries)
    }

    /// Expand `archive` into `target`, creating the target if needed
    fn decompress_archive(&self, archive: &Path, target: &Path) -> Result<(), FilterError> {
        if !archive.is_file() {
            return Err(FilterError::InvalidArgument(format!(
                "An archive does not exist at {}",
                archive.display()
            )));
        }
        ensure_writable_directory(target)?;

        let staging = StagingArea::new(target)?;
        self.extract_entries(archive, &staging)?;
        staging.commit()?;

        info!("Expanded {} archive {} into {}", self.kind(), archive.display(), target.display());
        Ok(())
    }
}

/// Create or replace `archive` atomically
///
/// The archive is written to a temporary file in the same directory and only
/// persisted over the destination once the adapter has finished.
pub fn write_archive<A>(adapter: &A, archive: &Path, entries: Vec<ArchiveEntry>) -> Result<(), FilterError>
where
    A: ArchiveAdapter + ?Sized,
{
    let parent = match archive.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    if !parent.is_dir() {
        return Err(FilterError::InvalidArgument(format!(
            "The archive directory {} does not exist",
            parent.display()
        )));
    }

    let count = entries.len();
    let mut temp = NamedTempFile::new_in(parent).map_err(|e| {
        FilterError::Archive(format!("Failed to create temporary archive in {}: {}", parent.display(), e))
    })?;
    adapter.write_entries(temp.as_file_mut(), entries)?;
    temp.persist(archive).map_err(|e| {
        FilterError::Archive(format!("Failed to write archive {}: {}", archive.display(), e.error))
    })?;

    info!("Wrote {} archive {} with {} entries", adapter.kind(), archive.display(), count);
    Ok(())
}

/// Reject targets that exist but are not writable directories; create missing ones
pub fn ensure_writable_directory(target: &Path) -> Result<(), FilterError> {
    if target.exists() {
        if !target.is_dir() {
            return Err(FilterError::InvalidArgument(format!(
                "The target {} is not a directory",
                target.display()
            )));
        }
        if fs::metadata(target)?.permissions().readonly() {
            return Err(FilterError::InvalidArgument(format!(
                "The target directory {} cannot be written to",
                target.display()
            )));
        }
        return Ok(());
    }
    fs::create_dir_all(target).map_err(|e| {
        FilterError::InvalidArgument(format!("The target directory {} cannot be created: {}", target.display(), e))
    })
}

/// Last path component, accepting either separator
pub fn base_name(path: &str) -> String {
    path.trim_end_matches(['/', '\\'])
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .to_string()
}
