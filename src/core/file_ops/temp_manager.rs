use std::fs;
use std::path::{Component, Path, PathBuf};

use log::debug;
use tempfile::TempDir;
use walkdir::WalkDir;

use crate::models::FilterError;

/// Hidden extraction area inside a target directory
///
/// Archives are expanded here first and merged into the target only once the
/// whole archive has been read. Dropping an uncommitted area removes it along
/// with anything partially extracted.
pub struct StagingArea {
    temp_dir: TempDir,
    target: PathBuf,
}

impl StagingArea {
    /// Create a staging directory inside `target`
    pub fn new(target: &Path) -> Result<Self, FilterError> {
        let temp_dir = tempfile::Builder::new()
            .prefix(".value-filter-")
            .tempdir_in(target)
            .map_err(|e| {
                FilterError::Archive(format!(
                    "Failed to create staging directory in {}: {}",
                    target.display(),
                    e
                ))
            })?;

        Ok(Self {
            temp_dir,
            target: target.to_path_buf(),
        })
    }

    /// Staging directory path
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Location inside the staging area for an archive entry
    ///
    /// Absolute names and names that climb out with `..` are rejected.
    pub fn entry_path(&self, entry_name: &str) -> Result<PathBuf, FilterError> {
        let relative = safe_relative_path(entry_name).ok_or_else(|| {
            FilterError::CorruptedArchive(format!("Entry '{}' escapes the extraction directory", entry_name))
        })?;
        Ok(self.temp_dir.path().join(relative))
    }

    /// Write an entry's contents, creating parent directories as needed
    pub fn write_entry(&self, entry_name: &str, content: &[u8]) -> Result<(), FilterError> {
        let dest = self.entry_path(entry_name)?;

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                FilterError::Archive(format!("Failed to create directory {}: {}", parent.display(), e))
            })?;
        }

        fs::write(&dest, content)
            .map_err(|e| FilterError::Archive(format!("Failed to write to {}: {}", dest.display(), e)))
    }

    /// Create a directory entry
    ///
    /// The archive's own root (`./` in tarballs) is skipped.
    pub fn create_dir_entry(&self, entry_name: &str) -> Result<(), FilterError> {
        if matches!(entry_name, "." | "./" | "/" | "") {
            return Ok(());
        }
        let dest = self.entry_path(entry_name)?;
        fs::create_dir_all(&dest)
            .map_err(|e| FilterError::Archive(format!("Failed to create directory {}: {}", dest.display(), e)))
    }

    /// Move everything staged into the target directory
    ///
    /// Existing files in the target are replaced; existing directories are merged.
    pub fn commit(self) -> Result<(), FilterError> {
        let staged_root = self.temp_dir.path();

        for entry in WalkDir::new(staged_root).min_depth(1) {
            let entry = entry.map_err(|e| FilterError::Archive(format!("Failed to read staged entry: {}", e)))?;
            let relative = entry
                .path()
                .strip_prefix(staged_root)
                .map_err(|e| FilterError::Archive(format!("Failed to calculate relative path: {}", e)))?;
            let dest = self.target.join(relative);

            if entry.file_type().is_dir() {
                if dest.is_file() {
                    fs::remove_file(&dest)?;
                }
                fs::create_dir_all(&dest).map_err(|e| {
                    FilterError::Archive(format!("Failed to create directory {}: {}", dest.display(), e))
                })?;
                continue;
            }

            if dest.is_dir() {
                return Err(FilterError::Archive(format!(
                    "Cannot replace directory {} with a file",
                    dest.display()
                )));
            }
            if dest.exists() {
                fs::remove_file(&dest)?;
            }
            fs::rename(entry.path(), &dest).map_err(|e| {
                FilterError::Archive(format!("Failed to move {} into place: {}", dest.display(), e))
            })?;
        }

        debug!("Merged staged files into {}", self.target.display());
        Ok(())
    }
}

/// Relative path for an archive entry name, if it stays below its root
fn safe_relative_path(entry_name: &str) -> Option<PathBuf> {
    let mut relative = PathBuf::new();
    for component in Path::new(&entry_name.replace('\\', "/")).components() {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    if relative.as_os_str().is_empty() {
        None
    } else {
        Some(relative)
    }
}
