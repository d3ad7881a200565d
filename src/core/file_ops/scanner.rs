use std::path::Path;

use log::warn;
use walkdir::WalkDir;

use crate::models::{FilterError, ScannedFile};

/// Recursive scanner for the regular files below a directory
///
/// Entry names are relative to the root and always use `/` separators, so
/// archives built from them look the same on every host.
/// Symbolic links are not followed; links themselves are skipped.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectoryScanner;

impl DirectoryScanner {
    pub fn new() -> Self {
        Self
    }

    /// Scan a directory recursively
    ///
    /// # Returns
    /// * Regular files sorted by entry name
    ///
    /// # Example
    /// ```ignore
    /// let files = DirectoryScanner::new().scan(Path::new("/tmp/site"))?;
    /// // files[0].entry_name == "css/main.css"
    /// ```
    pub fn scan(&self, root_path: &Path) -> Result<Vec<ScannedFile>, FilterError> {
        if !root_path.is_dir() {
            return Err(FilterError::InvalidArgument(format!(
                "'{}' is not a directory",
                root_path.display()
            )));
        }

        let mut files = Vec::new();

        for entry in WalkDir::new(root_path) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable entry below {}: {}", root_path.display(), e);
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let relative = entry.path().strip_prefix(root_path).map_err(|e| {
                FilterError::Io(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    format!("Failed to calculate relative path: {}", e),
                ))
            })?;

            files.push(ScannedFile::new(entry_name(relative), entry.path().to_path_buf()));
        }

        files.sort_by(|a, b| a.entry_name.cmp(&b.entry_name));

        Ok(files)
    }
}

/// `/`-joined form of a relative path
pub fn entry_name(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
