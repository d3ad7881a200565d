use std::path::PathBuf;

/// A regular file found below a directory being archived
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedFile {
    /// Root-relative name, always `/`-separated
    pub entry_name: String,
    /// Location on disk
    pub path: PathBuf,
}

impl ScannedFile {
    pub fn new(entry_name: String, path: PathBuf) -> Self {
        Self { entry_name, path }
    }
}

/// An archive entry held in memory, ready to be written
#[derive(Debug, Clone)]
pub struct ArchiveEntry {
    pub name: String,
    pub data: Vec<u8>,
}

impl ArchiveEntry {
    pub fn new(name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }
}
