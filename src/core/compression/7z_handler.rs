use std::fs::File;
use std::io::Read;
use std::path::Path;

use log::debug;
use sevenz_rust::{Password, SevenZArchiveEntry, SevenZReader, SevenZWriter};

use crate::core::compression::common::{ArchiveAdapter, ArchiveKind};
use crate::core::file_ops::StagingArea;
use crate::models::{ArchiveEntry, FilterError};

/// 7z archives (LZMA2)
///
/// Password-protected archives are not supported.
#[derive(Debug, Clone, Copy, Default)]
pub struct SevenZAdapter;

impl SevenZAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl ArchiveAdapter for SevenZAdapter {
    fn kind(&self) -> ArchiveKind {
        ArchiveKind::SevenZ
    }

    fn write_entries(&self, out: &mut File, entries: Vec<ArchiveEntry>) -> Result<(), FilterError> {
        let mut writer = SevenZWriter::new(out)
            .map_err(|e| FilterError::Archive(format!("Failed to create 7z writer: {}", e)))?;

        for entry in entries {
            let mut archive_entry = SevenZArchiveEntry::new();
            archive_entry.name = entry.name.clone();

            writer
                .push_archive_entry(archive_entry, Some(entry.data.as_slice()))
                .map_err(|e| {
                    FilterError::Archive(format!("Failed to add file {} to archive: {}", entry.name, e))
                })?;
        }

        writer
            .finish()
            .map_err(|e| FilterError::Archive(format!("Failed to finalize 7z archive: {}", e)))?;

        Ok(())
    }

    fn extract_entries(&self, archive: &Path, staging: &StagingArea) -> Result<(), FilterError> {
        let file = File::open(archive).map_err(|e| {
            FilterError::Archive(format!("Failed to open 7z archive {}: {}", archive.display(), e))
        })?;
        let file_size = file
            .metadata()
            .map_err(|e| FilterError::Archive(format!("Failed to get file metadata: {}", e)))?
            .len();

        let mut reader = SevenZReader::new(file, file_size, Password::empty())
            .map_err(|e| FilterError::CorruptedArchive(format!("Failed to read 7z archive: {}", e)))?;

        // Entries are buffered so staging errors keep their own type
        let mut directories = Vec::new();
        let mut files = Vec::new();
        reader
            .for_each_entries(|entry, reader| {
                if entry.is_directory() {
                    directories.push(entry.name().to_string());
                } else {
                    let mut data = Vec::new();
                    reader.read_to_end(&mut data).map_err(sevenz_rust::Error::io)?;
                    files.push(ArchiveEntry::new(entry.name(), data));
                }
                Ok(true)
            })
            .map_err(|e| FilterError::CorruptedArchive(format!("Failed to extract 7z archive: {}", e)))?;

        debug!(
            "Read {} files and {} directories from {}",
            files.len(),
            directories.len(),
            archive.display()
        );

        for dir in &directories {
            staging.create_dir_entry(dir)?;
        }
        for file in &files {
            staging.write_entry(&file.name, &file.data)?;
        }
        Ok(())
    }
}
