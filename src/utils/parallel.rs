use std::fs;

use log::debug;
use rayon::prelude::*;

use crate::models::{ArchiveEntry, FilterError, ScannedFile};

/// Parallel loader for the files going into an archive
///
/// Archive writers are sequential, so contents are read up front on the rayon
/// pool and handed over in entry-name order.
#[derive(Debug, Clone, Default)]
pub struct ParallelReader {
    thread_count: Option<usize>,
}

impl ParallelReader {
    /// Use rayon's global pool
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a dedicated pool with a fixed thread count
    pub fn with_threads(thread_count: usize) -> Self {
        Self {
            thread_count: Some(thread_count.max(1)),
        }
    }

    /// Read every scanned file into memory
    ///
    /// # Returns
    /// * Entries in the same order as `files`
    pub fn read_entries(&self, files: &[ScannedFile]) -> Result<Vec<ArchiveEntry>, FilterError> {
        debug!("Reading {} files for archiving", files.len());

        match self.thread_count {
            None => read_all(files),
            Some(threads) => rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build()
                .map_err(|e| FilterError::Runtime(format!("Failed to create thread pool: {}", e)))?
                .install(|| read_all(files)),
        }
    }
}

fn read_all(files: &[ScannedFile]) -> Result<Vec<ArchiveEntry>, FilterError> {
    files
        .par_iter()
        .map(|file| {
            let data = fs::read(&file.path).map_err(|e| {
                FilterError::Archive(format!("Failed to read file {}: {}", file.path.display(), e))
            })?;
            Ok(ArchiveEntry::new(file.entry_name.clone(), data))
        })
        .collect()
}
