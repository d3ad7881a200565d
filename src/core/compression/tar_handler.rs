use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom, Write};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use bzip2::read::BzDecoder;
use bzip2::write::BzEncoder;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use log::{debug, warn};
use tar::{Archive, Builder, EntryType, Header};

use crate::core::compression::common::{ArchiveAdapter, ArchiveKind, TarCompression};
use crate::core::file_ops::StagingArea;
use crate::models::{ArchiveEntry, FilterError};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];
const BZIP2_MAGIC: [u8; 3] = *b"BZh";

/// Tarballs, optionally wrapped in gzip or bzip2
///
/// The configured compression applies when writing. Reading detects the
/// wrapper from the archive's leading bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct TarAdapter {
    compression: TarCompression,
}

impl TarAdapter {
    pub fn new(compression: TarCompression) -> Self {
        Self { compression }
    }

    pub fn compression(&self) -> TarCompression {
        self.compression
    }
}

impl ArchiveAdapter for TarAdapter {
    fn kind(&self) -> ArchiveKind {
        ArchiveKind::Tar(self.compression)
    }

    fn write_entries(&self, out: &mut File, entries: Vec<ArchiveEntry>) -> Result<(), FilterError> {
        let result = match self.compression {
            TarCompression::None => append_all(out, &entries).map(|_| ()),
            TarCompression::Gz => append_all(GzEncoder::new(out, flate2::Compression::default()), &entries)
                .and_then(|encoder| encoder.finish().map(|_| ())),
            TarCompression::Bz2 => append_all(BzEncoder::new(out, bzip2::Compression::default()), &entries)
                .and_then(|encoder| encoder.finish().map(|_| ())),
        };
        result.map_err(|e| FilterError::Archive(format!("Error creating the Tar archive: {}", e)))
    }

    fn extract_entries(&self, archive: &Path, staging: &StagingArea) -> Result<(), FilterError> {
        let mut file = File::open(archive).map_err(|e| {
            FilterError::Archive(format!("Failed to open Tar archive {}: {}", archive.display(), e))
        })?;
        let wrapper = detect_compression(&mut file)?;
        debug!("Reading {} as {:?} tarball", archive.display(), wrapper);

        let reader: Box<dyn Read> = match wrapper {
            TarCompression::None => Box::new(BufReader::new(file)),
            TarCompression::Gz => Box::new(GzDecoder::new(BufReader::new(file))),
            TarCompression::Bz2 => Box::new(BzDecoder::new(BufReader::new(file))),
        };

        let corrupted = |e: io::Error| FilterError::CorruptedArchive(format!("Error while extracting the Tar archive: {}", e));
        let mut tarball = Archive::new(reader);

        for entry in tarball.entries().map_err(corrupted)? {
            let mut entry = entry.map_err(corrupted)?;
            let name = entry.path().map_err(corrupted)?.to_string_lossy().into_owned();

            match entry.header().entry_type() {
                EntryType::Directory => staging.create_dir_entry(&name)?,
                EntryType::Regular | EntryType::Continuous => {
                    let mut data = Vec::new();
                    entry.read_to_end(&mut data).map_err(corrupted)?;
                    staging.write_entry(&name, &data)?;
                }
                other => warn!("Skipping tar entry {} of type {:?}", name, other),
            }
        }

        Ok(())
    }
}

/// Write every entry into a tar stream over `writer`, returning the writer
fn append_all<W: Write>(writer: W, entries: &[ArchiveEntry]) -> io::Result<W> {
    let mtime = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    let mut builder = Builder::new(writer);
    for entry in entries {
        let mut header = Header::new_gnu();
        header.set_entry_type(EntryType::Regular);
        header.set_size(entry.data.len() as u64);
        header.set_mode(0o644);
        header.set_mtime(mtime);
        builder.append_data(&mut header, &entry.name, entry.data.as_slice())?;
    }
    builder.into_inner()
}

/// Sniff the wrapper from magic bytes, leaving the file rewound
fn detect_compression(file: &mut File) -> Result<TarCompression, FilterError> {
    let mut magic = [0u8; 3];
    let mut read = 0;
    while read < magic.len() {
        let n = file.read(&mut magic[read..])?;
        if n == 0 {
            break;
        }
        read += n;
    }
    file.seek(SeekFrom::Start(0))?;

    Ok(if read >= 2 && magic[..2] == GZIP_MAGIC {
        TarCompression::Gz
    } else if read == 3 && magic == BZIP2_MAGIC {
        TarCompression::Bz2
    } else {
        TarCompression::None
    })
}
