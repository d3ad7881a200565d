// In-memory string compression

use std::io::{Read, Write};

use bzip2::read::BzDecoder;
use bzip2::write::BzEncoder;
use flate2::read::{DeflateDecoder, GzDecoder, ZlibDecoder};
use flate2::write::{DeflateEncoder, GzEncoder, ZlibEncoder};
use serde::Deserialize;

use crate::models::FilterError;

/// Compress and decompress whole byte strings
pub trait StringCompressionAdapter: Send + Sync {
    fn compress(&self, value: &[u8]) -> Result<Vec<u8>, FilterError>;
    fn decompress(&self, value: &[u8]) -> Result<Vec<u8>, FilterError>;
}

/// zlib-family container written by [`GzAdapter`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GzMode {
    /// zlib stream
    #[default]
    Compress,
    /// Raw deflate
    Deflate,
    /// gzip file format
    Encode,
}

/// Library default level
pub const DEFAULT_GZ_LEVEL: i32 = -1;
pub const DEFAULT_BZ2_BLOCK_SIZE: u32 = 4;

#[derive(Debug, Clone, Copy)]
pub struct GzAdapter {
    level: flate2::Compression,
    mode: GzMode,
}

impl GzAdapter {
    /// `level` is -1 for the library default, otherwise 0..=9
    pub fn new(level: i32, mode: GzMode) -> Result<Self, FilterError> {
        let level = match level {
            DEFAULT_GZ_LEVEL => flate2::Compression::default(),
            0..=9 => flate2::Compression::new(level as u32),
            _ => {
                return Err(FilterError::InvalidConfig(format!(
                    "Compression level '{}' must be between -1 and 9",
                    level
                )))
            }
        };
        Ok(Self { level, mode })
    }
}

impl Default for GzAdapter {
    fn default() -> Self {
        Self {
            level: flate2::Compression::default(),
            mode: GzMode::default(),
        }
    }
}

fn compression_failed(e: std::io::Error) -> FilterError {
    FilterError::Compression(format!("Compression failed: {}", e))
}

fn decompression_failed(e: std::io::Error) -> FilterError {
    FilterError::Compression(format!("Error during decompression: {}", e))
}

impl StringCompressionAdapter for GzAdapter {
    fn compress(&self, value: &[u8]) -> Result<Vec<u8>, FilterError> {
        match self.mode {
            GzMode::Compress => {
                let mut encoder = ZlibEncoder::new(Vec::new(), self.level);
                encoder.write_all(value).map_err(compression_failed)?;
                encoder.finish().map_err(compression_failed)
            }
            GzMode::Deflate => {
                let mut encoder = DeflateEncoder::new(Vec::new(), self.level);
                encoder.write_all(value).map_err(compression_failed)?;
                encoder.finish().map_err(compression_failed)
            }
            GzMode::Encode => {
                let mut encoder = GzEncoder::new(Vec::new(), self.level);
                encoder.write_all(value).map_err(compression_failed)?;
                encoder.finish().map_err(compression_failed)
            }
        }
    }

    fn decompress(&self, value: &[u8]) -> Result<Vec<u8>, FilterError> {
        let mut out = Vec::new();
        let read = match self.mode {
            GzMode::Compress => ZlibDecoder::new(value).read_to_end(&mut out),
            GzMode::Deflate => DeflateDecoder::new(value).read_to_end(&mut out),
            GzMode::Encode => GzDecoder::new(value).read_to_end(&mut out),
        };
        read.map_err(decompression_failed)?;
        Ok(out)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Bz2Adapter {
    block_size: u32,
}

impl Bz2Adapter {
    /// `block_size` is in units of 100k, 1..=9
    pub fn new(block_size: u32) -> Result<Self, FilterError> {
        if !(1..=9).contains(&block_size) {
            return Err(FilterError::InvalidConfig(format!(
                "Block size '{}' must be between 1 and 9",
                block_size
            )));
        }
        Ok(Self { block_size })
    }
}

impl Default for Bz2Adapter {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BZ2_BLOCK_SIZE,
        }
    }
}

impl StringCompressionAdapter for Bz2Adapter {
    fn compress(&self, value: &[u8]) -> Result<Vec<u8>, FilterError> {
        let mut encoder = BzEncoder::new(Vec::new(), bzip2::Compression::new(self.block_size));
        encoder.write_all(value).map_err(compression_failed)?;
        encoder.finish().map_err(compression_failed)
    }

    fn decompress(&self, value: &[u8]) -> Result<Vec<u8>, FilterError> {
        let mut out = Vec::new();
        BzDecoder::new(value)
            .read_to_end(&mut out)
            .map_err(decompression_failed)?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEXT: &[u8] = b"compress me compress me compress me compress me";

    #[test]
    fn test_gz_modes_produce_their_containers() {
        let zlib = GzAdapter::new(9, GzMode::Compress).unwrap().compress(TEXT).unwrap();
        assert_eq!(zlib[0], 0x78);

        let gzip = GzAdapter::new(-1, GzMode::Encode).unwrap().compress(TEXT).unwrap();
        assert_eq!(gzip[..2], [0x1f, 0x8b]);

        let raw = GzAdapter::new(0, GzMode::Deflate).unwrap();
        assert_eq!(raw.decompress(&raw.compress(TEXT).unwrap()).unwrap(), TEXT);
    }

    #[test]
    fn test_gz_level_range() {
        assert!(GzAdapter::new(10, GzMode::Compress).unwrap_err().is_config_error());
        assert!(GzAdapter::new(-2, GzMode::Compress).unwrap_err().is_config_error());
    }

    #[test]
    fn test_gz_mode_mismatch_fails() {
        let zlib = GzAdapter::default().compress(TEXT).unwrap();
        let gzip = GzAdapter::new(-1, GzMode::Encode).unwrap();
        assert!(matches!(gzip.decompress(&zlib), Err(FilterError::Compression(_))));
    }

    #[test]
    fn test_bz2() {
        let adapter = Bz2Adapter::new(9).unwrap();
        let compressed = adapter.compress(TEXT).unwrap();
        assert_eq!(&compressed[..3], b"BZh");
        assert_eq!(Bz2Adapter::default().decompress(&compressed).unwrap(), TEXT);

        assert!(Bz2Adapter::new(0).unwrap_err().is_config_error());
        assert!(matches!(
            Bz2Adapter::default().decompress(b"not bzip2"),
            Err(FilterError::Compression(_))
        ));
    }
}
