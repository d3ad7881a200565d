// Filters over the compression adapters

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::debug;
use serde::Deserialize;

use crate::core::compression::common::{ensure_writable_directory, ArchiveAdapter, ArchiveKind, TarCompression};
use crate::core::compression::resolver::{adapter_for, AggregateArchiveAdapterResolver, ArchiveAdapterResolver};
use crate::core::compression::string::{
    Bz2Adapter, GzAdapter, GzMode, StringCompressionAdapter, DEFAULT_BZ2_BLOCK_SIZE, DEFAULT_GZ_LEVEL,
};
use crate::core::file_ops::FileInformation;
use crate::core::filter::Filter;
use crate::models::config::parse_options;
use crate::models::{FilterError, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveFormat {
    #[default]
    Zip,
    Tar,
    #[serde(rename = "7z")]
    SevenZ,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompressToArchiveOptions {
    pub archive: String,
    #[serde(default)]
    pub adapter: ArchiveFormat,
    /// Tarball wrapper; ignored by the other formats
    #[serde(default)]
    pub mode: TarCompression,
    #[serde(default)]
    pub file_name: Option<String>,
}

impl CompressToArchiveOptions {
    pub fn new(archive: impl Into<String>) -> Self {
        Self {
            archive: archive.into(),
            adapter: ArchiveFormat::default(),
            mode: TarCompression::default(),
            file_name: None,
        }
    }

    pub fn kind(&self) -> ArchiveKind {
        match self.adapter {
            ArchiveFormat::Zip => ArchiveKind::Zip,
            ArchiveFormat::Tar => ArchiveKind::Tar(self.mode),
            ArchiveFormat::SevenZ => ArchiveKind::SevenZ,
        }
    }

    pub fn validate(&self) -> Result<(), FilterError> {
        if self.archive.is_empty() {
            return Err(FilterError::InvalidConfig("The `archive` option must not be empty".into()));
        }
        if matches!(&self.file_name, Some(name) if name.is_empty()) {
            return Err(FilterError::InvalidConfig("The `fileName` option must not be empty".into()));
        }
        Ok(())
    }
}

/// Compress a directory, a file or a string into an archive
///
/// Returns the archive path.
pub struct CompressToArchive {
    adapter: Arc<dyn ArchiveAdapter>,
    archive: PathBuf,
    file_name: Option<String>,
}

impl fmt::Debug for CompressToArchive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompressToArchive")
            .field("archive", &self.archive)
            .field("file_name", &self.file_name)
            .finish_non_exhaustive()
    }
}

impl CompressToArchive {
    pub fn new(options: CompressToArchiveOptions) -> Result<Self, FilterError> {
        options.validate()?;
        Ok(Self {
            adapter: adapter_for(options.kind()),
            archive: PathBuf::from(options.archive),
            file_name: options.file_name,
        })
    }

    pub fn from_options(options: serde_json::Value) -> Result<Self, FilterError> {
        Self::new(parse_options("CompressToArchive", options)?)
    }

    /// Use a specific adapter instead of one named in options
    pub fn with_adapter(adapter: Arc<dyn ArchiveAdapter>, archive: impl Into<PathBuf>, file_name: Option<String>) -> Self {
        Self {
            adapter,
            archive: archive.into(),
            file_name,
        }
    }

    fn archive_value(&self) -> Value {
        Value::Str(self.archive.to_string_lossy().into_owned())
    }
}

impl Filter for CompressToArchive {
    fn filter(&self, value: Value) -> Result<Value, FilterError> {
        if let Value::Str(path) = &value {
            if !path.is_empty() && Path::new(path).is_dir() {
                self.adapter.compress_directory_contents(&self.archive, Path::new(path))?;
                return Ok(self.archive_value());
            }
        }

        if FileInformation::is_possible_file(&value) {
            let file = FileInformation::from_value(&value)?;
            self.adapter.compress_file(&self.archive, &file.path)?;
            return Ok(self.archive_value());
        }

        let Some(contents) = value.as_bytes() else {
            return Ok(value);
        };
        let Some(file_name) = &self.file_name else {
            return Err(FilterError::Runtime(
                "The `fileName` option must be present when compressing arbitrary strings".into(),
            ));
        };

        self.adapter.compress_string_to_file(&self.archive, file_name, contents)?;
        Ok(self.archive_value())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DecompressArchiveOptions {
    pub target: String,
}

/// Expand an archive into a target directory
///
/// Returns the target path, or the input unchanged when it is not an archive.
pub struct DecompressArchive {
    target: PathBuf,
    resolver: Box<dyn ArchiveAdapterResolver>,
}

impl fmt::Debug for DecompressArchive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecompressArchive").field("target", &self.target).finish_non_exhaustive()
    }
}

impl DecompressArchive {
    pub fn new(options: DecompressArchiveOptions) -> Result<Self, FilterError> {
        Self::with_resolver(options, Box::new(AggregateArchiveAdapterResolver::default()))
    }

    pub fn with_resolver(
        options: DecompressArchiveOptions,
        resolver: Box<dyn ArchiveAdapterResolver>,
    ) -> Result<Self, FilterError> {
        let target = PathBuf::from(&options.target);
        let writable = target.is_dir()
            && target
                .metadata()
                .map(|m| !m.permissions().readonly())
                .unwrap_or(false);
        if !writable {
            return Err(FilterError::InvalidConfig(format!(
                "The target directory {} is either not a directory, or it cannot be written to",
                options.target
            )));
        }
        Ok(Self { target, resolver })
    }

    pub fn from_options(options: serde_json::Value) -> Result<Self, FilterError> {
        Self::new(parse_options("DecompressArchive", options)?)
    }
}

impl Filter for DecompressArchive {
    fn filter(&self, value: Value) -> Result<Value, FilterError> {
        if !FileInformation::is_possible_file(&value) {
            return Ok(value);
        }
        let file = FileInformation::from_value(&value)?;

        let adapter = match self.resolver.resolve(&file) {
            Ok(adapter) => adapter,
            Err(e) => {
                debug!("Leaving {} untouched: {}", file.path.display(), e);
                return Ok(value);
            }
        };

        ensure_writable_directory(&self.target)?;
        adapter.decompress_archive(&file.path, &self.target)?;
        Ok(Value::Str(self.target.to_string_lossy().into_owned()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StringCodec {
    #[default]
    Gz,
    Bz2,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StringCompressionOptions {
    pub adapter: StringCodec,
    /// gz: -1..=9, bz2: block size 1..=9
    pub level: Option<i32>,
    pub mode: GzMode,
}

impl StringCompressionOptions {
    fn build(&self) -> Result<Box<dyn StringCompressionAdapter>, FilterError> {
        let adapter: Box<dyn StringCompressionAdapter> = match self.adapter {
            StringCodec::Gz => Box::new(GzAdapter::new(self.level.unwrap_or(DEFAULT_GZ_LEVEL), self.mode)?),
            StringCodec::Bz2 => {
                let level = self.level.unwrap_or(DEFAULT_BZ2_BLOCK_SIZE as i32);
                let block_size = u32::try_from(level).map_err(|_| {
                    FilterError::InvalidConfig(format!("Block size '{}' must be between 1 and 9", level))
                })?;
                Box::new(Bz2Adapter::new(block_size)?)
            }
        };
        Ok(adapter)
    }
}

/// Compress string or byte values
pub struct CompressString {
    adapter: Box<dyn StringCompressionAdapter>,
}

impl fmt::Debug for CompressString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompressString").finish_non_exhaustive()
    }
}

impl CompressString {
    pub fn new(options: StringCompressionOptions) -> Result<Self, FilterError> {
        Ok(Self {
            adapter: options.build()?,
        })
    }

    pub fn from_options(options: serde_json::Value) -> Result<Self, FilterError> {
        Self::new(parse_options("CompressString", options)?)
    }

    pub fn with_adapter(adapter: Box<dyn StringCompressionAdapter>) -> Self {
        Self { adapter }
    }
}

impl Filter for CompressString {
    fn filter(&self, value: Value) -> Result<Value, FilterError> {
        match value.as_bytes() {
            Some(input) => Ok(Value::Bytes(self.adapter.compress(input)?)),
            None => Ok(value),
        }
    }
}

/// Decompress string or byte values
pub struct DecompressString {
    adapter: Box<dyn StringCompressionAdapter>,
}

impl DecompressString {
    pub fn new(options: StringCompressionOptions) -> Result<Self, FilterError> {
        Ok(Self {
            adapter: options.build()?,
        })
    }

    pub fn from_options(options: serde_json::Value) -> Result<Self, FilterError> {
        Self::new(parse_options("DecompressString", options)?)
    }

    pub fn with_adapter(adapter: Box<dyn StringCompressionAdapter>) -> Self {
        Self { adapter }
    }
}

impl Filter for DecompressString {
    fn filter(&self, value: Value) -> Result<Value, FilterError> {
        match value.as_bytes() {
            Some(input) => Ok(Value::from_bytes(self.adapter.decompress(input)?)),
            None => Ok(value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_compress_to_archive_options() {
        let options: CompressToArchiveOptions =
            parse_options("CompressToArchive", json!({"archive": "/tmp/a.tar", "adapter": "tar", "mode": "bz2"}))
                .unwrap();
        assert_eq!(options.kind(), ArchiveKind::Tar(TarCompression::Bz2));

        let options: CompressToArchiveOptions = parse_options("CompressToArchive", json!({"archive": "a.7z", "adapter": "7z"})).unwrap();
        assert_eq!(options.kind(), ArchiveKind::SevenZ);

        assert!(CompressToArchive::from_options(json!({})).unwrap_err().is_config_error());
        assert!(CompressToArchive::from_options(json!({"archive": ""})).unwrap_err().is_config_error());
        assert!(CompressToArchive::from_options(json!({"archive": "a.rar", "adapter": "rar"}))
            .unwrap_err()
            .is_config_error());
    }

    #[test]
    fn test_compress_string_requires_file_name() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("out.zip");
        let filter = CompressToArchive::new(CompressToArchiveOptions::new(archive.to_string_lossy())).unwrap();

        let err = filter.filter(Value::from("loose text")).unwrap_err();
        assert!(matches!(err, FilterError::Runtime(_)));
        assert!(!archive.exists());

        assert_eq!(filter.filter(Value::Int(4)).unwrap(), Value::Int(4));
    }

    #[test]
    fn test_string_archive_round_trip() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("out.zip");
        let target = temp.path().join("target");
        fs::create_dir(&target).unwrap();

        let compress = CompressToArchive::from_options(json!({
            "archive": archive.to_string_lossy(),
            "fileName": "greeting.txt"
        }))
        .unwrap();
        let result = compress.filter(Value::from("Hello, archive")).unwrap();
        assert_eq!(result, Value::from(archive.to_string_lossy().as_ref()));

        let decompress = DecompressArchive::from_options(json!({"target": target.to_string_lossy()})).unwrap();
        let result = decompress.filter(result).unwrap();
        assert_eq!(result, Value::from(target.to_string_lossy().as_ref()));
        assert_eq!(fs::read_to_string(target.join("greeting.txt")).unwrap(), "Hello, archive");
    }

    #[test]
    fn test_decompress_archive_target_must_exist() {
        let err = DecompressArchive::from_options(json!({"target": "/no/such/dir"})).unwrap_err();
        assert!(err.is_config_error());
        assert!(DecompressArchive::from_options(json!({})).unwrap_err().is_config_error());
    }

    #[test]
    fn test_decompress_archive_leaves_non_archives() {
        let temp = TempDir::new().unwrap();
        let text = temp.path().join("notes.txt");
        fs::write(&text, b"not an archive").unwrap();

        let filter = DecompressArchive::from_options(json!({"target": temp.path().to_string_lossy()})).unwrap();
        let input = Value::from(text.to_string_lossy().as_ref());
        assert_eq!(filter.filter(input.clone()).unwrap(), input);

        let missing = Value::from("/no/such/archive.zip");
        assert_eq!(filter.filter(missing.clone()).unwrap(), missing);
        assert_eq!(filter.filter(Value::Null).unwrap(), Value::Null);
    }

    #[test]
    fn test_compress_and_decompress_string() {
        for options in [
            json!({}),
            json!({"adapter": "gz", "level": 9, "mode": "deflate"}),
            json!({"adapter": "gz", "mode": "encode"}),
            json!({"adapter": "bz2", "level": 1}),
        ] {
            let compress = CompressString::from_options(options.clone()).unwrap();
            let decompress = DecompressString::from_options(options.clone()).unwrap();

            let compressed = compress.filter(Value::from("compress me")).unwrap();
            assert!(matches!(compressed, Value::Bytes(_)), "{}", options);
            assert_eq!(decompress.filter(compressed).unwrap(), Value::from("compress me"));
        }
    }

    #[test]
    fn test_decompress_binary_stays_bytes() {
        let compress = CompressString::from_options(json!({})).unwrap();
        let decompress = DecompressString::from_options(json!({})).unwrap();

        let compressed = compress.filter(Value::Bytes(vec![0xff, 0xfe, 0x00])).unwrap();
        assert_eq!(decompress.filter(compressed).unwrap(), Value::Bytes(vec![0xff, 0xfe, 0x00]));
    }

    #[test]
    fn test_string_compression_config_errors() {
        assert!(CompressString::from_options(json!({"adapter": "rar"})).unwrap_err().is_config_error());
        assert!(CompressString::from_options(json!({"level": 12})).unwrap_err().is_config_error());
        assert!(CompressString::from_options(json!({"adapter": "bz2", "level": -1}))
            .unwrap_err()
            .is_config_error());
    }

    #[test]
    fn test_string_filters_skip_other_values() {
        let compress = CompressString::from_options(json!({})).unwrap();
        assert_eq!(compress.filter(Value::Int(1)).unwrap(), Value::Int(1));
        assert_eq!(compress.filter(Value::Null).unwrap(), Value::Null);
    }
}
