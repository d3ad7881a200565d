use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::models::{FilterError, Value};

pub const OCTET_STREAM: &str = "application/octet-stream";

/// Bytes sniffed when content has no recognised signature
const SNIFF_LEN: u64 = 8192;

/// Facts about a file named by a filter's input value
#[derive(Debug)]
pub struct FileInformation {
    pub path: PathBuf,
    pub base_name: String,
    pub readable: bool,
    media_type: OnceLock<String>,
}

impl FileInformation {
    /// Describe the file named by `value`
    pub fn from_value(value: &Value) -> Result<Self, FilterError> {
        if !Self::is_possible_file(value) {
            return Err(FilterError::Runtime("Cannot detect any file information".into()));
        }
        let path = value.as_text().map(|p| p.into_owned()).unwrap_or_default();
        Ok(Self::new(PathBuf::from(path)))
    }

    pub fn new(path: PathBuf) -> Self {
        let base_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let readable = File::open(&path).is_ok();

        Self {
            path,
            base_name,
            readable,
            media_type: OnceLock::new(),
        }
    }

    /// True for a non-empty string path that exists
    pub fn is_possible_file(value: &Value) -> bool {
        match value {
            Value::Str(path) => !path.is_empty() && Path::new(path).exists(),
            _ => false,
        }
    }

    /// MIME type from the file's content, computed once
    pub fn detect_mime_type(&self) -> &str {
        self.media_type.get_or_init(|| sniff_mime_type(&self.path))
    }
}

fn sniff_mime_type(path: &Path) -> String {
    if path.is_dir() {
        return "directory".to_string();
    }
    if let Ok(Some(kind)) = infer::get_from_path(path) {
        return kind.mime_type().to_string();
    }

    let mut head = Vec::new();
    let read = File::open(path).and_then(|file| file.take(SNIFF_LEN).read_to_end(&mut head));
    match read {
        Ok(0) if fs::metadata(path).map(|m| m.len() == 0).unwrap_or(false) => "application/x-empty".to_string(),
        Ok(_) if looks_like_text(&head) => "text/plain".to_string(),
        _ => OCTET_STREAM.to_string(),
    }
}

fn looks_like_text(head: &[u8]) -> bool {
    if head.contains(&0) {
        return false;
    }
    match std::str::from_utf8(head) {
        Ok(_) => true,
        // A multi-byte character cut off by the sniff window
        Err(e) => e.error_len().is_none(),
    }
}
