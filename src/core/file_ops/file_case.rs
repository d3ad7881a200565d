use std::fs;
use std::path::Path;

use encoding_rs::Encoding;
use log::info;

use crate::core::filter::Filter;
use crate::core::text::encoding::{resolve_encoding, transcode_with};
use crate::core::text::CaseOptions;
use crate::models::config::parse_options;
use crate::models::{FilterError, Value};

/// Rewrite a file's contents through a text transform, returning its path
fn convert_file(value: Value, encoding: &'static Encoding, transform: fn(&str) -> String) -> Result<Value, FilterError> {
    let Value::Str(path) = &value else {
        return Ok(value);
    };

    let file = Path::new(path);
    if !file.is_file() {
        return Err(FilterError::InvalidArgument(format!("File '{}' not found", path)));
    }

    let contents = fs::read(file)
        .map_err(|e| FilterError::Runtime(format!("Problem while reading file '{}': {}", path, e)))?;
    let converted = transcode_with(encoding, &contents, transform);
    fs::write(file, converted)
        .map_err(|e| FilterError::Runtime(format!("Problem while writing file '{}': {}", path, e)))?;

    info!("Converted case of {}", path);
    Ok(value)
}

/// Lowercase the contents of the named file in place
#[derive(Debug, Clone)]
pub struct FileLowerCase {
    encoding: &'static Encoding,
}

impl FileLowerCase {
    pub fn new(options: CaseOptions) -> Result<Self, FilterError> {
        Ok(Self {
            encoding: resolve_encoding(&options.encoding)?,
        })
    }

    pub fn from_options(options: serde_json::Value) -> Result<Self, FilterError> {
        Self::new(parse_options("FileLowerCase", options)?)
    }
}

impl Filter for FileLowerCase {
    fn filter(&self, value: Value) -> Result<Value, FilterError> {
        convert_file(value, self.encoding, |s| s.to_lowercase())
    }
}

/// Uppercase the contents of the named file in place
#[derive(Debug, Clone)]
pub struct FileUpperCase {
    encoding: &'static Encoding,
}

impl FileUpperCase {
    pub fn new(options: CaseOptions) -> Result<Self, FilterError> {
        Ok(Self {
            encoding: resolve_encoding(&options.encoding)?,
        })
    }

    pub fn from_options(options: serde_json::Value) -> Result<Self, FilterError> {
        Self::new(parse_options("FileUpperCase", options)?)
    }
}

impl Filter for FileUpperCase {
    fn filter(&self, value: Value) -> Result<Value, FilterError> {
        convert_file(value, self.encoding, |s| s.to_uppercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_upper_and_lower_case() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("testfile.txt");
        fs::write(&file, "This is a File").unwrap();
        let input = Value::from(file.to_string_lossy().as_ref());

        let upper = FileUpperCase::new(CaseOptions::default()).unwrap();
        assert_eq!(upper.filter(input.clone()).unwrap(), input);
        assert_eq!(fs::read_to_string(&file).unwrap(), "THIS IS A FILE");

        let lower = FileLowerCase::from_options(json!({})).unwrap();
        lower.filter(input.clone()).unwrap();
        assert_eq!(fs::read_to_string(&file).unwrap(), "this is a file");
    }

    #[test]
    fn test_latin1_contents() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("latin1.txt");
        fs::write(&file, [0xe9, b't', 0xe9]).unwrap();

        let upper = FileUpperCase::from_options(json!({"encoding": "ISO-8859-1"})).unwrap();
        upper.filter(Value::from(file.to_string_lossy().as_ref())).unwrap();
        assert_eq!(fs::read(&file).unwrap(), vec![0xc9, b'T', 0xc9]);
    }

    #[test]
    fn test_missing_file() {
        let filter = FileLowerCase::new(CaseOptions::default()).unwrap();
        let err = filter.filter(Value::from("/no/such/file.txt")).unwrap_err();
        assert!(matches!(err, FilterError::InvalidArgument(ref msg) if msg.contains("not found")));
    }

    #[test]
    fn test_non_string_unchanged_and_bad_encoding() {
        let filter = FileUpperCase::new(CaseOptions::default()).unwrap();
        assert_eq!(filter.filter(Value::Int(3)).unwrap(), Value::Int(3));

        let err = FileUpperCase::from_options(json!({"encoding": "no-such-encoding"})).unwrap_err();
        assert!(err.is_config_error());
    }
}
