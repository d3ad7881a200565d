// Path filters

use std::env;
use std::fs;
use std::path::{Component, Path, PathBuf};

use serde::Deserialize;

use crate::core::filter::Filter;
use crate::models::config::parse_options;
use crate::models::{FilterError, Value};

/// Parent directory of a path, `.` for a bare name
pub fn dirname(path: &str) -> String {
    if path.is_empty() {
        return String::new();
    }
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return "/".to_string();
    }
    let Some(last_slash) = trimmed.rfind('/') else {
        return ".".to_string();
    };
    let parent = trimmed[..last_slash].trim_end_matches('/');
    if parent.is_empty() {
        "/".to_string()
    } else {
        parent.to_string()
    }
}

/// Parent directory of a scalar path
#[derive(Debug, Clone, Default)]
pub struct Dir;

impl Dir {
    pub fn new() -> Self {
        Self
    }

    pub fn from_options(_options: serde_json::Value) -> Result<Self, FilterError> {
        Ok(Self)
    }
}

impl Filter for Dir {
    fn filter(&self, value: Value) -> Result<Value, FilterError> {
        Ok(match value.as_text() {
            Some(path) => Value::Str(dirname(&path)),
            None => value,
        })
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct RealPathOptions {
    /// Only resolve paths that exist
    #[serde(default = "default_true")]
    pub exists: bool,
}

impl Default for RealPathOptions {
    fn default() -> Self {
        Self { exists: true }
    }
}

/// Canonical absolute path
#[derive(Debug, Clone)]
pub struct RealPath {
    must_exist: bool,
}

impl Default for RealPath {
    fn default() -> Self {
        Self::new(RealPathOptions::default())
    }
}

impl RealPath {
    pub fn new(options: RealPathOptions) -> Self {
        Self {
            must_exist: options.exists,
        }
    }

    pub fn from_options(options: serde_json::Value) -> Result<Self, FilterError> {
        Ok(Self::new(parse_options("RealPath", options)?))
    }

    fn resolve(&self, raw: &str) -> Option<PathBuf> {
        let path = Path::new(raw);
        if self.must_exist && !path.exists() {
            return None;
        }
        if let Ok(canonical) = fs::canonicalize(path) {
            return Some(canonical);
        }

        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            env::current_dir().ok()?.join(path)
        };
        Some(normalize_lexically(&absolute))
    }
}

/// Resolve `.` and `..` without touching the filesystem
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut stack: Vec<Component> = Vec::new();
    let mut root = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => root.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                stack.pop();
            }
            Component::Normal(_) => stack.push(component),
        }
    }
    stack.iter().fold(root, |mut acc, c| {
        acc.push(c.as_os_str());
        acc
    })
}

impl Filter for RealPath {
    fn filter(&self, value: Value) -> Result<Value, FilterError> {
        let Value::Str(raw) = &value else {
            return Ok(value);
        };
        Ok(match self.resolve(raw) {
            Some(resolved) => Value::Str(resolved.to_string_lossy().into_owned()),
            None => value,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_dirname() {
        assert_eq!(dirname("a"), ".");
        assert_eq!(dirname("/a"), "/");
        assert_eq!(dirname("/"), "/");
        assert_eq!(dirname(""), "");
        assert_eq!(dirname("/usr/local/lib"), "/usr/local");
        assert_eq!(dirname("a/b/"), "a");
        assert_eq!(dirname("a//b"), "a");
    }

    #[test]
    fn test_dir_filter() {
        let filter = Dir::new();
        assert_eq!(filter.filter(Value::from("/path/to/file.txt")).unwrap(), Value::from("/path/to"));
        assert_eq!(filter.filter(Value::Int(5)).unwrap(), Value::from("."));
        assert_eq!(filter.filter(Value::Null).unwrap(), Value::Null);
    }

    #[test]
    fn test_real_path_existing() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("file.1");
        fs::write(&file, b"x").unwrap();

        let input = temp.path().join("sub/../file.1");
        fs::create_dir(temp.path().join("sub")).unwrap();

        let filter = RealPath::new(RealPathOptions::default());
        let expected = fs::canonicalize(&file).unwrap();
        assert_eq!(
            filter.filter(Value::from(input.to_string_lossy().as_ref())).unwrap(),
            Value::from(expected.to_string_lossy().as_ref())
        );
    }

    #[test]
    fn test_real_path_missing_unchanged() {
        let filter = RealPath::new(RealPathOptions::default());
        let input = Value::from("/nonexistent/really/not/here");
        assert_eq!(filter.filter(input.clone()).unwrap(), input);
    }

    #[test]
    fn test_real_path_defaults_require_existence() {
        let input = Value::from("/definitely/not/here/../x");
        let from_default = RealPath::default();
        let from_options = RealPath::from_options(serde_json::json!({})).unwrap();
        assert_eq!(from_default.filter(input.clone()).unwrap(), input);
        assert_eq!(from_options.filter(input.clone()).unwrap(), input);
    }

    #[test]
    fn test_real_path_missing_normalized() {
        let filter = RealPath::from_options(serde_json::json!({"exists": false})).unwrap();
        assert_eq!(
            filter.filter(Value::from("/nonexistent/a/./b/../c")).unwrap(),
            Value::from("/nonexistent/a/c")
        );

        let cwd = env::current_dir().unwrap();
        let expected = normalize_lexically(&cwd.join("nonexistent"));
        assert_eq!(
            filter.filter(Value::from("nonexistent")).unwrap(),
            Value::from(expected.to_string_lossy().as_ref())
        );
    }

    #[test]
    fn test_real_path_non_strings() {
        let filter = RealPath::new(RealPathOptions::default());
        assert_eq!(filter.filter(Value::Int(1)).unwrap(), Value::Int(1));
    }
}
