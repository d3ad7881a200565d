use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::models::FilterError;

/// Priority given to filters attached without an explicit one
pub const DEFAULT_PRIORITY: i32 = 1000;

/// Chain configuration
///
/// ```ignore
/// {
///   "filters": [
///     { "name": "StripTags", "options": { "allowTags": ["b"] } },
///     { "name": "StringToUpper", "priority": 2000 }
///   ]
/// }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainSpec {
    #[serde(default)]
    pub filters: Vec<FilterSpec>,
}

/// A named filter with its construction options
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterSpec {
    pub name: String,
    #[serde(default = "empty_options")]
    pub options: serde_json::Value,
    #[serde(default)]
    pub priority: Option<i32>,
}

impl FilterSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            options: empty_options(),
            priority: None,
        }
    }

    pub fn with_options(mut self, options: serde_json::Value) -> Self {
        self.options = options;
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn priority_or_default(&self) -> i32 {
        self.priority.unwrap_or(DEFAULT_PRIORITY)
    }
}

impl ChainSpec {
    pub fn from_json_str(json: &str) -> Result<Self, FilterError> {
        serde_json::from_str(json)
            .map_err(|e| FilterError::InvalidConfig(format!("Invalid chain specification: {}", e)))
    }

    pub fn from_path(path: &Path) -> Result<Self, FilterError> {
        let json = fs::read_to_string(path).map_err(|e| {
            FilterError::InvalidConfig(format!(
                "Failed to read chain specification {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_json_str(&json)
    }
}

pub fn empty_options() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

/// Deserialize a filter's options, treating `null` as "all defaults"
pub fn parse_options<T: DeserializeOwned>(
    filter_name: &str,
    options: serde_json::Value,
) -> Result<T, FilterError> {
    let options = if options.is_null() { empty_options() } else { options };
    serde_json::from_value(options)
        .map_err(|e| FilterError::InvalidConfig(format!("Invalid options for {}: {}", filter_name, e)))
}
