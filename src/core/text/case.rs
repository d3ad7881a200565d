// Case conversion and string casting

use encoding_rs::Encoding;
use serde::Deserialize;

use crate::core::filter::Filter;
use crate::core::text::encoding::{default_encoding, resolve_encoding, transcode_with};
use crate::models::config::parse_options;
use crate::models::{FilterError, Value};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CaseOptions {
    pub encoding: String,
}

impl Default for CaseOptions {
    fn default() -> Self {
        Self {
            encoding: default_encoding(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Case {
    Upper,
    Lower,
}

impl Case {
    fn apply(self, text: &str) -> String {
        match self {
            Case::Upper => text.to_uppercase(),
            Case::Lower => text.to_lowercase(),
        }
    }
}

/// Shared body of the two case filters
#[derive(Debug, Clone)]
struct CaseConverter {
    case: Case,
    encoding: &'static Encoding,
}

impl CaseConverter {
    fn new(case: Case, options: CaseOptions) -> Result<Self, FilterError> {
        Ok(Self {
            case,
            encoding: resolve_encoding(&options.encoding)?,
        })
    }

    fn convert(&self, value: Value) -> Value {
        match value {
            Value::Bytes(bytes) => Value::Bytes(transcode_with(self.encoding, &bytes, |s| self.case.apply(s))),
            other => match other.as_text() {
                Some(text) => Value::Str(self.case.apply(&text)),
                None => other,
            },
        }
    }
}

/// Uppercase scalar values
#[derive(Debug, Clone)]
pub struct StringToUpper {
    inner: CaseConverter,
}

impl StringToUpper {
    pub fn new(options: CaseOptions) -> Result<Self, FilterError> {
        Ok(Self {
            inner: CaseConverter::new(Case::Upper, options)?,
        })
    }

    pub fn from_options(options: serde_json::Value) -> Result<Self, FilterError> {
        Self::new(parse_options("StringToUpper", options)?)
    }
}

impl Filter for StringToUpper {
    fn filter(&self, value: Value) -> Result<Value, FilterError> {
        Ok(self.inner.convert(value))
    }
}

/// Lowercase scalar values
#[derive(Debug, Clone)]
pub struct StringToLower {
    inner: CaseConverter,
}

impl StringToLower {
    pub fn new(options: CaseOptions) -> Result<Self, FilterError> {
        Ok(Self {
            inner: CaseConverter::new(Case::Lower, options)?,
        })
    }

    pub fn from_options(options: serde_json::Value) -> Result<Self, FilterError> {
        Self::new(parse_options("StringToLower", options)?)
    }
}

impl Filter for StringToLower {
    fn filter(&self, value: Value) -> Result<Value, FilterError> {
        Ok(self.inner.convert(value))
    }
}

/// Cast scalars to strings
#[derive(Debug, Clone, Default)]
pub struct ToStringFilter;

impl ToStringFilter {
    pub fn new() -> Self {
        Self
    }

    /// Takes no options; anything passed is ignored
    pub fn from_options(_options: serde_json::Value) -> Result<Self, FilterError> {
        Ok(Self)
    }
}

impl Filter for ToStringFilter {
    fn filter(&self, value: Value) -> Result<Value, FilterError> {
        if let Value::Str(_) = value {
            return Ok(value);
        }
        Ok(match value.as_text() {
            Some(text) => Value::Str(text.into_owned()),
            None => value,
        })
    }
}
