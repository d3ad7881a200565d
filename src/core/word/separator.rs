// Separator-based word transformations

use std::sync::OnceLock;

use regex::Regex;
use serde::Deserialize;

use crate::core::filter::{map_scalars, Filter};
use crate::models::config::parse_options;
use crate::models::{FilterError, Value};

fn space() -> String {
    " ".to_string()
}

fn dash() -> String {
    "-".to_string()
}

/// Unicode `Z` category: space, line and paragraph separators
fn is_separator_char(c: char) -> bool {
    matches!(
        c,
        '\u{20}' | '\u{a0}' | '\u{1680}' | '\u{2000}'..='\u{200a}' | '\u{2028}' | '\u{2029}' | '\u{202f}' | '\u{205f}' | '\u{3000}'
    )
}

/// Unicode `Nd`: decimal digits only, not numerals such as `½` or `²`
fn is_decimal_digit(c: char) -> bool {
    if c.is_ascii() {
        return c.is_ascii_digit();
    }
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let pattern = PATTERN.get_or_init(|| Regex::new(r"^\p{Nd}$").expect("digit pattern is valid"));
    let mut buf = [0u8; 4];
    pattern.is_match(c.encode_utf8(&mut buf))
}

fn push_upper(out: &mut String, c: char) {
    out.extend(c.to_uppercase());
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SeparatorToSeparatorOptions {
    pub search_separator: String,
    pub replacement_separator: String,
}

impl Default for SeparatorToSeparatorOptions {
    fn default() -> Self {
        Self {
            search_separator: space(),
            replacement_separator: dash(),
        }
    }
}

/// Replace one separator with another
#[derive(Debug, Clone)]
pub struct SeparatorToSeparator {
    search: String,
    replacement: String,
}

impl SeparatorToSeparator {
    pub fn new(search: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self {
            search: search.into(),
            replacement: replacement.into(),
        }
    }

    pub fn from_options(options: serde_json::Value) -> Result<Self, FilterError> {
        let options: SeparatorToSeparatorOptions = parse_options("SeparatorToSeparator", options)?;
        Ok(Self::new(options.search_separator, options.replacement_separator))
    }

    pub fn convert(&self, input: &str) -> String {
        input.replace(&self.search, &self.replacement)
    }
}

impl Filter for SeparatorToSeparator {
    fn filter(&self, value: Value) -> Result<Value, FilterError> {
        Ok(map_scalars(value, &|s: &str| self.convert(s)))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SeparatorOptions {
    pub separator: String,
}

impl Default for SeparatorOptions {
    fn default() -> Self {
        Self { separator: space() }
    }
}

/// Join separated words into CamelCase
#[derive(Debug, Clone)]
pub struct SeparatorToCamelCase {
    separator: String,
}

impl SeparatorToCamelCase {
    pub fn new(separator: impl Into<String>) -> Self {
        Self {
            separator: separator.into(),
        }
    }

    pub fn from_options(options: serde_json::Value) -> Result<Self, FilterError> {
        let options: SeparatorOptions = parse_options("SeparatorToCamelCase", options)?;
        Ok(Self::new(options.separator))
    }

    pub fn convert(&self, input: &str) -> String {
        let mut joined = String::with_capacity(input.len());
        let mut rest = input;

        while !rest.is_empty() {
            if let Some(after) = rest.strip_prefix(self.separator.as_str()) {
                let mut chars = after.chars();
                if let Some(next) = chars.next().filter(|c| !is_separator_char(*c)) {
                    push_upper(&mut joined, next);
                    rest = chars.as_str();
                    continue;
                }
            }
            let mut chars = rest.chars();
            if let Some(c) = chars.next() {
                joined.push(c);
            }
            rest = chars.as_str();
        }

        let mut chars = joined.chars();
        match chars.next() {
            Some(first) if !is_separator_char(first) => {
                let mut out = String::with_capacity(joined.len());
                push_upper(&mut out, first);
                out.push_str(chars.as_str());
                out
            }
            _ => joined,
        }
    }
}

impl Filter for SeparatorToCamelCase {
    fn filter(&self, value: Value) -> Result<Value, FilterError> {
        Ok(map_scalars(value, &|s: &str| self.convert(s)))
    }
}

/// Split CamelCase words with a separator
#[derive(Debug, Clone)]
pub struct CamelCaseToSeparator {
    separator: String,
}

impl CamelCaseToSeparator {
    pub fn new(separator: impl Into<String>) -> Self {
        Self {
            separator: separator.into(),
        }
    }

    pub fn from_options(options: serde_json::Value) -> Result<Self, FilterError> {
        let options: SeparatorOptions = parse_options("CamelCaseToSeparator", options)?;
        Ok(Self::new(options.separator))
    }

    pub fn convert(&self, input: &str) -> String {
        // "ABCWord" -> "ABC Word": an upper+lower pair after an uppercase letter
        let chars: Vec<char> = input.chars().collect();
        let starts_word: Vec<bool> = (0..chars.len())
            .map(|i| {
                i > 0
                    && chars[i - 1].is_uppercase()
                    && chars[i].is_uppercase()
                    && chars.get(i + 1).is_some_and(|n| n.is_lowercase())
            })
            .collect();

        // "camelCase2Word" -> "camel Case2 Word": an uppercase letter after a lowercase letter or digit
        let mut out = String::with_capacity(input.len() + self.separator.len() * 4);
        let mut previous: Option<char> = None;
        for (&c, &split) in chars.iter().zip(&starts_word) {
            if split {
                out.push_str(&self.separator);
                previous = self.separator.chars().last();
            }
            if c.is_uppercase() && previous.is_some_and(|p| p.is_lowercase() || is_decimal_digit(p)) {
                out.push_str(&self.separator);
            }
            out.push(c);
            previous = Some(c);
        }
        out
    }
}

impl Filter for CamelCaseToSeparator {
    fn filter(&self, value: Value) -> Result<Value, FilterError> {
        Ok(map_scalars(value, &|s: &str| self.convert(s)))
    }
}
