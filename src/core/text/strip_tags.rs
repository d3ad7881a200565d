// Markup stripping with a tag and attribute allow-list

use std::collections::HashMap;
use std::sync::OnceLock;

use indexmap::IndexMap;
use regex::Regex;
use serde::Deserialize;

use crate::core::filter::Filter;
use crate::models::config::parse_options;
use crate::models::{FilterError, Value};

const COMMENT_OPEN: &str = "<!--";
const COMMENT_CLOSE: &str = "-->";

/// One attribute name or several
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AttributeList {
    One(String),
    Many(Vec<String>),
}

impl AttributeList {
    fn into_lowercase(self) -> Vec<String> {
        match self {
            AttributeList::One(name) => vec![name.to_lowercase()],
            AttributeList::Many(names) => names.into_iter().map(|n| n.to_lowercase()).collect(),
        }
    }
}

/// Allowed tags, either plain names or names mapped to their own attributes
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AllowedTags {
    Names(Vec<String>),
    WithAttributes(IndexMap<String, AttributeList>),
}

impl Default for AllowedTags {
    fn default() -> Self {
        AllowedTags::Names(Vec::new())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StripTagsOptions {
    pub allow_tags: AllowedTags,
    pub allow_attribs: Vec<String>,
}

/// Remove markup, keeping allowed tags and attributes
#[derive(Debug, Clone)]
pub struct StripTags {
    tags_allowed: HashMap<String, Vec<String>>,
    attributes_allowed: Vec<String>,
}

/// Parts of a tag that ends with `>`
struct TagParts<'a> {
    start: &'a str,
    name: &'a str,
    attributes: &'a str,
    end: &'a str,
}

fn attribute_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"(?s)([A-Za-z0-9_-]+)[\t\n\x0B\x0C\r ]*=[\t\n\x0B\x0C\r ]*(?:(")(.*?)"|(')(.*?)')"#)
            .expect("attribute pattern is valid")
    })
}

impl StripTags {
    pub fn new(options: StripTagsOptions) -> Self {
        let tags_allowed = match options.allow_tags {
            AllowedTags::Names(names) => names.into_iter().map(|n| (n.to_lowercase(), Vec::new())).collect(),
            AllowedTags::WithAttributes(map) => map
                .into_iter()
                .map(|(tag, attributes)| (tag.to_lowercase(), attributes.into_lowercase()))
                .collect(),
        };

        Self {
            tags_allowed,
            attributes_allowed: options.allow_attribs.into_iter().map(|a| a.to_lowercase()).collect(),
        }
    }

    pub fn from_options(options: serde_json::Value) -> Result<Self, FilterError> {
        Ok(Self::new(parse_options("StripTags", options)?))
    }

    /// Strip markup from a string
    pub fn strip(&self, value: &str) -> String {
        let value = strip_comments(value);
        let mut filtered = String::with_capacity(value.len());
        let mut rest = value.as_str();

        while !rest.is_empty() {
            let tag_start = rest.find('<').unwrap_or(rest.len());
            filtered.extend(rest[..tag_start].chars().filter(|&c| c != '>'));
            rest = &rest[tag_start..];
            if rest.is_empty() {
                break;
            }

            // The tag runs up to and including the next '>', or to the end of input
            let tag_end = rest[1..].find('>').map(|i| i + 2).unwrap_or(rest.len());
            filtered.push_str(&self.filter_tag(&rest[..tag_end]));
            rest = &rest[tag_end..];
        }

        filtered
    }

    fn filter_tag(&self, tag: &str) -> String {
        let Some(parts) = split_tag(tag) else {
            return String::new();
        };

        let name = parts.name.to_lowercase();
        let Some(tag_attributes) = self.tags_allowed.get(&name) else {
            return String::new();
        };

        let mut attributes = String::new();
        let raw = parts.attributes.trim_matches([' ', '\t', '\n', '\r', '\0', '\x0B']);
        if !raw.is_empty() {
            for caps in attribute_pattern().captures_iter(raw) {
                let attribute = caps[1].to_lowercase();
                if !self.attributes_allowed.contains(&attribute) && !tag_attributes.contains(&attribute) {
                    continue;
                }

                let (delimiter, value) = match (caps.get(2), caps.get(3)) {
                    (Some(quote), Some(value)) => (quote.as_str(), value.as_str()),
                    _ => (
                        caps.get(4).map_or("", |m| m.as_str()),
                        caps.get(5).map_or("", |m| m.as_str()),
                    ),
                };
                attributes.push_str(&format!(" {}={}{}{}", attribute, delimiter, value, delimiter));
            }
        }

        let end = if parts.end.contains('/') {
            format!(" {}", parts.end)
        } else {
            parts.end.to_string()
        };

        format!("{}{}{}{}", parts.start, name, attributes, end)
    }
}

impl Filter for StripTags {
    fn filter(&self, value: Value) -> Result<Value, FilterError> {
        Ok(match value.as_text() {
            Some(text) => Value::Str(self.strip(&text)),
            None => value,
        })
    }
}

/// Remove `<!-- ... -->` comments; an unterminated comment runs to the end
fn strip_comments(value: &str) -> String {
    let mut value = value.to_string();
    while let Some(start) = value.find(COMMENT_OPEN) {
        let search_from = start + COMMENT_OPEN.len();
        match value[search_from..].find(COMMENT_CLOSE) {
            Some(offset) => {
                let end = search_from + offset + COMMENT_CLOSE.len();
                value.replace_range(start..end, "");
            }
            None => value.truncate(start),
        }
    }
    value
}

/// Split `</?name attributes /?>`; tags without a closing `>` do not parse
fn split_tag(tag: &str) -> Option<TagParts<'_>> {
    let inner = tag.strip_prefix('<')?.strip_suffix('>')?;

    let (start, rest) = match inner.strip_prefix('/') {
        Some(rest) => (&tag[..2], rest),
        None => (&tag[..1], inner),
    };

    let name_len = rest
        .bytes()
        .take_while(|b| b.is_ascii_alphanumeric() || *b == b'_')
        .count();
    let (name, remainder) = rest.split_at(name_len);

    let (attributes, end) = match remainder.strip_suffix('/') {
        Some(attributes) => (attributes, "/>"),
        None => (remainder, ">"),
    };

    Some(TagParts {
        start,
        name,
        attributes,
        end,
    })
}
