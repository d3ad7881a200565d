use std::fs;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use log::info;
use rand::Rng;
use serde::Deserialize;

use crate::core::filter::Filter;
use crate::core::path::dirname;
use crate::models::config::parse_options;
use crate::models::{FilterError, Value};

/// Source pattern matching any file
pub const ANY_FILE: &str = "*";

/// One rename rule as written in configuration; unset fields take defaults
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RenameRuleSpec {
    pub source: Option<String>,
    pub target: Option<String>,
    pub overwrite: Option<bool>,
    pub randomize: Option<bool>,
}

impl RenameRuleSpec {
    fn is_empty(&self) -> bool {
        self.source.is_none() && self.target.is_none() && self.overwrite.is_none() && self.randomize.is_none()
    }
}

/// A single rule, or any nesting of lists of rules
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RenameOptions {
    Many(Vec<RenameOptions>),
    One(RenameRuleSpec),
}

impl Default for RenameOptions {
    fn default() -> Self {
        RenameOptions::Many(Vec::new())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameRule {
    pub source: String,
    pub target: String,
    pub overwrite: bool,
    pub randomize: bool,
}

impl From<RenameRuleSpec> for RenameRule {
    fn from(spec: RenameRuleSpec) -> Self {
        Self {
            source: spec.source.unwrap_or_else(|| ANY_FILE.to_string()),
            target: spec.target.unwrap_or_else(|| ANY_FILE.to_string()),
            overwrite: spec.overwrite.unwrap_or(false),
            randomize: spec.randomize.unwrap_or(false),
        }
    }
}

/// A resolved move from one path to another
#[derive(Debug, Clone, PartialEq, Eq)]
struct PlannedRename {
    source: String,
    target: String,
    overwrite: bool,
}

/// Rename files according to source/target rules
#[derive(Debug, Clone, Default)]
pub struct Rename {
    rules: Vec<RenameRule>,
}

impl Rename {
    pub fn new(options: RenameOptions) -> Self {
        let mut rename = Self::default();
        rename.add_rules(options);
        rename
    }

    pub fn from_options(options: serde_json::Value) -> Result<Self, FilterError> {
        Ok(Self::new(parse_options("Rename", options)?))
    }

    pub fn rules(&self) -> &[RenameRule] {
        &self.rules
    }

    fn add_rules(&mut self, options: RenameOptions) {
        match options {
            RenameOptions::Many(list) => list.into_iter().for_each(|o| self.add_rules(o)),
            RenameOptions::One(spec) if spec.is_empty() => {}
            RenameOptions::One(spec) => {
                let rule = RenameRule::from(spec);
                // A later rule for the same source replaces the earlier one
                match self.rules.iter_mut().find(|r| r.source == rule.source) {
                    Some(existing) => *existing = rule,
                    None => self.rules.push(rule),
                }
            }
        }
    }

    /// Pick the rule for `file`: an exact source match wins over the first wildcard
    fn rule_for(&self, file: &str) -> Option<RenameRule> {
        if let Some(exact) = self.rules.iter().find(|r| r.source == file) {
            return Some(exact.clone());
        }
        self.rules.iter().find(|r| r.source == ANY_FILE).map(|wildcard| RenameRule {
            source: file.to_string(),
            ..wildcard.clone()
        })
    }

    fn plan(&self, file: &str) -> Result<Option<PlannedRename>, FilterError> {
        let Some(rule) = self.rule_for(file) else {
            return Ok(None);
        };

        let mut target = if rule.target == ANY_FILE {
            rule.source.clone()
        } else {
            rule.target.clone()
        };

        if Path::new(&target).is_dir() {
            let name = Path::new(&rule.source)
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            if !target.ends_with('/') && !target.ends_with('\\') {
                target.push(std::path::MAIN_SEPARATOR);
            }
            target.push_str(&name);
        }

        if rule.randomize {
            target = randomized(&target);
        }

        if rule.source == target || !Path::new(&rule.source).exists() {
            return Ok(None);
        }

        if rule.overwrite && Path::new(&target).exists() {
            fs::remove_file(&target)?;
        }

        if Path::new(&target).exists() {
            let shown = fs::canonicalize(&target)
                .map(|p| p.to_string_lossy().into_owned())
                .unwrap_or_else(|_| target.clone());
            return Err(FilterError::InvalidArgument(format!(
                "File '{}' could not be renamed to '{}'; target file already exists",
                file, shown
            )));
        }

        Ok(Some(PlannedRename {
            source: rule.source,
            target,
            overwrite: rule.overwrite,
        }))
    }
}

impl Filter for Rename {
    fn filter(&self, value: Value) -> Result<Value, FilterError> {
        if !value.is_scalar() {
            return Ok(value);
        }
        let Some(file) = value.as_text().map(|t| t.into_owned()) else {
            return Ok(value);
        };

        let Some(planned) = self.plan(&file)? else {
            return Ok(value);
        };

        fs::rename(&planned.source, &planned.target).map_err(|e| {
            FilterError::Runtime(format!(
                "File '{}' could not be renamed. An error occurred while processing the file: {}",
                file, e
            ))
        })?;

        info!(
            "Renamed {} to {}{}",
            planned.source,
            planned.target,
            if planned.overwrite { " (overwrite)" } else { "" }
        );
        Ok(Value::Str(planned.target))
    }
}

/// Insert `_<13 hex digits>` before the extension
fn randomized(target: &str) -> String {
    let path = Path::new(target);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut name = format!("{}{}{}", dirname(target), std::path::MAIN_SEPARATOR, stem);
    name.push('_');
    name.push_str(&unique_suffix());
    if let Some(ext) = path.extension() {
        name.push('.');
        name.push_str(&ext.to_string_lossy());
    }
    name
}

/// 8 hex digits of seconds plus 5 random hex digits
fn unique_suffix() -> String {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let entropy: u32 = rand::thread_rng().gen_range(0..0x10_0000);
    format!("{:08x}{:05x}", secs & 0xffff_ffff, entropy)
}
