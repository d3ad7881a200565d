// Rule-driven string inflection

use std::sync::Arc;

use indexmap::IndexMap;
use serde::Deserialize;

use crate::core::filter::Filter;
use crate::core::registry::FilterRegistry;
use crate::models::config::{empty_options, parse_options};
use crate::models::{FilterError, FilterSpec, Value};

/// Prefix marking a rule as a filter rule
const FILTER_RULE_PREFIX: char = ':';

fn default_true() -> bool {
    true
}

fn default_identifier() -> String {
    ":".to_string()
}

/// One filter in a filter rule: a registered name or a full spec
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RuleFilter {
    Name(String),
    Spec(FilterSpec),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RuleSpec {
    Text(String),
    Filters(Vec<RuleFilter>),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InflectorOptions {
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub rules: IndexMap<String, RuleSpec>,
    #[serde(default = "default_true")]
    pub throw_target_exceptions_on: bool,
    #[serde(default = "default_identifier")]
    pub target_replacement_identifier: String,
}

enum Rule {
    Static(String),
    Filters(Vec<Arc<dyn Filter>>),
}

/// Fill a target template from a map of source values
///
/// ```ignore
/// // target ":controller/:action.:suffix"
/// // rules  {":controller": ["CamelCaseToDash", "StringToLower"], "suffix": "phtml"}
/// // {"controller": "MyController", "action": "index"} -> "my-controller/index.phtml"
/// ```
pub struct Inflector {
    target: String,
    rules: IndexMap<String, Rule>,
    throw_target_exceptions: bool,
    identifier: String,
}

impl Inflector {
    pub fn new(registry: &FilterRegistry, options: InflectorOptions) -> Result<Self, FilterError> {
        let target = match options.target {
            Some(target) if !target.is_empty() => target,
            _ => {
                return Err(FilterError::InvalidConfig(
                    "Inflector requires the target option to be a non-empty string".into(),
                ))
            }
        };
        if options.target_replacement_identifier.is_empty() {
            return Err(FilterError::InvalidConfig(
                "The target replacement identifier must not be empty".into(),
            ));
        }

        let mut rules = IndexMap::with_capacity(options.rules.len());
        for (key, spec) in options.rules {
            let name = key.trim_start_matches(FILTER_RULE_PREFIX).to_string();
            let rule = if key.starts_with(FILTER_RULE_PREFIX) {
                let filters = match spec {
                    RuleSpec::Text(filter_name) => vec![RuleFilter::Name(filter_name)],
                    RuleSpec::Filters(filters) => filters,
                };
                Rule::Filters(
                    filters
                        .into_iter()
                        .map(|filter| build_rule_filter(registry, filter))
                        .collect::<Result<_, _>>()?,
                )
            } else {
                match spec {
                    RuleSpec::Text(text) => Rule::Static(text),
                    RuleSpec::Filters(_) => {
                        return Err(FilterError::InvalidConfig(format!(
                            "Static rule '{}' must be a string",
                            key
                        )))
                    }
                }
            };
            // A redefined rule keeps its first position
            rules.insert(name, rule);
        }

        Ok(Self {
            target,
            rules,
            throw_target_exceptions: options.throw_target_exceptions_on,
            identifier: options.target_replacement_identifier,
        })
    }

    pub fn from_options(registry: &FilterRegistry, options: serde_json::Value) -> Result<Self, FilterError> {
        Self::new(registry, parse_options("Inflector", options)?)
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    /// True when `<identifier><ASCII letter>` is still present
    fn has_unsatisfied_placeholder(&self, inflected: &str) -> bool {
        inflected.match_indices(self.identifier.as_str()).any(|(at, _)| {
            inflected[at + self.identifier.len()..]
                .chars()
                .next()
                .map_or(false, |c| c.is_ascii_alphabetic())
        })
    }
}

fn build_rule_filter(registry: &FilterRegistry, filter: RuleFilter) -> Result<Arc<dyn Filter>, FilterError> {
    match filter {
        RuleFilter::Name(name) => registry.build(&name, empty_options()),
        RuleFilter::Spec(spec) => registry.build(&spec.name, spec.options),
    }
}

impl Filter for Inflector {
    fn filter(&self, value: Value) -> Result<Value, FilterError> {
        let Value::Map(source) = &value else {
            return Ok(value);
        };

        let subject: IndexMap<&str, String> = source
            .iter()
            .filter(|(_, v)| v.is_scalar())
            .filter_map(|(k, v)| Some((k.trim_start_matches(':'), v.as_text()?.into_owned())))
            .collect();

        let mut inflected = self.target.clone();
        for (name, rule) in &self.rules {
            let replacement = match (rule, subject.get(name.as_str())) {
                (Rule::Static(_), Some(part)) => part.clone(),
                (Rule::Static(text), None) => text.clone(),
                (Rule::Filters(filters), Some(part)) => {
                    let mut processed = Value::Str(part.clone());
                    for filter in filters {
                        processed = filter.filter(processed)?;
                    }
                    processed.as_text().map(|t| t.into_owned()).unwrap_or_default()
                }
                (Rule::Filters(_), None) => continue,
            };
            let placeholder = format!("{}{}", self.identifier, name);
            inflected = inflected.replace(&placeholder, &replacement);
        }

        if self.throw_target_exceptions && self.has_unsatisfied_placeholder(&inflected) {
            return Err(FilterError::Runtime(format!(
                "A replacement identifier {} was found inside the inflected target, perhaps a rule was not \
                 satisfied with a target source? Unsatisfied inflected target: {}",
                self.identifier, inflected
            )));
        }

        Ok(Value::Str(inflected))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn source(pairs: &[(&str, Value)]) -> Value {
        Value::Map(pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect())
    }

    fn inflector(options: serde_json::Value) -> Inflector {
        Inflector::from_options(&FilterRegistry::with_defaults(), options).unwrap()
    }

    #[test]
    fn test_filter_and_static_rules() {
        let filter = inflector(json!({
            "target": ":controller/:action.:suffix",
            "rules": {
                ":controller": ["CamelCaseToDash", "StringToLower"],
                ":action": "StringToLower",
                "suffix": "phtml"
            }
        }));

        let result = filter
            .filter(source(&[
                ("controller", Value::from("MyController")),
                ("action", Value::from("INDEX")),
            ]))
            .unwrap();
        assert_eq!(result, Value::from("my-controller/index.phtml"));
    }

    #[test]
    fn test_source_value_overrides_static_text() {
        let filter = inflector(json!({"target": "page.:suffix", "rules": {"suffix": "phtml"}}));
        let result = filter.filter(source(&[(":suffix", Value::from("html"))])).unwrap();
        assert_eq!(result, Value::from("page.html"));
    }

    #[test]
    fn test_redefined_rule_keeps_its_position() {
        let filter = inflector(json!({
            "target": ":ab",
            "rules": {
                ":a": "StringToUpper",
                "ab": "Q",
                "a": "z"
            }
        }));
        let result = filter.filter(source(&[])).unwrap();
        assert_eq!(result, Value::from("zb"));
    }

    #[test]
    fn test_rule_filter_with_options() {
        let filter = inflector(json!({
            "target": ":name",
            "rules": {":name": [{"name": "SeparatorToSeparator", "options": {"search_separator": " ", "replacement_separator": "+"}}]}
        }));
        let result = filter.filter(source(&[("name", Value::from("a b c"))])).unwrap();
        assert_eq!(result, Value::from("a+b+c"));
    }

    #[test]
    fn test_unsatisfied_target() {
        let filter = inflector(json!({"target": ":controller/:action", "rules": {":controller": "StringToLower"}}));
        let err = filter.filter(source(&[("controller", Value::from("Foo"))])).unwrap_err();
        assert!(matches!(err, FilterError::Runtime(ref msg) if msg.contains("foo/:action")));

        let quiet = inflector(json!({
            "target": ":controller/:action",
            "rules": {":controller": "StringToLower"},
            "throwTargetExceptionsOn": false
        }));
        let result = quiet.filter(source(&[("controller", Value::from("Foo"))])).unwrap();
        assert_eq!(result, Value::from("foo/:action"));
    }

    #[test]
    fn test_custom_identifier() {
        let filter = inflector(json!({
            "target": "$name.$ext",
            "rules": {":name": "StringToUpper", "ext": "txt"},
            "targetReplacementIdentifier": "$"
        }));
        let result = filter.filter(source(&[("name", Value::from("readme"))])).unwrap();
        assert_eq!(result, Value::from("README.txt"));
    }

    #[test]
    fn test_non_scalar_sources_and_non_maps() {
        let filter = inflector(json!({"target": "x-:a", "rules": {"a": "default"}}));
        let result = filter
            .filter(source(&[("a", Value::List(vec![Value::from("ignored")]))]))
            .unwrap();
        assert_eq!(result, Value::from("x-default"));

        assert_eq!(filter.filter(Value::from("plain")).unwrap(), Value::from("plain"));
    }

    #[test]
    fn test_configuration_errors() {
        let registry = FilterRegistry::with_defaults();
        assert!(Inflector::from_options(&registry, json!({})).err().unwrap().is_config_error());
        assert!(Inflector::from_options(&registry, json!({"target": ""})).err().unwrap().is_config_error());
        assert!(Inflector::from_options(&registry, json!({"target": "x", "rules": {":a": "NoSuchFilter"}}))
            .err()
            .unwrap()
            .is_config_error());
        assert!(Inflector::from_options(&registry, json!({"target": "x", "rules": {"a": ["StringToLower"]}}))
            .err()
            .unwrap()
            .is_config_error());
    }
}
