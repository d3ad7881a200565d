// Name-based filter factory

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use log::debug;

use crate::core::chain::{FilterChain, ImmutableFilterChain};
use crate::core::compression::{CompressString, CompressToArchive, DecompressArchive, DecompressString};
use crate::core::date::{DateSelect, DateTimeSelect, MonthSelect};
use crate::core::file_ops::{FileLowerCase, FileUpperCase, Rename};
use crate::core::filter::Filter;
use crate::core::inflector::Inflector;
use crate::core::path::{Dir, RealPath};
use crate::core::text::{HtmlEntities, StringToLower, StringToUpper, StripTags, ToStringFilter};
use crate::core::word::{
    CamelCaseToDash, CamelCaseToSeparator, CamelCaseToUnderscore, DashToCamelCase, DashToUnderscore,
    SeparatorToCamelCase, SeparatorToSeparator, UnderscoreToCamelCase, UnderscoreToDash,
    UnderscoreToSeparator, UnderscoreToStudlyCase,
};
use crate::models::config::parse_options;
use crate::models::{ChainSpec, FilterError};

/// Builds a filter from JSON options
///
/// The registry is passed in so composite filters can build their children.
pub type FilterFactory =
    dyn Fn(&FilterRegistry, serde_json::Value) -> Result<Arc<dyn Filter>, FilterError> + Send + Sync;

/// Table of filter factories keyed by name
///
/// Names are matched ASCII case-insensitively. Cloning is cheap; factories are
/// shared between clones.
#[derive(Clone, Default)]
pub struct FilterRegistry {
    factories: HashMap<String, (String, Arc<FilterFactory>)>,
}

/// Adapt a plain options constructor into a factory
fn options_factory<T, C>(
    ctor: C,
) -> impl Fn(&FilterRegistry, serde_json::Value) -> Result<Arc<dyn Filter>, FilterError> + Send + Sync + 'static
where
    T: Filter + 'static,
    C: Fn(serde_json::Value) -> Result<T, FilterError> + Send + Sync + 'static,
{
    move |_registry: &FilterRegistry, options: serde_json::Value| {
        let filter: Arc<dyn Filter> = Arc::new(ctor(options)?);
        Ok(filter)
    }
}

impl FilterRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every filter shipped by this crate
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();

        registry
            .register("StringToUpper", options_factory(StringToUpper::from_options))
            .register("StringToLower", options_factory(StringToLower::from_options))
            .register("ToString", options_factory(ToStringFilter::from_options))
            .register("HtmlEntities", options_factory(HtmlEntities::from_options))
            .register("StripTags", options_factory(StripTags::from_options));

        registry
            .register("SeparatorToSeparator", options_factory(SeparatorToSeparator::from_options))
            .register("SeparatorToCamelCase", options_factory(SeparatorToCamelCase::from_options))
            .register("CamelCaseToSeparator", options_factory(CamelCaseToSeparator::from_options))
            .register("CamelCaseToDash", options_factory(CamelCaseToDash::from_options))
            .register("CamelCaseToUnderscore", options_factory(CamelCaseToUnderscore::from_options))
            .register("DashToCamelCase", options_factory(DashToCamelCase::from_options))
            .register("DashToUnderscore", options_factory(DashToUnderscore::from_options))
            .register("UnderscoreToCamelCase", options_factory(UnderscoreToCamelCase::from_options))
            .register("UnderscoreToDash", options_factory(UnderscoreToDash::from_options))
            .register("UnderscoreToSeparator", options_factory(UnderscoreToSeparator::from_options))
            .register("UnderscoreToStudlyCase", options_factory(UnderscoreToStudlyCase::from_options));

        registry
            .register("DateSelect", options_factory(DateSelect::from_options))
            .register("DateTimeSelect", options_factory(DateTimeSelect::from_options))
            .register("MonthSelect", options_factory(MonthSelect::from_options));

        registry
            .register("Dir", options_factory(Dir::from_options))
            .register("RealPath", options_factory(RealPath::from_options))
            .register("Rename", options_factory(Rename::from_options))
            .register("FileLowerCase", options_factory(FileLowerCase::from_options))
            .register("FileUpperCase", options_factory(FileUpperCase::from_options));

        registry
            .register("CompressString", options_factory(CompressString::from_options))
            .register("DecompressString", options_factory(DecompressString::from_options))
            .register("CompressToArchive", options_factory(CompressToArchive::from_options))
            .register("DecompressArchive", options_factory(DecompressArchive::from_options));

        registry
            .register("Inflector", |registry: &FilterRegistry, options: serde_json::Value| {
                let filter: Arc<dyn Filter> = Arc::new(Inflector::from_options(registry, options)?);
                Ok(filter)
            })
            .register("FilterChain", |registry: &FilterRegistry, options: serde_json::Value| {
                let spec: ChainSpec = parse_options("FilterChain", options)?;
                let filter: Arc<dyn Filter> = Arc::new(FilterChain::from_spec(registry.clone(), &spec)?);
                Ok(filter)
            })
            .register("ImmutableFilterChain", |registry: &FilterRegistry, options: serde_json::Value| {
                let spec: ChainSpec = parse_options("ImmutableFilterChain", options)?;
                let filter: Arc<dyn Filter> = Arc::new(ImmutableFilterChain::from_spec(registry.clone(), &spec)?);
                Ok(filter)
            });

        registry
    }

    /// Add or replace a factory
    pub fn register<F>(&mut self, name: &str, factory: F) -> &mut Self
    where
        F: Fn(&FilterRegistry, serde_json::Value) -> Result<Arc<dyn Filter>, FilterError> + Send + Sync + 'static,
    {
        self.factories
            .insert(name.to_ascii_lowercase(), (name.to_string(), Arc::new(factory)));
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(&name.to_ascii_lowercase())
    }

    /// Build a filter by name
    pub fn build(&self, name: &str, options: serde_json::Value) -> Result<Arc<dyn Filter>, FilterError> {
        let (canonical, factory) = self
            .factories
            .get(&name.to_ascii_lowercase())
            .ok_or_else(|| FilterError::UnknownFilter(name.to_string()))?;

        debug!("Building filter {} (requested as {})", canonical, name);
        factory(self, options)
    }

    /// Registered canonical names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.values().map(|(name, _)| name.as_str()).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for FilterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterRegistry").field("filters", &self.names()).finish()
    }
}
