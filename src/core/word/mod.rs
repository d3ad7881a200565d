// Word filters
pub mod separator;

pub use separator::{
    CamelCaseToSeparator, SeparatorOptions, SeparatorToCamelCase, SeparatorToSeparator,
    SeparatorToSeparatorOptions,
};

use crate::core::filter::{map_scalars, Filter};
use crate::models::config::parse_options;
use crate::models::{FilterError, Value};

/// Filters that are a word filter with fixed separators
macro_rules! preset_word_filter {
    ($(#[$meta:meta])* $name:ident($inner:ty) = $build:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone)]
        pub struct $name {
            inner: $inner,
        }

        impl $name {
            pub fn new() -> Self {
                Self { inner: $build }
            }

            /// Takes no options; anything passed is ignored
            pub fn from_options(_options: serde_json::Value) -> Result<Self, FilterError> {
                Ok(Self::new())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl Filter for $name {
            fn filter(&self, value: Value) -> Result<Value, FilterError> {
                self.inner.filter(value)
            }
        }
    };
}

preset_word_filter!(
    /// `camelCase` to `camel-Case`
    CamelCaseToDash(CamelCaseToSeparator) = CamelCaseToSeparator::new("-")
);
preset_word_filter!(
    /// `camelCase` to `camel_Case`
    CamelCaseToUnderscore(CamelCaseToSeparator) = CamelCaseToSeparator::new("_")
);
preset_word_filter!(
    /// `dash-words` to `DashWords`
    DashToCamelCase(SeparatorToCamelCase) = SeparatorToCamelCase::new("-")
);
preset_word_filter!(DashToUnderscore(SeparatorToSeparator) = SeparatorToSeparator::new("-", "_"));
preset_word_filter!(
    /// `under_score` to `UnderScore`
    UnderscoreToCamelCase(SeparatorToCamelCase) = SeparatorToCamelCase::new("_")
);
preset_word_filter!(UnderscoreToDash(SeparatorToSeparator) = SeparatorToSeparator::new("_", "-"));

/// Replace underscores with a configurable separator
#[derive(Debug, Clone)]
pub struct UnderscoreToSeparator {
    inner: SeparatorToSeparator,
}

impl UnderscoreToSeparator {
    pub fn new(separator: impl Into<String>) -> Self {
        Self {
            inner: SeparatorToSeparator::new("_", separator),
        }
    }

    pub fn from_options(options: serde_json::Value) -> Result<Self, FilterError> {
        let options: SeparatorOptions = parse_options("UnderscoreToSeparator", options)?;
        Ok(Self::new(options.separator))
    }
}

impl Filter for UnderscoreToSeparator {
    fn filter(&self, value: Value) -> Result<Value, FilterError> {
        self.inner.filter(value)
    }
}

/// `under_score` to `underScore`
#[derive(Debug, Clone)]
pub struct UnderscoreToStudlyCase {
    camel: SeparatorToCamelCase,
}

impl UnderscoreToStudlyCase {
    pub fn new() -> Self {
        Self {
            camel: SeparatorToCamelCase::new("_"),
        }
    }

    pub fn from_options(_options: serde_json::Value) -> Result<Self, FilterError> {
        Ok(Self::new())
    }
}

impl Default for UnderscoreToStudlyCase {
    fn default() -> Self {
        Self::new()
    }
}

impl Filter for UnderscoreToStudlyCase {
    fn filter(&self, value: Value) -> Result<Value, FilterError> {
        Ok(map_scalars(value, &|input: &str| {
            let camel = self.camel.convert(input);
            let mut chars = camel.chars();
            match chars.next() {
                Some(first) => first.to_lowercase().chain(chars).collect(),
                None => String::new(),
            }
        }))
    }
}
