// Priority-ordered filter chains

use std::sync::Arc;

use log::trace;

use crate::core::filter::Filter;
use crate::core::registry::FilterRegistry;
use crate::models::{ChainSpec, FilterError, Value};

/// One attached filter with its ordering keys
#[derive(Clone)]
struct QueuedFilter {
    priority: i32,
    sequence: u64,
    filter: Arc<dyn Filter>,
}

/// Filters ordered by descending priority, FIFO within a priority
#[derive(Clone, Default)]
struct PriorityQueue {
    items: Vec<QueuedFilter>,
    next_sequence: u64,
}

impl PriorityQueue {
    fn insert(&mut self, filter: Arc<dyn Filter>, priority: i32) {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        // First slot whose priority is strictly lower keeps equal priorities in insertion order
        let index = self.items.partition_point(|item| item.priority >= priority);
        self.items.insert(
            index,
            QueuedFilter {
                priority,
                sequence,
                filter,
            },
        );
    }

    fn run(&self, mut value: Value) -> Result<Value, FilterError> {
        for (step, item) in self.items.iter().enumerate() {
            trace!("chain step {} (priority {}, seq {})", step, item.priority, item.sequence);
            value = item.filter.filter(value)?;
        }
        Ok(value)
    }
}

/// Mutable filter chain
///
/// Filters run from the highest priority to the lowest; filters sharing a
/// priority run in the order they were attached.
#[derive(Clone)]
pub struct FilterChain {
    registry: FilterRegistry,
    queue: PriorityQueue,
}

impl FilterChain {
    pub fn new(registry: FilterRegistry) -> Self {
        Self {
            registry,
            queue: PriorityQueue::default(),
        }
    }

    /// Build a chain from configuration, resolving every named filter
    pub fn from_spec(registry: FilterRegistry, spec: &ChainSpec) -> Result<Self, FilterError> {
        let mut chain = Self::new(registry);
        for filter in &spec.filters {
            chain.attach_by_name(&filter.name, filter.options.clone(), filter.priority_or_default())?;
        }
        Ok(chain)
    }

    pub fn attach(&mut self, filter: Arc<dyn Filter>, priority: i32) -> &mut Self {
        self.queue.insert(filter, priority);
        self
    }

    /// Build a filter through the registry and attach it
    pub fn attach_by_name(
        &mut self,
        name: &str,
        options: serde_json::Value,
        priority: i32,
    ) -> Result<&mut Self, FilterError> {
        let filter = self.registry.build(name, options)?;
        Ok(self.attach(filter, priority))
    }

    /// Append every filter of `other`, keeping their priorities
    pub fn merge(&mut self, other: &FilterChain) -> &mut Self {
        for item in &other.queue.items {
            self.queue.insert(Arc::clone(&item.filter), item.priority);
        }
        self
    }

    pub fn len(&self) -> usize {
        self.queue.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.items.is_empty()
    }

    /// Attached filters in execution order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Filter>> {
        self.queue.items.iter().map(|item| &item.filter)
    }

    pub fn registry(&self) -> &FilterRegistry {
        &self.registry
    }
}

impl Filter for FilterChain {
    fn filter(&self, value: Value) -> Result<Value, FilterError> {
        self.queue.run(value)
    }
}

/// Filter chain whose attach operations return a new chain
#[derive(Clone)]
pub struct ImmutableFilterChain {
    registry: FilterRegistry,
    queue: PriorityQueue,
}

impl ImmutableFilterChain {
    pub fn empty(registry: FilterRegistry) -> Self {
        Self {
            registry,
            queue: PriorityQueue::default(),
        }
    }

    pub fn from_spec(registry: FilterRegistry, spec: &ChainSpec) -> Result<Self, FilterError> {
        let mut chain = Self::empty(registry);
        for filter in &spec.filters {
            chain = chain.attach_by_name(&filter.name, filter.options.clone(), filter.priority_or_default())?;
        }
        Ok(chain)
    }

    #[must_use]
    pub fn attach(&self, filter: Arc<dyn Filter>, priority: i32) -> Self {
        let mut queue = self.queue.clone();
        queue.insert(filter, priority);
        Self {
            registry: self.registry.clone(),
            queue,
        }
    }

    pub fn attach_by_name(
        &self,
        name: &str,
        options: serde_json::Value,
        priority: i32,
    ) -> Result<Self, FilterError> {
        let filter = self.registry.build(name, options)?;
        Ok(self.attach(filter, priority))
    }

    pub fn len(&self) -> usize {
        self.queue.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.items.is_empty()
    }
}

impl Filter for ImmutableFilterChain {
    fn filter(&self, value: Value) -> Result<Value, FilterError> {
        self.queue.run(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FilterSpec, DEFAULT_PRIORITY};
    use serde_json::json;

    fn append(suffix: &'static str) -> Arc<dyn Filter> {
        Arc::new(move |value: Value| -> Result<Value, FilterError> {
            Ok(match value {
                Value::Str(s) => Value::Str(format!("{}{}", s, suffix)),
                other => other,
            })
        })
    }

    #[test]
    fn test_empty_chain_returns_value() {
        let chain = FilterChain::new(FilterRegistry::with_defaults());
        assert!(chain.is_empty());
        assert_eq!(chain.filter(Value::from("abc")).unwrap(), Value::from("abc"));
    }

    #[test]
    fn test_higher_priority_runs_first() {
        let mut chain = FilterChain::new(FilterRegistry::with_defaults());
        chain.attach(append("-low"), 10);
        chain.attach(append("-high"), 5000);
        chain.attach(append("-default"), DEFAULT_PRIORITY);

        assert_eq!(
            chain.filter(Value::from("x")).unwrap(),
            Value::from("x-high-default-low")
        );
    }

    #[test]
    fn test_equal_priority_runs_in_insertion_order() {
        let mut chain = FilterChain::new(FilterRegistry::with_defaults());
        chain.attach(append("1"), DEFAULT_PRIORITY);
        chain.attach(append("2"), DEFAULT_PRIORITY);
        chain.attach(append("3"), DEFAULT_PRIORITY);

        assert_eq!(chain.filter(Value::from("")).unwrap(), Value::from("123"));
        assert_eq!(chain.len(), 3);
    }

    #[test]
    fn test_attach_by_name() {
        let mut chain = FilterChain::new(FilterRegistry::with_defaults());
        chain
            .attach_by_name("StripTags", json!({}), DEFAULT_PRIORITY)
            .unwrap()
            .attach_by_name("StringToUpper", json!({}), DEFAULT_PRIORITY)
            .unwrap();

        assert_eq!(
            chain.filter(Value::from("<b>bold</b> text")).unwrap(),
            Value::from("BOLD TEXT")
        );
    }

    #[test]
    fn test_attach_unknown_name_fails() {
        let mut chain = FilterChain::new(FilterRegistry::with_defaults());
        let err = chain.attach_by_name("NoSuchFilter", json!({}), DEFAULT_PRIORITY).err().unwrap();
        assert!(matches!(err, FilterError::UnknownFilter(_)));
        assert!(chain.is_empty());
    }

    #[test]
    fn test_merge_keeps_priorities() {
        let mut first = FilterChain::new(FilterRegistry::with_defaults());
        first.attach(append("-a"), 100);

        let mut second = FilterChain::new(FilterRegistry::with_defaults());
        second.attach(append("-b"), 200);
        second.attach(append("-c"), 50);

        first.merge(&second);
        assert_eq!(first.len(), 3);
        assert_eq!(first.filter(Value::from("x")).unwrap(), Value::from("x-b-a-c"));
        assert_eq!(second.len(), 2);
    }

    #[test]
    fn test_clone_is_independent() {
        let mut chain = FilterChain::new(FilterRegistry::with_defaults());
        chain.attach(append("-a"), DEFAULT_PRIORITY);

        let mut copy = chain.clone();
        copy.attach(append("-b"), DEFAULT_PRIORITY);

        assert_eq!(chain.len(), 1);
        assert_eq!(copy.len(), 2);
        assert_eq!(chain.filter(Value::from("x")).unwrap(), Value::from("x-a"));
    }

    #[test]
    fn test_error_stops_chain() {
        let mut chain = FilterChain::new(FilterRegistry::with_defaults());
        chain.attach(
            Arc::new(|_: Value| -> Result<Value, FilterError> { Err(FilterError::Runtime("boom".into())) }),
            2000,
        );
        chain.attach(append("-never"), DEFAULT_PRIORITY);

        let err = chain.filter(Value::from("x")).unwrap_err();
        assert_eq!(err.to_string(), "boom");
    }

    #[test]
    fn test_from_spec() {
        let spec = ChainSpec {
            filters: vec![
                FilterSpec::new("StringToLower"),
                FilterSpec::new("SeparatorToSeparator")
                    .with_options(json!({"search_separator": " ", "replacement_separator": "_"}))
                    .with_priority(10),
            ],
        };
        let chain = FilterChain::from_spec(FilterRegistry::with_defaults(), &spec).unwrap();
        assert_eq!(
            chain.filter(Value::from("Hello Big World")).unwrap(),
            Value::from("hello_big_world")
        );
    }

    #[test]
    fn test_closures_attach_after_configured_filters() {
        let spec = ChainSpec {
            filters: vec![FilterSpec::new("StringToUpper")],
        };
        let mut chain = FilterChain::from_spec(FilterRegistry::with_defaults(), &spec).unwrap();
        assert_eq!(chain.len(), 1);

        chain.attach(append("-done"), DEFAULT_PRIORITY);
        assert_eq!(chain.len(), 2);
        assert_eq!(chain.filter(Value::from("abc")).unwrap(), Value::from("ABC-done"));
    }

    #[test]
    fn test_immutable_attach_returns_new_chain() {
        let empty = ImmutableFilterChain::empty(FilterRegistry::with_defaults());
        let one = empty.attach(append("-a"), DEFAULT_PRIORITY);
        let two = one
            .attach_by_name("StringToUpper", json!({}), 1)
            .unwrap();

        assert!(empty.is_empty());
        assert_eq!(one.len(), 1);
        assert_eq!(two.len(), 2);
        assert_eq!(empty.filter(Value::from("x")).unwrap(), Value::from("x"));
        assert_eq!(two.filter(Value::from("x")).unwrap(), Value::from("X-A"));
    }

    #[test]
    fn test_immutable_from_spec_with_bad_options() {
        let spec = ChainSpec {
            filters: vec![FilterSpec::new("StringToUpper").with_options(json!({"encoding": "no-such-encoding"}))],
        };
        let err = ImmutableFilterChain::from_spec(FilterRegistry::with_defaults(), &spec).err().unwrap();
        assert!(err.is_config_error());
    }

    #[test]
    fn test_chains_nest() {
        let mut inner = FilterChain::new(FilterRegistry::with_defaults());
        inner.attach(append("-inner"), DEFAULT_PRIORITY);

        let mut outer = FilterChain::new(FilterRegistry::with_defaults());
        outer.attach(Arc::new(inner), DEFAULT_PRIORITY);
        outer.attach(append("-outer"), DEFAULT_PRIORITY);

        assert_eq!(outer.filter(Value::from("x")).unwrap(), Value::from("x-inner-outer"));
    }
}
