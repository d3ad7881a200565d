// Module declarations
pub mod commands;
pub mod core;
pub mod models;
pub mod utils;

pub use crate::core::chain::{FilterChain, ImmutableFilterChain};
pub use crate::core::filter::Filter;
pub use crate::core::registry::FilterRegistry;
pub use crate::models::{ChainSpec, FilterError, FilterSpec, Result, Value};
