pub mod error;
pub mod value;
pub mod entry;
pub mod config;

// Re-export commonly used types
pub use error::{FilterError, Result};
pub use value::Value;
pub use entry::{ArchiveEntry, ScannedFile};
pub use config::{ChainSpec, FilterSpec, DEFAULT_PRIORITY};
