use thiserror::Error;

/// Error type shared by every filter, adapter and resolver in the crate
///
/// `InvalidConfig` is reserved for problems detected while a filter or adapter
/// is being constructed; everything else is raised while filtering a value.
#[derive(Error, Debug)]
pub enum FilterError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Unknown filter: {0}")]
    UnknownFilter(String),

    #[error("{0}")]
    Runtime(String),

    #[error("Domain error: {0}")]
    Domain(String),

    #[error("Compression error: {0}")]
    Compression(String),

    #[error("Archive error: {0}")]
    Archive(String),

    #[error("Unsupported archive format: {0}")]
    UnsupportedArchive(String),

    #[error("Corrupted archive: {0}")]
    CorruptedArchive(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl FilterError {
    /// True for errors raised while building a filter rather than running it
    pub fn is_config_error(&self) -> bool {
        matches!(self, FilterError::InvalidConfig(_) | FilterError::UnknownFilter(_))
    }
}

// The CLI reports errors as plain strings
impl From<FilterError> for String {
    fn from(err: FilterError) -> String {
        err.to_string()
    }
}

pub type Result<T> = std::result::Result<T, FilterError>;
