use std::time::Duration;

use thiserror::Error;

/// Errors returned by clustering and image grouping in this crate.
///
/// An empty input is not an error: clustering zero points yields zero labels.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid parameter value.
    #[error("invalid parameter {name}: {message}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Human-readable explanation.
        message: &'static str,
    },

    /// Points in a dataset have inconsistent dimensionality.
    #[error("dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch {
        /// Expected dimensionality (taken from the first point).
        expected: usize,
        /// Found dimensionality.
        found: usize,
    },

    /// The run did not finish within the configured deadline.
    #[error("clustering exceeded its deadline of {limit:?}")]
    DeadlineExceeded {
        /// The configured limit.
        limit: Duration,
    },

    /// Configuration could not be read or parsed.
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::Config(e.to_string())
    }
}

/// Result type used by this crate.
pub type Result<T> = std::result::Result<T, Error>;
