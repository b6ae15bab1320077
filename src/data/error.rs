/// Error types for loading the rental tables
use thiserror::Error;

use super::model::Granularity;

/// Why a load aborted. Nothing is cached when one of these is returned.
#[derive(Error, Debug)]
pub enum LoadError {
    /// Source unreachable, HTTP error status, unreadable file, or content
    /// that is not a rental table.
    #[error("failed to fetch {location}: {reason}")]
    Fetch { location: String, reason: String },

    /// A data row has a malformed date, number or flag.
    #[error("{table} table, row {row}: {reason}")]
    Parse {
        table: Granularity,
        row: usize,
        reason: String,
    },
}

impl LoadError {
    pub(crate) fn fetch(location: impl Into<String>, reason: impl ToString) -> Self {
        LoadError::Fetch {
            location: location.into(),
            reason: reason.to_string(),
        }
    }
}

/// Type alias for Results using LoadError
pub type Result<T> = std::result::Result<T, LoadError>;
