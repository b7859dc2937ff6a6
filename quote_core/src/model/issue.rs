//! Per-symbol problems collected while building a record.
use std::fmt;

use strum::Display;

use crate::error::ProviderError;

/// Which provider call an issue came from.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum ProviderCall {
    Info,
    Snapshot,
    History,
}

/// Something that went wrong for one symbol without stopping the run.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq)]
pub enum SymbolIssue {
    /// A provider call failed outright.
    ProviderFailure {
        call: ProviderCall,
        error: ProviderError,
    },
    /// The call answered, but a piece of data is missing.
    PartialData(String),
    /// A value is present but unusable for derived fields.
    MalformedField { field: String, value: String },
}

impl fmt::Display for SymbolIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SymbolIssue::ProviderFailure { call, error } => write!(f, "{}: {}", call, error),
            SymbolIssue::PartialData(what) => f.write_str(what),
            SymbolIssue::MalformedField { field, value } => {
                write!(f, "unusable value for {}: {}", field, value)
            }
        }
    }
}
