//! Result type alias shared across the workspace.
//!
//! Defaults the error type to `ExportError`, so functions can simply return
//! `Result<T>`.
use crate::error::ExportError;

/// Workspace-wide `Result` alias with `ExportError` as the default error.
pub type Result<T, E = ExportError> = std::result::Result<T, E>;
