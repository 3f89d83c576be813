//! Error types for the better-error-pages crate.
//!
//! Per-frame failures (a source file that cannot be read, a template that cannot
//! be located) never surface through the public API; they degrade to placeholder
//! snippets. Only configuration problems and archive misses are first-class errors.

use std::path::PathBuf;
use thiserror::Error;

/// Failures surfaced to the embedding application.
#[derive(Debug, Error)]
pub enum ErrorPagesError {
    /// Invalid configuration, fatal at startup.
    #[error("configuration error: {0}")]
    Config(String),

    /// Lookup of an archived error by an unknown or expired token.
    ///
    /// Expected to map to a 404-equivalent at the HTTP boundary. Carries the
    /// archive timeout so the boundary can explain why the entry is gone.
    #[error("no archived error page for id '{id}' (entries expire after {timeout_ms}ms)")]
    ArchiveNotFound { id: String, timeout_ms: u64 },
}

/// Failure to resolve a frame reference to a readable source file.
///
/// Always recovered locally during [`crate::context::ErrorContext`] construction.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("source file for '{reference}' not found under any configured root")]
    SourceNotFound { reference: String },

    #[error("template '{template}' not found on any template root")]
    TemplateNotFound { template: String },

    #[error("failed to read {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
