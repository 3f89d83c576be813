//! Better Error Pages: Annotated Traces for Development
//!
//! Turns a raw exception trace into a list of source-code contexts and a styled,
//! HTML-safe rendering of the trace with inline cross-references, and archives
//! full error details behind short-lived opaque tokens so a simplified error
//! beacon link can redisplay the full diagnostics later.

pub mod archive;
pub mod config;
pub mod context;
pub mod error;
pub mod logging;
pub mod parser;
pub mod report;
pub mod resolve;
pub mod routes;
pub mod service;
pub mod styler;

pub use archive::{ErrorArchive, ErrorAttributes};
pub use config::ErrorPagesConfig;
pub use context::{ErrorContext, FileType};
pub use error::ErrorPagesError;
pub use parser::{FrameMatch, TraceParser};
pub use resolve::SourceResolver;
pub use service::ErrorPagesService;
