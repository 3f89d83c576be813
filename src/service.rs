//! Error Pages Service
//!
//! Facade over the parse → resolve → style pipeline. Context extraction and
//! trace styling are separate calls with an explicit data dependency: the
//! styler takes the context list produced from the same trace as an argument,
//! so the ordering requirement is visible in the signatures instead of hiding
//! in ambient per-request state.
//!
//! Instances of this type are thread-safe.

use crate::config::ErrorPagesConfig;
use crate::context::ErrorContext;
use crate::parser::TraceParser;
use crate::resolve::{PathMapping, SourceResolver};
use crate::styler::TraceStyler;
use std::fmt::Display;
use std::panic::{catch_unwind, AssertUnwindSafe};
use tracing::warn;

pub struct ErrorPagesService {
    parser: TraceParser,
    resolver: SourceResolver,
}

impl ErrorPagesService {
    pub fn new(config: &ErrorPagesConfig) -> Self {
        Self {
            parser: TraceParser::new(&config.package_name),
            resolver: SourceResolver::new(
                config.source_roots.clone(),
                config.template_roots.clone(),
            ),
        }
    }

    /// Install a build-layout translation applied during source resolution.
    pub fn with_path_mapping(mut self, mapping: PathMapping) -> Self {
        self.resolver = self.resolver.with_path_mapping(mapping);
        self
    }

    /// Extract the ordered error contexts from a raw trace.
    ///
    /// `None` or a blank trace yields no contexts; that is the normal shape of
    /// a 404, not a failure.
    pub fn error_contexts(&self, raw_trace: Option<&str>) -> Vec<ErrorContext> {
        let Some(trace) = raw_trace.filter(|t| !t.trim().is_empty()) else {
            warn!(
                "trace is absent, this is normal for 404 errors; for other errors make sure \
                 the error response includes the stack trace"
            );
            return Vec::new();
        };

        self.parser
            .parse(trace)
            .iter()
            .map(|frame| ErrorContext::from_frame(frame, &self.resolver))
            .collect()
    }

    /// Render the annotated trace.
    ///
    /// `contexts` must be the list returned by [`Self::error_contexts`] for
    /// this same trace; an unrelated list produces an escaped trace with zero
    /// highlights.
    pub fn styled_trace(&self, raw_trace: &str, contexts: &[ErrorContext]) -> String {
        TraceStyler::new(&self.parser).style(raw_trace, contexts)
    }

    /// Render any model value, turning a panicking `Display` implementation
    /// into an inline diagnostic instead of crashing the page.
    ///
    /// The panic is contained, not suppressed: the process panic hook still
    /// runs and logs its usual report for every hostile value. The hook is
    /// process-global state shared with concurrent request threads, so it is
    /// deliberately left untouched here; callers wanting quiet rendering of
    /// known-bad values must configure the hook themselves.
    pub fn display_safe(&self, value: &dyn Display) -> String {
        match catch_unwind(AssertUnwindSafe(|| value.to_string())) {
            Ok(rendered) => rendered,
            Err(panic) => {
                let message = panic
                    .downcast_ref::<String>()
                    .map(String::as_str)
                    .or_else(|| panic.downcast_ref::<&str>().copied())
                    .unwrap_or("unknown panic");
                format!("Failure while rendering value: {message}")
            }
        }
    }
}
