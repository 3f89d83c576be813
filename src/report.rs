//! Error Reports
//!
//! Assembles the data handed to the view layer for one error response: the
//! raw attributes, the extracted contexts, the styled trace and, for 404s,
//! the route listing. Also owns the archival glue: JSON error bodies that
//! carry a trace are archived under a fresh opaque token so the response can
//! advertise a beacon link that redisplays the full page later.

use crate::archive::{ErrorArchive, ErrorAttributes};
use crate::context::ErrorContext;
use crate::error::ErrorPagesError;
use crate::routes::{RequestMapping, RouteRegistry};
use crate::service::ErrorPagesService;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Attribute under which the boundary layer supplies the raw trace.
pub const TRACE_KEY: &str = "trace";

/// Everything the view layer needs to render one error page.
#[derive(Debug)]
pub struct ErrorReport {
    pub status: u16,
    pub attributes: ErrorAttributes,
    pub error_contexts: Vec<ErrorContext>,
    pub styled_trace: Option<String>,
    /// Registered URL patterns, populated for 404 responses only.
    pub mappings: Vec<RequestMapping>,
}

/// Builds [`ErrorReport`]s and manages their archival.
pub struct ErrorReporter {
    service: Arc<ErrorPagesService>,
    archive: Arc<ErrorArchive>,
    /// Error endpoint path the beacon link is built from.
    error_path: String,
}

impl ErrorReporter {
    pub fn new(
        service: Arc<ErrorPagesService>,
        archive: Arc<ErrorArchive>,
        error_path: impl Into<String>,
    ) -> Self {
        Self {
            service,
            archive,
            error_path: error_path.into(),
        }
    }

    /// Assemble the render model for one error response.
    ///
    /// Context extraction runs before styling; the styler receives the list it
    /// must correlate against as an argument.
    pub fn build(
        &self,
        status: u16,
        attributes: ErrorAttributes,
        routes: Option<&RouteRegistry>,
    ) -> ErrorReport {
        let trace = attributes.get(TRACE_KEY).and_then(Value::as_str);

        let error_contexts = self.service.error_contexts(trace);
        let styled_trace =
            trace.map(|raw| self.service.styled_trace(raw, &error_contexts));

        let mappings = if status == 404 {
            routes.map(RouteRegistry::mappings).unwrap_or_default()
        } else {
            Vec::new()
        };

        ErrorReport {
            status,
            attributes,
            error_contexts,
            styled_trace,
            mappings,
        }
    }

    /// Archive the attributes of a trace-carrying error body under a fresh
    /// token and return the beacon path to advertise in the response.
    ///
    /// Bodies without a trace are not archived: there is nothing more to show
    /// than the plain body already does.
    pub fn archive(&self, attributes: &ErrorAttributes) -> Option<String> {
        if !attributes.contains_key(TRACE_KEY) {
            return None;
        }

        let id = Uuid::new_v4().to_string();
        self.archive.put(&id, attributes.clone());
        debug!(id, "archived error body for beacon link");
        Some(format!("{}/{}", self.error_path, id))
    }

    /// Fetch archived attributes by token and merge them over `attributes`.
    ///
    /// The read pins the entry against eviction. A miss propagates as
    /// [`ErrorPagesError::ArchiveNotFound`] for the boundary to map to 404.
    pub fn merge_archived(
        &self,
        id: &str,
        mut attributes: ErrorAttributes,
    ) -> Result<ErrorAttributes, ErrorPagesError> {
        let archived = self.archive.get(id)?;
        attributes.extend(archived);
        Ok(attributes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::ARCHIVED_KEY;
    use crate::config::ErrorPagesConfig;
    use serde_json::json;
    use std::time::Duration;

    fn reporter() -> ErrorReporter {
        let config = ErrorPagesConfig::new("com.acme");
        ErrorReporter::new(
            Arc::new(ErrorPagesService::new(&config)),
            Arc::new(ErrorArchive::new(Duration::from_millis(900_000))),
            "/error",
        )
    }

    fn attributes_with_trace() -> ErrorAttributes {
        let mut attributes = ErrorAttributes::new();
        attributes.insert("status".to_string(), json!(500));
        attributes.insert(
            TRACE_KEY.to_string(),
            json!("at com.acme.demo.A.run(A.java:3)"),
        );
        attributes
    }

    #[test]
    fn report_for_trace_carrying_error_has_contexts_and_styled_trace() {
        let report = reporter().build(500, attributes_with_trace(), None);

        assert_eq!(report.error_contexts.len(), 1);
        let styled = report.styled_trace.expect("styled trace present");
        assert!(styled.contains("com.acme.demo.A:3"));
        assert!(report.mappings.is_empty());
    }

    #[test]
    fn report_without_trace_is_empty_but_valid() {
        let report = reporter().build(500, ErrorAttributes::new(), None);
        assert!(report.error_contexts.is_empty());
        assert!(report.styled_trace.is_none());
    }

    #[test]
    fn not_found_report_lists_registered_routes() {
        let mut routes = RouteRegistry::new();
        routes.register("/cart", vec!["GET".to_string()]);

        let report = reporter().build(404, ErrorAttributes::new(), Some(&routes));
        assert_eq!(report.mappings.len(), 1);

        // Same routes, non-404: the listing stays out of the model.
        let report = reporter().build(500, ErrorAttributes::new(), Some(&routes));
        assert!(report.mappings.is_empty());
    }

    #[test]
    fn archive_round_trip_via_beacon_path() {
        let reporter = reporter();
        let beacon = reporter.archive(&attributes_with_trace()).unwrap();
        let id = beacon.strip_prefix("/error/").unwrap();

        let merged = reporter
            .merge_archived(id, ErrorAttributes::new())
            .unwrap();
        assert_eq!(merged.get(ARCHIVED_KEY), Some(&json!(true)));
        assert_eq!(merged.get("status"), Some(&json!(500)));
    }

    #[test]
    fn traceless_bodies_are_not_archived() {
        assert!(reporter().archive(&ErrorAttributes::new()).is_none());
    }

    #[test]
    fn unknown_token_is_an_archive_miss() {
        let result = reporter().merge_archived("unknown", ErrorAttributes::new());
        assert!(matches!(
            result,
            Err(ErrorPagesError::ArchiveNotFound { .. })
        ));
    }
}
