//! Trace Styling
//!
//! Re-renders a raw trace as HTML-safe text, wrapping every line that has a
//! corresponding [`ErrorContext`] in an inline marker tag carrying the
//! context's id. The correlation key is the exact substring the parser
//! matched, so the context list must have been produced from the same trace;
//! a mismatched list degrades to an escaped trace with zero highlights.

use crate::context::ErrorContext;
use crate::parser::TraceParser;
use std::collections::HashMap;

/// Marker start tag, `{}` replaced by the context id.
pub const HIGHLIGHT_START: &str = "<span class=\"own-class\" source-id=\"{}\">";

/// Marker end tag.
pub const HIGHLIGHT_END: &str = "</span>";

/// Renders annotated traces.
///
/// Instances of this type are thread-safe.
pub struct TraceStyler<'p> {
    parser: &'p TraceParser,
}

impl<'p> TraceStyler<'p> {
    pub fn new(parser: &'p TraceParser) -> Self {
        Self { parser }
    }

    /// Render `raw_trace` as HTML-safe text with inline context markers.
    ///
    /// Must be called with the contexts extracted from the same trace in the
    /// same logical request; the contexts carry the matched substrings this
    /// method correlates lines against.
    pub fn style(&self, raw_trace: &str, contexts: &[ErrorContext]) -> String {
        let correlation: HashMap<&str, &ErrorContext> = contexts
            .iter()
            .map(|context| (context.raw_trace_line(), context))
            .collect();

        raw_trace
            .split('\n')
            .map(|line| self.decorate_line(line, &correlation))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn decorate_line(&self, line: &str, correlation: &HashMap<&str, &ErrorContext>) -> String {
        let escaped = html_escape::encode_text(line);

        let context = self
            .parser
            .matched_content(line)
            .and_then(|key| correlation.get(key));

        match context {
            Some(context) => format!(
                "{}{escaped}{HIGHLIGHT_END}",
                HIGHLIGHT_START.replace("{}", &context.id())
            ),
            None => escaped.into_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::SourceResolver;

    const TRACE: &str = "java.lang.IllegalStateException: <boom>\n\
        \tat com.acme.demo.A.run(A.java:3)\n\
        \tat org.framework.Dispatcher.dispatch(Dispatcher.java:100)\n\
        \tat com.acme.demo.B.call(B.java:5)";

    fn contexts_for(trace: &str, parser: &TraceParser) -> Vec<ErrorContext> {
        let resolver = SourceResolver::new(vec![], vec![]);
        parser
            .parse(trace)
            .iter()
            .map(|frame| ErrorContext::from_frame(frame, &resolver))
            .collect()
    }

    #[test]
    fn matched_lines_are_wrapped_with_context_ids() {
        let parser = TraceParser::new("com.acme");
        let contexts = contexts_for(TRACE, &parser);
        let styled = TraceStyler::new(&parser).style(TRACE, &contexts);

        for context in &contexts {
            assert!(styled.contains(&context.id()));
        }
        assert_eq!(styled.matches("<span class=\"own-class\"").count(), 2);
        assert_eq!(styled.matches(HIGHLIGHT_END).count(), 2);
    }

    #[test]
    fn every_line_is_html_escaped() {
        let parser = TraceParser::new("com.acme");
        let contexts = contexts_for(TRACE, &parser);
        let styled = TraceStyler::new(&parser).style(TRACE, &contexts);

        assert!(styled.contains("&lt;boom&gt;"));
        assert!(!styled.contains("<boom>"));
    }

    #[test]
    fn unrelated_contexts_degrade_to_zero_highlights() {
        let parser = TraceParser::new("com.acme");
        let other_trace = "at com.acme.other.C.run(C.java:9)";
        let contexts = contexts_for(other_trace, &parser);

        let styled = TraceStyler::new(&parser).style(TRACE, &contexts);
        assert_eq!(styled.matches("<span").count(), 0);
    }

    #[test]
    fn line_structure_is_preserved() {
        let parser = TraceParser::new("com.acme");
        let styled = TraceStyler::new(&parser).style(TRACE, &[]);
        assert_eq!(styled.split('\n').count(), TRACE.split('\n').count());
    }
}
