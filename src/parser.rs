//! Trace Parsing
//!
//! Pure text scanner that extracts structured frame references from a raw
//! exception trace. Two pattern families are compiled once per parser: one for
//! application-code frames scoped to a configured package prefix, one for
//! template-engine frames. Instances are thread-safe and hold no state beyond
//! the compiled patterns.

use regex::Regex;
use tracing::{debug, trace};

/// A frame referencing application code.
///
/// Produced from lines of the shape
/// `at com.acme.shop.CartController.checkout(CartController.java:69)`.
#[derive(Debug, Clone, Eq)]
pub struct ClassFrame {
    /// Fully qualified class name, e.g. `com.acme.shop.CartController`.
    pub fully_qualified_name: String,
    /// Package portion, e.g. `com.acme.shop`.
    pub package_name: String,
    /// Simple class name, e.g. `CartController`.
    pub simple_name: String,
    /// Declaring source file name, e.g. `CartController.java`.
    pub file_name: String,
    /// 1-based line number within the source file.
    pub line_number: u32,
    /// The exact matched substring, preserved verbatim as the correlation key.
    pub raw_line: String,
}

// Equality is defined over the five captured fields only. The raw line also
// carries the method name, and recursion through the same class/line via
// different methods must still collapse to one frame.
impl PartialEq for ClassFrame {
    fn eq(&self, other: &Self) -> bool {
        self.fully_qualified_name == other.fully_qualified_name
            && self.package_name == other.package_name
            && self.simple_name == other.simple_name
            && self.file_name == other.file_name
            && self.line_number == other.line_number
    }
}

/// A frame referencing a template file, e.g.
/// `(template: "products/syntaxError" - line 3, col 5)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateFrame {
    /// Template name as reported, resource-locator brackets already stripped.
    pub template_name: String,
    /// 1-based line number within the template.
    pub line_number: u32,
    /// The exact matched substring, preserved verbatim as the correlation key.
    pub raw_line: String,
}

/// One structured frame reference extracted from a trace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameMatch {
    Class(ClassFrame),
    Template(TemplateFrame),
}

impl FrameMatch {
    /// The exact substring the pattern matched, used as the correlation key.
    pub fn raw_line(&self) -> &str {
        match self {
            FrameMatch::Class(frame) => &frame.raw_line,
            FrameMatch::Template(frame) => &frame.raw_line,
        }
    }
}

/// Extracts frame references from raw traces.
///
/// Instances of this type are thread-safe.
pub struct TraceParser {
    class_pattern: Regex,
    template_pattern: Regex,
}

impl TraceParser {
    /// Create a parser scoped to the given package-name prefix.
    ///
    /// Only code frames whose qualifying prefix starts with `package_name` are
    /// matched; everything else in the trace is framework noise.
    pub fn new(package_name: &str) -> Self {
        let class_pattern = Regex::new(&format!(
            r"at (({}[a-z0-9.]*)\.([A-Z]\w*)).*\((.+):(\d+)\)",
            regex::escape(package_name)
        ))
        .expect("class frame pattern is valid for any escaped package prefix");

        // Template names are sometimes wrapped in a resource-locator bracket:
        //   (template: "class path resource [templates/index.html]" - line 2, col 100)
        // and sometimes bare:
        //   (template: "products/syntaxError" - line 3, col 5)
        // The optional `.+\[` prefix and trailing `\]*` strip the wrapper.
        let template_pattern =
            Regex::new(r#"\(template: "(?:.+\[)?(.+?)\]*" - line (\d+), col .+\)"#)
                .expect("template frame pattern is valid");

        Self {
            class_pattern,
            template_pattern,
        }
    }

    /// Extract all frame references from `trace`.
    ///
    /// Code frames are deduplicated by field equality while preserving
    /// first-occurrence order. When no code frame matches at all, the template
    /// pattern is tried as a fallback and only the first template match is
    /// kept: later matches in the same trace name the same file again.
    /// Empty or whitespace-only input yields an empty result.
    pub fn parse(&self, raw_trace: &str) -> Vec<FrameMatch> {
        if raw_trace.trim().is_empty() {
            return Vec::new();
        }

        let mut frames: Vec<FrameMatch> = Vec::new();

        for caps in self.class_pattern.captures_iter(raw_trace) {
            let line_number = match caps[5].parse::<u32>() {
                Ok(n) => n,
                Err(_) => continue,
            };
            let frame = FrameMatch::Class(ClassFrame {
                fully_qualified_name: caps[1].to_string(),
                package_name: caps[2].to_string(),
                simple_name: caps[3].to_string(),
                file_name: caps[4].to_string(),
                line_number,
                raw_line: caps[0].to_string(),
            });
            if !frames.contains(&frame) {
                frames.push(frame);
            }
        }

        if frames.is_empty() {
            if let Some(caps) = self.template_pattern.captures(raw_trace) {
                if let Ok(line_number) = caps[2].parse::<u32>() {
                    debug!("frame reference for a template exception found");
                    frames.push(FrameMatch::Template(TemplateFrame {
                        template_name: caps[1].to_string(),
                        line_number,
                        raw_line: caps[0].to_string(),
                    }));
                }
            }
        }

        trace!(count = frames.len(), "extracted frame references");
        frames
    }

    /// Map a single trace line back to the substring a pattern would match.
    ///
    /// Code pattern first, template pattern second, first hit wins. The styler
    /// uses the returned substring as the key into its correlation map.
    pub fn matched_content<'t>(&self, trace_line: &'t str) -> Option<&'t str> {
        if let Some(found) = self.class_pattern.find(trace_line) {
            return Some(found.as_str());
        }
        self.template_pattern
            .find(trace_line)
            .map(|found| found.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_TRACE: &str = r#"org.springframework.web.util.NestedServletException: Request processing failed
	at org.springframework.web.servlet.FrameworkServlet.processRequest(FrameworkServlet.java:1013)
	at com.acme.shop.CartService.priceOf(CartService.java:42)
	at com.acme.shop.CartService.total(CartService.java:57)
	at com.acme.shop.web.CartController.checkout(CartController.java:69)
	at com.acme.shop.web.CartController.checkout(CartController.java:70)
	at javax.servlet.http.HttpServlet.service(HttpServlet.java:634)
"#;

    #[test]
    fn parses_only_in_scope_code_frames() {
        let parser = TraceParser::new("com.acme");
        let frames = parser.parse(SAMPLE_TRACE);

        assert_eq!(frames.len(), 4);
        for frame in &frames {
            assert!(matches!(frame, FrameMatch::Class(_)));
        }
    }

    #[test]
    fn captures_all_five_fields() {
        let parser = TraceParser::new("com.acme");
        let frames =
            parser.parse("at com.acme.shop.web.CartController.checkout(CartController.java:69)");

        assert_eq!(frames.len(), 1);
        let FrameMatch::Class(frame) = &frames[0] else {
            panic!("expected a class frame");
        };
        assert_eq!(frame.fully_qualified_name, "com.acme.shop.web.CartController");
        assert_eq!(frame.package_name, "com.acme.shop.web");
        assert_eq!(frame.simple_name, "CartController");
        assert_eq!(frame.file_name, "CartController.java");
        assert_eq!(frame.line_number, 69);
        assert_eq!(
            frame.raw_line,
            "at com.acme.shop.web.CartController.checkout(CartController.java:69)"
        );
    }

    #[test]
    fn out_of_scope_package_does_not_match() {
        let parser = TraceParser::new("com.acme");
        let frames = parser
            .parse("at org.springframework.web.servlet.DispatcherServlet.doDispatch(DispatcherServlet.java:1039)");
        assert!(frames.is_empty());
    }

    #[test]
    fn duplicate_class_and_line_collapses_to_one_frame() {
        let parser = TraceParser::new("com.acme");
        let trace = "at com.acme.demo.Recursive.descend(Recursive.java:12)\n\
                     at com.acme.demo.Recursive.descend(Recursive.java:12)\n\
                     at com.acme.demo.Recursive.start(Recursive.java:12)";
        let frames = parser.parse(trace);
        assert_eq!(frames.len(), 1);
    }

    #[test]
    fn dedup_preserves_first_occurrence_order() {
        let parser = TraceParser::new("com.acme");
        let trace = "at com.acme.demo.B.run(B.java:5)\n\
                     at com.acme.demo.A.run(A.java:3)\n\
                     at com.acme.demo.B.run(B.java:5)";
        let frames = parser.parse(trace);

        assert_eq!(frames.len(), 2);
        let FrameMatch::Class(first) = &frames[0] else {
            panic!("expected a class frame");
        };
        assert_eq!(first.simple_name, "B");
    }

    #[test]
    fn template_fallback_when_no_code_frames() {
        let parser = TraceParser::new("com.acme");
        let frames = parser.parse(
            r#"org.thymeleaf.exceptions.TemplateProcessingException: Exception evaluating expression (template: "products/syntaxError" - line 3, col 5)"#,
        );

        assert_eq!(frames.len(), 1);
        let FrameMatch::Template(frame) = &frames[0] else {
            panic!("expected a template frame");
        };
        assert_eq!(frame.template_name, "products/syntaxError");
        assert_eq!(frame.line_number, 3);
    }

    #[test]
    fn template_resource_locator_brackets_are_stripped() {
        let parser = TraceParser::new("com.acme");
        let frames = parser.parse(
            r#"(template: "class path resource [templates/index.html]" - line 2, col 100)"#,
        );

        assert_eq!(frames.len(), 1);
        let FrameMatch::Template(frame) = &frames[0] else {
            panic!("expected a template frame");
        };
        assert_eq!(frame.template_name, "templates/index.html");
        assert_eq!(frame.line_number, 2);
    }

    #[test]
    fn only_first_template_match_is_kept() {
        let parser = TraceParser::new("com.acme");
        let trace = r#"(template: "layouts/default" - line 17, col 22)
caused by: (template: "layouts/default" - line 17, col 22)"#;
        assert_eq!(parser.parse(trace).len(), 1);
    }

    #[test]
    fn empty_and_whitespace_traces_yield_nothing() {
        let parser = TraceParser::new("com.acme");
        assert!(parser.parse("").is_empty());
        assert!(parser.parse("   \n\t  ").is_empty());
    }

    #[test]
    fn matched_content_returns_exact_substring() {
        let parser = TraceParser::new("com.acme");
        let line = "\tat com.acme.demo.A.run(A.java:3) ~[classes/:na]";
        assert_eq!(
            parser.matched_content(line),
            Some("at com.acme.demo.A.run(A.java:3)")
        );

        let template = r#"... (template: "products/list" - line 4, col 9) ..."#;
        assert_eq!(
            parser.matched_content(template),
            Some(r#"(template: "products/list" - line 4, col 9)"#)
        );

        assert_eq!(parser.matched_content("no frame here"), None);
    }
}
