//! Error Contexts
//!
//! An [`ErrorContext`] pairs one resolved frame reference with the snippet of
//! source code around the implicated line. Contexts are built once per matched
//! frame; source resolution happens during construction and fails soft, so a
//! missing file still yields a context whose snippet is a placeholder.

use crate::parser::FrameMatch;
use crate::resolve::SourceResolver;
use std::hash::{Hash, Hasher};
use std::path::PathBuf;
use tracing::debug;

/// Snippet text used when the source behind a frame cannot be read.
pub const UNRESOLVED_SNIPPET: &str =
    "Cannot read source file, the failure is logged at debug level.";

const TEMPLATES_PREFIX: &str = "templates/";
const TEMPLATES_SUFFIX: &str = ".html";

/// Kind of source artifact a context points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    Code,
    Template,
}

/// One frame reference with its resolved source snippet.
#[derive(Debug, Clone)]
pub struct ErrorContext {
    file_type: FileType,
    fully_qualified_reference: String,
    package_name: String,
    short_name: String,
    file_name: String,
    error_line_number: u32,
    source_code_path: Option<PathBuf>,
    source_code: String,
    first_line_number: u32,
    raw_trace_line: String,
}

impl ErrorContext {
    /// Build a context from a frame, resolving its source snippet immediately.
    ///
    /// Resolution failure never propagates: the context is still produced with
    /// [`UNRESOLVED_SNIPPET`] as its snippet and no source path.
    pub fn from_frame(frame: &FrameMatch, resolver: &SourceResolver) -> Self {
        let mut context = match frame {
            FrameMatch::Class(class_frame) => Self {
                file_type: FileType::Code,
                fully_qualified_reference: class_frame.fully_qualified_name.clone(),
                package_name: class_frame.package_name.clone(),
                short_name: class_frame.simple_name.clone(),
                file_name: class_frame.file_name.clone(),
                error_line_number: class_frame.line_number,
                source_code_path: None,
                source_code: UNRESOLVED_SNIPPET.to_string(),
                first_line_number: 0,
                raw_trace_line: class_frame.raw_line.clone(),
            },
            FrameMatch::Template(template_frame) => {
                let file_name = normalize_template_name(&template_frame.template_name);
                Self {
                    file_type: FileType::Template,
                    fully_qualified_reference: file_name.clone(),
                    package_name: String::new(),
                    short_name: file_name.clone(),
                    file_name,
                    error_line_number: template_frame.line_number,
                    source_code_path: None,
                    source_code: UNRESOLVED_SNIPPET.to_string(),
                    first_line_number: 0,
                    raw_trace_line: template_frame.raw_line.clone(),
                }
            }
        };

        // Template frames resolve against the normalized name, so re-resolve
        // through the context's own fields rather than the raw frame.
        let lookup_frame = context.lookup_frame();
        match resolver.resolve(&lookup_frame) {
            Ok(resolved) => {
                context.source_code_path = Some(resolved.path);
                context.source_code = resolved.snippet;
                context.first_line_number = resolved.first_line_number;
            }
            Err(err) => {
                debug!(reference = %context.fully_qualified_reference, error = %err,
                    "source resolution failed, keeping placeholder snippet");
            }
        }

        context
    }

    fn lookup_frame(&self) -> FrameMatch {
        match self.file_type {
            FileType::Code => FrameMatch::Class(crate::parser::ClassFrame {
                fully_qualified_name: self.fully_qualified_reference.clone(),
                package_name: self.package_name.clone(),
                simple_name: self.short_name.clone(),
                file_name: self.file_name.clone(),
                line_number: self.error_line_number,
                raw_line: self.raw_trace_line.clone(),
            }),
            FileType::Template => FrameMatch::Template(crate::parser::TemplateFrame {
                template_name: self.file_name.clone(),
                line_number: self.error_line_number,
                raw_line: self.raw_trace_line.clone(),
            }),
        }
    }

    /// Stable identity used for cross-referencing from the styled trace.
    pub fn id(&self) -> String {
        format!("{}:{}", self.fully_qualified_reference, self.error_line_number)
    }

    pub fn file_type(&self) -> FileType {
        self.file_type
    }

    /// Fully qualified class name for code frames, normalized template path
    /// for template frames.
    pub fn fully_qualified_reference(&self) -> &str {
        &self.fully_qualified_reference
    }

    /// Empty for templates.
    pub fn package_name(&self) -> &str {
        &self.package_name
    }

    pub fn short_name(&self) -> &str {
        &self.short_name
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// 1-based line implicated by the frame.
    pub fn error_line_number(&self) -> u32 {
        self.error_line_number
    }

    /// Resolved source file, absent when resolution failed.
    pub fn source_code_path(&self) -> Option<&PathBuf> {
        self.source_code_path.as_ref()
    }

    /// The extracted snippet, or [`UNRESOLVED_SNIPPET`] on failure.
    pub fn source_code(&self) -> &str {
        &self.source_code
    }

    /// 1-based line number of the first snippet line, 0 when unresolved.
    pub fn first_line_number(&self) -> u32 {
        self.first_line_number
    }

    /// The original matched substring, the styler's correlation key.
    pub fn raw_trace_line(&self) -> &str {
        &self.raw_trace_line
    }
}

// Identity is the id alone: two contexts for the same reference and line are
// the same context even when their snippets differ.
impl PartialEq for ErrorContext {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for ErrorContext {}

impl Hash for ErrorContext {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id().hash(state);
    }
}

/// Normalize a reported template name to its lookup path.
///
/// Layout errors are reported without the `.html` suffix while custom
/// component errors come fully wrapped as `templates/index.html`, so both the
/// prefix and the suffix are added only when missing.
fn normalize_template_name(template_name: &str) -> String {
    let suffix = if template_name.ends_with(TEMPLATES_SUFFIX) {
        ""
    } else {
        TEMPLATES_SUFFIX
    };
    let prefix = if template_name.starts_with(TEMPLATES_PREFIX) {
        ""
    } else {
        TEMPLATES_PREFIX
    };
    format!("{prefix}{template_name}{suffix}")
}
