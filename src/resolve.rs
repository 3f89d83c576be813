//! Source Context Resolution
//!
//! Locates the source artifact behind a frame reference and extracts a
//! fixed-size window of lines around the error line. Code frames are resolved
//! by probing configured source roots with a path derived from the package and
//! declaring file name; template frames use a classpath-style lookup across
//! template roots. Packaging layouts vary across run modes, so the translation
//! from a located artifact to its source-tree file is an injectable strategy
//! rather than fixed logic.

use crate::error::ResolveError;
use crate::parser::{ClassFrame, FrameMatch, TemplateFrame};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::trace;
use walkdir::WalkDir;

/// Lines shown above the error line in a snippet.
const LINES_BEFORE: u32 = 6;

/// Lines shown below the error line in a snippet (exclusive upper bound).
const LINES_AFTER: u32 = 5;

/// Translation from a located artifact path to the source file to display.
///
/// Supplied by the embedding application when its build layout separates
/// compiled or packaged artifacts from the source tree.
pub type PathMapping = Arc<dyn Fn(&Path) -> PathBuf + Send + Sync>;

/// A successfully extracted source snippet.
#[derive(Debug, Clone)]
pub struct ResolvedSource {
    /// Path of the file the snippet was read from.
    pub path: PathBuf,
    /// The extracted window of source lines, joined with `\n`.
    pub snippet: String,
    /// 1-based line number of the first line in the snippet.
    pub first_line_number: u32,
}

/// Resolves frame references to source snippets.
///
/// Instances of this type are thread-safe.
pub struct SourceResolver {
    source_roots: Vec<PathBuf>,
    template_roots: Vec<PathBuf>,
    path_mapping: Option<PathMapping>,
}

impl SourceResolver {
    pub fn new(source_roots: Vec<PathBuf>, template_roots: Vec<PathBuf>) -> Self {
        Self {
            source_roots,
            template_roots,
            path_mapping: None,
        }
    }

    /// Install a layout-translation strategy applied to every located artifact.
    pub fn with_path_mapping(mut self, mapping: PathMapping) -> Self {
        self.path_mapping = Some(mapping);
        self
    }

    /// Resolve a frame to its source snippet.
    ///
    /// Errors are expected and recovered by the caller; a missing file must
    /// never abort processing of other frames.
    pub fn resolve(&self, frame: &FrameMatch) -> Result<ResolvedSource, ResolveError> {
        let (path, line_number) = match frame {
            FrameMatch::Class(class_frame) => (
                self.locate_class_source(class_frame)?,
                class_frame.line_number,
            ),
            FrameMatch::Template(template_frame) => (
                self.locate_template(template_frame)?,
                template_frame.line_number,
            ),
        };

        trace!(path = %path.display(), "resolved source file");
        let snippet = extract_snippet(&path, line_number)?;
        Ok(ResolvedSource {
            path,
            snippet: snippet.text,
            first_line_number: snippet.first_line_number,
        })
    }

    /// Probe each source root for the package-derived relative path.
    ///
    /// The relative path uses the declaring file name rather than the simple
    /// class name: nested and non-public types live in a file named after the
    /// declaring type, not after themselves.
    fn locate_class_source(&self, frame: &ClassFrame) -> Result<PathBuf, ResolveError> {
        let mut relative: PathBuf = frame.package_name.split('.').collect();
        relative.push(&frame.file_name);

        for root in &self.source_roots {
            let candidate = self.map(root.join(&relative));
            if candidate.is_file() {
                return Ok(candidate);
            }
        }

        Err(ResolveError::SourceNotFound {
            reference: frame.fully_qualified_name.clone(),
        })
    }

    /// Classpath-style template lookup: direct probe of each root first, then a
    /// recursive suffix search so templates are found from the lookup root even
    /// when the reported name omits intermediate directories.
    fn locate_template(&self, frame: &TemplateFrame) -> Result<PathBuf, ResolveError> {
        let relative = Path::new(&frame.template_name);

        for root in &self.template_roots {
            let candidate = self.map(root.join(relative));
            if candidate.is_file() {
                return Ok(candidate);
            }
        }

        // Packaged layouts flatten or relocate template directories; fall back
        // to searching every root for a path ending in the reported name.
        for root in &self.template_roots {
            for entry in WalkDir::new(root).into_iter().filter_map(Result::ok) {
                if entry.file_type().is_file() && entry.path().ends_with(relative) {
                    return Ok(self.map(entry.path().to_path_buf()));
                }
            }
        }

        Err(ResolveError::TemplateNotFound {
            template: frame.template_name.clone(),
        })
    }

    fn map(&self, located: PathBuf) -> PathBuf {
        match &self.path_mapping {
            Some(mapping) => mapping(&located),
            None => located,
        }
    }
}

struct Snippet {
    text: String,
    first_line_number: u32,
}

/// Extract the window `[error_line - 6, error_line + 5)` of 0-based lines,
/// clamping the lower bound at 0.
fn extract_snippet(path: &Path, error_line_number: u32) -> Result<Snippet, ResolveError> {
    let content = fs::read_to_string(path).map_err(|source| ResolveError::Unreadable {
        path: path.to_path_buf(),
        source,
    })?;

    // Line numbers come straight from the trace text, so both bounds must
    // tolerate arbitrary values without wrapping.
    let first_line = error_line_number.saturating_sub(LINES_BEFORE);
    let last_line = error_line_number.saturating_add(LINES_AFTER);

    let mut text = content
        .lines()
        .enumerate()
        .filter(|(index, _)| (*index as u32) >= first_line && (*index as u32) < last_line)
        .map(|(_, line)| line)
        .collect::<Vec<_>>()
        .join("\n");

    // A leading blank line is silently dropped by the code-viewer widget; a
    // single space keeps the line count intact.
    if text.starts_with('\n') {
        text.insert(0, ' ');
    }

    Ok(Snippet {
        text,
        first_line_number: first_line + 1,
    })
}
