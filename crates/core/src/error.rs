use crate::frontmatter::FrontmatterError;
use serde::Serialize;
use thiserror::Error;

/// Source location information for error reporting
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceLocation {
    /// Line number (1-indexed)
    pub line: usize,
    /// Column number (1-indexed)
    pub column: usize,
}

impl SourceLocation {
    /// Create a new source location
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }

    /// Start of an mdast node, when the parser recorded one.
    pub fn of_position(position: Option<&markdown::unist::Position>) -> Option<Self> {
        position.map(|p| Self::new(p.start.line, p.start.column))
    }
}

impl std::fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Errors that abort extraction.
///
/// Content anomalies never end up here; they are reported as [`Diagnostic`]s.
#[derive(Debug, Error)]
pub enum MdxTextError {
    /// markdown-rs rejected the document (usually invalid MDX/JS syntax).
    #[error("Parse error at {location}: {message}")]
    Parse {
        /// Error message
        message: String,
        /// Source location
        location: SourceLocation,
    },
    /// Frontmatter could not be parsed.
    #[error(transparent)]
    Frontmatter(#[from] FrontmatterError),
}

/// A non-fatal message produced while extracting a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// Human readable message
    pub message: String,
    /// Location of the originating node, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<SourceLocation>,
    /// Whether the anomaly made part of the document unusable.
    /// Extraction itself only reports warnings.
    pub fatal: bool,
}

impl Diagnostic {
    /// Create a warning.
    pub fn warning(message: impl Into<String>, location: Option<SourceLocation>) -> Self {
        Self {
            message: message.into(),
            location,
            fatal: false,
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let severity = if self.fatal { "error" } else { "warning" };
        match &self.location {
            Some(location) => write!(f, "{} at {}: {}", severity, location, self.message),
            None => write!(f, "{}: {}", severity, self.message),
        }
    }
}

/// Ordered collection of diagnostics for one extraction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    /// Create a new empty diagnostics collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a diagnostic.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.entries.push(diagnostic);
    }

    /// Add a warning with an optional location
    pub fn warning_at(&mut self, message: impl Into<String>, location: Option<SourceLocation>) {
        self.entries.push(Diagnostic::warning(message, location));
    }

    /// Append every diagnostic from `other`, keeping order.
    pub fn extend(&mut self, other: Diagnostics) {
        self.entries.extend(other.entries);
    }

    /// Check if there are any diagnostics
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total count of diagnostics
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Iterate in encounter order.
    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.entries.iter()
    }

    /// Consume into the underlying vector.
    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.entries
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_encounter_order() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.warning_at("first", None);
        diagnostics.push(Diagnostic::warning("second", Some(SourceLocation::new(3, 1))));

        let messages: Vec<_> = diagnostics.iter().map(|d| d.message.as_str()).collect();
        assert_eq!(messages, ["first", "second"]);
        assert!(!diagnostics.iter().next().unwrap().fatal);
        assert_eq!(diagnostics.len(), 2);
    }

    #[test]
    fn display_includes_location() {
        let diagnostic = Diagnostic::warning("bad meta", Some(SourceLocation::new(4, 2)));
        assert_eq!(diagnostic.to_string(), "warning at 4:2: bad meta");
        assert_eq!(Diagnostic::warning("oops", None).to_string(), "warning: oops");
    }

    #[test]
    fn serializes_as_plain_array() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.warning_at("meta", None);
        let json = serde_json::to_string(&diagnostics).unwrap();
        assert_eq!(json, r#"[{"message":"meta","fatal":false}]"#);
    }
}
