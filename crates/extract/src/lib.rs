#![deny(missing_docs)]
//! Structural text extraction for Markdown and MDX.
//!
//! [`extract`] parses a document, removes components, media, ESM and
//! expressions according to [`ExtractOptions`], and serializes what is left
//! as plain text or canonical Markdown. [`get_structure`] additionally
//! returns the heading outline.

/// Extraction options.
pub mod options;
/// Component handler registry.
pub mod registry;
/// Heading outline collection.
pub mod sections;
/// Plain text and Markdown serialization.
pub mod serialize;
/// Document structure (extraction plus outline).
pub mod structure;
/// Tree transformation.
pub mod transform;

pub use options::{ExtractOptions, Format, UnknownComponentHandling};
pub use registry::{ComponentHandler, HandlerContext, HandlerRegistry, JsxElement, Placement};
pub use sections::{Section, collect_sections};
pub use serialize::{Serializer, serialize};
pub use structure::{Structure, get_structure, get_structure_with_parser};
pub use transform::code_meta::{CodeMeta, ExpressionValue, MetaValue};

use markdown::mdast::Node;
use mdxtext_core::{
    Diagnostics, FrontmatterError, FrontmatterSplit, MarkdownParser, MdxTextError, ParseOptions,
    SourceLocation, split_frontmatter,
};
use serde::Serialize;
use serde_json::{Map, Value as JsonValue};
use transform::Transformer;

/// Output of [`extract`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractResult {
    /// Serialized content.
    pub content: String,
    /// Parsed frontmatter, when the document has any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frontmatter: Option<Map<String, JsonValue>>,
    /// Non-fatal problems, in encounter order.
    pub diagnostics: Diagnostics,
    /// Transformed tree `content` was serialized from.
    #[serde(skip)]
    pub tree: Node,
}

/// Extracts the text content of a document.
///
/// Content anomalies end up in [`ExtractResult::diagnostics`]; only parser
/// failures (invalid MDX, invalid frontmatter YAML) are errors.
///
/// ```
/// use mdxtext_extract::{ExtractOptions, extract};
///
/// let result = extract("# Hi\n\n<Note>Inside</Note>", &ExtractOptions::default()).unwrap();
/// assert_eq!(result.content, "Hi\n\nInside");
/// ```
pub fn extract(source: &str, options: &ExtractOptions) -> Result<ExtractResult, MdxTextError> {
    extract_with_parser(source, options, &ParseOptions::for_syntax(options.syntax))
}

/// Like [`extract`], with a caller-provided parsing stage.
///
/// `options.syntax` is ignored; the parser decides the dialect.
pub fn extract_with_parser<P>(
    source: &str,
    options: &ExtractOptions,
    parser: &P,
) -> Result<ExtractResult, MdxTextError>
where
    P: MarkdownParser + ?Sized,
{
    let document = parse_document(source, parser)?;
    Ok(extract_parsed(document, options))
}

/// A parsed body with its frontmatter.
pub(crate) struct ParsedDocument {
    pub(crate) tree: Node,
    frontmatter: Option<Map<String, JsonValue>>,
    diagnostics: Diagnostics,
    line_offset: usize,
}

pub(crate) fn parse_document<P>(source: &str, parser: &P) -> Result<ParsedDocument, MdxTextError>
where
    P: MarkdownParser + ?Sized,
{
    let mut diagnostics = Diagnostics::new();
    let split = match split_frontmatter(source) {
        Ok(split) => split,
        Err(err @ FrontmatterError::Unterminated) => {
            diagnostics.warning_at(err.to_string(), opening_fence_location(source));
            FrontmatterSplit::without_frontmatter(source)
        }
        Err(err) => return Err(err.into()),
    };
    let line_offset = split.line_offset(source);

    let tree = parser.parse(split.body).map_err(|err| match err {
        MdxTextError::Parse { message, location } => MdxTextError::Parse {
            message,
            location: SourceLocation::new(location.line + line_offset, location.column),
        },
        other => other,
    })?;

    Ok(ParsedDocument {
        tree,
        frontmatter: split.data,
        diagnostics,
        line_offset,
    })
}

pub(crate) fn extract_parsed(document: ParsedDocument, options: &ExtractOptions) -> ExtractResult {
    let transformer = Transformer::new(options, document.line_offset);
    let tree = transformer.transform_root(&document.tree);

    let mut diagnostics = document.diagnostics;
    diagnostics.extend(transformer.into_diagnostics());

    ExtractResult {
        content: Serializer::new(options.format).serialize(&tree),
        frontmatter: document.frontmatter,
        diagnostics,
        tree,
    }
}

fn opening_fence_location(source: &str) -> Option<SourceLocation> {
    source
        .lines()
        .position(|line| line.trim_start_matches('\u{feff}').trim_end() == "---")
        .map(|index| SourceLocation::new(index + 1, 1))
}
