//! Extraction together with the heading outline.

use crate::options::ExtractOptions;
use crate::sections::{Section, collect_sections, outline_shape};
use crate::{ExtractResult, extract_parsed, parse_document};
use mdxtext_core::{MarkdownParser, MdxTextError, ParseOptions};
use serde::Serialize;

/// Output of [`get_structure`].
#[derive(Debug, Clone, Serialize)]
pub struct Structure {
    /// Content, frontmatter, diagnostics and tree.
    #[serde(flatten)]
    pub extraction: ExtractResult,
    /// Outline of the extracted tree.
    pub sections: Vec<Section>,
}

/// Extracts a document and collects its outline.
///
/// The outline is collected from the extracted tree. When it differs in shape
/// from the outline of the raw document (a heading was dropped with its
/// component, say) a warning is added to the diagnostics.
pub fn get_structure(source: &str, options: &ExtractOptions) -> Result<Structure, MdxTextError> {
    get_structure_with_parser(source, options, &ParseOptions::for_syntax(options.syntax))
}

/// Like [`get_structure`], with a caller-provided parsing stage.
pub fn get_structure_with_parser<P>(
    source: &str,
    options: &ExtractOptions,
    parser: &P,
) -> Result<Structure, MdxTextError>
where
    P: MarkdownParser + ?Sized,
{
    let document = parse_document(source, parser)?;
    let raw_shape = outline_shape(&collect_sections(&document.tree));

    let mut extraction = extract_parsed(document, options);
    let sections = collect_sections(&extraction.tree);
    let shape = outline_shape(&sections);
    if shape != raw_shape {
        log::debug!("outline drift: {raw_shape:?} -> {shape:?}");
        extraction.diagnostics.warning_at(
            format!(
                "Outline changed during extraction: {} headings in source, {} after extraction",
                raw_shape.len(),
                shape.len()
            ),
            None,
        );
    }

    Ok(Structure {
        extraction,
        sections,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::UnknownComponentHandling;

    #[test]
    fn matching_outlines_have_no_diagnostics() {
        let structure =
            get_structure("# A\n\n<Note>\n  ## B\n</Note>", &ExtractOptions::default()).unwrap();
        assert!(structure.extraction.diagnostics.is_empty());
        assert_eq!(structure.sections[0].children[0].id, "b");
    }

    #[test]
    fn raw_and_extracted_titles_agree() {
        let source = "## Press <Kbd>Ctrl</Kbd> now\n\n### Value {1 + 1}";
        let raw = mdxtext_core::parse_mdast(source, &ParseOptions::mdx()).unwrap();
        let structure = get_structure(source, &ExtractOptions::default()).unwrap();
        assert_eq!(collect_sections(&raw), structure.sections);
        assert_eq!(structure.sections[0].id, "press-ctrl-now");
        assert_eq!(structure.sections[0].children[0].title, "Value");
    }

    #[test]
    fn dropped_headings_are_reported() {
        let options =
            ExtractOptions::default().with_unknown_component_handling(UnknownComponentHandling::Drop);
        let structure = get_structure("# A\n\n<Tabs>\n  ## Hidden\n</Tabs>", &options).unwrap();
        assert_eq!(structure.sections.len(), 1);
        assert!(structure.sections[0].children.is_empty());
        assert_eq!(structure.extraction.diagnostics.len(), 1);
    }

    #[test]
    fn serializes_flat() {
        let structure = get_structure("---\ntitle: T\n---\n# A", &ExtractOptions::default()).unwrap();
        let json = serde_json::to_value(&structure).unwrap();
        assert_eq!(json["content"], "A");
        assert_eq!(json["frontmatter"]["title"], "T");
        assert_eq!(json["sections"][0]["id"], "a");
        assert!(json.get("tree").is_none());
    }
}
