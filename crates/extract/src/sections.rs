//! Heading outline collection.

use crate::transform::content::{collapse_whitespace, plain_text};
use markdown::mdast::{Heading, Node};
use mdxtext_core::Slugger;
use serde::Serialize;

/// A heading and the headings nested under it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Section {
    /// Slug, unique within the document.
    pub id: String,
    /// Heading text without markup.
    pub title: String,
    /// Heading depth, 1 to 6.
    pub depth: u8,
    /// Sections under this heading.
    pub children: Vec<Section>,
}

/// Builds the heading outline of a document.
///
/// Headings are visited in document order, including headings nested in
/// blockquotes, lists or components. A heading becomes a child of the most
/// recent heading with a smaller depth.
///
/// ```
/// use mdxtext_core::{ParseOptions, parse_mdast};
/// use mdxtext_extract::collect_sections;
///
/// let tree = parse_mdast("# A\n\n## B\n\n# A", &ParseOptions::mdx()).unwrap();
/// let sections = collect_sections(&tree);
/// assert_eq!(sections.len(), 2);
/// assert_eq!(sections[0].children[0].id, "b");
/// assert_eq!(sections[1].id, "a-2");
/// ```
pub fn collect_sections(tree: &Node) -> Vec<Section> {
    let mut headings = Vec::new();
    collect_headings(tree, &mut headings);

    let mut slugger = Slugger::new();
    let mut builder = OutlineBuilder::default();
    for heading in headings {
        let title = collapse_whitespace(&plain_text(&heading.children));
        builder.push(Section {
            id: slugger.next_slug(&title),
            title,
            depth: heading.depth,
            children: Vec::new(),
        });
    }
    builder.finish()
}

fn collect_headings<'a>(node: &'a Node, headings: &mut Vec<&'a Heading>) {
    if let Node::Heading(heading) = node {
        headings.push(heading);
        return;
    }
    if let Some(children) = node.children() {
        for child in children {
            collect_headings(child, headings);
        }
    }
}

#[derive(Default)]
struct OutlineBuilder {
    roots: Vec<Section>,
    open: Vec<Section>,
}

impl OutlineBuilder {
    fn push(&mut self, section: Section) {
        while self
            .open
            .last()
            .is_some_and(|last| last.depth >= section.depth)
        {
            self.close_last();
        }
        self.open.push(section);
    }

    fn close_last(&mut self) {
        let Some(section) = self.open.pop() else {
            return;
        };
        match self.open.last_mut() {
            Some(parent) => parent.children.push(section),
            None => self.roots.push(section),
        }
    }

    fn finish(mut self) -> Vec<Section> {
        while !self.open.is_empty() {
            self.close_last();
        }
        self.roots
    }
}

/// Shape of an outline: depths and nesting, without titles or ids.
pub(crate) fn outline_shape(sections: &[Section]) -> Vec<(u8, usize)> {
    fn walk(sections: &[Section], level: usize, out: &mut Vec<(u8, usize)>) {
        for section in sections {
            out.push((section.depth, level));
            walk(&section.children, level + 1, out);
        }
    }
    let mut out = Vec::new();
    walk(sections, 0, &mut out);
    out
}
