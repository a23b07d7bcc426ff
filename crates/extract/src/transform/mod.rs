//! Tree transformation.
//!
//! The transformer rebuilds the parsed tree without components, media,
//! ESM or expressions. Every node comes out in a position its category
//! allows: blocks under the root, list items and blockquotes, phrasing
//! content under paragraphs and headings.

/// Code fence meta parsing.
pub mod code_meta;
/// Node categories and helpers.
pub mod content;
/// Raw HTML flattening.
pub mod html;

use crate::options::{ExtractOptions, Format, UnknownComponentHandling};
use crate::registry::{
    HandlerContext, JsxElement, Placement, drop_component, is_media_tag, is_wrapper_tag,
    unwrap_component,
};
use code_meta::CodeMeta;
use content::{is_blank, is_block_content, is_phrasing_content, paragraph, text};
use markdown::mdast::{
    Blockquote, Code, Delete, Emphasis, Heading, Link, List, ListItem, MdxJsxFlowElement,
    MdxJsxTextElement, Node, Root, Strong, Table,
};
use markdown::unist::Position;
use mdxtext_core::{Diagnostic, Diagnostics, SourceLocation};
use std::cell::RefCell;

/// Rebuilds a tree according to [`ExtractOptions`].
///
/// Diagnostics are collected through a shared reference so handlers can
/// report them while the transformer is borrowed by their context.
pub(crate) struct Transformer<'a> {
    options: &'a ExtractOptions,
    diagnostics: RefCell<Diagnostics>,
    line_offset: usize,
}

impl<'a> Transformer<'a> {
    /// `line_offset` is added to reported lines (lines taken by frontmatter).
    pub(crate) fn new(options: &'a ExtractOptions, line_offset: usize) -> Self {
        Self {
            options,
            diagnostics: RefCell::new(Diagnostics::new()),
            line_offset,
        }
    }

    pub(crate) fn format(&self) -> Format {
        self.options.format
    }

    pub(crate) fn warn(&self, message: impl Into<String>, position: Option<&Position>) {
        let location = SourceLocation::of_position(position)
            .map(|loc| SourceLocation::new(loc.line + self.line_offset, loc.column));
        self.diagnostics
            .borrow_mut()
            .push(Diagnostic::warning(message, location));
    }

    pub(crate) fn into_diagnostics(self) -> Diagnostics {
        self.diagnostics.into_inner()
    }

    /// Transforms a whole document. Non-root input is treated as the only child.
    pub(crate) fn transform_root(&self, tree: &Node) -> Node {
        let (children, position) = match tree {
            Node::Root(root) => (self.blocks(&root.children), root.position.clone()),
            other => (self.blocks(std::slice::from_ref(other)), None),
        };
        Node::Root(Root { children, position })
    }

    /// Transforms flow content. Runs of phrasing nodes are wrapped in paragraphs.
    pub(crate) fn blocks(&self, nodes: &[Node]) -> Vec<Node> {
        let mut out = Vec::new();
        let mut run_start = None;
        for (index, node) in nodes.iter().enumerate() {
            if is_block_content(node) {
                if let Some(start) = run_start.take() {
                    self.push_phrasing_run(&nodes[start..index], &mut out);
                }
                out.extend(self.block(node));
            } else {
                run_start.get_or_insert(index);
            }
        }
        if let Some(start) = run_start {
            self.push_phrasing_run(&nodes[start..], &mut out);
        }
        out
    }

    /// Transforms phrasing content. Block nodes contribute their paragraphs' content.
    pub(crate) fn phrasing(&self, nodes: &[Node]) -> Vec<Node> {
        let mut out = Vec::new();
        for node in nodes {
            if is_phrasing_content(node) {
                out.extend(self.inline(node));
            } else {
                append_spliced(&mut out, into_phrasing(self.block(node)));
            }
        }
        merge_text(out)
    }

    fn push_phrasing_run(&self, run: &[Node], out: &mut Vec<Node>) {
        let children = trim_phrasing(self.phrasing(run));
        if !is_blank(&children) {
            out.push(paragraph(children));
        }
    }

    fn block(&self, node: &Node) -> Vec<Node> {
        match node {
            Node::Html(html) => html::html_to_paragraphs(&html.value)
                .into_iter()
                .map(|line| paragraph(vec![text(line)]))
                .collect(),
            Node::Paragraph(para) => {
                let children = trim_phrasing(self.phrasing(&para.children));
                if is_blank(&children) {
                    return Vec::new();
                }
                vec![Node::Paragraph(markdown::mdast::Paragraph {
                    children,
                    position: para.position.clone(),
                })]
            }
            Node::Heading(heading) => {
                let children = trim_phrasing(self.phrasing(&heading.children));
                if is_blank(&children) {
                    return Vec::new();
                }
                vec![Node::Heading(Heading {
                    children,
                    depth: heading.depth,
                    position: heading.position.clone(),
                })]
            }
            Node::ThematicBreak(_) => vec![node.clone()],
            Node::Blockquote(quote) => {
                let children = self.blocks(&quote.children);
                if children.is_empty() {
                    return Vec::new();
                }
                vec![Node::Blockquote(Blockquote {
                    children,
                    position: quote.position.clone(),
                })]
            }
            Node::List(list) => self.list(list),
            Node::ListItem(item) => self.list_item(item),
            Node::Code(code) => vec![self.code(code)],
            Node::Table(table) => self.table(table),
            Node::FootnoteDefinition(definition) => self.blocks(&definition.children),
            Node::MdxJsxFlowElement(element) => {
                self.component(flow_element(element), Placement::Block)
            }
            Node::Definition(_)
            | Node::MdxjsEsm(_)
            | Node::MdxFlowExpression(_) => Vec::new(),
            other => match other.children() {
                Some(children) => self.blocks(children),
                None => Vec::new(),
            },
        }
    }

    fn inline(&self, node: &Node) -> Vec<Node> {
        match node {
            Node::Text(_) | Node::InlineCode(_) | Node::Break(_) => {
                vec![node.clone()]
            }
            Node::Emphasis(emphasis) => self.wrap_phrasing(&emphasis.children, |children| {
                Node::Emphasis(Emphasis {
                    children,
                    position: emphasis.position.clone(),
                })
            }),
            Node::Strong(strong) => self.wrap_phrasing(&strong.children, |children| {
                Node::Strong(Strong {
                    children,
                    position: strong.position.clone(),
                })
            }),
            Node::Delete(delete) => self.wrap_phrasing(&delete.children, |children| {
                Node::Delete(Delete {
                    children,
                    position: delete.position.clone(),
                })
            }),
            Node::Link(link) => self.wrap_phrasing(&link.children, |children| {
                Node::Link(Link {
                    children: unlink(children),
                    url: link.url.clone(),
                    title: link.title.clone(),
                    position: link.position.clone(),
                })
            }),
            Node::LinkReference(reference) => self.phrasing(&reference.children),
            Node::Html(html) => {
                if html::is_line_break(&html.value) {
                    return vec![Node::Break(markdown::mdast::Break {
                        position: html.position.clone(),
                    })];
                }
                if html::is_single_tag(&html.value) {
                    return Vec::new();
                }
                let flattened = html::html_to_text(&html.value);
                if flattened.trim().is_empty() {
                    Vec::new()
                } else {
                    vec![text(flattened)]
                }
            }
            Node::MdxJsxTextElement(element) => {
                self.component(text_element(element), Placement::Phrasing)
            }
            Node::Image(_)
            | Node::ImageReference(_)
            | Node::FootnoteReference(_)
            | Node::MdxTextExpression(_) => Vec::new(),
            other => match other.children() {
                Some(children) => self.phrasing(children),
                None => Vec::new(),
            },
        }
    }

    /// Rebuilds a phrasing container, dropping it when nothing is left inside.
    fn wrap_phrasing(&self, children: &[Node], build: impl FnOnce(Vec<Node>) -> Node) -> Vec<Node> {
        let children = self.phrasing(children);
        if is_blank(&children) {
            return Vec::new();
        }
        vec![build(children)]
    }

    fn list(&self, list: &List) -> Vec<Node> {
        let children: Vec<Node> = list
            .children
            .iter()
            .flat_map(|child| match child {
                Node::ListItem(item) => self.list_item(item),
                other => self.block(other),
            })
            .collect();
        if children.is_empty() {
            return Vec::new();
        }
        vec![Node::List(List {
            children,
            ordered: list.ordered,
            start: list.start,
            spread: list.spread,
            position: list.position.clone(),
        })]
    }

    fn list_item(&self, item: &ListItem) -> Vec<Node> {
        let children = self.blocks(&item.children);
        if children.is_empty() {
            return Vec::new();
        }
        vec![Node::ListItem(ListItem {
            children,
            checked: item.checked,
            spread: item.spread,
            position: item.position.clone(),
        })]
    }

    fn code(&self, code: &Code) -> Node {
        let meta = code
            .meta
            .as_deref()
            .map(str::trim)
            .filter(|meta| !meta.is_empty())
            .map(|raw| {
                let (meta, malformed) = CodeMeta::parse(raw);
                for token in malformed {
                    self.warn(
                        format!("Unrecognized code meta token `{token}`"),
                        code.position.as_ref(),
                    );
                }
                meta.to_string()
            })
            .filter(|meta| !meta.is_empty());

        Node::Code(Code {
            value: code.value.clone(),
            lang: code.lang.clone(),
            meta,
            position: code.position.clone(),
        })
    }

    /// One paragraph per row, cells joined with `" | "`.
    fn table(&self, table: &Table) -> Vec<Node> {
        table
            .children
            .iter()
            .filter_map(|row| {
                let cells: Vec<Vec<Node>> = row
                    .children()?
                    .iter()
                    .map(|cell| match cell.children() {
                        Some(children) => trim_phrasing(self.phrasing(children)),
                        None => Vec::new(),
                    })
                    .collect();
                if cells.iter().all(|cell| is_blank(cell)) {
                    return None;
                }
                let mut children = Vec::new();
                for (index, cell) in cells.into_iter().enumerate() {
                    if index > 0 {
                        children.push(text(" | "));
                    }
                    children.extend(cell);
                }
                Some(paragraph(children))
            })
            .collect()
    }

    fn component(&self, element: JsxElement<'_>, placement: Placement) -> Vec<Node> {
        if let Some(name) = element.name
            && is_media_tag(name)
        {
            log::debug!("dropping media element <{name}>");
            return Vec::new();
        }

        let ctx = HandlerContext::new(element, placement, self);
        let output = match element.name {
            None => unwrap_component(&ctx),
            Some(name) => match self.options.component_handlers.get(name) {
                Some(handler) => handler.handle(&ctx),
                None if is_wrapper_tag(name) => unwrap_component(&ctx),
                None => match self.options.unknown_component_handling {
                    UnknownComponentHandling::Unwrap => unwrap_component(&ctx),
                    UnknownComponentHandling::Drop => drop_component(&ctx),
                },
            },
        };

        match placement {
            Placement::Block => into_blocks(output),
            Placement::Phrasing => into_phrasing(output),
        }
    }
}

fn flow_element(element: &MdxJsxFlowElement) -> JsxElement<'_> {
    JsxElement {
        name: element.name.as_deref(),
        attributes: &element.attributes,
        children: &element.children,
        position: element.position.as_ref(),
    }
}

fn text_element(element: &MdxJsxTextElement) -> JsxElement<'_> {
    JsxElement {
        name: element.name.as_deref(),
        attributes: &element.attributes,
        children: &element.children,
        position: element.position.as_ref(),
    }
}

/// Category guard for handler output in block position.
fn into_blocks(nodes: Vec<Node>) -> Vec<Node> {
    let mut out = Vec::new();
    let mut run = Vec::new();
    for node in nodes {
        if is_block_content(&node) {
            flush_run(&mut run, &mut out);
            out.push(node);
        } else if is_phrasing_content(&node) {
            run.push(node);
        }
    }
    flush_run(&mut run, &mut out);
    out
}

fn flush_run(run: &mut Vec<Node>, out: &mut Vec<Node>) {
    let children = trim_phrasing(std::mem::take(run));
    if !is_blank(&children) {
        out.push(paragraph(children));
    }
}

/// Category guard for handler output in phrasing position.
fn into_phrasing(nodes: Vec<Node>) -> Vec<Node> {
    let mut out = Vec::new();
    for node in nodes {
        match node {
            Node::Paragraph(para) => append_spliced(&mut out, para.children),
            node if is_phrasing_content(&node) => out.push(node),
            _ => {}
        }
    }
    out
}

/// Joins adjacent text nodes.
///
/// Whitespace on both sides of a dropped node collapses into the left run.
fn merge_text(nodes: Vec<Node>) -> Vec<Node> {
    let mut out: Vec<Node> = Vec::with_capacity(nodes.len());
    for node in nodes {
        if let Node::Text(next) = &node
            && let Some(Node::Text(prev)) = out.last_mut()
        {
            let value = if prev.value.ends_with(char::is_whitespace) {
                next.value.trim_start()
            } else {
                next.value.as_str()
            };
            prev.value.push_str(value);
            prev.position = None;
            continue;
        }
        out.push(node);
    }
    out
}

/// Replaces links nested in link text (GFM autolinks) with their text.
fn unlink(nodes: Vec<Node>) -> Vec<Node> {
    nodes
        .into_iter()
        .flat_map(|node| match node {
            Node::Link(link) => unlink(link.children),
            Node::Emphasis(mut n) => {
                n.children = unlink(n.children);
                vec![Node::Emphasis(n)]
            }
            Node::Strong(mut n) => {
                n.children = unlink(n.children);
                vec![Node::Strong(n)]
            }
            Node::Delete(mut n) => {
                n.children = unlink(n.children);
                vec![Node::Delete(n)]
            }
            other => vec![other],
        })
        .collect()
}

/// Appends spliced paragraph content, keeping it apart from what precedes it.
fn append_spliced(out: &mut Vec<Node>, spliced: Vec<Node>) {
    if spliced.is_empty() {
        return;
    }
    if !out.is_empty() {
        out.push(text(" "));
    }
    out.extend(spliced);
}

/// Strips whitespace at both ends of phrasing content.
fn trim_phrasing(mut nodes: Vec<Node>) -> Vec<Node> {
    loop {
        let Some(Node::Text(first)) = nodes.first_mut() else {
            break;
        };
        let trimmed = first.value.trim_start().to_string();
        if trimmed.is_empty() {
            nodes.remove(0);
        } else {
            first.value = trimmed;
            break;
        }
    }
    loop {
        let Some(Node::Text(last)) = nodes.last_mut() else {
            break;
        };
        let trimmed = last.value.trim_end().to_string();
        if trimmed.is_empty() {
            nodes.pop();
        } else {
            last.value = trimmed;
            break;
        }
    }
    nodes
}

#[cfg(test)]
mod tests {
    use super::*;
    use mdxtext_core::{ParseOptions, parse_mdast};

    fn transform(source: &str, options: &ExtractOptions) -> (Node, Diagnostics) {
        let tree = parse_mdast(source, &ParseOptions::for_syntax(options.syntax)).unwrap();
        let transformer = Transformer::new(options, 0);
        let root = transformer.transform_root(&tree);
        (root, transformer.into_diagnostics())
    }

    fn paragraph_text(node: &Node) -> String {
        match node {
            Node::Paragraph(para) => content::plain_text(&para.children),
            other => panic!("expected paragraph, got {other:?}"),
        }
    }

    fn root_children(node: &Node) -> &[Node] {
        match node {
            Node::Root(root) => &root.children,
            other => panic!("expected root, got {other:?}"),
        }
    }

    #[test]
    fn drops_esm_and_expressions() {
        let (root, _) = transform(
            "import X from './x'\n\n{1 + 1}\n\nHello {name}",
            &ExtractOptions::default(),
        );
        let children = root_children(&root);
        assert_eq!(children.len(), 1);
        assert_eq!(paragraph_text(&children[0]), "Hello");
    }

    #[test]
    fn image_only_paragraph_disappears() {
        let (root, _) = transform("![alt](a.png)\n\n<img src=\"b.png\" />", &ExtractOptions::default());
        assert!(root_children(&root).is_empty());
    }

    #[test]
    fn flow_component_keeps_block_children() {
        let (root, _) = transform(
            "<Note>\n  Inside\n\n  - item\n</Note>",
            &ExtractOptions::default(),
        );
        let children = root_children(&root);
        assert!(matches!(children[0], Node::Paragraph(_)));
        assert!(matches!(children[1], Node::List(_)));
    }

    #[test]
    fn inline_component_is_spliced() {
        let (root, _) = transform("Press <Kbd>Ctrl</Kbd> now", &ExtractOptions::default());
        assert_eq!(paragraph_text(&root_children(&root)[0]), "Press Ctrl now");
    }

    #[test]
    fn inline_html_tags_leave_only_text() {
        let options = ExtractOptions::default().with_syntax(mdxtext_core::Syntax::Md);
        let (root, _) = transform(
            "a <span>b</span> c <kbd>Ctrl</kbd> and <a href=\"https://x.dev\">docs</a>.",
            &options,
        );
        assert_eq!(paragraph_text(&root_children(&root)[0]), "a b c Ctrl and docs.");

        let (root, _) = transform("x <img src=a.png> y", &options);
        assert_eq!(paragraph_text(&root_children(&root)[0]), "x y");
    }

    #[test]
    fn links_inside_link_text_are_flattened() {
        let (root, _) = transform("[https://a.dev](https://a.dev)", &ExtractOptions::default());
        let Node::Paragraph(para) = &root_children(&root)[0] else {
            panic!("expected paragraph");
        };
        let [Node::Link(link)] = &para.children[..] else {
            panic!("expected a single link, got {:?}", para.children);
        };
        assert!(matches!(&link.children[..], [Node::Text(t)] if t.value == "https://a.dev"));
    }

    #[test]
    fn unknown_components_can_be_dropped() {
        let options =
            ExtractOptions::default().with_unknown_component_handling(UnknownComponentHandling::Drop);
        let (root, _) = transform("<Tabs>\n  Hidden\n</Tabs>\n\n<div>\n  Shown\n</div>", &options);
        let children = root_children(&root);
        assert_eq!(children.len(), 1);
        assert_eq!(paragraph_text(&children[0]), "Shown");
    }

    #[test]
    fn media_tags_ignore_handlers() {
        let options =
            ExtractOptions::default().with_handler("video", |_: &HandlerContext<'_>| vec![text("x")]);
        let (root, _) = transform("<video src=\"a.mp4\" />", &options);
        assert!(root_children(&root).is_empty());
    }

    #[test]
    fn handler_output_is_guarded_by_category() {
        let options = ExtractOptions::default().with_handler("Badge", |_: &HandlerContext<'_>| {
            vec![
                Node::ThematicBreak(markdown::mdast::ThematicBreak { position: None }),
                text("new"),
            ]
        });
        let (root, _) = transform("Status <Badge />", &options);
        assert_eq!(paragraph_text(&root_children(&root)[0]), "Status new");

        let (root, _) = transform("<Badge />", &options);
        let children = root_children(&root);
        assert!(matches!(children[0], Node::ThematicBreak(_)));
        assert_eq!(paragraph_text(&children[1]), "new");
    }

    #[test]
    fn malformed_meta_is_reported_at_the_code_node() {
        let (root, diagnostics) = transform(
            "Intro\n\n```js {1,3} title=\"a.js\"\nlet a;\n```",
            &ExtractOptions::default(),
        );
        let Node::Code(code) = &root_children(&root)[1] else {
            panic!("expected code");
        };
        assert_eq!(code.meta.as_deref(), Some("title=\"a.js\" {1,3}"));
        assert_eq!(diagnostics.len(), 1);
        let diagnostic = diagnostics.iter().next().unwrap();
        assert_eq!(diagnostic.location, Some(SourceLocation::new(3, 1)));
        assert!(!diagnostic.fatal);
    }

    #[test]
    fn empty_lists_and_quotes_are_dropped() {
        let (root, _) = transform("- ![a](a.png)\n- <Video />\n\n> ![b](b.png)", &ExtractOptions::default());
        assert!(root_children(&root).is_empty());
    }

    #[test]
    fn tables_become_row_paragraphs() {
        let (root, _) = transform(
            "| a | b |\n| - | - |\n|   |   |\n| 1 | **2** |",
            &ExtractOptions::default(),
        );
        let children = root_children(&root);
        assert_eq!(children.len(), 2);
        assert_eq!(paragraph_text(&children[0]), "a | b");
        assert_eq!(paragraph_text(&children[1]), "1 | 2");
    }
}
