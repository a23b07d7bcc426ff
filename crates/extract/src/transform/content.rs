//! Node categories and small node helpers.

use crate::registry::is_media_tag;
use markdown::mdast::{Node, Paragraph, Text};

/// Whether `node` may appear in flow position (root, list item, blockquote).
pub fn is_block_content(node: &Node) -> bool {
    matches!(
        node,
        Node::Paragraph(_)
            | Node::Heading(_)
            | Node::ThematicBreak(_)
            | Node::Blockquote(_)
            | Node::List(_)
            | Node::Code(_)
            | Node::Table(_)
            | Node::Html(_)
            | Node::Definition(_)
            | Node::FootnoteDefinition(_)
            | Node::MdxJsxFlowElement(_)
            | Node::MdxFlowExpression(_)
            | Node::MdxjsEsm(_)
    )
}

/// Whether `node` may appear inside a paragraph or heading.
pub fn is_phrasing_content(node: &Node) -> bool {
    matches!(
        node,
        Node::Text(_)
            | Node::Emphasis(_)
            | Node::Strong(_)
            | Node::Delete(_)
            | Node::InlineCode(_)
            | Node::Break(_)
            | Node::Link(_)
            | Node::LinkReference(_)
            | Node::Image(_)
            | Node::ImageReference(_)
            | Node::FootnoteReference(_)
            | Node::Html(_)
            | Node::MdxJsxTextElement(_)
            | Node::MdxTextExpression(_)
    )
}

/// Visible text of phrasing content, without any markup.
///
/// JSX elements contribute their children's text; media elements, images and
/// expressions contribute nothing.
pub fn plain_text(nodes: &[Node]) -> String {
    let mut buffer = String::new();
    for node in nodes {
        push_plain_text(node, &mut buffer);
    }
    buffer
}

fn push_plain_text(node: &Node, buffer: &mut String) {
    match node {
        Node::Text(text) => buffer.push_str(&text.value),
        Node::InlineCode(code) => buffer.push_str(&code.value),
        Node::Break(_) => buffer.push(' '),
        Node::Strong(n) => n.children.iter().for_each(|c| push_plain_text(c, buffer)),
        Node::Emphasis(n) => n.children.iter().for_each(|c| push_plain_text(c, buffer)),
        Node::Delete(n) => n.children.iter().for_each(|c| push_plain_text(c, buffer)),
        Node::Link(n) => n.children.iter().for_each(|c| push_plain_text(c, buffer)),
        Node::LinkReference(n) => n.children.iter().for_each(|c| push_plain_text(c, buffer)),
        Node::Paragraph(n) => n.children.iter().for_each(|c| push_plain_text(c, buffer)),
        Node::MdxJsxTextElement(n) if !n.name.as_deref().is_some_and(is_media_tag) => {
            n.children.iter().for_each(|c| push_plain_text(c, buffer))
        }
        Node::MdxJsxFlowElement(n) if !n.name.as_deref().is_some_and(is_media_tag) => {
            n.children.iter().for_each(|c| push_plain_text(c, buffer))
        }
        _ => {}
    }
}

/// Whether phrasing content renders as nothing but whitespace.
pub fn is_blank(nodes: &[Node]) -> bool {
    nodes.iter().all(|node| match node {
        Node::Text(text) => text.value.trim().is_empty(),
        Node::Break(_) => true,
        _ => false,
    })
}

/// Collapses runs of whitespace into single spaces and trims.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub(crate) fn text(value: impl Into<String>) -> Node {
    Node::Text(Text {
        value: value.into(),
        position: None,
    })
}

pub(crate) fn paragraph(children: Vec<Node>) -> Node {
    Node::Paragraph(Paragraph {
        children,
        position: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use markdown::mdast::{InlineCode, Strong};

    #[test]
    fn plain_text_skips_markup() {
        let nodes = vec![
            text("Hello "),
            Node::Strong(Strong {
                children: vec![text("big")],
                position: None,
            }),
            text(" "),
            Node::InlineCode(InlineCode {
                value: "x()".into(),
                position: None,
            }),
        ];
        assert_eq!(plain_text(&nodes), "Hello big x()");
    }

    #[test]
    fn plain_text_keeps_jsx_children() {
        let tree = mdxtext_core::parse_mdast(
            "Press <Kbd>Ctrl</Kbd> now <video>fallback</video>{x}",
            &mdxtext_core::ParseOptions::mdx(),
        )
        .unwrap();
        let Node::Root(root) = tree else {
            panic!("expected root");
        };
        assert_eq!(plain_text(&root.children), "Press Ctrl now ");
    }

    #[test]
    fn categories_are_disjoint_except_html() {
        let para = paragraph(vec![text("a")]);
        assert!(is_block_content(&para));
        assert!(!is_phrasing_content(&para));
        assert!(is_phrasing_content(&text("a")));
        assert!(!is_block_content(&text("a")));
    }

    #[test]
    fn blank_detection() {
        assert!(is_blank(&[text("  "), text("\n")]));
        assert!(!is_blank(&[text(" a ")]));
        assert!(is_blank(&[]));
    }
}
