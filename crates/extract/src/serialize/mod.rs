//! Serialization of transformed trees to plain text or Markdown.
//!
//! Serialization never fails and never looks outside the tree: the same tree
//! always gives the same string.

use crate::options::Format;
use markdown::mdast::{Code, Link, List, ListItem, Node};
use std::borrow::Cow;

/// Serializes transformed trees.
#[derive(Debug, Clone, Copy)]
pub struct Serializer {
    format: Format,
}

/// Serializes `tree` with a one-off [`Serializer`].
pub fn serialize(tree: &Node, format: Format) -> String {
    Serializer::new(format).serialize(tree)
}

impl Serializer {
    /// Creates a serializer for the given format.
    pub fn new(format: Format) -> Self {
        Self { format }
    }

    /// Serializes a root (or a single block), top-level blocks separated by a blank line.
    pub fn serialize(&self, tree: &Node) -> String {
        let blocks = match tree {
            Node::Root(root) => &root.children[..],
            other => std::slice::from_ref(other),
        };
        let mut out = self.blocks(blocks, "\n\n");
        out.truncate(out.trim_end().len());
        out
    }

    fn markdown(&self) -> bool {
        self.format == Format::Markdown
    }

    fn blocks(&self, nodes: &[Node], separator: &str) -> String {
        nodes
            .iter()
            .map(|node| self.block(node))
            .filter(|block| !block.is_empty())
            .collect::<Vec<_>>()
            .join(separator)
    }

    fn block(&self, node: &Node) -> String {
        match node {
            Node::Paragraph(para) => {
                let text = self.phrasing(&para.children);
                if self.markdown() {
                    escape_line_starts(&text)
                } else {
                    text
                }
            }
            Node::Heading(heading) => {
                let text = self.phrasing(&heading.children);
                if self.markdown() {
                    format!("{} {}", "#".repeat(heading.depth.into()), text.replace('\n', " "))
                } else {
                    text
                }
            }
            Node::ThematicBreak(_) => {
                if self.markdown() {
                    "---".to_string()
                } else {
                    String::new()
                }
            }
            Node::Blockquote(quote) => {
                let inner = self.blocks(&quote.children, "\n\n");
                if self.markdown() {
                    prefix_lines(&inner, "> ", ">")
                } else {
                    inner
                }
            }
            Node::List(list) => self.list(list),
            Node::ListItem(item) => self.blocks(&item.children, "\n"),
            Node::Code(code) => self.code(code),
            Node::Html(html) => html.value.clone(),
            node if crate::transform::content::is_phrasing_content(node) => {
                self.phrasing(std::slice::from_ref(node))
            }
            other => {
                log::warn!("cannot serialize block node: {}", node_kind(other));
                String::new()
            }
        }
    }

    fn list(&self, list: &List) -> String {
        let separator = if list.spread { "\n\n" } else { "\n" };
        let start = list.start.unwrap_or(1);
        list.children
            .iter()
            .enumerate()
            .map(|(index, child)| match child {
                Node::ListItem(item) => {
                    let marker = if !self.markdown() {
                        String::new()
                    } else if list.ordered {
                        format!("{}.", start.saturating_add(index as u32))
                    } else {
                        "-".to_string()
                    };
                    self.list_item(item, &marker)
                }
                other => self.block(other),
            })
            .filter(|item| !item.is_empty())
            .collect::<Vec<_>>()
            .join(separator)
    }

    fn list_item(&self, item: &ListItem, marker: &str) -> String {
        let separator = if item.spread { "\n\n" } else { "\n" };
        let body = self.blocks(&item.children, separator);
        if !self.markdown() {
            return indent_continuation(&body, "", "  ");
        }

        let checkbox = match item.checked {
            Some(true) => "[x] ",
            Some(false) => "[ ] ",
            None => "",
        };
        let first = format!("{marker} {checkbox}");
        let rest = " ".repeat(marker.len() + 1);
        if body.is_empty() {
            return first.trim_end().to_string();
        }
        indent_continuation(&body, &first, &rest)
    }

    fn code(&self, code: &Code) -> String {
        if !self.markdown() {
            return code.value.clone();
        }
        let fence = "`".repeat(longest_run(&code.value, '`').max(2) + 1);
        let mut info = code.lang.clone().unwrap_or_default();
        if let Some(meta) = code.meta.as_deref().filter(|meta| !meta.is_empty()) {
            if !info.is_empty() {
                info.push(' ');
            }
            info.push_str(meta);
        }
        if code.value.is_empty() {
            format!("{fence}{info}\n{fence}")
        } else {
            format!("{fence}{info}\n{}\n{fence}", code.value)
        }
    }

    fn phrasing(&self, nodes: &[Node]) -> String {
        let mut out = String::new();
        for node in nodes {
            self.inline(node, &mut out);
        }
        out
    }

    fn inline(&self, node: &Node, out: &mut String) {
        let markdown = self.markdown();
        match node {
            Node::Text(text) => {
                if markdown {
                    out.push_str(&escape_text(&text.value));
                } else {
                    out.push_str(&text.value);
                }
            }
            Node::Emphasis(n) => self.delimited(&n.children, "*", out),
            Node::Strong(n) => self.delimited(&n.children, "**", out),
            Node::Delete(n) => self.delimited(&n.children, "~~", out),
            Node::InlineCode(code) => {
                if markdown {
                    out.push_str(&inline_code(&code.value));
                } else {
                    out.push_str(&code.value);
                }
            }
            Node::Break(_) => out.push_str(if markdown { "\\\n" } else { "\n" }),
            Node::Link(link) => self.link(link, out),
            Node::Html(html) => out.push_str(&html.value),
            Node::Paragraph(para) => out.push_str(&self.phrasing(&para.children)),
            other => log::warn!("cannot serialize phrasing node: {}", node_kind(other)),
        }
    }

    fn delimited(&self, children: &[Node], marker: &str, out: &mut String) {
        let inner = self.phrasing(children);
        if self.markdown() {
            out.push_str(marker);
            out.push_str(&inner);
            out.push_str(marker);
        } else {
            out.push_str(&inner);
        }
    }

    fn link(&self, link: &Link, out: &mut String) {
        let text = self.phrasing(&link.children);
        if !self.markdown() {
            out.push_str(&text);
            if !link.url.is_empty() && !text.contains(link.url.as_str()) {
                out.push_str(" (");
                out.push_str(&link.url);
                out.push(')');
            }
            return;
        }

        out.push('[');
        out.push_str(&text);
        out.push_str("](");
        if link.url.is_empty() || link.url.contains([' ', '(', ')', '<', '>']) {
            out.push('<');
            out.push_str(&link.url.replace('<', "\\<").replace('>', "\\>"));
            out.push('>');
        } else {
            out.push_str(&link.url);
        }
        if let Some(title) = &link.title {
            out.push_str(" \"");
            out.push_str(&title.replace('"', "\\\""));
            out.push('"');
        }
        out.push(')');
    }
}

fn node_kind(node: &Node) -> &'static str {
    match node {
        Node::MdxJsxFlowElement(_) | Node::MdxJsxTextElement(_) => "mdx jsx element",
        Node::MdxFlowExpression(_) | Node::MdxTextExpression(_) => "mdx expression",
        Node::MdxjsEsm(_) => "esm",
        Node::Image(_) | Node::ImageReference(_) => "image",
        Node::Definition(_) => "definition",
        Node::FootnoteDefinition(_) | Node::FootnoteReference(_) => "footnote",
        Node::Table(_) => "table",
        _ => "node",
    }
}

fn longest_run(value: &str, marker: char) -> usize {
    let mut longest = 0;
    let mut current = 0;
    for ch in value.chars() {
        if ch == marker {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    longest
}

fn inline_code(value: &str) -> String {
    let fence = "`".repeat(longest_run(value, '`') + 1);
    let pad = value.starts_with('`')
        || value.ends_with('`')
        || (value.len() > 1 && value.starts_with(' ') && value.ends_with(' ') && !value.trim().is_empty());
    if pad {
        format!("{fence} {value} {fence}")
    } else {
        format!("{fence}{value}{fence}")
    }
}

/// Escapes characters that would otherwise start Markdown or MDX syntax.
fn escape_text(value: &str) -> Cow<'_, str> {
    let needs_escape = |index: usize, ch: char| match ch {
        '\\' | '*' | '`' | '[' | ']' | '<' | '{' | '}' | '~' => true,
        '_' => {
            let before = value[..index].chars().next_back();
            let after = value[index + 1..].chars().next();
            !(before.is_some_and(char::is_alphanumeric) && after.is_some_and(char::is_alphanumeric))
        }
        '&' => {
            let rest = &value[index + 1..];
            let name_len = rest
                .find(|c: char| !(c.is_ascii_alphanumeric() || c == '#'))
                .unwrap_or(rest.len());
            name_len > 0 && rest[name_len..].starts_with(';')
        }
        _ => false,
    };

    if !value.char_indices().any(|(index, ch)| needs_escape(index, ch)) {
        return Cow::Borrowed(value);
    }
    let mut out = String::with_capacity(value.len() + 8);
    for (index, ch) in value.char_indices() {
        if needs_escape(index, ch) {
            out.push('\\');
        }
        out.push(ch);
    }
    Cow::Owned(out)
}

/// Escapes line starts that would be read as a block construct.
fn escape_line_starts(text: &str) -> String {
    text.split('\n')
        .map(|line| {
            let trimmed = line.trim_start();
            let indent = &line[..line.len() - trimmed.len()];
            match block_marker_offset(trimmed) {
                Some(offset) => format!(
                    "{indent}{}\\{}",
                    &trimmed[..offset],
                    &trimmed[offset..]
                ),
                None => line.to_string(),
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Offset of the punctuation that makes `line` start a block, if any.
fn block_marker_offset(line: &str) -> Option<usize> {
    let mut chars = line.chars();
    let first = chars.next()?;
    match first {
        '#' | '>' => Some(0),
        '-' | '+' | '*' => {
            let rest = chars.as_str();
            let marker = rest.is_empty()
                || rest.starts_with([' ', '\t'])
                || line.chars().all(|c| c == first || c == ' ');
            marker.then_some(0)
        }
        '=' => line.chars().all(|c| c == '=' || c == ' ').then_some(0),
        '0'..='9' => {
            let digits = line.chars().take_while(char::is_ascii_digit).count();
            let rest = &line[digits..];
            let marker = digits <= 9
                && (rest.starts_with(". ") || rest.starts_with(") ") || rest == "." || rest == ")");
            marker.then_some(digits)
        }
        _ => None,
    }
}

/// Prefixes every line, using `empty` for blank lines.
fn prefix_lines(text: &str, prefix: &str, empty: &str) -> String {
    text.split('\n')
        .map(|line| {
            if line.is_empty() {
                empty.to_string()
            } else {
                format!("{prefix}{line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Prefixes the first line with `first` and non-blank later lines with `rest`.
fn indent_continuation(text: &str, first: &str, rest: &str) -> String {
    text.split('\n')
        .enumerate()
        .map(|(index, line)| {
            if index == 0 {
                format!("{first}{line}")
            } else if line.is_empty() {
                String::new()
            } else {
                format!("{rest}{line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
