//! Markdown parsing utilities.
//!
//! Parsing is delegated to markdown-rs. The rest of the workspace only sees
//! the resulting mdast tree, through [`MarkdownParser`].

use crate::{MdxTextError, SourceLocation};
use markdown::mdast::Node;
use markdown::message::{Message, Place};
use serde::{Deserialize, Serialize};

/// Source dialect of a document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Syntax {
    /// Plain Markdown; raw HTML is parsed as HTML nodes.
    Md,
    /// MDX; JSX, ESM and `{expressions}` are parsed as MDX nodes.
    #[default]
    Mdx,
}

/// Parser options for building markdown-rs parse options.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParseOptions {
    /// Enable MDX constructs (JSX, ESM, expressions).
    pub mdx: bool,
    /// Enable GitHub Flavored Markdown constructs.
    pub gfm: bool,
    /// Allow raw HTML nodes in the AST.
    pub raw_html: bool,
}

impl ParseOptions {
    /// Markdown defaults: GFM plus raw HTML.
    pub const fn markdown() -> Self {
        Self {
            mdx: false,
            gfm: true,
            raw_html: true,
        }
    }

    /// MDX defaults: GFM plus JSX/ESM/expressions.
    pub const fn mdx() -> Self {
        Self {
            mdx: true,
            gfm: true,
            raw_html: false,
        }
    }

    /// Defaults for the given dialect.
    pub const fn for_syntax(syntax: Syntax) -> Self {
        match syntax {
            Syntax::Md => Self::markdown(),
            Syntax::Mdx => Self::mdx(),
        }
    }

    /// Convert to markdown-rs `ParseOptions`.
    pub fn to_markdown(self) -> markdown::ParseOptions {
        let mut constructs = markdown::Constructs {
            html_flow: self.raw_html,
            html_text: self.raw_html,
            ..Default::default()
        };

        if self.gfm {
            constructs.gfm_autolink_literal = true;
            constructs.gfm_footnote_definition = true;
            constructs.gfm_label_start_footnote = true;
            constructs.gfm_strikethrough = true;
            constructs.gfm_table = true;
            constructs.gfm_task_list_item = true;
        }

        if self.mdx {
            // MDX has no indented code and treats `<` as JSX.
            constructs.code_indented = false;
            constructs.html_flow = false;
            constructs.html_text = false;
            constructs.autolink = false;
            constructs.mdx_esm = true;
            constructs.mdx_expression_flow = true;
            constructs.mdx_expression_text = true;
            constructs.mdx_jsx_flow = true;
            constructs.mdx_jsx_text = true;
        }

        markdown::ParseOptions {
            constructs,
            // markdown-rs only recognizes ESM when a parser is installed
            mdx_esm_parse: self
                .mdx
                .then(|| Box::new(accept_esm) as Box<markdown::MdxEsmParse>),
            ..markdown::ParseOptions::default()
        }
    }
}

/// Accepts every ESM block; its content is dropped, never evaluated.
fn accept_esm(_source: &str) -> markdown::MdxSignal {
    markdown::MdxSignal::Ok
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self::mdx()
    }
}

/// A stage that turns source text into an mdast tree.
pub trait MarkdownParser {
    /// Parse `input` into a root node.
    fn parse(&self, input: &str) -> Result<Node, MdxTextError>;
}

impl MarkdownParser for ParseOptions {
    fn parse(&self, input: &str) -> Result<Node, MdxTextError> {
        parse_mdast(input, self)
    }
}

impl<F> MarkdownParser for F
where
    F: Fn(&str) -> Result<Node, MdxTextError>,
{
    fn parse(&self, input: &str) -> Result<Node, MdxTextError> {
        (self)(input)
    }
}

/// Parse markdown into an MDAST tree using core options.
pub fn parse_mdast(input: &str, options: &ParseOptions) -> Result<Node, MdxTextError> {
    parse_mdast_with_options(input, &options.to_markdown())
}

/// Parse markdown into an MDAST tree using markdown-rs `ParseOptions`.
pub fn parse_mdast_with_options(
    input: &str,
    options: &markdown::ParseOptions,
) -> Result<Node, MdxTextError> {
    markdown::to_mdast(input, options).map_err(|err| MdxTextError::Parse {
        message: err.to_string(),
        location: message_location(&err),
    })
}

fn message_location(message: &Message) -> SourceLocation {
    match &message.place {
        Some(place) => match place.as_ref() {
            Place::Point(point) => SourceLocation::new(point.line, point.column),
            Place::Position(position) => {
                SourceLocation::new(position.start.line, position.start.column)
            }
        },
        None => SourceLocation::new(1, 1),
    }
}
