#![deny(missing_docs)]
//! mdxtext core: parsing, frontmatter, slugs, diagnostics and streaming repair.

/// Core error and diagnostic types.
pub mod error;
/// YAML frontmatter splitting.
pub mod frontmatter;
/// Repair of incomplete streaming Markdown.
pub mod heal;
/// Markdown parsing utilities.
pub mod parse;
/// Slug generation utilities.
pub mod slug;

pub use error::{Diagnostic, Diagnostics, MdxTextError, SourceLocation};
pub use frontmatter::{FrontmatterError, FrontmatterSplit, split_frontmatter};
pub use heal::{
    DEFAULT_WINDOW_SIZE, HealOptions, INCOMPLETE_LINK_URL, heal, heal_default, heal_with_options,
};
pub use parse::{MarkdownParser, ParseOptions, Syntax, parse_mdast, parse_mdast_with_options};
pub use slug::{Slugger, slugify};
