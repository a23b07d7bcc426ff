//! Built-in handlers and tag sets.
//!
//! Documentation components such as `<Note>` or `<Card>` only decorate their
//! content, so the default registry unwraps them. Media tags never contribute
//! text, and plain HTML wrappers are unwrapped even without a handler.

use super::types::{HandlerContext, HandlerRegistry, Placement};
use markdown::mdast::{Node, Paragraph};
use once_cell::sync::Lazy;
use std::collections::HashSet;

/// Components unwrapped by [`HandlerRegistry::with_defaults`].
pub const DEFAULT_UNWRAPPED_COMPONENTS: &[&str] = &["Note", "Command", "Card", "Row", "Preview"];

static MEDIA_TAGS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "img", "video", "iframe", "audio", "embed", "picture", "source", "track", "object",
    ]
    .into_iter()
    .collect()
});

static WRAPPER_TAGS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "div", "span", "section", "article", "main", "header", "footer", "aside", "nav",
        "figure", "figcaption", "p", "strong", "em", "b", "i", "u", "small", "sup", "sub",
        "mark", "kbd", "abbr", "code", "details", "summary", "blockquote", "ul", "ol", "li",
        "table", "thead", "tbody", "tr", "td", "th",
    ]
    .into_iter()
    .collect()
});

/// Tags that are always dropped, handler or not.
pub fn is_media_tag(name: &str) -> bool {
    MEDIA_TAGS.contains(name)
}

/// HTML wrapper tags that are unwrapped without a handler.
pub fn is_wrapper_tag(name: &str) -> bool {
    WRAPPER_TAGS.contains(name)
}

/// Discards the element and keeps its transformed children.
///
/// Phrasing elements keep their children as a single paragraph, block
/// elements keep theirs as block content.
pub fn unwrap_component(ctx: &HandlerContext<'_>) -> Vec<Node> {
    match ctx.placement {
        Placement::Phrasing => {
            let children = ctx.transform_children();
            if children.is_empty() {
                return Vec::new();
            }
            vec![Node::Paragraph(Paragraph {
                children,
                position: None,
            })]
        }
        Placement::Block => ctx.transform_children_blocks(),
    }
}

/// Discards the element together with its children.
pub fn drop_component(ctx: &HandlerContext<'_>) -> Vec<Node> {
    log::debug!(
        "dropping component <{}>",
        ctx.element.name.unwrap_or_default()
    );
    Vec::new()
}

impl HandlerRegistry {
    /// Registry with the documentation components unwrapped.
    ///
    /// ```
    /// use mdxtext_extract::HandlerRegistry;
    ///
    /// let registry = HandlerRegistry::with_defaults();
    /// assert!(registry.contains("Note"));
    /// assert!(!registry.contains("Tabs"));
    /// ```
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        for name in DEFAULT_UNWRAPPED_COMPONENTS {
            registry.register(*name, unwrap_component);
        }
        registry
    }
}
