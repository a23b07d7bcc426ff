//! Handler registry types.

use crate::options::Format;
use crate::transform::Transformer;
use markdown::mdast::{AttributeContent, AttributeValue, Node};
use markdown::unist::Position;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Where a component appeared in its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Flow position: direct child of the root, a list item, a blockquote, …
    Block,
    /// Phrasing position: inside a paragraph or heading.
    Phrasing,
}

/// Borrowed view of an MDX JSX element (flow or text).
#[derive(Debug, Clone, Copy)]
pub struct JsxElement<'a> {
    /// Tag name, `None` for fragments.
    pub name: Option<&'a str>,
    /// Attributes in source order.
    pub attributes: &'a [AttributeContent],
    /// Untransformed children.
    pub children: &'a [Node],
    /// Source position.
    pub position: Option<&'a Position>,
}

impl<'a> JsxElement<'a> {
    /// Returns the literal value of an attribute.
    ///
    /// Expression attributes yield their source text; boolean attributes yield `""`.
    pub fn attribute(&self, name: &str) -> Option<&'a str> {
        self.attributes.iter().find_map(|attr| match attr {
            AttributeContent::Property(prop) if prop.name == name => match &prop.value {
                Some(AttributeValue::Literal(value)) => Some(value.as_str()),
                Some(AttributeValue::Expression(expr)) => Some(expr.value.as_str()),
                None => Some(""),
            },
            _ => None,
        })
    }
}

/// Context handed to a [`ComponentHandler`].
pub struct HandlerContext<'a> {
    /// The element being handled.
    pub element: JsxElement<'a>,
    /// Target output format.
    pub format: Format,
    /// Position of the element in its parent.
    pub placement: Placement,
    transformer: &'a Transformer<'a>,
}

impl<'a> HandlerContext<'a> {
    pub(crate) fn new(
        element: JsxElement<'a>,
        placement: Placement,
        transformer: &'a Transformer<'a>,
    ) -> Self {
        Self {
            element,
            format: transformer.format(),
            placement,
            transformer,
        }
    }

    /// Transforms the element's children as phrasing content.
    ///
    /// Block children contribute their phrasing content.
    pub fn transform_children(&self) -> Vec<Node> {
        self.transformer.phrasing(self.element.children)
    }

    /// Transforms the element's children as block content.
    pub fn transform_children_blocks(&self) -> Vec<Node> {
        self.transformer.blocks(self.element.children)
    }

    /// Records a non-fatal diagnostic located at the element.
    pub fn warn(&self, message: impl Into<String>) {
        self.transformer.warn(message, self.element.position);
    }
}

/// Turns a component element into plain nodes.
///
/// Returned nodes are filtered by category: in phrasing position paragraphs
/// are spliced into their content and other blocks are discarded; in block
/// position phrasing runs are wrapped in paragraphs.
pub trait ComponentHandler {
    /// Produce the replacement nodes for the element.
    fn handle(&self, ctx: &HandlerContext<'_>) -> Vec<Node>;
}

impl<F> ComponentHandler for F
where
    F: Fn(&HandlerContext<'_>) -> Vec<Node>,
{
    fn handle(&self, ctx: &HandlerContext<'_>) -> Vec<Node> {
        (self)(ctx)
    }
}

/// Component handlers keyed by tag name.
#[derive(Clone)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Arc<dyn ComponentHandler + Send + Sync>>,
}

impl HandlerRegistry {
    /// A registry without any handlers.
    pub fn empty() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Registers a handler, replacing any existing one for `name`.
    pub fn register<H>(&mut self, name: impl Into<String>, handler: H)
    where
        H: ComponentHandler + Send + Sync + 'static,
    {
        self.handlers.insert(name.into(), Arc::new(handler));
    }

    /// Removes the handler for `name`, returning whether one existed.
    pub fn remove(&mut self, name: &str) -> bool {
        self.handlers.remove(name).is_some()
    }

    /// Looks up the handler for `name`.
    pub fn get(&self, name: &str) -> Option<&(dyn ComponentHandler + Send + Sync)> {
        self.handlers.get(name).map(|handler| handler.as_ref())
    }

    /// Whether a handler is registered for `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.handlers.keys().collect();
        names.sort();
        f.debug_struct("HandlerRegistry")
            .field("handlers", &names)
            .finish()
    }
}
