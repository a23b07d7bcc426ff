//! Extraction options.

use crate::registry::{ComponentHandler, HandlerRegistry};
use mdxtext_core::Syntax;
use serde::{Deserialize, Serialize};

/// Output format of the extracted content.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// Plain text without Markdown markers.
    #[default]
    Text,
    /// Canonical Markdown.
    Markdown,
}

/// What happens to a component tag that has no handler.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownComponentHandling {
    /// Discard the tag and keep its transformed children.
    #[default]
    Unwrap,
    /// Discard the tag together with its children.
    Drop,
}

/// Options for [`crate::extract`] and [`crate::get_structure`].
///
/// Deserializes from camelCase keys; the handler registry is not part of the
/// serialized form and always starts from the defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExtractOptions {
    /// Output format.
    pub format: Format,
    /// Source dialect.
    pub syntax: Syntax,
    /// Handlers for component tags, keyed by tag name.
    #[serde(skip)]
    pub component_handlers: HandlerRegistry,
    /// Policy for tags without a handler.
    pub unknown_component_handling: UnknownComponentHandling,
}

impl ExtractOptions {
    /// Defaults with Markdown output.
    pub fn markdown() -> Self {
        Self::default().with_format(Format::Markdown)
    }

    /// Sets the output format.
    pub fn with_format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }

    /// Sets the source dialect.
    pub fn with_syntax(mut self, syntax: Syntax) -> Self {
        self.syntax = syntax;
        self
    }

    /// Sets the policy for tags without a handler.
    pub fn with_unknown_component_handling(mut self, handling: UnknownComponentHandling) -> Self {
        self.unknown_component_handling = handling;
        self
    }

    /// Registers a handler, replacing any existing one for `name`.
    pub fn with_handler<H>(mut self, name: impl Into<String>, handler: H) -> Self
    where
        H: ComponentHandler + Send + Sync + 'static,
    {
        self.component_handlers.register(name, handler);
        self
    }
}
