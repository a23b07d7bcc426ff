//! Component handler registry.

/// Built-in handlers and tag sets.
pub mod defaults;
/// Registry and handler context types.
pub mod types;

pub use defaults::{
    DEFAULT_UNWRAPPED_COMPONENTS, drop_component, is_media_tag, is_wrapper_tag, unwrap_component,
};
pub use types::{ComponentHandler, HandlerContext, HandlerRegistry, JsxElement, Placement};
