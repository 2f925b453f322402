//! SQL template rendering port.

use crate::provisioning::domain::{ScriptContext, SqlTemplate};
use thiserror::Error;

/// Result type for template rendering.
pub type TemplateRenderResult<T> = Result<T, TemplateRenderError>;

/// Renders SQL script templates into executable SQL text.
pub trait TemplateRenderer: Send + Sync {
    /// Renders `template` with the variables in `context`.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateRenderError`] when the template is unknown or a
    /// variable is missing.
    fn render(&self, template: SqlTemplate, context: &ScriptContext)
    -> TemplateRenderResult<String>;
}

/// Errors returned by template rendering adapters.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TemplateRenderError {
    /// The renderer has no source for the template.
    #[error("unknown SQL template {0}")]
    UnknownTemplate(SqlTemplate),

    /// Rendering failed.
    #[error("failed to render SQL template {template}: {reason}")]
    Render {
        /// Template being rendered.
        template: SqlTemplate,
        /// Renderer diagnostic.
        reason: String,
    },
}
