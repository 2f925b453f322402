//! Port contracts for remote command execution and SQL template rendering.

mod executor;
mod templates;

pub use executor::{RemoteExecutor, RemoteExecutorError, RemoteExecutorResult};
pub use templates::{TemplateRenderError, TemplateRenderResult, TemplateRenderer};
