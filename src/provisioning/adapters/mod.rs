//! Adapter implementations for the remote execution and template ports.

pub mod memory;

mod ssh;
mod templates;

pub use ssh::{SshExecutor, SshOptions};
pub use templates::MiniJinjaTemplates;
