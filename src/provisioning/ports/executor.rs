//! Remote command execution port.

use crate::provisioning::domain::Host;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for remote command execution.
pub type RemoteExecutorResult<T> = Result<T, RemoteExecutorError>;

/// Runs shell commands on remote hosts and returns their captured stdout.
///
/// Implementations must report a non-zero remote exit status as
/// [`RemoteExecutorError::CommandFailed`].
#[async_trait]
pub trait RemoteExecutor: Send + Sync {
    /// Runs `command` as the connecting (login) user.
    async fn run(&self, host: &Host, command: &str) -> RemoteExecutorResult<String>;

    /// Runs `command` under the identity of the privileged OS `user`, such
    /// as the database superuser account.
    async fn run_as(&self, host: &Host, user: &str, command: &str) -> RemoteExecutorResult<String>;

    /// Writes `contents` to `path`, readable only by `owner`.
    async fn upload(
        &self,
        host: &Host,
        path: &str,
        contents: &str,
        owner: &str,
    ) -> RemoteExecutorResult<()>;
}

/// Errors returned by remote execution adapters.
#[derive(Debug, Clone, Error)]
pub enum RemoteExecutorError {
    /// The remote command exited unsuccessfully.
    #[error("command `{command}` failed on {host} (exit status {status:?}): {stderr}")]
    CommandFailed {
        /// Host the command ran on.
        host: Host,
        /// Command line as submitted.
        command: String,
        /// Exit status, when the process was not killed by a signal.
        status: Option<i32>,
        /// Captured standard error, trimmed.
        stderr: String,
    },

    /// The transport could not run the command at all.
    #[error("remote transport error on {host}: {source}")]
    Transport {
        /// Host the command was meant for.
        host: Host,
        /// Underlying transport failure.
        source: Arc<dyn std::error::Error + Send + Sync>,
    },
}

impl RemoteExecutorError {
    /// Wraps a transport failure for `host`.
    pub fn transport(host: &Host, err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Transport {
            host: host.clone(),
            source: Arc::new(err),
        }
    }
}
