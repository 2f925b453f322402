//! Unit tests for provisioning services, plus the executor mock they share.


use crate::provisioning::{
    domain::Host,
    ports::{RemoteExecutor, RemoteExecutorError, RemoteExecutorResult},
};
use async_trait::async_trait;

mockall::mock! {
    pub Executor {}

    #[async_trait]
    impl RemoteExecutor for Executor {
        async fn run(&self, host: &Host, command: &str) -> RemoteExecutorResult<String>;
        async fn run_as(&self, host: &Host, user: &str, command: &str) -> RemoteExecutorResult<String>;
        async fn upload(
            &self,
            host: &Host,
            path: &str,
            contents: &str,
            owner: &str,
        ) -> RemoteExecutorResult<()>;
    }
}

/// A non-zero exit of `command` on `host`.
pub(crate) fn command_failure(host: &Host, command: &str) -> RemoteExecutorError {
    RemoteExecutorError::CommandFailed {
        host: host.clone(),
        command: command.to_owned(),
        status: Some(1),
        stderr: "ERROR:  simulated".to_owned(),
    }
}
