//! Remote executor adapter that shells out to the system `ssh` client.

use crate::provisioning::{
    domain::Host,
    ports::{RemoteExecutor, RemoteExecutorError, RemoteExecutorResult},
};
use crate::shell::shell_escape;
use async_trait::async_trait;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

/// Connection options passed to every `ssh` invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SshOptions {
    program: String,
    user: Option<String>,
    port: Option<u16>,
    extra_options: Vec<String>,
}

impl Default for SshOptions {
    fn default() -> Self {
        Self {
            program: "ssh".to_owned(),
            user: None,
            port: None,
            extra_options: Vec::new(),
        }
    }
}

impl SshOptions {
    /// Creates options using `ssh` from `PATH` with no overrides.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the `ssh` executable.
    #[must_use]
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Sets the remote login user.
    #[must_use]
    pub fn with_user(mut self, user: Option<String>) -> Self {
        self.user = user;
        self
    }

    /// Sets the remote port.
    #[must_use]
    pub const fn with_port(mut self, port: Option<u16>) -> Self {
        self.port = port;
        self
    }

    /// Appends `-o` options such as `StrictHostKeyChecking=accept-new`.
    #[must_use]
    pub fn with_extra_options(mut self, options: impl IntoIterator<Item = String>) -> Self {
        self.extra_options.extend(options);
        self
    }

    fn arguments(&self, host: &Host, remote_command: &str) -> Vec<String> {
        let mut arguments = vec!["-o".to_owned(), "BatchMode=yes".to_owned()];
        for option in &self.extra_options {
            arguments.push("-o".to_owned());
            arguments.push(option.clone());
        }
        if let Some(port) = self.port {
            arguments.push("-p".to_owned());
            arguments.push(port.to_string());
        }
        if let Some(user) = &self.user {
            arguments.push("-l".to_owned());
            arguments.push(user.clone());
        }
        arguments.push(host.as_str().to_owned());
        arguments.push("--".to_owned());
        arguments.push(remote_command.to_owned());
        arguments
    }
}

/// Runs commands on remote hosts through `ssh`.
///
/// The remote command line is passed as a single argument and interpreted by
/// the remote login shell. Privileged commands go through `sudo -n -i -u`.
#[derive(Debug, Clone, Default)]
pub struct SshExecutor {
    options: SshOptions,
}

impl SshExecutor {
    /// Creates an executor with the given connection options.
    #[must_use]
    pub const fn new(options: SshOptions) -> Self {
        Self { options }
    }

    /// Returns the remote command line used to run `command` as `user`.
    #[must_use]
    pub fn privileged_command(user: &str, command: &str) -> String {
        format!(
            "sudo -n -i -u {} sh -c {}",
            shell_escape(user),
            shell_escape(command)
        )
    }

    /// Returns the remote command line that stores stdin at `path`.
    #[must_use]
    pub fn upload_command(path: &str, owner: &str) -> String {
        format!(
            "install -m 0600 -o {} /dev/stdin {}",
            shell_escape(owner),
            shell_escape(path)
        )
    }

    async fn execute(
        &self,
        host: &Host,
        remote_command: &str,
        stdin: Option<&str>,
    ) -> RemoteExecutorResult<String> {
        debug!(host = %host, command = remote_command, "running remote command");

        let mut child = Command::new(&self.options.program)
            .args(self.options.arguments(host, remote_command))
            .stdin(if stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|err| RemoteExecutorError::transport(host, err))?;

        if let Some(contents) = stdin {
            let mut pipe = child.stdin.take().ok_or_else(|| {
                RemoteExecutorError::transport(host, std::io::Error::other("stdin was not piped"))
            })?;
            pipe.write_all(contents.as_bytes())
                .await
                .map_err(|err| RemoteExecutorError::transport(host, err))?;
            drop(pipe);
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|err| RemoteExecutorError::transport(host, err))?;

        if !output.status.success() {
            return Err(RemoteExecutorError::CommandFailed {
                host: host.clone(),
                command: remote_command.to_owned(),
                status: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl RemoteExecutor for SshExecutor {
    async fn run(&self, host: &Host, command: &str) -> RemoteExecutorResult<String> {
        self.execute(host, command, None).await
    }

    async fn run_as(&self, host: &Host, user: &str, command: &str) -> RemoteExecutorResult<String> {
        self.execute(host, &Self::privileged_command(user, command), None)
            .await
    }

    async fn upload(
        &self,
        host: &Host,
        path: &str,
        contents: &str,
        owner: &str,
    ) -> RemoteExecutorResult<()> {
        self.execute(host, &Self::upload_command(path, owner), Some(contents))
            .await
            .map(|_| ())
    }
}
