use super::error::ToolInvokeError;
use crate::config::ServerConfig;
use async_trait::async_trait;
use std::process::Stdio;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::process::{Child, Command};
use tracing::{debug, info};

pub type BoxedReader = Box<dyn AsyncRead + Send + Unpin>;
pub type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Paired byte streams a session speaks line-delimited JSON-RPC over.
pub struct TransportChannels {
    pub reader: BoxedReader,
    pub writer: BoxedWriter,
}

impl TransportChannels {
    pub fn new(
        reader: impl AsyncRead + Send + Unpin + 'static,
        writer: impl AsyncWrite + Send + Unpin + 'static,
    ) -> Self {
        Self {
            reader: Box::new(reader),
            writer: Box::new(writer),
        }
    }
}

/// Something that can hand out read/write channels to a tool provider and
/// release whatever backs them.
#[async_trait]
pub trait Transport: Send {
    fn server_name(&self) -> &str;

    async fn connect(&mut self) -> Result<TransportChannels, ToolInvokeError>;

    /// Releases the transport. Must be safe to call more than once.
    async fn shutdown(&mut self) -> Result<(), ToolInvokeError>;
}

/// Runs the provider as a child process and talks to it over stdin/stdout.
pub struct StdioTransport {
    server: ServerConfig,
    child: Option<Child>,
}

impl StdioTransport {
    pub fn new(server: ServerConfig) -> Self {
        Self {
            server,
            child: None,
        }
    }

    fn transport_error(&self, message: impl Into<String>) -> ToolInvokeError {
        ToolInvokeError::Transport {
            server: self.server.name.clone(),
            message: message.into(),
        }
    }
}

#[async_trait]
impl Transport for StdioTransport {
    fn server_name(&self) -> &str {
        &self.server.name
    }

    async fn connect(&mut self) -> Result<TransportChannels, ToolInvokeError> {
        if self.child.is_some() {
            return Err(self.transport_error("transport is already connected"));
        }

        let mut command = Command::new(&self.server.command);
        command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);
        if let Some(dir) = &self.server.workdir {
            command.current_dir(dir);
        }
        if !self.server.args.is_empty() {
            command.args(&self.server.args);
        }
        for (key, value) in &self.server.env {
            command.env(key, value);
        }

        let mut child = command.spawn().map_err(|source| ToolInvokeError::Spawn {
            server: self.server.name.clone(),
            source,
        })?;
        info!(
            server = %self.server.name,
            command = %self.server.command.display(),
            "spawned MCP server process"
        );

        let stdin = child.stdin.take();
        let stdout = child.stdout.take();
        self.child = Some(child);

        match (stdout, stdin) {
            (Some(stdout), Some(stdin)) => Ok(TransportChannels::new(stdout, stdin)),
            _ => {
                self.shutdown().await?;
                Err(self.transport_error("failed to capture server stdio"))
            }
        }
    }

    async fn shutdown(&mut self) -> Result<(), ToolInvokeError> {
        let Some(mut child) = self.child.take() else {
            return Ok(());
        };
        if let Err(err) = child.kill().await {
            debug!(
                server = %self.server.name,
                %err,
                "failed to kill MCP server process (may have already exited)"
            );
        }
        let status = child
            .wait()
            .await
            .map_err(|source| self.transport_error(source.to_string()))?;
        debug!(server = %self.server.name, %status, "MCP server process exited");
        Ok(())
    }
}
