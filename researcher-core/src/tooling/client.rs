use super::bound::{BoundTool, session_invoker};
use super::error::ToolInvokeError;
use super::session::{McpSession, ToolDescriptor};
use super::transport::Transport;
use super::wrap::ToolWrapper;
use crate::error::Error;
use crate::schema::translate;
use futures::FutureExt;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, info, warn};

/// Owns one session with a tool provider and exposes its tools as [`BoundTool`]s.
///
/// The session is acquired by [`open`](Self::open) and released by
/// [`close`](Self::close): session first, then transport. Prefer
/// [`scope`](Self::scope), which closes on every exit path.
pub struct ToolSessionClient {
    server: String,
    session: Arc<McpSession>,
    transport: AsyncMutex<Option<Box<dyn Transport>>>,
    tools: AsyncMutex<Option<Vec<ToolDescriptor>>>,
}

impl ToolSessionClient {
    /// Connects the transport, starts a session and performs the handshake.
    ///
    /// On failure everything acquired so far is released before the error
    /// is returned.
    pub async fn open<T>(transport: T) -> Result<Self, ToolInvokeError>
    where
        T: Transport + 'static,
    {
        let mut transport: Box<dyn Transport> = Box::new(transport);
        let server = transport.server_name().to_string();

        let channels = match transport.connect().await {
            Ok(channels) => channels,
            Err(err) => {
                release_transport(&server, transport.as_mut()).await;
                return Err(err);
            }
        };

        let session = McpSession::start(server.clone(), channels);
        if let Err(err) = session.initialize().await {
            warn!(server = %server, %err, "MCP handshake failed");
            session.close().await;
            release_transport(&server, transport.as_mut()).await;
            return Err(err);
        }

        info!(server = %server, "MCP session established");
        Ok(Self {
            server,
            session,
            transport: AsyncMutex::new(Some(transport)),
            tools: AsyncMutex::new(None),
        })
    }

    /// Opens a client, runs `body` with it and closes it afterwards, whether
    /// `body` succeeded, failed or panicked. An error from `body` wins over
    /// one from closing; a panic is resumed once the client is closed.
    pub async fn scope<T, F, Fut, R, E>(transport: T, body: F) -> Result<R, E>
    where
        T: Transport + 'static,
        F: FnOnce(Arc<ToolSessionClient>) -> Fut,
        Fut: Future<Output = Result<R, E>>,
        E: From<ToolInvokeError>,
    {
        let client = Arc::new(Self::open(transport).await?);
        let handle = Arc::clone(&client);
        let outcome = AssertUnwindSafe(async move { body(handle).await })
            .catch_unwind()
            .await;
        let closed = client.close().await;
        let outcome = match outcome {
            Ok(outcome) => outcome,
            Err(payload) => {
                if let Err(close_err) = closed {
                    warn!(server = %client.server, %close_err, "failed to close MCP client");
                }
                panic::resume_unwind(payload);
            }
        };
        match outcome {
            Ok(value) => {
                closed?;
                Ok(value)
            }
            Err(err) => {
                if let Err(close_err) = closed {
                    warn!(server = %client.server, %close_err, "failed to close MCP client");
                }
                Err(err)
            }
        }
    }

    pub fn server(&self) -> &str {
        &self.server
    }

    pub fn session(&self) -> &Arc<McpSession> {
        &self.session
    }

    pub fn is_closed(&self) -> bool {
        self.session.is_closed()
    }

    /// Instructions the server sent during the handshake, if any.
    pub async fn instructions(&self) -> Option<String> {
        self.session.instructions().await
    }

    /// Returns the provider's tool descriptors.
    ///
    /// The first call fetches them; every later call returns that same list
    /// without another round trip. Start a new session for a fresh list.
    pub async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, ToolInvokeError> {
        let mut cache = self.tools.lock().await;
        if let Some(tools) = cache.as_ref() {
            return Ok(tools.clone());
        }
        let tools = self.session.list_tools().await?;
        info!(server = %self.server, count = tools.len(), "cached MCP tool descriptors");
        *cache = Some(tools.clone());
        Ok(tools)
    }

    /// Binds every descriptor to a typed argument record and an invoker on
    /// this session.
    pub async fn bound_tools(&self) -> Result<Vec<BoundTool>, Error> {
        let descriptors = self.list_tools().await?;
        let mut tools = Vec::with_capacity(descriptors.len());
        for descriptor in descriptors {
            let argument_type = translate(&descriptor.name, &descriptor.input_schema)?;
            debug!(
                server = %self.server,
                tool = descriptor.name.as_str(),
                fields = argument_type.len(),
                "bound MCP tool"
            );
            let invoker = session_invoker(Arc::clone(&self.session), descriptor.name.clone());
            tools.push(BoundTool::new(
                descriptor.name,
                descriptor.description,
                argument_type,
                invoker,
            ));
        }
        Ok(tools)
    }

    /// [`bound_tools`](Self::bound_tools) packaged by `wrapper`.
    pub async fn tools_with<W>(&self, wrapper: &W) -> Result<Vec<W::Output>, Error>
    where
        W: ToolWrapper,
    {
        let tools = self.bound_tools().await?;
        Ok(tools.into_iter().map(|tool| wrapper.wrap(tool)).collect())
    }

    /// Closes the session, then shuts the transport down. Safe to call twice.
    pub async fn close(&self) -> Result<(), ToolInvokeError> {
        self.session.close().await;
        let transport = self.transport.lock().await.take();
        if let Some(mut transport) = transport {
            transport.shutdown().await?;
            info!(server = %self.server, "MCP client closed");
        }
        Ok(())
    }
}

async fn release_transport(server: &str, transport: &mut dyn Transport) {
    if let Err(err) = transport.shutdown().await {
        warn!(server, %err, "failed to shut down MCP transport");
    }
}
