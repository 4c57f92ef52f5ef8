use super::error::ToolInvokeError;
use super::session::McpSession;
use crate::schema::RecordDefinition;
use futures::FutureExt;
use futures::future::BoxFuture;
use serde_json::{Map as JsonMap, Value};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

pub const NO_DESCRIPTION: &str = "No description provided.";

pub type InvokeFuture = BoxFuture<'static, Result<Value, ToolInvokeError>>;

/// Forwards keyword arguments to wherever the tool actually runs.
pub type Invoker = Arc<dyn Fn(JsonMap<String, Value>) -> InvokeFuture + Send + Sync>;

/// A tool descriptor joined with its typed argument record and a way to call it.
#[derive(Clone)]
pub struct BoundTool {
    name: String,
    description: String,
    argument_type: RecordDefinition,
    invoker: Invoker,
}

impl BoundTool {
    pub fn new(
        name: impl Into<String>,
        description: Option<String>,
        argument_type: RecordDefinition,
        invoker: Invoker,
    ) -> Self {
        let description = description
            .filter(|text| !text.is_empty())
            .unwrap_or_else(|| NO_DESCRIPTION.to_string());
        Self {
            name: name.into(),
            description,
            argument_type,
            invoker,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn argument_type(&self) -> &RecordDefinition {
        &self.argument_type
    }

    /// Sends `kwargs` as-is and returns the provider's raw result.
    ///
    /// Nothing is validated here; build the arguments through
    /// [`RecordDefinition::instantiate`] first when validation is wanted.
    pub async fn invoke(&self, kwargs: JsonMap<String, Value>) -> Result<Value, ToolInvokeError> {
        (self.invoker)(kwargs).await
    }
}

impl fmt::Debug for BoundTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundTool")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("argument_type", &self.argument_type)
            .finish_non_exhaustive()
    }
}

/// Invoker that calls `tool` over a live session.
///
/// Holding the session keeps the handle valid, but once the session has
/// been closed every call fails with [`ToolInvokeError::Closed`].
pub(crate) fn session_invoker(session: Arc<McpSession>, tool: String) -> Invoker {
    Arc::new(move |arguments: JsonMap<String, Value>| {
        let session = Arc::clone(&session);
        let tool = tool.clone();
        async move {
            debug!(
                server = session.server(),
                tool = tool.as_str(),
                argument_count = arguments.len(),
                "invoking MCP tool"
            );
            session.call_tool(&tool, Value::Object(arguments)).await
        }
        .boxed()
    })
}
