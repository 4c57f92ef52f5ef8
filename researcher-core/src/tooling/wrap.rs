//! Packaging bound tools for a particular orchestration layer.
//!
//! Fetching and binding is shared by every consumer; only the final shape
//! differs, so that step is the [`ToolWrapper`] trait.

use super::bound::BoundTool;
use super::error::ToolInvokeError;
use crate::schema::ValidationError;
use async_trait::async_trait;
use serde_json::{Value, json};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

pub trait ToolWrapper {
    type Output;

    fn wrap(&self, tool: BoundTool) -> Self::Output;
}

/// Passes bound tools through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityWrapper;

impl ToolWrapper for IdentityWrapper {
    type Output = BoundTool;

    fn wrap(&self, tool: BoundTool) -> BoundTool {
        tool
    }
}

#[derive(Debug, Error)]
pub enum AgentToolError {
    #[error("invalid arguments for tool '{tool}': {source}")]
    InvalidArguments {
        tool: String,
        #[source]
        source: ValidationError,
    },
    #[error("tool '{tool}' failed: {source}")]
    Remote {
        tool: String,
        #[source]
        source: ToolInvokeError,
    },
}

/// A callable tool as an agent loop sees it: a name, a description, a JSON
/// Schema for its parameters and an async entry point.
#[async_trait]
pub trait AgentTool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn parameters(&self) -> Value;
    async fn call(&self, input: Value) -> Result<Value, AgentToolError>;
}

/// Agent tool that validates its input against the argument record before
/// forwarding it.
#[derive(Debug, Clone)]
pub struct StructuredTool {
    tool: BoundTool,
}

impl StructuredTool {
    pub fn new(tool: BoundTool) -> Self {
        Self { tool }
    }

    pub fn bound(&self) -> &BoundTool {
        &self.tool
    }
}

#[async_trait]
impl AgentTool for StructuredTool {
    fn name(&self) -> &str {
        self.tool.name()
    }

    fn description(&self) -> &str {
        self.tool.description()
    }

    fn parameters(&self) -> Value {
        self.tool.argument_type().to_json_schema()
    }

    async fn call(&self, input: Value) -> Result<Value, AgentToolError> {
        let arguments = self
            .tool
            .argument_type()
            .instantiate(&input)
            .map_err(|source| AgentToolError::InvalidArguments {
                tool: self.tool.name().to_string(),
                source,
            })?;
        debug!(tool = self.tool.name(), "validated tool arguments");
        self.tool
            .invoke(arguments)
            .await
            .map_err(|source| AgentToolError::Remote {
                tool: self.tool.name().to_string(),
                source,
            })
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StructuredToolWrapper;

impl ToolWrapper for StructuredToolWrapper {
    type Output = Arc<dyn AgentTool>;

    fn wrap(&self, tool: BoundTool) -> Arc<dyn AgentTool> {
        Arc::new(StructuredTool::new(tool))
    }
}

/// Chat-completion style function declaration paired with the tool it describes.
#[derive(Debug, Clone)]
pub struct FunctionTool {
    pub definition: Value,
    pub tool: BoundTool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FunctionDefinitionWrapper;

impl ToolWrapper for FunctionDefinitionWrapper {
    type Output = FunctionTool;

    fn wrap(&self, tool: BoundTool) -> FunctionTool {
        let definition = json!({
            "type": "function",
            "function": {
                "name": tool.name(),
                "description": tool.description(),
                "parameters": tool.argument_type().to_json_schema(),
            }
        });
        FunctionTool { definition, tool }
    }
}
