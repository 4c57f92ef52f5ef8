mod bound;
mod client;
mod error;
mod session;
mod transport;
mod wrap;

pub use bound::{BoundTool, InvokeFuture, Invoker, NO_DESCRIPTION};
pub use client::ToolSessionClient;
pub use error::ToolInvokeError;
pub use session::{McpSession, PROTOCOL_VERSION, ToolDescriptor};
pub use transport::{BoxedReader, BoxedWriter, StdioTransport, Transport, TransportChannels};
pub use wrap::{
    AgentTool, AgentToolError, FunctionDefinitionWrapper, FunctionTool, IdentityWrapper,
    StructuredTool, StructuredToolWrapper, ToolWrapper,
};
