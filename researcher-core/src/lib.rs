//! Typed tool bridge between MCP servers and agent orchestration layers.
//!
//! A [`ToolSessionClient`](tooling::ToolSessionClient) opens a session with a
//! tool provider, lists its tools and binds each one to a
//! [`RecordDefinition`](schema::RecordDefinition) translated from the tool's
//! JSON Schema plus an invoker that forwards calls over the session.

pub mod config;
pub mod error;
pub mod schema;
pub mod tooling;

pub use error::{Error, Result};
