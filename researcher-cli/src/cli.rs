use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "researcher",
    version,
    about = "Inspect and call the tools exposed by an MCP server"
)]
pub struct Cli {
    /// Path to client.toml (defaults to config/client.toml)
    #[arg(long)]
    pub config: Option<String>,
    /// Server entry to connect to (defaults to `default_server`, then the first entry)
    #[arg(long, short)]
    pub server: Option<String>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// List tools with their typed arguments
    List {
        /// Print OpenAI-style function declarations instead of a summary
        #[arg(long)]
        json: bool,
    },
    /// Validate arguments against a tool's schema and call it
    Call {
        tool: String,
        /// Keyword arguments as a JSON object
        #[arg(long, default_value = "{}")]
        args: String,
    },
}
