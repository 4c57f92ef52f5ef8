mod cli;
mod render;

use clap::Parser;
use cli::{Cli, Command};
use researcher_core::config::AppConfig;
use researcher_core::tooling::{
    FunctionDefinitionWrapper, StdioTransport, ToolInvokeError, ToolSessionClient,
};
use serde_json::Value;
use std::path::Path;
use std::process::ExitCode;
use thiserror::Error;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Core(#[from] researcher_core::Error),
    #[error("--args must be a JSON object: {0}")]
    InvalidArgs(String),
    #[error("tool '{tool}' is not offered by server '{server}'")]
    UnknownTool { tool: String, server: String },
    #[error("failed to encode output: {0}")]
    Output(#[from] serde_json::Error),
}

impl From<ToolInvokeError> for CliError {
    fn from(err: ToolInvokeError) -> Self {
        CliError::Core(err.into())
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    debug!(
        config = ?cli.config,
        server = ?cli.server,
        command = ?cli.command,
        "CLI arguments parsed"
    );

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let config = AppConfig::load(cli.config.as_deref().map(Path::new))
        .map_err(researcher_core::Error::from)?;
    let server = config
        .server(cli.server.as_deref())
        .map_err(researcher_core::Error::from)?
        .clone();
    info!(server = %server.name, "Connecting to MCP server");

    match cli.command {
        Command::List { json } => list_tools(server, json).await,
        Command::Call { tool, args } => {
            let arguments = parse_arguments(&args)?;
            call_tool(server, tool, arguments).await
        }
    }
}

async fn list_tools(
    server: researcher_core::config::ServerConfig,
    json: bool,
) -> Result<(), CliError> {
    ToolSessionClient::scope(StdioTransport::new(server), |client| async move {
        if json {
            let declarations: Vec<Value> = client
                .tools_with(&FunctionDefinitionWrapper)
                .await?
                .into_iter()
                .map(|tool| tool.definition)
                .collect();
            println!("{}", serde_json::to_string_pretty(&declarations)?);
            return Ok(());
        }

        if let Some(instructions) = client.instructions().await {
            println!("{}\n", instructions.trim());
        }
        let tools = client.bound_tools().await?;
        if tools.is_empty() {
            println!("Server '{}' offers no tools.", client.server());
        }
        for tool in &tools {
            print!("{}", render::describe_tool(tool));
        }
        Ok::<(), CliError>(())
    })
    .await
}

async fn call_tool(
    server: researcher_core::config::ServerConfig,
    tool: String,
    arguments: Value,
) -> Result<(), CliError> {
    ToolSessionClient::scope(StdioTransport::new(server), |client| async move {
        let bound = client
            .bound_tools()
            .await?
            .into_iter()
            .find(|candidate| candidate.name() == tool)
            .ok_or_else(|| CliError::UnknownTool {
                tool: tool.clone(),
                server: client.server().to_string(),
            })?;

        let kwargs = bound
            .argument_type()
            .instantiate(&arguments)
            .map_err(researcher_core::Error::from)?;
        info!(tool = bound.name(), "Calling tool");
        let result = bound.invoke(kwargs).await?;
        println!("{}", serde_json::to_string_pretty(&result)?);
        Ok::<(), CliError>(())
    })
    .await
}

fn parse_arguments(raw: &str) -> Result<Value, CliError> {
    let value: Value =
        serde_json::from_str(raw).map_err(|err| CliError::InvalidArgs(err.to_string()))?;
    if !value.is_object() {
        return Err(CliError::InvalidArgs("expected an object".to_string()));
    }
    Ok(value)
}

fn init_tracing() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_level(true)
            .init();
    });
}
