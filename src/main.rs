use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::Value;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tool_bridge::config::{self, AppConfig};
use tool_bridge::connector::{Connector, Endpoint, ToolParams};
use tool_bridge::tools::{BackendClient, builtin_registry};
use tool_bridge::{api, serve_stdio};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "tool-bridge")]
#[command(about = "Call business-data tools over HTTP or a local MCP process", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, env = "TOOL_BRIDGE_CONFIG")]
    config: Option<PathBuf>,

    /// Override log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Override log format (pretty, json)
    #[arg(long)]
    log_format: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the tool server
    Serve {
        /// Speak MCP on stdin/stdout instead of listening on HTTP
        #[arg(long)]
        stdio: bool,
    },
    /// Check that the tool server answers
    Health(EndpointArgs),
    /// Print the tools offered by the server
    ListTools(EndpointArgs),
    /// Invoke one tool and print its result
    Call {
        /// Tool name
        tool: String,

        /// Parameters as a JSON object
        #[arg(long, default_value = "{}")]
        params: String,

        #[command(flatten)]
        endpoint: EndpointArgs,
    },
}

#[derive(clap::Args, Debug, Clone)]
struct EndpointArgs {
    /// Tool server base URL (plain JSON protocol)
    #[arg(long, conflicts_with_all = ["mcp_url", "command"])]
    url: Option<String>,

    /// MCP streamable-HTTP endpoint URL
    #[arg(long, conflicts_with = "command")]
    mcp_url: Option<String>,

    /// Tool server executable to spawn (MCP over stdio)
    #[arg(long)]
    command: Option<String>,

    /// Argument for --command; repeatable
    #[arg(long = "arg", requires = "command", allow_hyphen_values = true)]
    args: Vec<String>,
}

impl EndpointArgs {
    fn resolve(&self, config: &AppConfig) -> Endpoint {
        if let Some(url) = &self.url {
            return Endpoint::http(url.clone());
        }
        if let Some(url) = &self.mcp_url {
            return Endpoint::mcp_http(url.clone());
        }
        if let Some(command) = &self.command {
            return Endpoint::local_process(command.clone()).with_args(self.args.clone());
        }
        match &config.endpoint {
            Some(endpoint) => endpoint.to_endpoint(),
            None => Endpoint::http(format!(
                "http://{}:{}",
                config.server.host, config.server.port
            )),
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let config = match load(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = init_logging(&config.logging) {
        eprintln!("error: {:#}", e);
        return ExitCode::FAILURE;
    }

    match run(cli.command, config).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn load(cli: &Cli) -> Result<AppConfig> {
    let mut config = config::load_config(cli.config.as_deref()).with_context(|| match &cli.config
    {
        Some(path) => format!("Failed to load configuration from: {}", path.display()),
        None => "Failed to load configuration".to_string(),
    })?;

    if let Some(log_level) = &cli.log_level {
        config.logging.level = log_level.clone();
    }
    if let Some(log_format) = &cli.log_format {
        config.logging.format = log_format.clone();
    }
    config::validate_config(&config)?;

    Ok(config)
}

async fn run(command: Command, config: AppConfig) -> Result<bool> {
    match command {
        Command::Serve { stdio } => {
            let backend = BackendClient::new(config::load_backend_config()?)?;
            let registry = builtin_registry(Arc::new(backend))?;

            if stdio {
                serve_stdio(registry).await?;
            } else {
                print_banner(&config);
                api::start_server(&config.server, registry).await?;
            }
            Ok(true)
        }
        Command::Health(args) => {
            let Some(mut connector) = connect(&args, &config).await? else {
                return Ok(false);
            };
            let healthy = connector.health().await?;
            connector.close().await;

            println!("{}", if healthy { "healthy" } else { "unhealthy" });
            Ok(healthy)
        }
        Command::ListTools(args) => {
            let Some(mut connector) = connect(&args, &config).await? else {
                return Ok(false);
            };
            let tools = connector.list_tools().await;
            connector.close().await;

            println!("{}", serde_json::to_string_pretty(&tools?)?);
            Ok(true)
        }
        Command::Call {
            tool,
            params,
            endpoint,
        } => {
            let params = parse_params(&params)?;
            let Some(mut connector) = connect(&endpoint, &config).await? else {
                return Ok(false);
            };
            let result = connector.call_tool(tool, params).await;
            connector.close().await;

            let result = result?;
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(result.is_success())
        }
    }
}

async fn connect(args: &EndpointArgs, config: &AppConfig) -> Result<Option<Connector>> {
    let endpoint = args.resolve(config);
    let mut connector = Connector::new(endpoint.clone(), &config.connector)?;

    if connector.connect().await? {
        Ok(Some(connector))
    } else {
        eprintln!("error: could not connect to {}", endpoint);
        Ok(None)
    }
}

fn parse_params(raw: &str) -> Result<ToolParams> {
    match serde_json::from_str::<Value>(raw).context("--params is not valid JSON")? {
        Value::Object(params) => Ok(params),
        _ => anyhow::bail!("--params must be a JSON object"),
    }
}

fn init_logging(config: &config::LoggingConfig) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    // stdout carries command output and the stdio MCP stream
    match config.format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .try_init()?;
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().pretty().with_writer(std::io::stderr))
                .try_init()?;
        }
    }

    Ok(())
}

fn print_banner(config: &AppConfig) {
    let version = env!("CARGO_PKG_VERSION");
    let width = 59usize;
    let border = "═".repeat(width + 2);
    let line = |content: &str| {
        info!("║ {:width$} ║", content, width = width);
    };

    info!("╔{}╗", border);
    line("TOOL-BRIDGE");
    line(&format!("Tool Server v{}", version));
    info!("╚{}╝", border);
    info!("");
    info!("Server Configuration:");
    info!("  → Address: {}:{}", config.server.host, config.server.port);
    info!("  → Log Level: {}", config.logging.level);
    info!("  → Log Format: {}", config.logging.format);
    info!("");
}
