mod config;
mod error;
mod logging;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use functions::{Registry, TOOL_DIR, Workspace, standard_registry};
use protocol::Request;
use serde_json::Value;
use server::{Client, Dispatcher, Server};
use tokio_util::sync::CancellationToken;

use config::Config;
use error::{Error, Result};

const CONFIG_FILE: &str = "license-server.toml";
const LOG_FILE: &str = "python_interaction.log";

#[derive(Parser)]
#[command(name = "license-server")]
#[command(about = "Local function server for the license tool IDE plugin", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file (default: ./license-server.toml if present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the function registry over TCP
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(short, long)]
        port: Option<u16>,
        /// Project root (overrides LICENSE_TOOL_PROJECT)
        #[arg(long)]
        project: Option<PathBuf>,
    },
    /// Send one request to a running server and print the response
    Call {
        /// Function name
        function: String,
        /// Positional arguments as a JSON array
        #[arg(default_value = "[]")]
        args: String,
        #[arg(long)]
        host: Option<String>,
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// List the registered functions
    Functions,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Some(Commands::Serve {
            host,
            port,
            project,
        }) => cmd_serve(config, host, port, project).await,
        None => cmd_serve(config, None, None, None).await,
        Some(Commands::Call {
            function,
            args,
            host,
            port,
        }) => cmd_call(&config, &function, &args, host, port).await,
        Some(Commands::Functions) => cmd_functions(config),
    }
}

/// An explicit `--config` must exist; the default file is optional.
fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Ok(Config::load(path)?),
        None if Path::new(CONFIG_FILE).exists() => Ok(Config::load(CONFIG_FILE)?),
        None => Ok(Config::default()),
    }
}

/// `--project`, else `LICENSE_TOOL_PROJECT`, else the config file, else the
/// current directory.
fn workspace(config: &Config, project: Option<PathBuf>) -> Result<Workspace> {
    if let Some(project) = project {
        return Ok(Workspace::new(project));
    }
    let fallback = match &config.project {
        Some(project) => project.clone(),
        None => std::env::current_dir()?,
    };
    Ok(Workspace::from_env_or(fallback))
}

fn build_registry(config: Config, workspace: &Arc<Workspace>) -> Result<Registry> {
    Ok(standard_registry(
        workspace,
        config.models,
        config.providers,
    )?)
}

async fn cmd_serve(
    config: Config,
    host: Option<String>,
    port: Option<u16>,
    project: Option<PathBuf>,
) -> Result<()> {
    let workspace = Arc::new(workspace(&config, project)?);
    let root = workspace.root().await;

    let log_file = config
        .logging
        .file
        .clone()
        .unwrap_or_else(|| root.join(TOOL_DIR).join(LOG_FILE));
    logging::init(&config.logging, Some(&log_file))?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting license-server");
    tracing::info!(project = %root.display(), log = %log_file.display(), "project root");

    let addr = format!(
        "{}:{}",
        host.as_deref().unwrap_or(&config.server.host),
        port.unwrap_or(config.server.port)
    );
    let max_frame_bytes = config.server.max_frame_bytes;
    let registry = build_registry(config, &workspace)?;
    tracing::info!(functions = registry.len(), tools = registry.tool_specs().len(), "registry ready");

    let server = Server::bind(&addr, Dispatcher::new(Arc::new(registry)))
        .await?
        .max_frame_bytes(max_frame_bytes);

    let shutdown = CancellationToken::new();
    tokio::spawn(cancel_on_ctrl_c(shutdown.clone()));

    server.run(shutdown).await?;
    tracing::info!("server stopped");
    Ok(())
}

async fn cancel_on_ctrl_c(shutdown: CancellationToken) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("received Ctrl-C, shutting down"),
        Err(e) => {
            tracing::error!(error = %e, "cannot listen for Ctrl-C");
            return;
        }
    }
    shutdown.cancel();
}

async fn cmd_call(
    config: &Config,
    function: &str,
    args: &str,
    host: Option<String>,
    port: Option<u16>,
) -> Result<()> {
    logging::init(&config.logging, None)?;

    let args: Vec<Value> = serde_json::from_str(args).map_err(Error::InvalidArgs)?;
    let addr = format!(
        "{}:{}",
        host.as_deref().unwrap_or(&config.server.host),
        port.unwrap_or(config.server.port)
    );

    let mut client = Client::connect(addr.as_str()).await?;
    let response = client.call(&Request::new(function, args)).await?;
    let line = response.to_line()?;
    print!("{}", String::from_utf8_lossy(&line));

    if response.is_soft_failure() {
        tracing::warn!("the server reported a failure");
    }
    Ok(())
}

fn cmd_functions(config: Config) -> Result<()> {
    let workspace = Arc::new(workspace(&config, None)?);
    let registry = build_registry(config, &workspace)?;

    println!("{:<30}  {:<6}  PARAMETERS", "FUNCTION", "TOOL");
    println!("{}", "-".repeat(72));

    for name in registry.names() {
        let Some(function) = registry.get(name) else {
            continue;
        };
        let params = function
            .parameters()
            .iter()
            .map(|p| format!("{}: {}", p.name, p.kind.as_str()))
            .collect::<Vec<_>>()
            .join(", ");
        let tool = if function.is_model_facing() { "yes" } else { "" };
        println!("{name:<30}  {tool:<6}  {params}");
    }

    Ok(())
}
