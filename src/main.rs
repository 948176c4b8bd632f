//! ToolGuard - sensitive-data gateway for agent tools
//!
//! Serves the guarded tool set over MCP stdio. The same binary doubles as
//! the detached scan worker launched by `scanProject`.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use toolguard::{
    config::{LogFormat, ToolGuardConfig},
    detector,
    mcp::McpServer,
    scan::{ScanState, ScanWorker},
    tools::ToolRegistry,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "toolguard")]
#[command(version)]
#[command(about = "Sensitive-data gateway for agent tools")]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "TOOLGUARD_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the tools over MCP stdio (default)
    Serve,

    /// Run one scan job and write its log (launched by scanProject)
    #[command(hide = true)]
    ScanWorker {
        /// Directory to scan
        target: PathBuf,

        /// Job log file
        log_file: PathBuf,
    },

    /// Run the configured detector on a piece of text
    Inspect {
        /// Text to inspect
        text: String,
    },

    /// Show configuration
    Config {
        /// Show default configuration
        #[arg(long)]
        default: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // An explicit path must exist; the default location is optional.
    let config_path = cli
        .config
        .clone()
        .or_else(|| ToolGuardConfig::default_path().filter(|p| p.exists()));
    let config = match &config_path {
        Some(path) => ToolGuardConfig::load(path)?,
        None => ToolGuardConfig::default(),
    };

    init_logging(cli.verbose, config.logging.format);

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => run_server(config, config_path).await?,
        Commands::ScanWorker { target, log_file } => run_scan_worker(&config, target, log_file).await,
        Commands::Inspect { text } => run_inspect(&config, &text).await?,
        Commands::Config { default } => show_config(if default { None } else { Some(&config) })?,
    }

    Ok(())
}

/// Logs go to stderr; stdout carries the protocol.
fn init_logging(verbose: bool, format: LogFormat) {
    let log_level = if verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("toolguard={}", log_level).into());
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init(),
    }
}

async fn run_server(config: ToolGuardConfig, config_path: Option<PathBuf>) -> Result<()> {
    tracing::info!(
        name = %config.server.name,
        detector = ?config.detector.kind,
        dispatch = ?config.scanner.dispatch,
        "Starting ToolGuard"
    );

    let tools = ToolRegistry::from_config(&config, config_path)?;
    let server = McpServer::new(&config.server.name, &config.server.version, tools);

    tokio::select! {
        served = server.serve_stdio() => served?,
        signal = tokio::signal::ctrl_c() => {
            signal?;
            tracing::info!("Shutting down...");
        }
    }

    Ok(())
}

async fn run_scan_worker(config: &ToolGuardConfig, target: PathBuf, log_file: PathBuf) {
    let outcome = ScanWorker::from_config(&config.scanner)
        .run(&target, &log_file)
        .await;
    if outcome.state == ScanState::Failed {
        tracing::warn!(scan_target = %target.display(), "Scan finished with errors; see {}", log_file.display());
    }
}

async fn run_inspect(config: &ToolGuardConfig, text: &str) -> Result<()> {
    let detector = detector::from_config(&config.detector);
    let result = detector.inspect(text).await;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

fn show_config(config: Option<&ToolGuardConfig>) -> Result<()> {
    let config = config.cloned().unwrap_or_default();
    let toml = toml::to_string_pretty(&config)?;
    println!("{}", toml);
    Ok(())
}
