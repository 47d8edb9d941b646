//! gatewatch daemon: serves the HTTP API and administers the local store.

mod admin;
mod config;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use gatewatch_rpc::{AppState, RpcServer, ScanMetrics, ServerOptions};
use gatewatch_utils::LogFormat;

use crate::admin::Services;
use crate::config::DaemonConfig;

#[derive(Parser)]
#[command(name = "gatewatch-daemon", about = "Campus gate check-in/check-out service")]
struct Cli {
    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, env = "GATEWATCH_CONFIG")]
    config: Option<PathBuf>,

    /// Data directory for the audit log and gate records.
    #[arg(long, env = "GATEWATCH_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Maximum LMDB map size in MiB.
    #[arg(long, env = "GATEWATCH_MAP_SIZE_MB")]
    map_size_mb: Option<usize>,

    /// Log level or filter directive: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "GATEWATCH_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log output: "human" or "json".
    #[arg(long, env = "GATEWATCH_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    /// Subcommand.
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args)]
struct ServeArgs {
    /// Address the HTTP server binds to.
    #[arg(long, env = "GATEWATCH_BIND_ADDRESS")]
    bind_address: Option<String>,

    /// HTTP server port.
    #[arg(long, env = "GATEWATCH_RPC_PORT")]
    rpc_port: Option<u16>,

    /// Enable Prometheus metrics endpoint.
    #[arg(long, env = "GATEWATCH_ENABLE_METRICS")]
    metrics: bool,

    /// Disable permissive CORS headers.
    #[arg(long, env = "GATEWATCH_DISABLE_CORS")]
    disable_cors: bool,

    /// How long a scan waits on another scan of the same person, in milliseconds.
    #[arg(long, env = "GATEWATCH_LOCK_TIMEOUT_MS")]
    lock_timeout_ms: Option<u64>,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Serve the HTTP API.
    Serve(ServeArgs),
    /// Manage card holders.
    Identity {
        #[command(subcommand)]
        action: admin::IdentityAction,
    },
    /// Manage operator accounts.
    Operator {
        #[command(subcommand)]
        action: admin::OperatorAction,
    },
    /// Manage gates and their operators.
    Location {
        #[command(subcommand)]
        action: admin::LocationAction,
    },
    /// Query the audit log.
    Logs {
        #[command(subcommand)]
        action: admin::LogsAction,
    },
    /// Show where a person is checked in.
    Presence {
        /// Person id.
        person: String,
    },
    /// Print the effective configuration as TOML.
    Config,
}

/// File config (or defaults) with the global CLI overrides applied.
fn resolve_config(cli: &Cli) -> anyhow::Result<DaemonConfig> {
    let mut config = match &cli.config {
        Some(path) => DaemonConfig::from_toml_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => DaemonConfig::default(),
    };
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(mb) = cli.map_size_mb {
        config.map_size_mb = mb;
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    if let Some(format) = cli.log_format {
        config.log_format = format;
    }
    Ok(config)
}

fn apply_serve_args(config: &mut DaemonConfig, args: &ServeArgs) {
    if let Some(addr) = &args.bind_address {
        config.bind_address = addr.clone();
    }
    if let Some(port) = args.rpc_port {
        config.rpc_port = port;
    }
    config.enable_metrics |= args.metrics;
    if args.disable_cors {
        config.enable_cors = false;
    }
    if let Some(ms) = args.lock_timeout_ms {
        config.access.lock_timeout_ms = ms;
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

async fn serve(config: DaemonConfig) -> anyhow::Result<()> {
    let services = Services::open(&config)?;
    let metrics = Arc::new(ScanMetrics::new().context("registering metrics")?);
    let state = Arc::new(AppState {
        engine: services.engine.clone(),
        presence: services.presence.clone(),
        history: services.history.clone(),
        metrics,
    });
    let options = ServerOptions {
        enable_cors: config.enable_cors,
        enable_metrics: config.enable_metrics,
    };

    tracing::info!(
        data_dir = %config.data_dir.display(),
        lock_timeout_ms = config.access.lock_timeout_ms,
        "Starting gatewatch on {}:{}",
        config.bind_address,
        config.rpc_port,
    );
    RpcServer::new(config.bind_address.clone(), config.rpc_port, state)
        .with_options(options)
        .start(shutdown_signal())
        .await?;
    tracing::info!("gatewatch daemon exited cleanly");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = resolve_config(&cli)?;
    if let Command::Serve(args) = &cli.command {
        apply_serve_args(&mut config, args);
    }

    gatewatch_utils::init_tracing(&config.log_level, config.log_format)?;

    match cli.command {
        Command::Serve(_) => serve(config).await?,
        Command::Config => print!("{}", config.to_toml_string()?),
        Command::Identity { action } => admin::identity(&Services::open(&config)?, action)?,
        Command::Operator { action } => admin::operator(&Services::open(&config)?, action)?,
        Command::Location { action } => admin::location(&Services::open(&config)?, action)?,
        Command::Logs { action } => admin::logs(&Services::open(&config)?, action)?,
        Command::Presence { person } => admin::presence(&Services::open(&config)?, &person)?,
    }

    Ok(())
}
