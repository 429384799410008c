//! MU Launcher RPC Server - JSON-RPC backend for the launcher shell.
//!
//! This binary wraps `mu-launcher-core` in a JSON-RPC 2.0 server. The shell
//! reads the bound port from the `RPC_PORT=` line on stdout.

mod event_queue;
mod handlers;
mod server;

use anyhow::{Context, Result};
use clap::Parser;
use mu_launcher_core::config::{AppConfig, PathsConfig};
use mu_launcher_core::LauncherApi;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

#[derive(Parser, Debug)]
#[command(name = "mu-launcher-rpc")]
#[command(about = "JSON-RPC server for the MU Online launcher")]
struct Args {
    /// Port to listen on (0 = auto-assign)
    #[arg(short, long, default_value = "0")]
    port: u16,

    /// Host to bind to
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Emit console logs as JSON lines
    #[arg(long)]
    json_logs: bool,

    /// Launcher root directory (defaults to the executable's directory)
    #[arg(long)]
    launcher_root: Option<PathBuf>,
}

/// The directory holding the binary, where the game files live.
fn default_launcher_root() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .or_else(|| dirs::data_local_dir().map(|dir| dir.join(AppConfig::APP_NAME)))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Console output on stderr plus a plain-text file under `<root>/logs/`.
///
/// Returns the log file path, or `None` when the file could not be opened.
fn init_logging(args: &Args, launcher_root: &Path) -> Option<PathBuf> {
    let filter = if args.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    let console = if args.json_logs {
        fmt::layer().json().with_writer(std::io::stderr).boxed()
    } else {
        fmt::layer()
            .compact()
            .with_target(false)
            .with_writer(std::io::stderr)
            .boxed()
    };

    let log_dir = launcher_root.join(PathsConfig::LOGS_DIR_NAME);
    let log_path = log_dir.join(PathsConfig::LOG_FILE_NAME);
    let log_file = std::fs::create_dir_all(&log_dir)
        .and_then(|_| OpenOptions::new().create(true).append(true).open(&log_path))
        .ok();
    let opened = log_file.is_some();
    let file = log_file.map(|file| {
        fmt::layer()
            .with_ansi(false)
            .with_writer(Mutex::new(file))
    });

    tracing_subscriber::registry()
        .with(console)
        .with(file)
        .with(filter)
        .init();

    opened.then_some(log_path)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let launcher_root = args
        .launcher_root
        .clone()
        .unwrap_or_else(default_launcher_root);

    match init_logging(&args, &launcher_root) {
        Some(path) => info!("Logging to {}", path.display()),
        None => warn!("Log file unavailable, logging to console only"),
    }

    info!("Starting MU Launcher RPC Server");
    info!("Launcher root: {}", launcher_root.display());

    let api = LauncherApi::builder(&launcher_root)
        .auto_create_dirs(true)
        .build()
        .await
        .with_context(|| format!("failed to initialize launcher at {}", launcher_root.display()))?;

    let server = server::start_server(api.clone(), &args.host, args.port).await?;

    // Print port for the shell to read (intentional stdout for IPC)
    println!("RPC_PORT={}", server.addr.port());

    info!("RPC server running on {}", server.addr);

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            result?;
            info!("Shutdown signal received, exiting");
        }
        _ = server.shutdown.cancelled() => info!("Shutdown requested over RPC"),
    }

    server.shutdown.cancel();
    api.shutdown().await;
    Ok(())
}
