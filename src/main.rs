use anyhow::{Context, Result};
use bees_exporter::{
    bees::StatusDir,
    config::Config,
    error::ExporterError,
    sandbox,
    server::{self, AppState},
};
use clap::Parser;
use std::net::IpAddr;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/Default.toml")]
    config: String,

    /// Bees working directory holding the <uuid>.status files (overrides config)
    #[arg(short, long, env = "BEES_WORK_DIR")]
    bees_work_dir: Option<PathBuf>,

    /// Port to listen on for metrics (overrides config)
    #[arg(short, long, env = "EXPORTER_PORT")]
    port: Option<u16>,

    /// Address to bind to (overrides config)
    #[arg(short, long, env = "EXPORTER_ADDR")]
    address: Option<IpAddr>,

    /// Logging level: error, warn, info, debug, trace (overrides config)
    #[arg(short, long, env = "EXPORTER_LOG_LEVEL")]
    log_level: Option<String>,
}

fn init_tracing(level: &str) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(level)
            .map_err(|e| ExporterError::Config(format!("invalid log level '{level}': {e}")))?,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
    Ok(())
}

fn main() -> Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Load configuration, CLI flags win over file and environment
    let mut config = Config::load(&args.config)?;
    if let Some(work_dir) = args.bees_work_dir {
        config.bees.work_dir = work_dir;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(addr) = args.address {
        config.server.addr = addr;
    }
    if let Some(level) = args.log_level {
        config.logging.level = level;
    }

    init_tracing(&config.logging.level)?;

    info!(
        "Starting Bees Prometheus Exporter v{}",
        env!("CARGO_PKG_VERSION")
    );
    info!("Stats directory: {:?}", config.bees.work_dir);

    let dir = StatusDir::open(&config.bees.work_dir)?;

    // Landlock binds the calling thread and its future children, so the
    // policy goes in before the runtime spawns any worker.
    sandbox::install(&dir, config.server.port)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to build async runtime")?;

    if let Err(e) = runtime.block_on(server::start(&config.server, AppState::new(dir))) {
        error!("Server error: {}", e);
        std::process::exit(1);
    }

    Ok(())
}
