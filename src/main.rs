//! nfd - Node Feature Discovery for Kubernetes
//!
//! A node agent that detects hardware features of the machine it runs on
//! and advertises them as labels on the node object, so workloads can be
//! scheduled onto nodes with the capabilities they need.
//!
//! Exit codes:
//!   0 - Success (or shutdown requested in continuous mode)
//!   1 - Startup error, or the one-shot publish failed

mod cli;
mod config;
mod detector;
mod discovery;
mod models;
mod orchestrator;
mod publish;
mod report;

use anyhow::{Context, Result};
use cli::Args;
use config::{Config, DEFAULT_CONFIG_FILE};
use orchestrator::Orchestrator;
use publish::{KubeApi, KubeConfig};
use tracing::level_filters::LevelFilter;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    init_logging(&args);

    info!("nfd v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run(args).await {
        Ok(exit_code) => std::process::exit(exit_code),
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .nfd.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(DEFAULT_CONFIG_FILE);

    if path.exists() {
        eprintln!("{} already exists. Remove it first or edit it manually.", DEFAULT_CONFIG_FILE);
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", DEFAULT_CONFIG_FILE))?;

    println!("Created {} with default settings.", DEFAULT_CONFIG_FILE);
    Ok(())
}

/// Initialize logging. `RUST_LOG` wins over the verbosity flags.
fn init_logging(args: &Args) {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(args.log_level()).into())
        .from_env_lossy();

    // Logs go to stderr so printed labels stay machine readable.
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Build the runtime configuration and run the labeling loop.
async fn run(args: Args) -> Result<i32> {
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    let mut runtime = config.to_runtime().context("Invalid configuration")?;
    runtime.print_labels = args.print_labels || (runtime.oneshot && runtime.no_publish);
    runtime.format = args.format;

    let sources: Vec<&str> = runtime.detectors.iter().map(|d| d.name()).collect();
    info!("Enabled sources: [{}]", sources.join(", "));
    if !runtime.whitelist.as_str().is_empty() {
        info!("Label whitelist: {}", runtime.whitelist.as_str());
    }
    if runtime.oneshot {
        info!("Running a single labeling cycle");
    } else {
        info!("Labeling every {:?}", runtime.interval);
    }

    let api = KubeApi::new(KubeConfig::from(&config.kubernetes));
    let orchestrator =
        Orchestrator::new(runtime, api).with_node_name(config.kubernetes.node_name.clone());

    Ok(orchestrator.run(shutdown_signal()).await)
}

/// Resolves on Ctrl-C / SIGINT, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // A default file that exists but does not parse is fatal
    match Config::load_default()? {
        Some(config) => {
            info!("Loaded default config from {}", DEFAULT_CONFIG_FILE);
            Ok(config)
        }
        None => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
    }
}
