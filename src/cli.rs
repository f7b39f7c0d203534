//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap. Options that can
//! also come from the config file are optional here so the file value is
//! only overridden when a flag is actually given.

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// nfd - Node Feature Discovery for Kubernetes
///
/// Detects hardware features available on the node and advertises them
/// as node labels.
///
/// Examples:
///   nfd
///   nfd --oneshot --no-publish --print-labels
///   nfd --sources=cpuid,rdt --label-whitelist='.*rdt.*'
///   nfd --sleep-interval=30s
///   nfd --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Detectors to enable (comma-separated)
    ///
    /// Known: cpuid, iommu, memory, network, pstate, rdt, selinux, storage,
    /// gpu. Defaults to all of them.
    #[arg(long, value_name = "NAMES", value_delimiter = ',')]
    pub sources: Option<Vec<String>>,

    /// Regular expression a label key must match to be published
    ///
    /// An empty expression publishes every label.
    #[arg(long, value_name = "REGEX")]
    pub label_whitelist: Option<String>,

    /// Time to sleep between labeling cycles
    ///
    /// Accepts values such as 500ms, 30s, 5m, 1h or 1m30s. Default: 60s.
    #[arg(long, value_name = "DURATION", value_parser = parse_duration)]
    pub sleep_interval: Option<Duration>,

    /// Label once and exit
    #[arg(long)]
    pub oneshot: bool,

    /// Do not publish discovered features to the cluster
    #[arg(long)]
    pub no_publish: bool,

    /// Name of the node to label
    #[arg(long, value_name = "NAME", env = "NODE_NAME")]
    pub node_name: Option<String>,

    /// Kubernetes API server URL
    ///
    /// Defaults to the in-cluster service address.
    #[arg(long, value_name = "URL", env = "NFD_API_SERVER")]
    pub api_server: Option<String>,

    /// Directory where the host's /sys and /proc are mounted
    #[arg(long, value_name = "DIR", env = "NFD_HOST_ROOT")]
    pub host_root: Option<PathBuf>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .nfd.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print the discovered labels to stdout after every cycle
    #[arg(long)]
    pub print_labels: bool,

    /// Output format for printed labels (text, json)
    #[arg(long, default_value = "text", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (errors only)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .nfd.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for printed labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// One key=value per line (default)
    #[default]
    Text,
    /// JSON document
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(ref root) = self.host_root {
            if !root.is_dir() {
                return Err(format!("Host root is not a directory: {}", root.display()));
            }
        }

        if let Some(ref server) = self.api_server {
            if !server.starts_with("http://") && !server.starts_with("https://") {
                return Err("API server URL must start with 'http://' or 'https://'".to_string());
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

/// Parse a duration such as `60s`, `500ms`, `5m`, `1h` or `1m30s`.
///
/// A bare number is taken as seconds. Zero is rejected.
pub fn parse_duration(input: &str) -> Result<Duration, String> {
    let input = input.trim();
    if input.is_empty() {
        return Err("empty duration".to_string());
    }

    if let Ok(secs) = input.parse::<u64>() {
        return non_zero(Duration::from_secs(secs));
    }

    let mut total = Duration::ZERO;
    let mut rest = input;

    while !rest.is_empty() {
        let digits = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
        if digits == 0 {
            return Err(format!("invalid duration '{}'", input));
        }
        let value: u64 = rest[..digits]
            .parse()
            .map_err(|_| format!("invalid duration '{}'", input))?;
        rest = &rest[digits..];

        let unit_len = rest.find(|c: char| c.is_ascii_digit()).unwrap_or(rest.len());
        let unit = &rest[..unit_len];
        rest = &rest[unit_len..];

        let part = match unit {
            "ms" => Some(Duration::from_millis(value)),
            "s" => Some(Duration::from_secs(value)),
            "m" => value.checked_mul(60).map(Duration::from_secs),
            "h" => value.checked_mul(3600).map(Duration::from_secs),
            _ => return Err(format!("unknown unit '{}' in duration '{}'", unit, input)),
        };
        total = part
            .and_then(|part| total.checked_add(part))
            .ok_or_else(|| format!("duration too large '{}'", input))?;
    }

    non_zero(total)
}

fn non_zero(duration: Duration) -> Result<Duration, String> {
    if duration.is_zero() {
        Err("duration must be greater than zero".to_string())
    } else {
        Ok(duration)
    }
}
