//! Configuration file handling.
//!
//! This module handles loading `.nfd.toml`, merging it with command-line
//! arguments and turning the result into the validated, immutable
//! [`RuntimeConfig`] the orchestrator runs with.

use crate::cli::{parse_duration, OutputFormat};
use crate::detector::{self, Detector, HostPaths, DEFAULT_SOURCES};
use crate::discovery::LabelWhitelist;
use crate::publish::kube::SERVICE_ACCOUNT_DIR;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Default config file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = ".nfd.toml";

/// Errors found while validating the merged configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown source '{name}' (known: {known})")]
    UnknownSource { name: String, known: String },

    #[error("invalid label whitelist '{pattern}': {source}")]
    InvalidWhitelist {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("invalid sleep interval '{value}': {reason}")]
    InvalidInterval { value: String, reason: String },
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Scheduling settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Detector and label settings.
    #[serde(default)]
    pub discovery: DiscoveryConfig,

    /// Control plane settings.
    #[serde(default)]
    pub kubernetes: KubernetesConfig,
}

/// Scheduling settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Time between labeling cycles, e.g. "60s" or "5m".
    #[serde(default = "default_sleep_interval")]
    pub sleep_interval: String,

    /// Run a single cycle and exit.
    #[serde(default)]
    pub oneshot: bool,

    /// Discover features without touching the node object.
    #[serde(default)]
    pub no_publish: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            sleep_interval: default_sleep_interval(),
            oneshot: false,
            no_publish: false,
        }
    }
}

fn default_sleep_interval() -> String {
    "60s".to_string()
}

/// Detector and label settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// Enabled detectors, by name.
    #[serde(default = "default_sources")]
    pub sources: Vec<String>,

    /// Regular expression label keys must match. Empty matches all.
    #[serde(default)]
    pub label_whitelist: String,

    /// Where the host's /sys and /proc are visible.
    #[serde(default = "default_host_root")]
    pub host_root: PathBuf,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            sources: default_sources(),
            label_whitelist: String::new(),
            host_root: default_host_root(),
        }
    }
}

fn default_sources() -> Vec<String> {
    DEFAULT_SOURCES.iter().map(|s| s.to_string()).collect()
}

fn default_host_root() -> PathBuf {
    PathBuf::from("/")
}

/// Kubernetes API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KubernetesConfig {
    /// API server URL. Empty means the in-cluster address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_server: Option<String>,

    /// Name of the node to label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_name: Option<String>,

    /// Service account token file.
    #[serde(default = "default_token_path")]
    pub token_path: PathBuf,

    /// CA bundle for the API server certificate.
    #[serde(default = "default_ca_path")]
    pub ca_path: PathBuf,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for KubernetesConfig {
    fn default() -> Self {
        Self {
            api_server: None,
            node_name: None,
            token_path: default_token_path(),
            ca_path: default_ca_path(),
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_token_path() -> PathBuf {
    Path::new(SERVICE_ACCOUNT_DIR).join("token")
}

fn default_ca_path() -> PathBuf {
    Path::new(SERVICE_ACCOUNT_DIR).join("ca.crt")
}

fn default_timeout() -> u64 {
    30
}

/// Validated settings for one agent run. Built once, never modified.
pub struct RuntimeConfig {
    /// Sleep between the end of one cycle and the start of the next.
    pub interval: Duration,
    /// Stop after the first cycle.
    pub oneshot: bool,
    /// Never contact the control plane.
    pub no_publish: bool,
    /// Enabled detectors, in configuration order.
    pub detectors: Vec<Arc<dyn Detector>>,
    /// Filter applied to every label key.
    pub whitelist: LabelWhitelist,
    /// Print each cycle's labels to stdout.
    pub print_labels: bool,
    /// Format for printed labels.
    pub format: OutputFormat,
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        Self::load_if_exists(Path::new(DEFAULT_CONFIG_FILE))
    }

    /// Load `path` if it exists. A file that exists but is malformed is an error.
    pub fn load_if_exists(path: &Path) -> Result<Option<Self>> {
        if path.exists() {
            Ok(Some(Self::load(path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings. Only values
    /// given explicitly on the command line override the file.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(interval) = args.sleep_interval {
            self.general.sleep_interval = format!("{}ms", interval.as_millis());
        }

        // Flags can only switch these on
        if args.oneshot {
            self.general.oneshot = true;
        }
        if args.no_publish {
            self.general.no_publish = true;
        }

        if let Some(ref sources) = args.sources {
            self.discovery.sources = sources.clone();
        }
        if let Some(ref whitelist) = args.label_whitelist {
            self.discovery.label_whitelist = whitelist.clone();
        }
        if let Some(ref root) = args.host_root {
            self.discovery.host_root = root.clone();
        }

        if args.node_name.is_some() {
            self.kubernetes.node_name = args.node_name.clone();
        }
        if args.api_server.is_some() {
            self.kubernetes.api_server = args.api_server.clone();
        }
    }

    /// Validate the configuration and build the runtime settings.
    ///
    /// Unknown detector names and an invalid whitelist are errors. Empty
    /// source names are ignored, so `--sources=` enables no detectors.
    pub fn to_runtime(&self) -> Result<RuntimeConfig, ConfigError> {
        let interval =
            parse_duration(&self.general.sleep_interval).map_err(|reason| {
                ConfigError::InvalidInterval {
                    value: self.general.sleep_interval.clone(),
                    reason,
                }
            })?;

        let whitelist = LabelWhitelist::new(&self.discovery.label_whitelist).map_err(|source| {
            ConfigError::InvalidWhitelist {
                pattern: self.discovery.label_whitelist.clone(),
                source,
            }
        })?;

        let detectors = self.enabled_detectors()?;

        Ok(RuntimeConfig {
            interval,
            oneshot: self.general.oneshot,
            no_publish: self.general.no_publish,
            detectors,
            whitelist,
            print_labels: false,
            format: OutputFormat::default(),
        })
    }

    fn enabled_detectors(&self) -> Result<Vec<Arc<dyn Detector>>, ConfigError> {
        let host = HostPaths::new(&self.discovery.host_root);
        let mut detectors: Vec<Arc<dyn Detector>> = Vec::new();

        for name in self.discovery.sources.iter().map(|s| s.trim()) {
            if name.is_empty() || detectors.iter().any(|d| d.name() == name) {
                continue;
            }

            let detector =
                detector::create(name, &host).ok_or_else(|| ConfigError::UnknownSource {
                    name: name.to_string(),
                    known: detector::known_sources().collect::<Vec<_>>().join(", "),
                })?;
            detectors.push(detector);
        }

        Ok(detectors)
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
