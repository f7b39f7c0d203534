//! Labeling cycle orchestration.
//!
//! One tick runs every enabled detector, aggregates the labels and, unless
//! publishing is disabled, reconciles them onto the node. Ticks run back to
//! back with a fixed sleep in between; a tick is never interrupted.

use crate::cli::OutputFormat;
use crate::config::RuntimeConfig;
use crate::discovery::{build_labels, Discovery};
use crate::publish::{advertise_labels, NodeApi, PublishError};
use crate::report::{generate_json_report, generate_text_report, DiscoveryReport};
use std::future::Future;
use tracing::{debug, error, info, warn};

/// Exit code after a successful run.
pub const EXIT_SUCCESS: i32 = 0;

/// Exit code when the one-shot publish failed.
pub const EXIT_PUBLISH_FAILED: i32 = 1;

/// What happened to the labels of one tick.
#[derive(Debug)]
pub enum PublishOutcome {
    /// Publishing is disabled; the control plane was not contacted.
    Skipped,
    /// The node was updated.
    Published,
    /// Synchronization failed; nothing was written.
    Failed(PublishError),
}

impl PublishOutcome {
    /// The synchronization error, if publishing failed.
    pub fn error(&self) -> Option<&PublishError> {
        match self {
            PublishOutcome::Failed(e) => Some(e),
            _ => None,
        }
    }
}

/// Result of one tick.
#[derive(Debug)]
pub struct Tick {
    pub discovery: Discovery,
    pub publish: PublishOutcome,
}

/// Drives discovery and publishing.
pub struct Orchestrator<A: NodeApi> {
    config: RuntimeConfig,
    api: A,
    node_name: Option<String>,
}

impl<A: NodeApi> Orchestrator<A> {
    pub fn new(config: RuntimeConfig, api: A) -> Self {
        Self {
            config,
            api,
            node_name: None,
        }
    }

    /// Node name shown in printed reports.
    pub fn with_node_name(mut self, node_name: Option<String>) -> Self {
        self.node_name = node_name;
        self
    }

    #[cfg(test)]
    pub fn api(&self) -> &A {
        &self.api
    }

    /// Run a single discovery and publish cycle.
    pub async fn tick(&self) -> Tick {
        let discovery = build_labels(&self.config.detectors, &self.config.whitelist).await;

        info!(
            "Discovered {} labels from {} detectors ({} failed)",
            discovery.labels.len(),
            self.config.detectors.len(),
            discovery.failures.len()
        );
        if !discovery.is_complete() {
            let failed: Vec<&str> = discovery
                .failures
                .iter()
                .map(|f| f.detector.as_str())
                .collect();
            warn!("Labels from [{}] are missing this cycle", failed.join(", "));
        }
        for (key, value) in &discovery.labels {
            debug!("{} = {}", key, value);
        }

        if self.config.print_labels {
            self.print_report(&discovery);
        }

        let publish = if self.config.no_publish {
            debug!("Publishing disabled, skipping node update");
            PublishOutcome::Skipped
        } else {
            match advertise_labels(&self.api, &discovery.labels).await {
                Ok(()) => PublishOutcome::Published,
                Err(e) => {
                    error!("Failed to advertise labels: {}", e);
                    PublishOutcome::Failed(e)
                }
            }
        };

        Tick { discovery, publish }
    }

    /// Run ticks until one-shot completion or until `shutdown` resolves.
    ///
    /// Returns the process exit code. The shutdown future is only observed
    /// while sleeping between ticks.
    pub async fn run<F>(&self, shutdown: F) -> i32
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        loop {
            let tick = self.tick().await;

            if self.config.oneshot {
                if let Some(e) = tick.publish.error() {
                    error!("Single cycle could not publish labels: {}", e);
                    return EXIT_PUBLISH_FAILED;
                }
                info!(
                    "Single cycle finished with {} labels",
                    tick.discovery.labels.len()
                );
                return EXIT_SUCCESS;
            }

            debug!("Sleeping for {:?}", self.config.interval);
            tokio::select! {
                _ = tokio::time::sleep(self.config.interval) => {}
                _ = &mut shutdown => {
                    info!("Shutdown requested, stopping");
                    return EXIT_SUCCESS;
                }
            }
        }
    }

    fn print_report(&self, discovery: &Discovery) {
        let report = DiscoveryReport::new(self.node_name.clone(), discovery);
        match self.config.format {
            OutputFormat::Text => print!("{}", generate_text_report(&report)),
            OutputFormat::Json => match generate_json_report(&report) {
                Ok(json) => println!("{}", json),
                Err(e) => warn!("Failed to render labels as JSON: {}", e),
            },
        }
    }
}
