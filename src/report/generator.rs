//! Discovery report rendering.
//!
//! This module renders the outcome of one discovery cycle as plain text or
//! JSON, for `--print-labels` and dry runs with `--no-publish`.

use crate::discovery::Discovery;
use crate::models::{DetectorFailure, Labels};
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Printable summary of one discovery cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryReport {
    /// Node the labels are meant for, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node: Option<String>,
    /// When the cycle finished.
    pub generated_at: DateTime<Utc>,
    /// Labels that passed the whitelist.
    pub labels: Labels,
    /// Detectors that failed.
    pub failures: Vec<DetectorFailure>,
}

impl DiscoveryReport {
    pub fn new(node: Option<String>, discovery: &Discovery) -> Self {
        Self {
            node,
            generated_at: Utc::now(),
            labels: discovery.labels.clone(),
            failures: discovery.failures.clone(),
        }
    }
}

/// Render the report as `key=value` lines followed by any failures.
pub fn generate_text_report(report: &DiscoveryReport) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "# Discovered {} labels at {}",
        report.labels.len(),
        report.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    if let Some(ref node) = report.node {
        output.push_str(&format!(" for node {}", node));
    }
    output.push('\n');

    for (key, value) in &report.labels {
        output.push_str(&format!("{}={}\n", key, value));
    }

    if !report.failures.is_empty() {
        output.push_str(&format!("# {} detectors failed:\n", report.failures.len()));
        for failure in &report.failures {
            output.push_str(&format!("#   {}\n", failure));
        }
    }

    output
}

/// Render the report as pretty-printed JSON.
pub fn generate_json_report(report: &DiscoveryReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}
