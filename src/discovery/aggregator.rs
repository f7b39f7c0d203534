//! Label aggregation.
//!
//! This module runs every enabled detector, turns the reported features into
//! namespaced label keys and applies the label whitelist.

use super::isolation::discover_isolated;
use super::whitelist::LabelWhitelist;
use crate::detector::{Detector, DetectorError};
use crate::models::{label_key, DetectorFailure, FeatureSet, Labels, LABEL_VALUE};
use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, warn};

/// Outcome of one discovery pass over all enabled detectors.
#[derive(Debug, Clone, Default)]
pub struct Discovery {
    /// Labels to publish, already filtered by the whitelist.
    pub labels: Labels,
    /// Detectors that failed or panicked, in detector order.
    pub failures: Vec<DetectorFailure>,
}

impl Discovery {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Build the labels for one detector's features, without filtering.
pub fn feature_labels(detector: &str, features: &FeatureSet) -> Labels {
    features
        .iter()
        .map(|feature| (label_key(detector, feature), LABEL_VALUE.to_string()))
        .collect()
}

/// Run one detector under the fault-isolation boundary and label its features.
pub async fn discover_labels(detector: Arc<dyn Detector>) -> Result<Labels, DetectorError> {
    let name = detector.name().to_string();
    let features = discover_isolated(detector).await?;
    Ok(feature_labels(&name, &features))
}

/// Run all detectors concurrently and build the filtered label set.
///
/// A failing or panicking detector contributes no labels; its error is
/// recorded in [`Discovery::failures`] and the others are unaffected.
pub async fn build_labels(
    detectors: &[Arc<dyn Detector>],
    whitelist: &LabelWhitelist,
) -> Discovery {
    let runs = detectors.iter().map(|detector| {
        let name = detector.name().to_string();
        let detector = Arc::clone(detector);
        async move { (name, discover_labels(detector).await) }
    });

    let mut discovery = Discovery::default();

    for (name, result) in join_all(runs).await {
        match result {
            Ok(labels) => {
                for (key, value) in labels {
                    if whitelist.is_match(&key) {
                        discovery.labels.insert(key, value);
                    } else {
                        debug!("{} does not match the whitelist", key);
                    }
                }
            }
            Err(e) => {
                warn!("Discovery failed for {}: {}", name, e);
                discovery.failures.push(DetectorFailure {
                    detector: name,
                    error: e.to_string(),
                });
            }
        }
    }

    discovery
}
