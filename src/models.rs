//! Data models for node feature discovery.
//!
//! This module contains the core data structures shared by the detectors,
//! the aggregator and the node synchronizer: features, labels and the
//! in-memory representation of a cluster node.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Reserved namespace for every label this agent creates, reads or removes.
pub const LABEL_PREFIX: &str = "node.alpha.kubernetes-incubator.io/nfd";

/// Value written for every feature label. Labels are presence markers only.
pub const LABEL_VALUE: &str = "true";

/// A single detected capability, e.g. `"sse4.2"` or `"present"`.
pub type Feature = String;

/// Features reported by one detector invocation. Duplicates collapse.
pub type FeatureSet = BTreeSet<Feature>;

/// Label key to label value mapping.
pub type Labels = BTreeMap<String, String>;

/// Build the label key for a feature reported by the named detector.
pub fn label_key(detector: &str, feature: &str) -> String {
    format!("{}-{}-{}", LABEL_PREFIX, detector, feature)
}

/// A detector that failed during one discovery cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectorFailure {
    /// Name of the failed detector.
    pub detector: String,
    /// Human readable description of the failure.
    pub error: String,
}

impl fmt::Display for DetectorFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.detector, self.error)
    }
}

/// A cluster node as fetched from the control plane.
///
/// The complete object is kept so that writing it back only changes the
/// labels; every other field round-trips untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Node name (`metadata.name`).
    pub name: String,
    /// Current node labels (`metadata.labels`).
    pub labels: BTreeMap<String, String>,
    object: Value,
}

impl Node {
    /// Create a bare node with the given labels.
    #[cfg(test)]
    pub fn new(name: impl Into<String>, labels: BTreeMap<String, String>) -> Self {
        let name = name.into();
        let object = serde_json::json!({
            "apiVersion": "v1",
            "kind": "Node",
            "metadata": { "name": name },
        });
        Self {
            name,
            labels,
            object,
        }
    }

    /// Build a node from its API representation.
    ///
    /// Returns `None` if the object has no `metadata.name`.
    pub fn from_object(object: Value) -> Option<Self> {
        let metadata = object.get("metadata")?;
        let name = metadata.get("name")?.as_str()?.to_string();
        let labels = metadata
            .get("labels")
            .and_then(Value::as_object)
            .map(|map| {
                map.iter()
                    .filter_map(|(k, v)| v.as_str().map(|v| (k.clone(), v.to_string())))
                    .collect()
            })
            .unwrap_or_default();

        Some(Self {
            name,
            labels,
            object,
        })
    }

    /// Produce the API representation with the current labels applied.
    pub fn to_object(&self) -> Value {
        let mut object = self.object.clone();
        let labels: serde_json::Map<String, Value> = self
            .labels
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect();

        if let Some(metadata) = object.get_mut("metadata").and_then(Value::as_object_mut) {
            metadata.insert("labels".to_string(), Value::Object(labels));
        }

        object
    }

    /// Remove every label whose key starts with `prefix`.
    pub fn remove_labels(&mut self, prefix: &str) {
        self.labels.retain(|key, _| !key.starts_with(prefix));
    }

    /// Set or overwrite each of the given labels.
    pub fn add_labels(&mut self, labels: &Labels) {
        for (key, value) in labels {
            self.labels.insert(key.clone(), value.clone());
        }
    }
}
