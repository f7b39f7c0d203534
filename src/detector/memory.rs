//! Memory topology.

use super::{Detector, DetectorError, HostPaths};
use crate::models::FeatureSet;
use std::sync::Arc;

/// Reports `numa` when more than one memory node is online.
pub struct MemoryDetector {
    host: HostPaths,
}

impl MemoryDetector {
    pub fn new(host: HostPaths) -> Self {
        Self { host }
    }

    pub fn create(host: &HostPaths) -> Arc<dyn Detector> {
        Arc::new(Self::new(host.clone()))
    }

    fn is_numa(&self) -> Result<bool, DetectorError> {
        // "0" with a single node, a range or list like "0-3" otherwise.
        let online = self.host.read_to_string("/sys/devices/system/node/online")?;
        Ok(online.trim() != "0")
    }
}

impl Detector for MemoryDetector {
    fn name(&self) -> &str {
        "memory"
    }

    fn discover(&self) -> Result<FeatureSet, DetectorError> {
        let mut features = FeatureSet::new();
        if self.is_numa()? {
            features.insert("numa".to_string());
        }
        Ok(features)
    }
}
