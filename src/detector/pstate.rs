//! Intel P-State driver.

use super::{Detector, DetectorError, HostPaths};
use crate::models::FeatureSet;
use std::sync::Arc;

/// Reports `turbo` when the intel_pstate driver has turbo boost enabled.
pub struct PstateDetector {
    host: HostPaths,
}

impl PstateDetector {
    pub fn new(host: HostPaths) -> Self {
        Self { host }
    }

    pub fn create(host: &HostPaths) -> Arc<dyn Detector> {
        Arc::new(Self::new(host.clone()))
    }
}

impl Detector for PstateDetector {
    fn name(&self) -> &str {
        "pstate"
    }

    fn discover(&self) -> Result<FeatureSet, DetectorError> {
        if cfg!(any(target_arch = "arm", target_arch = "aarch64")) {
            return Err(DetectorError::Unsupported(
                "pstate is not available on arm".to_string(),
            ));
        }

        let no_turbo = self
            .host
            .read_to_string("/sys/devices/system/cpu/intel_pstate/no_turbo")?;

        let mut features = FeatureSet::new();
        if no_turbo.trim() == "0" {
            features.insert("turbo".to_string());
        }
        Ok(features)
    }
}
