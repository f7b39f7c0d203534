//! IOMMU support.

use super::{Detector, DetectorError, HostPaths};
use crate::models::FeatureSet;
use std::sync::Arc;

/// Reports `enabled` when the kernel exposes at least one IOMMU.
pub struct IommuDetector {
    host: HostPaths,
}

impl IommuDetector {
    pub fn new(host: HostPaths) -> Self {
        Self { host }
    }

    pub fn create(host: &HostPaths) -> Arc<dyn Detector> {
        Arc::new(Self::new(host.clone()))
    }
}

impl Detector for IommuDetector {
    fn name(&self) -> &str {
        "iommu"
    }

    fn discover(&self) -> Result<FeatureSet, DetectorError> {
        let devices = self.host.read_dir_names("/sys/class/iommu")?;

        let mut features = FeatureSet::new();
        if !devices.is_empty() {
            features.insert("enabled".to_string());
        }
        Ok(features)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_iommu_enabled() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::create_dir_all(temp_dir.path().join("sys/class/iommu/dmar0")).unwrap();

        let detector = IommuDetector::new(HostPaths::new(temp_dir.path()));
        let features = detector.discover().unwrap();
        assert!(features.contains("enabled"));
    }

    #[test]
    fn test_iommu_class_empty() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::create_dir_all(temp_dir.path().join("sys/class/iommu")).unwrap();

        let detector = IommuDetector::new(HostPaths::new(temp_dir.path()));
        assert!(detector.discover().unwrap().is_empty());
    }

    #[test]
    fn test_iommu_class_missing() {
        let temp_dir = TempDir::new().unwrap();
        let detector = IommuDetector::new(HostPaths::new(temp_dir.path()));
        assert!(detector.discover().is_err());
    }
}
