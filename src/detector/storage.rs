//! Block storage.

use super::{Detector, DetectorError, HostPaths};
use crate::models::FeatureSet;
use std::sync::Arc;

/// Reports `nonrotationaldisk` when any block device is non-rotational (SSD).
pub struct StorageDetector {
    host: HostPaths,
}

impl StorageDetector {
    pub fn new(host: HostPaths) -> Self {
        Self { host }
    }

    pub fn create(host: &HostPaths) -> Arc<dyn Detector> {
        Arc::new(Self::new(host.clone()))
    }
}

impl Detector for StorageDetector {
    fn name(&self) -> &str {
        "storage"
    }

    fn discover(&self) -> Result<FeatureSet, DetectorError> {
        let devices = self.host.read_dir_names("/sys/block")?;

        let non_rotational = devices.iter().any(|device| {
            self.host
                .read_to_string(&format!("/sys/block/{}/queue/rotational", device))
                .map(|rotational| rotational.trim() == "0")
                .unwrap_or(false)
        });

        let mut features = FeatureSet::new();
        if non_rotational {
            features.insert("nonrotationaldisk".to_string());
        }
        Ok(features)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use tempfile::TempDir;

    fn add_device(root: &Path, name: &str, rotational: &str) {
        let queue = root.join("sys/block").join(name).join("queue");
        std::fs::create_dir_all(&queue).unwrap();
        std::fs::write(queue.join("rotational"), rotational).unwrap();
    }

    #[test]
    fn test_ssd_present() {
        let temp_dir = TempDir::new().unwrap();
        add_device(temp_dir.path(), "sda", "1\n");
        add_device(temp_dir.path(), "nvme0n1", "0\n");

        let detector = StorageDetector::new(HostPaths::new(temp_dir.path()));
        assert!(detector.discover().unwrap().contains("nonrotationaldisk"));
    }

    #[test]
    fn test_only_spinning_disks() {
        let temp_dir = TempDir::new().unwrap();
        add_device(temp_dir.path(), "sda", "1\n");

        let detector = StorageDetector::new(HostPaths::new(temp_dir.path()));
        assert!(detector.discover().unwrap().is_empty());
    }
}
