//! Network device capabilities.

use super::{Detector, DetectorError, HostPaths};
use crate::models::FeatureSet;
use std::sync::Arc;
use tracing::debug;

/// Reports SR-IOV capable (`sriov`) and SR-IOV configured
/// (`sriov-configured`) network interfaces.
pub struct NetworkDetector {
    host: HostPaths,
}

impl NetworkDetector {
    pub fn new(host: HostPaths) -> Self {
        Self { host }
    }

    pub fn create(host: &HostPaths) -> Arc<dyn Detector> {
        Arc::new(Self::new(host.clone()))
    }

    fn read_count(&self, path: &str) -> Option<u32> {
        match self.host.read_to_string(path) {
            Ok(content) => content.trim().parse().ok(),
            Err(e) => {
                debug!("SR-IOV not available: {}", e);
                None
            }
        }
    }
}

impl Detector for NetworkDetector {
    fn name(&self) -> &str {
        "network"
    }

    fn discover(&self) -> Result<FeatureSet, DetectorError> {
        let interfaces = self.host.read_dir_names("/sys/class/net")?;
        let mut features = FeatureSet::new();

        for interface in interfaces {
            let device = format!("/sys/class/net/{}/device", interface);

            let total = self.read_count(&format!("{}/sriov_totalvfs", device));
            if total.unwrap_or(0) == 0 {
                continue;
            }
            features.insert("sriov".to_string());

            let configured = self.read_count(&format!("{}/sriov_numvfs", device));
            if configured.unwrap_or(0) > 0 {
                features.insert("sriov-configured".to_string());
            }
        }

        Ok(features)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use tempfile::TempDir;

    fn add_interface(root: &Path, name: &str, total: Option<&str>, configured: Option<&str>) {
        let device = root.join("sys/class/net").join(name).join("device");
        std::fs::create_dir_all(&device).unwrap();
        if let Some(total) = total {
            std::fs::write(device.join("sriov_totalvfs"), total).unwrap();
        }
        if let Some(configured) = configured {
            std::fs::write(device.join("sriov_numvfs"), configured).unwrap();
        }
    }

    #[test]
    fn test_no_sriov() {
        let temp_dir = TempDir::new().unwrap();
        add_interface(temp_dir.path(), "lo", None, None);
        add_interface(temp_dir.path(), "eth0", Some("0\n"), Some("0\n"));

        let detector = NetworkDetector::new(HostPaths::new(temp_dir.path()));
        assert!(detector.discover().unwrap().is_empty());
    }

    #[test]
    fn test_sriov_capable_and_configured() {
        let temp_dir = TempDir::new().unwrap();
        add_interface(temp_dir.path(), "eth0", Some("8\n"), Some("0\n"));
        add_interface(temp_dir.path(), "eth1", Some("8\n"), Some("4\n"));

        let detector = NetworkDetector::new(HostPaths::new(temp_dir.path()));
        let features = detector.discover().unwrap();
        assert_eq!(features.len(), 2);
        assert!(features.contains("sriov"));
        assert!(features.contains("sriov-configured"));
    }

    #[test]
    fn test_sriov_capable_only() {
        let temp_dir = TempDir::new().unwrap();
        add_interface(temp_dir.path(), "eth0", Some("8\n"), None);

        let detector = NetworkDetector::new(HostPaths::new(temp_dir.path()));
        let features = detector.discover().unwrap();
        assert_eq!(features.into_iter().collect::<Vec<_>>(), vec!["sriov"]);
    }
}
