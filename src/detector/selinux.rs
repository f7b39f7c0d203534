//! SELinux status.

use super::{Detector, DetectorError, HostPaths};
use crate::models::FeatureSet;
use std::sync::Arc;

/// Reports `enabled` when SELinux is in enforcing mode.
pub struct SelinuxDetector {
    host: HostPaths,
}

impl SelinuxDetector {
    pub fn new(host: HostPaths) -> Self {
        Self { host }
    }

    pub fn create(host: &HostPaths) -> Arc<dyn Detector> {
        Arc::new(Self::new(host.clone()))
    }
}

impl Detector for SelinuxDetector {
    fn name(&self) -> &str {
        "selinux"
    }

    fn discover(&self) -> Result<FeatureSet, DetectorError> {
        let enforce = self.host.read_to_string("/sys/fs/selinux/enforce")?;

        let mut features = FeatureSet::new();
        if enforce.trim() == "1" {
            features.insert("enabled".to_string());
        }
        Ok(features)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn host_with_enforce(content: &str) -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("sys/fs/selinux");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("enforce"), content).unwrap();
        temp_dir
    }

    #[test]
    fn test_enforcing() {
        let temp_dir = host_with_enforce("1");
        let detector = SelinuxDetector::new(HostPaths::new(temp_dir.path()));
        assert!(detector.discover().unwrap().contains("enabled"));
    }

    #[test]
    fn test_permissive() {
        let temp_dir = host_with_enforce("0");
        let detector = SelinuxDetector::new(HostPaths::new(temp_dir.path()));
        assert!(detector.discover().unwrap().is_empty());
    }
}
