//! Feature detectors.
//!
//! Every capability domain (CPU flags, IOMMU, NUMA, ...) is covered by one
//! [`Detector`]. Detectors are looked up by name in a static registry so the
//! enabled set can be chosen from configuration.

pub mod cpuid;
pub mod fake;
pub mod gpu;
pub mod iommu;
pub mod memory;
pub mod network;
pub mod pstate;
pub mod rdt;
pub mod selinux;
pub mod storage;

use crate::models::FeatureSet;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Errors a detector can report from [`Detector::discover`].
#[derive(Debug, Error)]
pub enum DetectorError {
    /// A host file or directory could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An external probe command failed.
    #[error("command `{command}` failed: {reason}")]
    Command { command: String, reason: String },

    /// The capability cannot be probed on this platform.
    #[error("not supported: {0}")]
    Unsupported(String),

    /// The detector panicked; the panic was contained.
    #[error("detector panicked: {0}")]
    Panicked(String),

    /// Any other detector specific failure.
    #[error("{0}")]
    Failed(String),
}

/// A pluggable probe for one capability domain of the host.
///
/// Implementations must report failures through the returned error. A
/// panic is still contained by the discovery layer, but it is a bug.
pub trait Detector: Send + Sync {
    /// Stable identifier, used verbatim in every label key.
    fn name(&self) -> &str;

    /// Probe the host and return the detected features.
    ///
    /// An empty set is a valid result and produces no labels.
    fn discover(&self) -> Result<FeatureSet, DetectorError>;
}

/// Resolves absolute host paths below a configurable root.
///
/// When running in a container the host's `/sys` and `/proc` are usually
/// mounted somewhere else, e.g. `/host`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostPaths {
    root: PathBuf,
}

impl Default for HostPaths {
    fn default() -> Self {
        Self::new("/")
    }
}

impl HostPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Map an absolute host path below the root.
    pub fn join(&self, path: &str) -> PathBuf {
        self.root.join(path.trim_start_matches('/'))
    }

    /// Read a host file to a string.
    pub fn read_to_string(&self, path: &str) -> Result<String, DetectorError> {
        let full = self.join(path);
        fs::read_to_string(&full).map_err(|source| DetectorError::Io { path: full, source })
    }

    /// List the entry names of a host directory, sorted.
    pub fn read_dir_names(&self, path: &str) -> Result<Vec<String>, DetectorError> {
        let full = self.join(path);
        let entries = fs::read_dir(&full).map_err(|source| DetectorError::Io {
            path: full.clone(),
            source,
        })?;

        let mut names: Vec<String> = entries
            .flatten()
            .map(|entry| entry.file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        Ok(names)
    }
}

type Constructor = fn(&HostPaths) -> Arc<dyn Detector>;

/// Every detector that can be enabled by name.
static REGISTRY: &[(&str, Constructor)] = &[
    ("cpuid", cpuid::CpuidDetector::create),
    ("iommu", iommu::IommuDetector::create),
    ("memory", memory::MemoryDetector::create),
    ("network", network::NetworkDetector::create),
    ("pstate", pstate::PstateDetector::create),
    ("rdt", rdt::RdtDetector::create),
    ("selinux", selinux::SelinuxDetector::create),
    ("storage", storage::StorageDetector::create),
    ("gpu", gpu::GpuDetector::create),
    ("fake", fake::FakeDetector::create),
    ("panic_fake", fake::PanicDetector::create),
];

/// Detectors enabled when no explicit list is configured.
pub const DEFAULT_SOURCES: &[&str] = &[
    "cpuid", "iommu", "memory", "network", "pstate", "rdt", "selinux", "storage", "gpu",
];

/// Names of all registered detectors.
pub fn known_sources() -> impl Iterator<Item = &'static str> {
    REGISTRY.iter().map(|(name, _)| *name)
}

/// Construct the detector registered under `name`.
pub fn create(name: &str, host: &HostPaths) -> Option<Arc<dyn Detector>> {
    REGISTRY
        .iter()
        .find(|(registered, _)| *registered == name)
        .map(|(_, constructor)| constructor(host))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_registry_contains_defaults() {
        let known: Vec<_> = known_sources().collect();
        for name in DEFAULT_SOURCES {
            assert!(known.contains(name), "{} not registered", name);
        }
        assert!(known.contains(&"fake"));
        assert!(!DEFAULT_SOURCES.contains(&"fake"));
    }

    #[test]
    fn test_create_uses_registered_name() {
        let host = HostPaths::default();
        for name in known_sources() {
            let detector = create(name, &host).unwrap();
            assert_eq!(detector.name(), name);
        }
        assert!(create("nonexistent", &host).is_none());
    }

    #[test]
    fn test_host_paths_join() {
        let host = HostPaths::new("/host");
        assert_eq!(
            host.join("/sys/class/iommu"),
            PathBuf::from("/host/sys/class/iommu")
        );
        assert_eq!(HostPaths::default().join("/proc/cpuinfo"), PathBuf::from("/proc/cpuinfo"));
    }

    #[test]
    fn test_host_paths_read_dir_names() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::create_dir_all(temp_dir.path().join("sys/block/sdb")).unwrap();
        std::fs::create_dir_all(temp_dir.path().join("sys/block/sda")).unwrap();

        let host = HostPaths::new(temp_dir.path());
        assert_eq!(host.read_dir_names("/sys/block").unwrap(), vec!["sda", "sdb"]);

        let err = host.read_dir_names("/sys/missing").unwrap_err();
        assert!(matches!(err, DetectorError::Io { .. }));
    }
}
