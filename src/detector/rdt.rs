//! Intel Resource Director Technology.

use super::cpuid::read_cpu_flags;
use super::{Detector, DetectorError, HostPaths};
use crate::models::FeatureSet;
use std::sync::Arc;

/// CPU flag to RDT feature name.
const RDT_FLAGS: &[(&str, &str)] = &[
    ("cqm", "RDTMON"),
    ("cqm_llc", "RDTMON"),
    ("cat_l3", "RDTL3CA"),
    ("cat_l2", "RDTL2CA"),
    ("mba", "RDTMBA"),
];

/// Reports cache monitoring and allocation capabilities.
pub struct RdtDetector {
    host: HostPaths,
}

impl RdtDetector {
    pub fn new(host: HostPaths) -> Self {
        Self { host }
    }

    pub fn create(host: &HostPaths) -> Arc<dyn Detector> {
        Arc::new(Self::new(host.clone()))
    }
}

impl Detector for RdtDetector {
    fn name(&self) -> &str {
        "rdt"
    }

    fn discover(&self) -> Result<FeatureSet, DetectorError> {
        let flags = read_cpu_flags(&self.host)?;

        Ok(RDT_FLAGS
            .iter()
            .filter(|(flag, _)| flags.iter().any(|f| f == flag))
            .map(|(_, feature)| feature.to_string())
            .collect())
    }
}
