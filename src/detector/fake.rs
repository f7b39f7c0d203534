//! Detectors with canned behavior, for trying out a deployment without
//! depending on the host hardware.

use super::{Detector, DetectorError, HostPaths};
use crate::models::FeatureSet;
use std::sync::Arc;

/// Always reports the same three features.
pub struct FakeDetector;

impl FakeDetector {
    pub const FEATURES: [&'static str; 3] = ["fakefeature1", "fakefeature2", "fakefeature3"];

    pub fn create(_host: &HostPaths) -> Arc<dyn Detector> {
        Arc::new(Self)
    }
}

impl Detector for FakeDetector {
    fn name(&self) -> &str {
        "fake"
    }

    fn discover(&self) -> Result<FeatureSet, DetectorError> {
        Ok(Self::FEATURES.iter().map(|f| f.to_string()).collect())
    }
}

/// Panics on every discovery.
pub struct PanicDetector;

impl PanicDetector {
    pub const MESSAGE: &'static str = "fake panic error";

    pub fn create(_host: &HostPaths) -> Arc<dyn Detector> {
        Arc::new(Self)
    }
}

impl Detector for PanicDetector {
    fn name(&self) -> &str {
        "panic_fake"
    }

    fn discover(&self) -> Result<FeatureSet, DetectorError> {
        panic!("{}", Self::MESSAGE)
    }
}
