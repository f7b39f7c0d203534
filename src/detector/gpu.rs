//! Accelerator presence.

use super::{Detector, DetectorError, HostPaths};
use crate::models::FeatureSet;
use std::process::Command;
use std::sync::Arc;
use tracing::debug;

/// Probe script shipped in the agent image; exits non-zero without a GPU.
const PROBE_COMMAND: &str = "find_nvidia_display_adapter.sh";

/// Reports `present` when the GPU probe command succeeds.
pub struct GpuDetector {
    command: String,
}

impl Default for GpuDetector {
    fn default() -> Self {
        Self::with_command(PROBE_COMMAND)
    }
}

impl GpuDetector {
    /// Use a different probe command.
    pub fn with_command(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    pub fn create(_host: &HostPaths) -> Arc<dyn Detector> {
        Arc::new(Self::default())
    }
}

impl Detector for GpuDetector {
    fn name(&self) -> &str {
        "gpu"
    }

    fn discover(&self) -> Result<FeatureSet, DetectorError> {
        debug!("Running GPU probe: {}", self.command);

        let output = Command::new(&self.command)
            .output()
            .map_err(|e| DetectorError::Command {
                command: self.command.clone(),
                reason: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(DetectorError::Command {
                command: self.command.clone(),
                reason: format!(
                    "{}: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }

        Ok(FeatureSet::from(["present".to_string()]))
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn test_probe_succeeds() {
        let detector = GpuDetector::with_command("true");
        let features = detector.discover().unwrap();
        assert_eq!(features.into_iter().collect::<Vec<_>>(), vec!["present"]);
    }

    #[test]
    fn test_probe_fails() {
        let detector = GpuDetector::with_command("false");
        assert!(matches!(
            detector.discover(),
            Err(DetectorError::Command { .. })
        ));
    }

    #[test]
    fn test_probe_missing() {
        let detector = GpuDetector::with_command("/nonexistent/probe-gpu");
        let err = detector.discover().unwrap_err();
        assert!(err.to_string().contains("/nonexistent/probe-gpu"));
    }
}
