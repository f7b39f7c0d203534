//! CPU feature flags.

use super::{Detector, DetectorError, HostPaths};
use crate::models::FeatureSet;
use std::sync::Arc;

/// Reports every CPU feature flag listed in `/proc/cpuinfo`.
pub struct CpuidDetector {
    host: HostPaths,
}

impl CpuidDetector {
    pub fn new(host: HostPaths) -> Self {
        Self { host }
    }

    pub fn create(host: &HostPaths) -> Arc<dyn Detector> {
        Arc::new(Self::new(host.clone()))
    }
}

impl Detector for CpuidDetector {
    fn name(&self) -> &str {
        "cpuid"
    }

    fn discover(&self) -> Result<FeatureSet, DetectorError> {
        let flags = read_cpu_flags(&self.host)?;
        Ok(flags.iter().map(|flag| flag.to_uppercase()).collect())
    }
}

/// Read the feature flags of the first processor in `/proc/cpuinfo`.
///
/// x86 lists them under `flags`, arm under `Features`.
pub(super) fn read_cpu_flags(host: &HostPaths) -> Result<Vec<String>, DetectorError> {
    let cpuinfo = host.read_to_string("/proc/cpuinfo")?;
    parse_cpu_flags(&cpuinfo)
        .ok_or_else(|| DetectorError::Unsupported("no CPU flags in /proc/cpuinfo".to_string()))
}

fn parse_cpu_flags(cpuinfo: &str) -> Option<Vec<String>> {
    cpuinfo.lines().find_map(|line| {
        let (key, value) = line.split_once(':')?;
        match key.trim() {
            "flags" | "Features" => Some(value.split_whitespace().map(String::from).collect()),
            _ => None,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const CPUINFO: &str = "processor\t: 0\n\
vendor_id\t: GenuineIntel\n\
flags\t\t: fpu sse4_2 avx avx2 cat_l3 cqm\n\
\n\
processor\t: 1\n\
flags\t\t: fpu sse4_2 avx avx2 cat_l3 cqm\n";

    fn host_with_cpuinfo(content: &str) -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        std::fs::create_dir_all(temp_dir.path().join("proc")).unwrap();
        std::fs::write(temp_dir.path().join("proc/cpuinfo"), content).unwrap();
        temp_dir
    }

    #[test]
    fn test_parse_x86_flags() {
        let flags = parse_cpu_flags(CPUINFO).unwrap();
        assert_eq!(flags, vec!["fpu", "sse4_2", "avx", "avx2", "cat_l3", "cqm"]);
    }

    #[test]
    fn test_parse_arm_features() {
        let flags = parse_cpu_flags("processor : 0\nFeatures : fp asimd aes\n").unwrap();
        assert_eq!(flags, vec!["fp", "asimd", "aes"]);
    }

    #[test]
    fn test_discover_uppercases_flags() {
        let temp_dir = host_with_cpuinfo(CPUINFO);
        let detector = CpuidDetector::new(HostPaths::new(temp_dir.path()));

        let features = detector.discover().unwrap();
        assert_eq!(features.len(), 6);
        assert!(features.contains("AVX2"));
        assert!(features.contains("SSE4_2"));
    }

    #[test]
    fn test_discover_without_flags() {
        let temp_dir = host_with_cpuinfo("processor : 0\n");
        let detector = CpuidDetector::new(HostPaths::new(temp_dir.path()));
        assert!(matches!(
            detector.discover(),
            Err(DetectorError::Unsupported(_))
        ));
    }
}
