//! IP + user-agent features.

use super::{FeatureValue, FeatureVector};
use crate::config::DeviceConfig;
use crate::network::{IpRangeIndex, IpType};

pub const DEVICE_FEATURES: [&str; 6] = [
    "ip_type_datacenter",
    "ip_type_residential",
    "is_from_suspicious_country",
    "is_outdated_os",
    "is_headless",
    "os_linux_server",
];

pub struct DeviceFeatureExtractor {
    suspicious_countries: Vec<String>,
    outdated_os_signatures: Vec<String>,
    headless_signatures: Vec<String>,
}

impl DeviceFeatureExtractor {
    pub fn new(config: &DeviceConfig) -> Self {
        let lower = |v: &[String]| v.iter().map(|s| s.to_lowercase()).collect::<Vec<_>>();
        Self {
            suspicious_countries: config.suspicious_countries.clone(),
            outdated_os_signatures: lower(&config.outdated_os_signatures),
            headless_signatures: lower(&config.headless_signatures),
        }
    }

    /// All flags are 0/1. An unresolvable IP sets neither IP-type flag.
    pub fn extract(&self, ip: &str, user_agent: &str, index: &IpRangeIndex) -> FeatureVector {
        let info = index.lookup(ip);
        let ua = user_agent.to_lowercase();
        let suspicious_country = self
            .suspicious_countries
            .iter()
            .any(|c| c.eq_ignore_ascii_case(info.country.trim()));

        let mut fv = FeatureVector::new();
        fv.insert("ip_type_datacenter", FeatureValue::flag(info.ip_type == IpType::DataCenter));
        fv.insert(
            "ip_type_residential",
            FeatureValue::flag(info.ip_type == IpType::ResidentialMobile),
        );
        fv.insert("is_from_suspicious_country", FeatureValue::flag(suspicious_country));
        fv.insert(
            "is_outdated_os",
            FeatureValue::flag(self.outdated_os_signatures.iter().any(|s| ua.contains(s.as_str()))),
        );
        fv.insert(
            "is_headless",
            FeatureValue::flag(self.headless_signatures.iter().any(|s| ua.contains(s.as_str()))),
        );
        fv.insert(
            "os_linux_server",
            FeatureValue::flag(ua.contains("linux") && !ua.contains("android")),
        );
        fv
    }
}
