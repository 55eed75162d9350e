//! Organization-name classification of IP ownership.

use serde::{Deserialize, Serialize};
use std::fmt;

const DATACENTER_KEYWORDS: [&str; 7] = [
    "cloud",
    "hosting",
    "datacenter",
    "cdn",
    "google",
    "amazon",
    "cloudflare",
];

const VPN_KEYWORDS: [&str; 2] = ["vpn", "proxy"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IpType {
    #[serde(rename = "Data Center")]
    DataCenter,
    #[serde(rename = "VPN/Proxy")]
    VpnProxy,
    #[serde(rename = "Residential/Mobile")]
    ResidentialMobile,
    Unknown,
}

impl IpType {
    /// Data-centre keywords take precedence over VPN keywords.
    pub fn classify(organization: &str) -> Self {
        let org = organization.to_lowercase();
        if DATACENTER_KEYWORDS.iter().any(|kw| org.contains(kw)) {
            IpType::DataCenter
        } else if VPN_KEYWORDS.iter().any(|kw| org.contains(kw)) {
            IpType::VpnProxy
        } else {
            IpType::ResidentialMobile
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            IpType::DataCenter => "Data Center",
            IpType::VpnProxy => "VPN/Proxy",
            IpType::ResidentialMobile => "Residential/Mobile",
            IpType::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for IpType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
