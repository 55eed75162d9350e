//! IP intelligence: organization/country range index and ownership classification.

mod classify;
mod loader;
mod ranges;

pub use classify::IpType;
pub use loader::{load_asn_ranges, load_country_ranges, parse_asn_ranges, parse_country_ranges};
pub use ranges::{parse_ipv4, AsnRange, CountryRange, IpInfo, IpRange, IpRangeIndex, UNKNOWN};
