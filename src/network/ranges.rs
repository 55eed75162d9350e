//! Merged ASN/country range table with point-containment lookup.
//!
//! Ranges may overlap. At build time the table is flattened into disjoint
//! segments, each tagged with the range that wins on that stretch of address
//! space: the narrowest range, then the lower start, then the earlier table
//! position. Lookup is a binary search over those segments.

use super::IpType;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::net::Ipv4Addr;

pub const UNKNOWN: &str = "Unknown";

/// Row of the organization dataset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AsnRange {
    pub start: u32,
    pub end: u32,
    pub organization: Option<String>,
}

/// Row of the country dataset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountryRange {
    pub start: u32,
    pub end: u32,
    pub country_code: String,
}

/// Entry of the merged table. `start <= end` always holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpRange {
    pub start: u32,
    pub end: u32,
    pub organization: Option<String>,
    pub country_code: Option<String>,
}

impl IpRange {
    pub fn contains(&self, ip: u32) -> bool {
        self.start <= ip && ip <= self.end
    }

    fn width(&self) -> u32 {
        self.end - self.start
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpInfo {
    pub organization: String,
    pub ip_type: IpType,
    pub country: String,
}

impl IpInfo {
    pub fn unknown() -> Self {
        Self {
            organization: UNKNOWN.to_string(),
            ip_type: IpType::Unknown,
            country: UNKNOWN.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Segment {
    start: u32,
    end: u32,
    range: usize,
}

#[derive(Debug, Clone, Default)]
pub struct IpRangeIndex {
    ranges: Vec<IpRange>,
    segments: Vec<Segment>,
}

/// Dotted-quad IPv4 to its integer form. Anything else is `None`.
pub fn parse_ipv4(ip: &str) -> Option<u32> {
    ip.trim().parse::<Ipv4Addr>().ok().map(u32::from)
}

impl IpRangeIndex {
    /// Outer-merge both datasets on exact `(start, end)`. Rows with `start > end` are dropped;
    /// a duplicated key keeps the first value seen.
    pub fn build(asn_ranges: Vec<AsnRange>, country_ranges: Vec<CountryRange>) -> Self {
        let mut merged: BTreeMap<(u32, u32), IpRange> = BTreeMap::new();
        let mut inverted = 0usize;

        for r in asn_ranges {
            if r.start > r.end {
                inverted += 1;
                continue;
            }
            let entry = merged.entry((r.start, r.end)).or_insert_with(|| IpRange {
                start: r.start,
                end: r.end,
                organization: None,
                country_code: None,
            });
            if entry.organization.is_none() {
                entry.organization = r.organization;
            }
        }
        for r in country_ranges {
            if r.start > r.end {
                inverted += 1;
                continue;
            }
            let entry = merged.entry((r.start, r.end)).or_insert_with(|| IpRange {
                start: r.start,
                end: r.end,
                organization: None,
                country_code: None,
            });
            if entry.country_code.is_none() {
                entry.country_code = Some(r.country_code);
            }
        }
        if inverted > 0 {
            tracing::warn!(inverted, "ranges with start > end dropped");
        }

        Self::from_ranges(merged.into_values().collect())
    }

    /// Index an already-merged table; its order is the final tie-break.
    pub fn from_ranges(ranges: Vec<IpRange>) -> Self {
        let ranges: Vec<IpRange> = ranges.into_iter().filter(|r| r.start <= r.end).collect();
        let segments = flatten(&ranges);
        tracing::info!(ranges = ranges.len(), segments = segments.len(), "IP range index built");
        Self { ranges, segments }
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn ranges(&self) -> &[IpRange] {
        &self.ranges
    }

    /// Winning range containing `ip`, if any.
    pub fn find(&self, ip: u32) -> Option<&IpRange> {
        let idx = self.segments.partition_point(|s| s.start <= ip);
        let seg = self.segments.get(idx.checked_sub(1)?)?;
        if seg.end >= ip {
            Some(&self.ranges[seg.range])
        } else {
            None
        }
    }

    /// Never fails: unparseable or unmatched addresses yield the all-`Unknown` result.
    pub fn lookup(&self, ip: &str) -> IpInfo {
        let Some(ip_int) = parse_ipv4(ip) else {
            return IpInfo::unknown();
        };
        let Some(range) = self.find(ip_int) else {
            return IpInfo::unknown();
        };
        let organization = range
            .organization
            .clone()
            .unwrap_or_else(|| UNKNOWN.to_string());
        IpInfo {
            ip_type: IpType::classify(&organization),
            organization,
            country: range
                .country_code
                .clone()
                .unwrap_or_else(|| UNKNOWN.to_string()),
        }
    }
}

/// Sweep over range boundaries keeping the active set ordered by (width, start, position).
fn flatten(ranges: &[IpRange]) -> Vec<Segment> {
    // u64 so that `end + 1` cannot overflow at 255.255.255.255
    let mut opens: Vec<(u64, usize)> = ranges
        .iter()
        .enumerate()
        .map(|(i, r)| (r.start as u64, i))
        .collect();
    let mut closes: Vec<(u64, usize)> = ranges
        .iter()
        .enumerate()
        .map(|(i, r)| (r.end as u64 + 1, i))
        .collect();
    opens.sort_unstable();
    closes.sort_unstable();

    let mut points: Vec<u64> = opens.iter().chain(closes.iter()).map(|p| p.0).collect();
    points.sort_unstable();
    points.dedup();

    let key = |i: usize| (ranges[i].width(), ranges[i].start, i);
    let mut active: BTreeSet<(u32, u32, usize)> = BTreeSet::new();
    let mut segments: Vec<Segment> = Vec::new();
    let (mut oi, mut ci) = (0usize, 0usize);

    for (pi, &p) in points.iter().enumerate() {
        while ci < closes.len() && closes[ci].0 == p {
            active.remove(&key(closes[ci].1));
            ci += 1;
        }
        while oi < opens.len() && opens[oi].0 == p {
            active.insert(key(opens[oi].1));
            oi += 1;
        }
        let Some(&(_, _, winner)) = active.first() else {
            continue;
        };
        // Active ranges all close at or after the next point, so it exists and end fits in u32.
        let seg_end = points.get(pi + 1).map_or(u32::MAX as u64, |next| next - 1) as u32;
        let seg_start = p as u32;
        if let Some(last) = segments.last_mut() {
            if last.range == winner && last.end as u64 + 1 == p {
                last.end = seg_end;
                continue;
            }
        }
        segments.push(Segment {
            start: seg_start,
            end: seg_end,
            range: winner,
        });
    }
    segments
}
