//! Range dataset files: comma-separated rows, no header required.
//! Malformed rows are skipped; a missing file is fatal.

use super::ranges::{parse_ipv4, AsnRange, CountryRange, IpRangeIndex};
use crate::error::{TrustError, TrustResult};
use csv::StringRecord;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{info, warn};

fn reader<R: Read>(input: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(input)
}

/// `None` for an unreadable row; I/O failures abort the whole file.
fn next_record(record: csv::Result<StringRecord>) -> TrustResult<Option<StringRecord>> {
    match record {
        Ok(r) => Ok(Some(r)),
        Err(e) if e.is_io_error() => Err(TrustError::Io(e.into())),
        Err(_) => Ok(None),
    }
}

fn parse_bounds(record: &StringRecord) -> Option<(u32, u32)> {
    let start = parse_ipv4(record.get(0)?)?;
    let end = parse_ipv4(record.get(1)?)?;
    (start <= end).then_some((start, end))
}

/// `ip_start,ip_end,asn,organization`. The organization keeps any commas it contains,
/// quoted or not. Returns parsed rows and the number of skipped rows.
pub fn parse_asn_ranges<R: Read>(input: R) -> TrustResult<(Vec<AsnRange>, usize)> {
    let mut rows = Vec::new();
    let mut skipped = 0usize;
    for record in reader(input).into_records() {
        let Some(record) = next_record(record)? else {
            skipped += 1;
            continue;
        };
        let Some((start, end)) = parse_bounds(&record) else {
            skipped += 1;
            continue;
        };
        // Unquoted names arrive split on their commas.
        let organization = Some(record.iter().skip(3).collect::<Vec<_>>().join(","))
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty());
        rows.push(AsnRange {
            start,
            end,
            organization,
        });
    }
    Ok((rows, skipped))
}

/// `ip_start,ip_end,country_code`
pub fn parse_country_ranges<R: Read>(input: R) -> TrustResult<(Vec<CountryRange>, usize)> {
    let mut rows = Vec::new();
    let mut skipped = 0usize;
    for record in reader(input).into_records() {
        let Some(record) = next_record(record)? else {
            skipped += 1;
            continue;
        };
        let country_code = record.get(2).map(str::trim).unwrap_or_default();
        match parse_bounds(&record) {
            Some((start, end)) if !country_code.is_empty() => rows.push(CountryRange {
                start,
                end,
                country_code: country_code.to_string(),
            }),
            _ => skipped += 1,
        }
    }
    Ok((rows, skipped))
}

fn open(path: &Path) -> TrustResult<File> {
    File::open(path).map_err(|e| TrustError::resource_missing(path, e))
}

pub fn load_asn_ranges(path: &Path) -> TrustResult<Vec<AsnRange>> {
    let (rows, skipped) = parse_asn_ranges(open(path)?)?;
    if skipped > 0 {
        warn!(path = %path.display(), skipped, "malformed ASN rows skipped");
    }
    info!(path = %path.display(), rows = rows.len(), "ASN ranges loaded");
    Ok(rows)
}

pub fn load_country_ranges(path: &Path) -> TrustResult<Vec<CountryRange>> {
    let (rows, skipped) = parse_country_ranges(open(path)?)?;
    if skipped > 0 {
        warn!(path = %path.display(), skipped, "malformed country rows skipped");
    }
    info!(path = %path.display(), rows = rows.len(), "country ranges loaded");
    Ok(rows)
}

impl IpRangeIndex {
    /// Both files must load before an index is handed out.
    pub fn from_files(asn_path: &Path, country_path: &Path) -> TrustResult<Self> {
        let asn = load_asn_ranges(asn_path)?;
        let country = load_country_ranges(country_path)?;
        Ok(Self::build(asn, country))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_asn_rows() {
        let text = "\
ip_start,ip_end,asn,organization
1.0.0.0,1.0.0.255,13335,\"Cloudflare, Inc.\"
1.0.4.0,1.0.7.255,38803,Wirefreebroadband Pty Ltd
1.0.16.0,1.0.16.255,2519
garbage
1.0.32.0,1.0.31.0,1,inverted
";
        let (rows, skipped) = parse_asn_ranges(text.as_bytes()).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(skipped, 3);
        assert_eq!(rows[0].organization.as_deref(), Some("Cloudflare, Inc."));
        assert_eq!(rows[1].organization.as_deref(), Some("Wirefreebroadband Pty Ltd"));
        assert_eq!(rows[2].organization, None);
    }

    #[test]
    fn test_unquoted_organization_keeps_commas() {
        let (rows, _) = parse_asn_ranges("2.0.0.0,2.0.0.9,1,Acme, Hosting, Ltd\n".as_bytes()).unwrap();
        assert_eq!(rows[0].organization.as_deref(), Some("Acme, Hosting, Ltd"));
    }

    #[test]
    fn test_parse_country_rows() {
        let text = "1.0.0.0,1.0.0.255,AU\n1.0.1.0,1.0.3.255\n::,::ffff,US\n1.0.4.0,1.0.7.255,\n";
        let (rows, skipped) = parse_country_ranges(text.as_bytes()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(skipped, 3);
        assert_eq!(rows[0].country_code, "AU");
    }

    #[test]
    fn test_quoted_fields_with_escaped_quotes() {
        let text = "\"3.0.0.0\",\"3.0.0.255\",\"16509\",\"Amazon \"\"AWS\"\", Inc\"\n";
        let (rows, skipped) = parse_asn_ranges(text.as_bytes()).unwrap();
        assert_eq!(skipped, 0);
        assert_eq!(rows[0].start, parse_ipv4("3.0.0.0").unwrap());
        assert_eq!(rows[0].organization.as_deref(), Some("Amazon \"AWS\", Inc"));
    }

    #[test]
    fn test_non_utf8_row_is_skipped() {
        let mut bytes = b"4.0.0.0,4.0.0.9,1,Level ".to_vec();
        bytes.extend_from_slice(&[0xff, 0xfe]);
        bytes.extend_from_slice(b"\n5.0.0.0,5.0.0.9,2,Carrier\n");
        let (rows, skipped) = parse_asn_ranges(bytes.as_slice()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(skipped, 1);
        assert_eq!(rows[0].organization.as_deref(), Some("Carrier"));
    }

    #[test]
    fn test_missing_file_is_resource_missing() {
        let err = load_asn_ranges(Path::new("/nonexistent/asn.csv")).unwrap_err();
        assert!(matches!(err, TrustError::ResourceMissing { .. }));
    }
}
