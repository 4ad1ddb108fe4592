use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use bzip2::read::BzDecoder;
use chrono::NaiveDate;
use log::debug;

use crate::as_graphs::as_graph::{normalize_edge, ASPair, ASN};
use crate::shared::{RecordLocation, Relationships, SimulationError};

/// One parsed CAIDA AS-relationship file.
///
/// Records look like `as1|as2|rel[|source]`:
/// * `-1`: `as1` is a provider of `as2`
/// * `0`: `as1` and `as2` are peers
/// * `2`: `as1` and `as2` are siblings
#[derive(Debug, Clone, Default)]
pub struct CAIDASnapshot {
    /// File name (or label) used in error messages.
    pub source: String,
    /// Date found in the file name, if any.
    pub date: Option<NaiveDate>,
    pub pairs: BTreeMap<ASPair, Relationships>,
}

impl CAIDASnapshot {
    /// Read a snapshot from disk. Files ending in `.bz2` are decompressed.
    pub fn from_path(path: &Path) -> Result<Self, SimulationError> {
        let file = File::open(path).map_err(|e| SimulationError::io(path, e))?;
        let source = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let is_bz2 = path.extension().map(|ext| ext == "bz2").unwrap_or(false);
        let mut snapshot = if is_bz2 {
            Self::from_reader(BzDecoder::new(BufReader::new(file)), &source)
        } else {
            Self::from_reader(BufReader::new(file), &source)
        }
        .map_err(|e| with_path(e, path))?;

        snapshot.date = snapshot_date(&source);
        debug!(
            "Loaded {} relationships from {} (date: {:?})",
            snapshot.pairs.len(),
            source,
            snapshot.date
        );
        Ok(snapshot)
    }

    /// Parse relationship records from any reader.
    pub fn from_reader<R: Read>(reader: R, source: &str) -> Result<Self, SimulationError> {
        let mut rdr = csv::ReaderBuilder::new()
            .delimiter(b'|')
            .has_headers(false)
            .flexible(true)
            .comment(Some(b'#'))
            .from_reader(reader);

        let mut pairs: BTreeMap<ASPair, Relationships> = BTreeMap::new();
        let mut first_lines: BTreeMap<ASPair, u64> = BTreeMap::new();

        for result in rdr.records() {
            let record = result.map_err(|e| SimulationError::csv(source, e))?;
            let line = record.position().map(|p| p.line()).unwrap_or(0);
            if record.iter().all(|field| field.trim().is_empty()) {
                continue;
            }
            let location = RecordLocation {
                source: source.to_string(),
                line,
                record: record.iter().collect::<Vec<_>>().join("|"),
            };
            let (asn1, asn2, rel) = parse_relationship(&record, &location)?;
            let (key, role) = normalize_edge(asn1, asn2, rel);

            match pairs.get(&key) {
                Some(existing) if *existing != role => {
                    return Err(SimulationError::DuplicateEdgeConflict {
                        asn1: key.0,
                        asn2: key.1,
                        first: existing.to_string(),
                        first_source: format!("{}:{}", source, first_lines[&key]),
                        second: role.to_string(),
                        second_source: format!("{}:{}", source, line),
                    });
                }
                Some(_) => {}
                None => {
                    pairs.insert(key, role);
                    first_lines.insert(key, line);
                }
            }
        }

        Ok(CAIDASnapshot {
            source: source.to_string(),
            date: None,
            pairs,
        })
    }

    /// Every ASN named by a relationship in this snapshot.
    pub fn asns(&self) -> BTreeSet<ASN> {
        self.pairs
            .keys()
            .flat_map(|&(low, high)| [low, high])
            .collect()
    }
}

/// Parses one record into (as1, as2, role of as2 as seen from as1).
fn parse_relationship(
    record: &csv::StringRecord,
    location: &RecordLocation,
) -> Result<(ASN, ASN, Relationships), SimulationError> {
    let malformed = |reason: String| SimulationError::MalformedTopology {
        location: location.clone(),
        reason,
    };

    if record.len() < 3 {
        return Err(malformed(format!(
            "expected at least 3 '|'-separated fields, found {}",
            record.len()
        )));
    }

    let asn1 = parse_asn(&record[0]).map_err(&malformed)?;
    let asn2 = parse_asn(&record[1]).map_err(&malformed)?;
    if asn1 == asn2 {
        return Err(malformed(format!("AS {} cannot be its own neighbor", asn1)));
    }

    let rel = match record[2].trim() {
        "-1" => Relationships::Customers,
        "0" => Relationships::Peers,
        "2" => Relationships::Siblings,
        other => return Err(malformed(format!("unknown relationship code {:?}", other))),
    };

    Ok((asn1, asn2, rel))
}

pub(crate) fn parse_asn(field: &str) -> Result<ASN, String> {
    let field = field.trim();
    match field.parse::<ASN>() {
        Ok(0) => Err("ASN 0 is reserved".to_string()),
        Ok(asn) => Ok(asn),
        Err(_) => Err(format!("{:?} is not a valid ASN", field)),
    }
}

/// Finds a `YYYY.MM.DD`, `YYYY-MM-DD` or `YYYYMMDD` date inside a file name.
pub fn snapshot_date(file_name: &str) -> Option<NaiveDate> {
    const FORMATS: [(&str, usize); 3] = [("%Y.%m.%d", 10), ("%Y-%m-%d", 10), ("%Y%m%d", 8)];

    for start in 0..file_name.len() {
        for (format, width) in FORMATS {
            let Some(candidate) = file_name.get(start..start + width) else {
                continue;
            };
            if !candidate.starts_with(|c: char| c.is_ascii_digit()) {
                continue;
            }
            // Reject windows cut out of a longer digit run.
            let before_is_digit = start > 0
                && file_name[..start]
                    .chars()
                    .next_back()
                    .map(|c| c.is_ascii_digit())
                    .unwrap_or(false);
            let after_is_digit = file_name[start + width..]
                .chars()
                .next()
                .map(|c| c.is_ascii_digit())
                .unwrap_or(false);
            if before_is_digit || after_is_digit {
                continue;
            }
            if let Ok(date) = NaiveDate::parse_from_str(candidate, format) {
                return Some(date);
            }
        }
    }
    None
}

fn with_path(err: SimulationError, path: &Path) -> SimulationError {
    match err {
        SimulationError::Csv { source, .. } => SimulationError::Csv {
            path: PathBuf::from(path),
            source,
        },
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_date_formats() {
        assert_eq!(
            snapshot_date("CAIDAASGraphCollector_2025.10.15.txt"),
            NaiveDate::from_ymd_opt(2025, 10, 15)
        );
        assert_eq!(
            snapshot_date("20231201.as-rel2.txt.bz2"),
            NaiveDate::from_ymd_opt(2023, 12, 1)
        );
        assert_eq!(
            snapshot_date("rels-2024-02-29.txt"),
            NaiveDate::from_ymd_opt(2024, 2, 29)
        );
        assert_eq!(snapshot_date("relationships.txt"), None);
        assert_eq!(snapshot_date("as-rel-123456789.txt"), None);
    }

    #[test]
    fn test_parse_asn() {
        assert_eq!(parse_asn(" 3356 "), Ok(3356));
        assert!(parse_asn("0").is_err());
        assert!(parse_asn("-5").is_err());
        assert!(parse_asn("AS3356").is_err());
    }

    #[test]
    fn test_parse_serial2_records() {
        let data = "# source:topology|BGP\n\
                    # input clique: 174 209\n\
                    1|2|-1|bgp\n\
                    \n\
                    2|3|0|mlp\n\
                    3|4|2\n";
        let snapshot = CAIDASnapshot::from_reader(data.as_bytes(), "mem").unwrap();

        assert_eq!(snapshot.pairs.len(), 3);
        assert_eq!(snapshot.pairs[&(1, 2)], Relationships::Customers);
        assert_eq!(snapshot.pairs[&(2, 3)], Relationships::Peers);
        assert_eq!(snapshot.pairs[&(3, 4)], Relationships::Siblings);
        assert_eq!(snapshot.asns().into_iter().collect::<Vec<_>>(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_reversed_provider_record_is_normalized() {
        // 9 is the provider of 4; stored from 4's point of view
        let snapshot = CAIDASnapshot::from_reader("9|4|-1\n".as_bytes(), "mem").unwrap();
        assert_eq!(snapshot.pairs[&(4, 9)], Relationships::Providers);
    }
}
