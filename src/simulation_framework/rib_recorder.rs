use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;
use tempfile::NamedTempFile;

use crate::as_graphs::as_graph::ASN;
use crate::shared::SimulationError;
use crate::simulation_engine::announcement::{format_as_path, Prefix};
use crate::simulation_engine::SimulationState;

/// Selected route of one AS for one prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RibRecord {
    pub asn: ASN,
    pub prefix: Prefix,
    pub as_path: Vec<ASN>,
    pub origin: ASN,
}

/// Every selected route, ordered by ASN and then prefix.
pub fn extract(state: &SimulationState) -> Vec<RibRecord> {
    // policies are stored by ascending ASN and local RIBs are BTreeMaps
    state
        .policies()
        .flat_map(|policy| {
            policy.local_rib.values().map(move |ann| RibRecord {
                asn: policy.asn,
                prefix: ann.prefix.clone(),
                as_path: ann.as_path.clone(),
                origin: ann.origin(),
            })
        })
        .collect()
}

/// Writes `asn,prefix,as_path[,origin_asn]` rows to `writer`.
pub fn write_ribs<W: Write>(
    records: &[RibRecord],
    writer: W,
    include_origin: bool,
) -> Result<(), csv::Error> {
    let mut wtr = csv::Writer::from_writer(writer);
    if include_origin {
        wtr.write_record(["asn", "prefix", "as_path", "origin_asn"])?;
    } else {
        wtr.write_record(["asn", "prefix", "as_path"])?;
    }

    for record in records {
        let asn = record.asn.to_string();
        let as_path = format_as_path(&record.as_path);
        if include_origin {
            let origin = record.origin.to_string();
            wtr.write_record([asn.as_str(), record.prefix.as_str(), as_path.as_str(), origin.as_str()])?;
        } else {
            wtr.write_record([asn.as_str(), record.prefix.as_str(), as_path.as_str()])?;
        }
    }
    wtr.flush()?;
    Ok(())
}

/// Writes the records to `path` through a temporary file in the same
/// directory, so a failed write never leaves a partial file behind.
pub fn write_ribs_csv(
    records: &[RibRecord],
    path: &Path,
    include_origin: bool,
) -> Result<(), SimulationError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| SimulationError::io(path, e))?;
    write_ribs(records, BufWriter::new(tmp.as_file_mut()), include_origin)
        .map_err(|e| SimulationError::csv(path, e))?;
    tmp.persist(path)
        .map_err(|e| SimulationError::io(path, e.error))?;
    Ok(())
}

pub fn to_json(records: &[RibRecord]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn records() -> Vec<RibRecord> {
        vec![
            RibRecord {
                asn: 1,
                prefix: "p".to_string(),
                as_path: vec![1],
                origin: 1,
            },
            RibRecord {
                asn: 2,
                prefix: "p".to_string(),
                as_path: vec![2, 1],
                origin: 1,
            },
        ]
    }

    #[test]
    fn test_write_ribs() {
        let mut out = Vec::new();
        write_ribs(&records(), &mut out, false).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "asn,prefix,as_path\n1,p,\"(1,)\"\n2,p,\"(2, 1)\"\n"
        );
    }

    #[test]
    fn test_write_ribs_with_origin() {
        let mut out = Vec::new();
        write_ribs(&records(), &mut out, true).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "asn,prefix,as_path,origin_asn\n1,p,\"(1,)\",1\n2,p,\"(2, 1)\",1\n"
        );
    }

    #[test]
    fn test_write_ribs_csv_replaces_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("my_ribs.csv");
        std::fs::write(&path, "stale contents that are longer than the new file\n").unwrap();

        write_ribs_csv(&records(), &path, false).unwrap();

        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "asn,prefix,as_path\n1,p,\"(1,)\"\n2,p,\"(2, 1)\"\n"
        );
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_failed_write_leaves_no_file() {
        let dir = tempfile::TempDir::new().unwrap();
        // a directory in the way makes the final rename fail
        let path = dir.path().join("my_ribs.csv");
        std::fs::create_dir(&path).unwrap();

        let result = write_ribs_csv(&records(), &path, false);
        assert!(matches!(result, Err(SimulationError::Io { .. })));
        assert!(path.is_dir());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);

        let missing = dir.path().join("no_such_dir").join("my_ribs.csv");
        assert!(matches!(
            write_ribs_csv(&records(), &missing, false),
            Err(SimulationError::Io { .. })
        ));
        assert!(!missing.exists());
    }

    #[test]
    fn test_to_json() {
        let json = to_json(&records()[..1]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(
            value,
            serde_json::json!([{"asn": 1, "prefix": "p", "as_path": [1], "origin": 1}])
        );
    }
}
