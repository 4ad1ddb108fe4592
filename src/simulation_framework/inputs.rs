use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use log::{debug, info};

use crate::as_graphs::as_graph_generators::caida::parse_asn;
use crate::route_validator::RouteValidator;
use crate::shared::{RecordLocation, SimulationError};
use crate::simulation_engine::SeedAnnouncement;

/// Reads `seed_asn,prefix,rov_invalid` rows after a header row.
pub fn read_announcements(path: &Path) -> Result<Vec<SeedAnnouncement>, SimulationError> {
    let file = File::open(path).map_err(|e| SimulationError::io(path, e))?;
    let seeds = read_announcements_from(BufReader::new(file), &display_name(path))
        .map_err(|e| with_csv_path(e, path))?;
    info!("Read {} seed announcements from {}", seeds.len(), path.display());
    Ok(seeds)
}

pub fn read_announcements_from<R: Read>(
    reader: R,
    source: &str,
) -> Result<Vec<SeedAnnouncement>, SimulationError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut seeds = Vec::new();
    for result in rdr.records() {
        let record = result.map_err(|e| SimulationError::csv(source, e))?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        let location = locate(&record, source);
        let malformed = |reason: String| SimulationError::MalformedAnnouncement {
            location: location.clone(),
            reason,
        };

        if record.len() != 3 {
            return Err(malformed(format!(
                "expected 3 fields (seed_asn,prefix,rov_invalid), found {}",
                record.len()
            )));
        }
        let origin_asn = parse_asn(&record[0]).map_err(&malformed)?;
        let prefix = &record[1];
        if prefix.is_empty() {
            return Err(malformed("empty prefix".to_string()));
        }
        let rov_invalid = parse_marker(&record[2]).map_err(&malformed)?;
        seeds.push(SeedAnnouncement::new(origin_asn, prefix, rov_invalid));
    }
    Ok(seeds)
}

/// Reads one ROV-enforcing ASN per row.
///
/// A first row without any digit (`asn`) is a header. Every other row must be
/// an ASN; `AS3356` is rejected rather than skipped.
pub fn read_rov_asns(path: &Path) -> Result<RouteValidator, SimulationError> {
    let file = File::open(path).map_err(|e| SimulationError::io(path, e))?;
    let validator = read_rov_asns_from(BufReader::new(file), &display_name(path))
        .map_err(|e| with_csv_path(e, path))?;
    info!("Read {} ROV ASes from {}", validator.len(), path.display());
    Ok(validator)
}

pub fn read_rov_asns_from<R: Read>(reader: R, source: &str) -> Result<RouteValidator, SimulationError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut validator = RouteValidator::new();
    let mut first_row = true;
    for result in rdr.records() {
        let record = result.map_err(|e| SimulationError::csv(source, e))?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        let field = &record[0];
        let is_first = std::mem::replace(&mut first_row, false);
        if is_first && !field.is_empty() && !field.contains(|c: char| c.is_ascii_digit()) {
            debug!("Skipping ROV list header {:?}", field);
            continue;
        }
        let asn = parse_asn(field).map_err(|reason| SimulationError::MalformedROVList {
            location: locate(&record, source),
            reason,
        })?;
        validator.add_rov_asn(asn);
    }
    Ok(validator)
}

/// `true`/`false`/`1`/`0`, case-insensitive.
fn parse_marker(field: &str) -> Result<bool, String> {
    match field.to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(format!("{:?} is not a valid rov_invalid marker", field)),
    }
}

fn locate(record: &csv::StringRecord, source: &str) -> RecordLocation {
    RecordLocation {
        source: source.to_string(),
        line: record.position().map(|p| p.line()).unwrap_or(0),
        record: record.iter().collect::<Vec<_>>().join(","),
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn with_csv_path(err: SimulationError, path: &Path) -> SimulationError {
    match err {
        SimulationError::Csv { source, .. } => SimulationError::csv(path, source),
        other => other,
    }
}
