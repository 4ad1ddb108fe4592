use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::as_graphs::as_graph::ASN;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum Relationships {
    Providers = 1,
    Peers = 2,
    Customers = 3,
    Origin = 4,
    Siblings = 5,
}

impl Relationships {
    /// The role the other endpoint of an edge sees.
    pub fn invert(&self) -> Self {
        match self {
            Relationships::Providers => Relationships::Customers,
            Relationships::Customers => Relationships::Providers,
            Relationships::Peers => Relationships::Peers,
            Relationships::Siblings => Relationships::Siblings,
            Relationships::Origin => Relationships::Origin,
        }
    }
}

impl fmt::Display for Relationships {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Relationships::Providers => "PROVIDERS",
            Relationships::Peers => "PEERS",
            Relationships::Customers => "CUSTOMERS",
            Relationships::Origin => "ORIGIN",
            Relationships::Siblings => "SIBLINGS",
        };
        write!(f, "{}", s)
    }
}

/// Per-AS defense setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u32)]
pub enum Settings {
    BaseDefense = 0,
    Rov = 1,
}

impl fmt::Display for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Settings::BaseDefense => "BGP",
            Settings::Rov => "ROV",
        };
        write!(f, "{}", s)
    }
}

/// How two dated relationship snapshots are combined into one topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum SnapshotMergeRule {
    /// Union of both snapshots; the later snapshot decides pairs present in both.
    #[default]
    LaterWins,
    /// Only the later snapshot is used.
    LatestOnly,
    /// Union of both snapshots; a pair with differing relationships is an error.
    Strict,
}

impl fmt::Display for SnapshotMergeRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SnapshotMergeRule::LaterWins => "later-wins",
            SnapshotMergeRule::LatestOnly => "latest-only",
            SnapshotMergeRule::Strict => "strict",
        };
        write!(f, "{}", s)
    }
}

/// Location of an offending input record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordLocation {
    pub source: String,
    pub line: u64,
    pub record: String,
}

impl fmt::Display for RecordLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {:?}", self.source, self.line, self.record)
    }
}

/// Errors raised while building or running a simulation.
#[derive(Error, Debug)]
pub enum SimulationError {
    #[error("Malformed relationship record at {location}: {reason}")]
    MalformedTopology {
        location: RecordLocation,
        reason: String,
    },
    #[error("Conflicting relationship for AS pair ({asn1}, {asn2}): {first} in {first_source}, {second} in {second_source}")]
    DuplicateEdgeConflict {
        asn1: ASN,
        asn2: ASN,
        first: String,
        first_source: String,
        second: String,
        second_source: String,
    },
    #[error("Malformed announcement at {location}: {reason}")]
    MalformedAnnouncement {
        location: RecordLocation,
        reason: String,
    },
    #[error("Malformed ROV ASN record at {location}: {reason}")]
    MalformedROVList {
        location: RecordLocation,
        reason: String,
    },
    #[error("Propagation did not converge within {steps} steps")]
    NonConvergence { steps: usize },
    #[error("Announcement for {prefix} is originated by AS {asn}, which is not in the AS graph")]
    UnknownOrigin { asn: ASN, prefix: String },
    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("CSV error on {path:?}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

impl SimulationError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SimulationError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        SimulationError::Csv {
            path: path.into(),
            source,
        }
    }
}

/// A provider/customer cycle was found in the AS graph.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Cycle detected in AS graph through AS {asn}")]
pub struct CycleError {
    pub asn: ASN,
}
