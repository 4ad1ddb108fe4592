pub mod caida;

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::as_graphs::as_graph::{ASGraph, ASPair, ASN};
use crate::shared::{Relationships, SimulationError, SnapshotMergeRule};

pub use caida::CAIDASnapshot;

pub trait ASGraphGenerator {
    fn generate(&self) -> Result<ASGraph, SimulationError>;
}

/// Builds an [`ASGraph`] from one or more CAIDA relationship files on disk.
#[derive(Debug, Clone)]
pub struct CAIDAASGraphGenerator {
    pub snapshot_paths: Vec<PathBuf>,
    pub merge_rule: SnapshotMergeRule,
    /// ASes to include even if no relationship names them (e.g. seed origins).
    pub extra_asns: BTreeSet<ASN>,
}

impl CAIDAASGraphGenerator {
    pub fn new(snapshot_paths: Vec<PathBuf>) -> Self {
        CAIDAASGraphGenerator {
            snapshot_paths,
            merge_rule: SnapshotMergeRule::default(),
            extra_asns: BTreeSet::new(),
        }
    }

    pub fn with_merge_rule(mut self, merge_rule: SnapshotMergeRule) -> Self {
        self.merge_rule = merge_rule;
        self
    }

    pub fn with_extra_asns(mut self, asns: impl IntoIterator<Item = ASN>) -> Self {
        self.extra_asns.extend(asns);
        self
    }
}

impl ASGraphGenerator for CAIDAASGraphGenerator {
    fn generate(&self) -> Result<ASGraph, SimulationError> {
        let snapshots = self
            .snapshot_paths
            .iter()
            .map(|path| CAIDASnapshot::from_path(path))
            .collect::<Result<Vec<_>, _>>()?;

        let pairs = merge_snapshots(snapshots, self.merge_rule)?;
        let graph = ASGraph::from_pairs(self.extra_asns.iter().copied(), &pairs);
        info!(
            "Built AS graph with {} ASes and {} relationships",
            graph.len(),
            graph.edge_count()
        );
        Ok(graph)
    }
}

/// Loads and merges relationship snapshots into a graph.
pub fn load_snapshots(
    paths: &[&Path],
    merge_rule: SnapshotMergeRule,
) -> Result<ASGraph, SimulationError> {
    CAIDAASGraphGenerator::new(paths.iter().map(|p| p.to_path_buf()).collect())
        .with_merge_rule(merge_rule)
        .generate()
}

/// Orders snapshots oldest first.
///
/// Dated file names decide the order when every snapshot has one; otherwise
/// the given order is kept.
pub fn order_snapshots(mut snapshots: Vec<CAIDASnapshot>) -> Vec<CAIDASnapshot> {
    if snapshots.iter().all(|s| s.date.is_some()) {
        snapshots.sort_by_key(|s| s.date);
    } else if snapshots.iter().any(|s| s.date.is_some()) {
        warn!("Only some relationship snapshots carry a date; using the given order");
    }
    snapshots
}

/// Combines snapshots into one relationship map according to `rule`.
pub fn merge_snapshots(
    snapshots: Vec<CAIDASnapshot>,
    rule: SnapshotMergeRule,
) -> Result<BTreeMap<ASPair, Relationships>, SimulationError> {
    let mut snapshots = order_snapshots(snapshots).into_iter();
    let Some(first) = snapshots.next() else {
        return Ok(BTreeMap::new());
    };

    let mut merged = first.pairs;
    let mut origin: BTreeMap<ASPair, String> = BTreeMap::new();
    if rule == SnapshotMergeRule::Strict {
        origin = merged.keys().map(|&k| (k, first.source.clone())).collect();
    }

    for later in snapshots {
        match rule {
            SnapshotMergeRule::LatestOnly => {
                info!(
                    "Replacing {} relationships with the {} of {}",
                    merged.len(),
                    later.pairs.len(),
                    later.source
                );
                merged = later.pairs;
            }
            SnapshotMergeRule::LaterWins => {
                let overridden = later
                    .pairs
                    .iter()
                    .filter(|&(k, rel)| merged.get(k).map_or(false, |old| old != rel))
                    .count();
                let carried = merged.keys().filter(|k| !later.pairs.contains_key(*k)).count();
                info!(
                    "Merging {}: {} relationships overridden, {} kept only from earlier snapshots",
                    later.source, overridden, carried
                );
                merged.extend(later.pairs);
            }
            SnapshotMergeRule::Strict => {
                for (key, rel) in later.pairs {
                    match merged.get(&key) {
                        Some(existing) if *existing != rel => {
                            return Err(SimulationError::DuplicateEdgeConflict {
                                asn1: key.0,
                                asn2: key.1,
                                first: existing.to_string(),
                                first_source: origin[&key].clone(),
                                second: rel.to_string(),
                                second_source: later.source.clone(),
                            });
                        }
                        Some(_) => {}
                        None => {
                            merged.insert(key, rel);
                            origin.insert(key, later.source.clone());
                        }
                    }
                }
            }
        }
    }

    Ok(merged)
}
