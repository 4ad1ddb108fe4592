use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use bzip2::write::BzEncoder;
use bzip2::Compression;
use tempfile::TempDir;

use bgpsimulator::as_graphs::as_graph::{ASBuilder, ASGraph};
use bgpsimulator::as_graphs::as_graph_generators::{load_snapshots, merge_snapshots, CAIDASnapshot};
use bgpsimulator::shared::{Relationships, SimulationError, SnapshotMergeRule};

fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn test_relationships_are_symmetric() {
    let as_graph = ASGraph::build(vec![
        ASBuilder::new(1).with_customers(vec![2]).with_peers(vec![3]),
        ASBuilder::new(4).with_siblings(vec![2]),
    ])
    .unwrap();

    assert_eq!(as_graph.len(), 4);
    assert_eq!(as_graph.all_asns(), vec![1, 2, 3, 4]);

    let as2 = as_graph.get(&2).unwrap();
    assert_eq!(as2.providers, vec![1]);
    assert_eq!(as2.siblings, vec![4]);
    assert_eq!(as_graph.get(&3).unwrap().peers, vec![1]);

    assert_eq!(as_graph.relationship(1, 2), Some(Relationships::Customers));
    assert_eq!(as_graph.relationship(2, 1), Some(Relationships::Providers));
    assert_eq!(as_graph.relationship(1, 3), Some(Relationships::Peers));
    assert_eq!(as_graph.relationship(3, 4), None);
    assert_eq!(as_graph.edge_count(), 3);
}

#[test]
fn test_neighbors_sorted_by_asn() {
    let as_graph = ASGraph::build(vec![ASBuilder::new(5)
        .with_customers(vec![9, 2])
        .with_peers(vec![7])
        .with_providers(vec![1])])
    .unwrap();

    assert_eq!(
        as_graph.neighbors(5),
        vec![
            (1, Relationships::Providers),
            (2, Relationships::Customers),
            (7, Relationships::Peers),
            (9, Relationships::Customers),
        ]
    );
    assert!(as_graph.neighbors(42).is_empty());
}

#[test]
fn test_same_edge_declared_from_both_sides() {
    let as_graph = ASGraph::build(vec![
        ASBuilder::new(1).with_customers(vec![2]),
        ASBuilder::new(2).with_providers(vec![1]),
    ])
    .unwrap();
    assert_eq!(as_graph.edge_count(), 1);
}

#[test]
fn test_conflicting_edge_is_rejected() {
    let result = ASGraph::build(vec![
        ASBuilder::new(1).with_customers(vec![2]),
        ASBuilder::new(2).with_peers(vec![1]),
    ]);
    assert!(matches!(
        result,
        Err(SimulationError::DuplicateEdgeConflict { asn1: 1, asn2: 2, .. })
    ));
}

#[test]
fn test_self_edge_is_rejected() {
    let result = ASGraph::build(vec![ASBuilder::new(1).with_peers(vec![1])]);
    assert!(matches!(result, Err(SimulationError::MalformedTopology { .. })));
}

#[test]
fn test_cycle_detection() {
    // 1 provider of 2, 2 provider of 3, 3 provider of 1
    let as_graph = ASGraph::build(vec![
        ASBuilder::new(1).with_customers(vec![2]),
        ASBuilder::new(2).with_customers(vec![3]),
        ASBuilder::new(3).with_customers(vec![1]),
    ])
    .unwrap();
    assert!(as_graph.check_for_cycles().is_err());

    let acyclic = ASGraph::build(vec![
        ASBuilder::new(1).with_customers(vec![2, 3]),
        ASBuilder::new(2).with_customers(vec![3]).with_peers(vec![4]),
        ASBuilder::new(4).with_customers(vec![3]),
    ])
    .unwrap();
    assert!(acyclic.check_for_cycles().is_ok());
}

#[test]
fn test_load_single_snapshot() {
    let dir = TempDir::new().unwrap();
    let path = write_file(
        dir.path(),
        "CAIDAASGraphCollector_2025.10.15.txt",
        "# comment\n1|2|-1\n2|3|0|bgp\n3|4|2\n",
    );

    let as_graph = load_snapshots(&[path.as_path()], SnapshotMergeRule::LaterWins).unwrap();
    assert_eq!(as_graph.all_asns(), vec![1, 2, 3, 4]);
    assert_eq!(as_graph.relationship(2, 1), Some(Relationships::Providers));
    assert_eq!(as_graph.relationship(3, 2), Some(Relationships::Peers));
    assert_eq!(as_graph.relationship(4, 3), Some(Relationships::Siblings));
}

#[test]
fn test_malformed_snapshot_reports_location() {
    let dir = TempDir::new().unwrap();
    let path = write_file(dir.path(), "rels.txt", "1|2|-1\n2|x|0\n");

    match load_snapshots(&[path.as_path()], SnapshotMergeRule::LaterWins) {
        Err(SimulationError::MalformedTopology { location, .. }) => {
            assert_eq!(location.source, "rels.txt");
            assert_eq!(location.line, 2);
            assert_eq!(location.record, "2|x|0");
        }
        other => panic!("unexpected result: {:?}", other.map(|g| g.len())),
    }
}

#[test]
fn test_unknown_relationship_code() {
    let result = CAIDASnapshot::from_reader("1|2|1\n".as_bytes(), "mem");
    assert!(matches!(result, Err(SimulationError::MalformedTopology { .. })));
}

#[test]
fn test_conflict_within_one_snapshot() {
    let result = CAIDASnapshot::from_reader("1|2|-1\n1|2|-1\n2|1|0\n".as_bytes(), "mem");
    match result {
        Err(SimulationError::DuplicateEdgeConflict {
            first_source,
            second_source,
            ..
        }) => {
            assert_eq!(first_source, "mem:1");
            assert_eq!(second_source, "mem:3");
        }
        other => panic!("unexpected result: {:?}", other.map(|s| s.pairs.len())),
    }
}

fn two_snapshots() -> Vec<CAIDASnapshot> {
    // Given newest first on purpose; dates in the names decide the order.
    let newer = CAIDASnapshot::from_reader("1|2|0\n2|4|-1\n".as_bytes(), "rels_2025.10.16.txt")
        .map(|mut s| {
            s.date = chrono::NaiveDate::from_ymd_opt(2025, 10, 16);
            s
        })
        .unwrap();
    let older = CAIDASnapshot::from_reader("1|2|-1\n1|3|-1\n".as_bytes(), "rels_2025.10.15.txt")
        .map(|mut s| {
            s.date = chrono::NaiveDate::from_ymd_opt(2025, 10, 15);
            s
        })
        .unwrap();
    vec![newer, older]
}

#[test]
fn test_merge_later_wins() {
    let merged = merge_snapshots(two_snapshots(), SnapshotMergeRule::LaterWins).unwrap();
    assert_eq!(merged.len(), 3);
    assert_eq!(merged[&(1, 2)], Relationships::Peers);
    assert_eq!(merged[&(1, 3)], Relationships::Customers);
    assert_eq!(merged[&(2, 4)], Relationships::Customers);
}

#[test]
fn test_merge_latest_only() {
    let merged = merge_snapshots(two_snapshots(), SnapshotMergeRule::LatestOnly).unwrap();
    assert_eq!(merged.len(), 2);
    assert!(!merged.contains_key(&(1, 3)));
}

#[test]
fn test_merge_strict() {
    let result = merge_snapshots(two_snapshots(), SnapshotMergeRule::Strict);
    match result {
        Err(SimulationError::DuplicateEdgeConflict {
            asn1,
            asn2,
            first_source,
            second_source,
            ..
        }) => {
            assert_eq!((asn1, asn2), (1, 2));
            assert_eq!(first_source, "rels_2025.10.15.txt");
            assert_eq!(second_source, "rels_2025.10.16.txt");
        }
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn test_load_two_snapshots_from_disk() {
    let dir = TempDir::new().unwrap();
    let newer = write_file(dir.path(), "CAIDAASGraphCollector_2025.10.16.txt", "1|2|0\n");
    let older = write_file(dir.path(), "CAIDAASGraphCollector_2025.10.15.txt", "1|2|-1\n5|6|0\n");

    let as_graph =
        load_snapshots(&[newer.as_path(), older.as_path()], SnapshotMergeRule::LaterWins).unwrap();
    assert_eq!(as_graph.relationship(1, 2), Some(Relationships::Peers));
    assert_eq!(as_graph.relationship(5, 6), Some(Relationships::Peers));

    let latest =
        load_snapshots(&[older.as_path(), newer.as_path()], SnapshotMergeRule::LatestOnly).unwrap();
    assert_eq!(latest.all_asns(), vec![1, 2]);
}

#[test]
fn test_load_bz2_snapshot() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("20251015.as-rel2.txt.bz2");
    let mut encoder = BzEncoder::new(fs::File::create(&path).unwrap(), Compression::default());
    encoder.write_all(b"1|2|-1|bgp\n2|3|-1|bgp\n").unwrap();
    encoder.finish().unwrap();

    let as_graph = load_snapshots(&[path.as_path()], SnapshotMergeRule::LaterWins).unwrap();
    assert_eq!(as_graph.all_asns(), vec![1, 2, 3]);
    assert_eq!(as_graph.relationship(3, 2), Some(Relationships::Providers));
}
