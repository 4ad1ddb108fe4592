use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::shared::SnapshotMergeRule;
use crate::simulation_engine::EngineConfig;

pub const SNAPSHOT_FILE_NAMES: [&str; 2] = [
    "CAIDAASGraphCollector_2025.10.15.txt",
    "CAIDAASGraphCollector_2025.10.16.txt",
];
pub const ANNS_FILE_NAME: &str = "anns.csv";
pub const ROV_ASNS_FILE_NAME: &str = "rov_asns.csv";
pub const OUTPUT_FILE_NAME: &str = "my_ribs.csv";

/// Configuration for a single engine run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineRunConfig {
    /// Label used in logs; the dataset directory name by default
    pub name: String,

    /// Relationship snapshots, in any order
    pub snapshot_paths: Vec<PathBuf>,

    pub anns_path: PathBuf,

    pub rov_asns_path: PathBuf,

    pub output_path: PathBuf,

    pub merge_rule: SnapshotMergeRule,

    pub engine_config: EngineConfig,

    /// Add an `origin_asn` column to the output
    pub include_origin: bool,
}

impl EngineRunConfig {
    /// Resolves the fixed input and output file names inside `dir`.
    pub fn from_dataset_dir(dir: &Path) -> Self {
        let name = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| dir.display().to_string());

        EngineRunConfig {
            name,
            snapshot_paths: SNAPSHOT_FILE_NAMES.iter().map(|f| dir.join(f)).collect(),
            anns_path: dir.join(ANNS_FILE_NAME),
            rov_asns_path: dir.join(ROV_ASNS_FILE_NAME),
            output_path: dir.join(OUTPUT_FILE_NAME),
            merge_rule: SnapshotMergeRule::default(),
            engine_config: EngineConfig::default(),
            include_origin: false,
        }
    }

    pub fn with_snapshot_paths(mut self, paths: Vec<PathBuf>) -> Self {
        self.snapshot_paths = paths;
        self
    }

    pub fn with_output_path(mut self, path: PathBuf) -> Self {
        self.output_path = path;
        self
    }

    pub fn with_merge_rule(mut self, merge_rule: SnapshotMergeRule) -> Self {
        self.merge_rule = merge_rule;
        self
    }

    pub fn with_max_steps(mut self, max_steps: Option<usize>) -> Self {
        self.engine_config.max_steps = max_steps;
        self
    }

    pub fn with_include_origin(mut self, include_origin: bool) -> Self {
        self.include_origin = include_origin;
        self
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "name": self.name,
            "snapshot_paths": self.snapshot_paths,
            "anns_path": self.anns_path,
            "rov_asns_path": self.rov_asns_path,
            "output_path": self.output_path,
            "merge_rule": self.merge_rule,
            "max_steps": self.engine_config.max_steps,
            "include_origin": self.include_origin,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_dataset_dir() {
        let config = EngineRunConfig::from_dataset_dir(Path::new("/data/run1"))
            .with_merge_rule(SnapshotMergeRule::Strict)
            .with_max_steps(Some(5));

        assert_eq!(config.name, "run1");
        assert_eq!(
            config.snapshot_paths,
            vec![
                PathBuf::from("/data/run1/CAIDAASGraphCollector_2025.10.15.txt"),
                PathBuf::from("/data/run1/CAIDAASGraphCollector_2025.10.16.txt"),
            ]
        );
        assert_eq!(config.output_path, PathBuf::from("/data/run1/my_ribs.csv"));

        let json = config.to_json();
        assert_eq!(json["merge_rule"], "strict");
        assert_eq!(json["max_steps"], 5);
        assert_eq!(json["include_origin"], false);
    }
}
