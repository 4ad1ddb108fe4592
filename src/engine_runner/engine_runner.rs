use std::path::PathBuf;

use indicatif::ProgressBar;
use log::{debug, info, warn};

use crate::as_graphs::as_graph::ASGraph;
use crate::as_graphs::as_graph_generators::{ASGraphGenerator, CAIDAASGraphGenerator};
use crate::route_validator::RouteValidator;
use crate::shared::SimulationError;
use crate::simulation_engine::{ConvergenceStats, SeedAnnouncement, SimulationEngine};
use crate::simulation_framework::inputs::{read_announcements, read_rov_asns};
use crate::simulation_framework::rib_recorder::{extract, write_ribs_csv, RibRecord};

use super::engine_run_config::EngineRunConfig;

/// Outcome of a completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub stats: ConvergenceStats,
    pub records: usize,
    pub output_path: PathBuf,
}

/// Runs a single engine run from dataset files to the RIB output file
pub struct EngineRunner {
    pub config: EngineRunConfig,

    /// Spinner updated with the current stage, if any
    pub progress: Option<ProgressBar>,
}

impl EngineRunner {
    pub fn new(config: EngineRunConfig) -> Self {
        EngineRunner {
            config,
            progress: None,
        }
    }

    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Runs the simulation and writes the RIB file.
    ///
    /// Nothing is written unless propagation converges.
    pub fn run(&self) -> Result<RunSummary, SimulationError> {
        debug!("Engine run config: {}", self.config.to_json());
        let (records, stats) = self.simulate()?;

        self.stage("Writing RIBs");
        write_ribs_csv(&records, &self.config.output_path, self.config.include_origin)?;
        info!(
            "Wrote {} RIB entries to {}",
            records.len(),
            self.config.output_path.display()
        );

        Ok(RunSummary {
            stats,
            records: records.len(),
            output_path: self.config.output_path.clone(),
        })
    }

    /// Loads the inputs and propagates, returning the extracted RIBs.
    pub fn simulate(&self) -> Result<(Vec<RibRecord>, ConvergenceStats), SimulationError> {
        self.stage("Reading announcements");
        let seeds = read_announcements(&self.config.anns_path)?;

        self.stage("Reading ROV ASes");
        let route_validator = read_rov_asns(&self.config.rov_asns_path)?;

        self.stage("Building AS graph");
        let as_graph = self.build_graph(&seeds)?;
        self.check_inputs(&as_graph, &route_validator);

        self.stage("Propagating announcements");
        let mut engine = SimulationEngine::new(&as_graph, &route_validator, self.config.engine_config);
        engine.setup(&seeds)?;
        let stats = engine.run()?;
        info!(
            "Propagation finished: {} rounds, {} steps, {} RIB updates",
            stats.rounds, stats.steps, stats.rib_updates
        );

        Ok((extract(&engine.into_state()), stats))
    }

    fn build_graph(&self, seeds: &[SeedAnnouncement]) -> Result<ASGraph, SimulationError> {
        CAIDAASGraphGenerator::new(self.config.snapshot_paths.clone())
            .with_merge_rule(self.config.merge_rule)
            .with_extra_asns(seeds.iter().map(|seed| seed.origin_asn))
            .generate()
    }

    fn check_inputs(&self, as_graph: &ASGraph, route_validator: &RouteValidator) {
        if let Err(e) = as_graph.check_for_cycles() {
            warn!("{}; propagation will still terminate", e);
        }

        let missing: Vec<_> = route_validator
            .rov_asns()
            .filter(|asn| !as_graph.contains(asn))
            .collect();
        if !missing.is_empty() {
            warn!(
                "{} ROV ASes are not in the AS graph and will be ignored: {:?}",
                missing.len(),
                missing
            );
        }
    }

    fn stage(&self, message: &'static str) {
        debug!("{}", message);
        if let Some(pb) = &self.progress {
            pb.set_message(message);
        }
    }
}
