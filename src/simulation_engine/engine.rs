use std::collections::{BTreeSet, VecDeque};

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::as_graphs::as_graph::{ASGraph, ASN};
use crate::route_validator::RouteValidator;
use crate::shared::{Relationships, SimulationError};
use crate::simulation_engine::announcement::{
    Announcement, LocalRIB, Policy, PolicyStore, SeedAnnouncement,
};
use crate::simulation_engine::policy::received_relationship;

/// Multiplier for the automatic step limit.
pub const AUTO_STEP_FACTOR: usize = 64;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Maximum number of AS activations before giving up. `None` derives a
    /// limit from the number of ASes and prefixes.
    pub max_steps: Option<usize>,
}

impl EngineConfig {
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = Some(max_steps);
        self
    }

    pub fn step_limit(&self, num_ases: usize, num_prefixes: usize) -> usize {
        self.max_steps.unwrap_or_else(|| {
            (num_ases + 1)
                .saturating_mul(num_prefixes + 1)
                .saturating_mul(AUTO_STEP_FACTOR)
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvergenceStats {
    pub rounds: usize,
    pub steps: usize,
    /// Number of times a local RIB entry was installed or replaced.
    pub rib_updates: usize,
}

/// One wavefront of a propagation round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropagationPhase {
    Up,
    Across,
    Down,
}

impl PropagationPhase {
    pub fn next(self) -> Option<Self> {
        match self {
            PropagationPhase::Up => Some(PropagationPhase::Across),
            PropagationPhase::Across => Some(PropagationPhase::Down),
            PropagationPhase::Down => None,
        }
    }

    /// Whether a route of class `class` is sent, during this phase, to a
    /// neighbor that is our `to`.
    pub fn carries(self, class: Relationships, to: Relationships) -> bool {
        let customer_route = matches!(class, Relationships::Origin | Relationships::Customers);
        match self {
            PropagationPhase::Up => {
                customer_route && matches!(to, Relationships::Providers | Relationships::Siblings)
            }
            PropagationPhase::Across => {
                (customer_route && to == Relationships::Peers)
                    || (class == Relationships::Peers && to == Relationships::Siblings)
            }
            PropagationPhase::Down => {
                to == Relationships::Customers
                    || (class == Relationships::Providers && to == Relationships::Siblings)
            }
        }
    }

    /// Whether routes of class `class` are exported at all during this phase.
    pub fn exports_class(self, class: Relationships) -> bool {
        match self {
            PropagationPhase::Up => {
                matches!(class, Relationships::Origin | Relationships::Customers)
            }
            PropagationPhase::Across => matches!(
                class,
                Relationships::Origin | Relationships::Customers | Relationships::Peers
            ),
            PropagationPhase::Down => true,
        }
    }
}

/// Per-AS routing state plus the pending work queue.
///
/// Policies are stored in the same order as the graph arena (ascending ASN).
pub struct SimulationState {
    pub policy_store: PolicyStore,
    queue: VecDeque<usize>,
    queued: Vec<bool>,
}

impl SimulationState {
    fn new(policy_store: PolicyStore) -> Self {
        let queued = vec![false; policy_store.len()];
        SimulationState {
            policy_store,
            queue: VecDeque::new(),
            queued,
        }
    }

    fn enqueue(&mut self, idx: usize) {
        if !self.queued[idx] {
            self.queued[idx] = true;
            self.queue.push_back(idx);
        }
    }

    fn clear(&mut self) {
        for policy in self.policy_store.iter_mut() {
            policy.local_rib.clear();
            policy.pending.clear();
        }
        self.queue.clear();
        self.queued.iter_mut().for_each(|q| *q = false);
    }

    /// Policies in ascending ASN order.
    pub fn policies(&self) -> impl Iterator<Item = &Policy> {
        self.policy_store.iter()
    }

    pub fn local_rib(&self, asn: ASN) -> Option<&LocalRIB> {
        self.policy_store
            .iter()
            .find(|policy| policy.asn == asn)
            .map(|policy| &policy.local_rib)
    }

    /// Number of ASes waiting to be processed.
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }
}

#[derive(Debug, Clone, Copy)]
struct Cursor {
    round: usize,
    phase: PropagationPhase,
    phase_started: bool,
    round_changed: bool,
    converged: bool,
}

impl Default for Cursor {
    fn default() -> Self {
        Cursor {
            round: 1,
            phase: PropagationPhase::Up,
            phase_started: false,
            round_changed: false,
            converged: false,
        }
    }
}

/// Propagates seeded announcements over an [`ASGraph`] until no RIB changes.
///
/// Every round runs the up, across and down phases in order. Each phase drains
/// a FIFO queue of ASes; an AS is re-queued whenever its best route for some
/// prefix strictly improves. The run stops after a round with no change.
pub struct SimulationEngine<'a> {
    pub as_graph: &'a ASGraph,
    pub route_validator: &'a RouteValidator,
    pub config: EngineConfig,
    state: SimulationState,
    cursor: Cursor,
    step_limit: usize,
    steps: usize,
    rib_updates: usize,
}

impl<'a> SimulationEngine<'a> {
    pub fn new(
        as_graph: &'a ASGraph,
        route_validator: &'a RouteValidator,
        config: EngineConfig,
    ) -> Self {
        let mut policy_store = PolicyStore::new();
        for as_obj in as_graph.iter() {
            policy_store.create_policy(as_obj.asn, route_validator.settings_for(as_obj.asn));
        }

        SimulationEngine {
            as_graph,
            route_validator,
            config,
            state: SimulationState::new(policy_store),
            cursor: Cursor::default(),
            step_limit: config.step_limit(as_graph.len(), 0),
            steps: 0,
            rib_updates: 0,
        }
    }

    /// Clears any previous run and installs the seed routes at their origins.
    ///
    /// An origin that enforces ROV drops its own origin-invalid seed.
    pub fn setup(&mut self, seeds: &[SeedAnnouncement]) -> Result<(), SimulationError> {
        self.state.clear();
        self.cursor = Cursor::default();
        self.steps = 0;
        self.rib_updates = 0;

        let mut prefixes = BTreeSet::new();
        for seed in seeds {
            let idx = self.as_graph.index_of(seed.origin_asn).ok_or_else(|| {
                SimulationError::UnknownOrigin {
                    asn: seed.origin_asn,
                    prefix: seed.prefix.clone(),
                }
            })?;
            prefixes.insert(seed.prefix.as_str());
            let ann = seed.to_announcement();
            if !self.route_validator.is_accepted(&ann, seed.origin_asn) {
                debug!(
                    "AS {} enforces ROV and drops its own invalid seed for {}",
                    seed.origin_asn, seed.prefix
                );
                continue;
            }
            if self.state.policy_store[idx].seed_ann(ann) {
                self.rib_updates += 1;
            }
        }

        self.step_limit = self.config.step_limit(self.as_graph.len(), prefixes.len());
        debug!(
            "Seeded {} announcements for {} prefixes; step limit {}",
            seeds.len(),
            prefixes.len(),
            self.step_limit
        );
        Ok(())
    }

    /// Processes one queued AS. Returns `Ok(false)` once converged.
    pub fn step(&mut self) -> Result<bool, SimulationError> {
        loop {
            if self.cursor.converged {
                return Ok(false);
            }
            if !self.cursor.phase_started {
                self.start_phase();
            }
            if !self.state.queue.is_empty() {
                if self.steps >= self.step_limit {
                    return Err(SimulationError::NonConvergence { steps: self.steps });
                }
                if let Some(idx) = self.state.queue.pop_front() {
                    self.state.queued[idx] = false;
                    self.steps += 1;
                    self.process_as(idx);
                }
                return Ok(true);
            }
            self.finish_phase();
        }
    }

    /// Steps until convergence.
    ///
    /// On `NonConvergence` the partial state is left behind and should be
    /// discarded.
    pub fn run(&mut self) -> Result<ConvergenceStats, SimulationError> {
        while self.step()? {}
        Ok(self.stats())
    }

    pub fn stats(&self) -> ConvergenceStats {
        ConvergenceStats {
            rounds: self.cursor.round,
            steps: self.steps,
            rib_updates: self.rib_updates,
        }
    }

    pub fn is_converged(&self) -> bool {
        self.cursor.converged
    }

    pub fn local_rib(&self, asn: ASN) -> Option<&LocalRIB> {
        self.as_graph
            .index_of(asn)
            .map(|idx| &self.state.policy_store[idx].local_rib)
    }

    pub fn best(&self, asn: ASN, prefix: &str) -> Option<&Announcement> {
        self.local_rib(asn).and_then(|rib| rib.get(prefix))
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    pub fn into_state(self) -> SimulationState {
        self.state
    }

    fn start_phase(&mut self) {
        let phase = self.cursor.phase;
        for idx in 0..self.state.policy_store.len() {
            let policy = &mut self.state.policy_store[idx];
            policy.pending.extend(
                policy
                    .local_rib
                    .iter()
                    .filter(|(_, ann)| phase.exports_class(ann.recv_relationship))
                    .map(|(prefix, _)| prefix.clone()),
            );
            let exporting = !policy.pending.is_empty();
            if exporting {
                self.state.enqueue(idx);
            }
        }
        self.cursor.phase_started = true;
        debug!(
            "Round {} {:?} phase: {} ASes queued",
            self.cursor.round,
            phase,
            self.state.queue.len()
        );
    }

    fn finish_phase(&mut self) {
        self.cursor.phase_started = false;
        if let Some(next) = self.cursor.phase.next() {
            self.cursor.phase = next;
            return;
        }
        if self.cursor.round_changed {
            self.cursor.round += 1;
            self.cursor.round_changed = false;
            self.cursor.phase = PropagationPhase::Up;
        } else {
            self.cursor.converged = true;
            info!(
                "Converged after {} rounds, {} steps, {} RIB updates",
                self.cursor.round, self.steps, self.rib_updates
            );
        }
    }

    /// Sends the current best route of every pending prefix to the neighbors
    /// this phase exports to.
    fn process_as(&mut self, idx: usize) {
        let graph = self.as_graph;
        let phase = self.cursor.phase;
        let policy = &mut self.state.policy_store[idx];
        let sender_asn = policy.asn;
        let prefixes = std::mem::take(&mut policy.pending);

        for prefix in prefixes {
            let best = match self.state.policy_store[idx].best(&prefix) {
                Some(ann) => ann.clone(),
                None => continue,
            };
            for &(n_idx, to) in graph.adjacency(idx) {
                if !phase.carries(best.recv_relationship, to)
                    || !self.state.policy_store[idx].should_propagate_to_rel(&best, to)
                {
                    continue;
                }
                let ann =
                    best.copy_and_process(sender_asn, received_relationship(best.recv_relationship, to));
                self.deliver(n_idx, ann);
            }
        }
    }

    fn deliver(&mut self, idx: usize, ann: Announcement) {
        let as_obj = self.as_graph.as_at(idx);
        let policy = &mut self.state.policy_store[idx];
        if !policy.valid_ann(&ann, as_obj, self.route_validator) {
            return;
        }
        if policy.process_ann(ann) {
            self.rib_updates += 1;
            self.cursor.round_changed = true;
            self.state.enqueue(idx);
        }
    }
}
