pub mod announcement;
pub mod engine;
pub mod policy;

pub use announcement::{Announcement, LocalRIB, Policy, PolicyStore, Prefix, SeedAnnouncement};
pub use engine::{ConvergenceStats, EngineConfig, PropagationPhase, SimulationEngine, SimulationState};
