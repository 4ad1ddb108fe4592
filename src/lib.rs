pub mod as_graphs;
pub mod engine_runner;
pub mod route_validator;
pub mod shared;
pub mod simulation_engine;
pub mod simulation_framework;

// Re-export commonly used types at the crate root
pub use as_graphs::{ASBuilder, ASGraph, AS, ASN};
pub use engine_runner::{EngineRunConfig, EngineRunner};
pub use route_validator::RouteValidator;
pub use shared::{Relationships, Settings, SimulationError, SnapshotMergeRule};
pub use simulation_engine::{Announcement, EngineConfig, Prefix, SeedAnnouncement, SimulationEngine};
pub use simulation_framework::RibRecord;
