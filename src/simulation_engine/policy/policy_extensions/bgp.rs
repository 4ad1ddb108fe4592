use crate::simulation_engine::policy::PolicyExtension;

/// Plain BGP: loop prevention, Gao-Rexford ranking and export.
#[derive(Debug, Clone, Copy, Default)]
pub struct BGPPolicy;

impl PolicyExtension for BGPPolicy {
    fn name(&self) -> &str {
        "BGP"
    }
}
