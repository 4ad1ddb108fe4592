pub mod bgp;
pub mod rov;

pub use bgp::BGPPolicy;
pub use rov::ROVPolicy;
