pub mod inputs;
pub mod rib_recorder;

pub use inputs::{read_announcements, read_rov_asns};
pub use rib_recorder::{extract, to_json, write_ribs_csv, RibRecord};
