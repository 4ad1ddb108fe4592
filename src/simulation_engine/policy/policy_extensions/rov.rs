use crate::as_graphs::as_graph::AS;
use crate::route_validator::RouteValidator;
use crate::shared::Relationships;
use crate::simulation_engine::announcement::Announcement;
use crate::simulation_engine::policy::PolicyExtension;
use crate::simulation_engine::policy::policy_extensions::BGPPolicy;

/// Route Origin Validation: BGP plus dropping origin-invalid routes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ROVPolicy;

impl PolicyExtension for ROVPolicy {
    fn validate_announcement(
        &self,
        ann: &Announcement,
        recv_relationship: Relationships,
        as_obj: &AS,
        route_validator: &RouteValidator,
    ) -> bool {
        BGPPolicy.validate_announcement(ann, recv_relationship, as_obj, route_validator)
            && route_validator.is_accepted(ann, as_obj.asn)
    }

    fn name(&self) -> &str {
        "ROV"
    }
}
