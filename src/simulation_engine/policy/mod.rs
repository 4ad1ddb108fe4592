pub mod policy_extensions;

use std::cmp::Ordering;

use crate::as_graphs::as_graph::AS;
use crate::route_validator::RouteValidator;
use crate::shared::{Relationships, Settings};
use crate::simulation_engine::announcement::Announcement;

/// Gao-Rexford export rule.
///
/// `from` is the class of the route at the sender, `to` is the role the
/// receiver plays for the sender. Origin and customer routes go everywhere;
/// peer and provider routes only go to customers. Siblings share everything.
pub fn may_export(from: Relationships, to: Relationships) -> bool {
    match (from, to) {
        (_, Relationships::Siblings) => true,
        (Relationships::Origin, _) | (Relationships::Customers, _) => true,
        (Relationships::Peers, Relationships::Customers) => true,
        (Relationships::Providers, Relationships::Customers) => true,
        _ => false,
    }
}

/// Class a route takes at the receiver when sent over an edge where the
/// receiver is the sender's `to`.
///
/// Across a sibling link the route keeps the class it had at the sender, with
/// origin routes becoming customer routes.
pub fn received_relationship(from: Relationships, to: Relationships) -> Relationships {
    match to {
        Relationships::Siblings => match from {
            Relationships::Origin => Relationships::Customers,
            other => other,
        },
        other => other.invert(),
    }
}

pub fn gao_rexford_preference(rel: Relationships) -> u8 {
    match rel {
        Relationships::Origin => 4,
        Relationships::Customers => 3,
        Relationships::Peers => 2,
        Relationships::Providers => 1,
        _ => 0,
    }
}

/// Total order over routes for the same prefix; `Less` is the better route.
///
/// Higher class preference wins, then the shorter path, then the lower next
/// hop, then the lexicographically smaller path. An origin-valid route beats
/// an otherwise identical invalid one.
pub fn rank_announcements(ann1: &Announcement, ann2: &Announcement) -> Ordering {
    gao_rexford_preference(ann2.recv_relationship)
        .cmp(&gao_rexford_preference(ann1.recv_relationship))
        .then_with(|| ann1.as_path.len().cmp(&ann2.as_path.len()))
        .then_with(|| ann1.next_hop_asn.cmp(&ann2.next_hop_asn))
        .then_with(|| ann1.as_path.cmp(&ann2.as_path))
        .then_with(|| ann1.rov_invalid.cmp(&ann2.rov_invalid))
}

/// Per-AS routing behavior.
pub trait PolicyExtension: Send + Sync {
    /// Validate an incoming announcement before it is ranked.
    fn validate_announcement(
        &self,
        ann: &Announcement,
        recv_relationship: Relationships,
        as_obj: &AS,
        _route_validator: &RouteValidator,
    ) -> bool {
        if ann.as_path.is_empty() && recv_relationship != Relationships::Origin {
            return false;
        }
        // loop prevention
        if ann.as_path.contains(&as_obj.asn) {
            return false;
        }
        match ann.as_path.first() {
            Some(first_asn) => *first_asn == ann.next_hop_asn,
            None => true,
        }
    }

    /// Whether a route of class `recv_relationship` may go to a neighbor
    /// that is our `send_relationship`.
    fn should_propagate(
        &self,
        _ann: &Announcement,
        recv_relationship: Relationships,
        send_relationship: Relationships,
    ) -> bool {
        may_export(recv_relationship, send_relationship)
    }

    fn compare_announcements(&self, ann1: &Announcement, ann2: &Announcement) -> Ordering {
        rank_announcements(ann1, ann2)
    }

    fn name(&self) -> &str;
}

pub fn create_policy_extension(settings: Settings) -> Box<dyn PolicyExtension> {
    use policy_extensions::*;

    match settings {
        Settings::BaseDefense => Box::new(bgp::BGPPolicy),
        Settings::Rov => Box::new(rov::ROVPolicy),
    }
}
