use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write;
use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};

use crate::as_graphs::as_graph::{AS, ASN};
use crate::route_validator::RouteValidator;
use crate::shared::{Relationships, Settings};
use crate::simulation_engine::policy::{create_policy_extension, PolicyExtension};

/// Address block identifier. Treated as an opaque token.
pub type Prefix = String;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Announcement {
    pub prefix: Prefix,
    /// Holder first, origin last.
    pub as_path: Vec<ASN>,
    /// Neighbor the route was learned from; the origin itself for a seed.
    pub next_hop_asn: ASN,
    /// Class of the route at its holder (origin, customer, peer or provider).
    pub recv_relationship: Relationships,
    /// The origin is not authorized for the prefix.
    pub rov_invalid: bool,
}

impl Announcement {
    pub fn new(prefix: impl Into<Prefix>, next_hop_asn: ASN, recv_relationship: Relationships) -> Self {
        Announcement {
            prefix: prefix.into(),
            as_path: Vec::new(),
            next_hop_asn,
            recv_relationship,
            rov_invalid: false,
        }
    }

    pub fn new_with_path(
        prefix: impl Into<Prefix>,
        as_path: Vec<ASN>,
        next_hop_asn: ASN,
        recv_relationship: Relationships,
        rov_invalid: bool,
    ) -> Self {
        Announcement {
            prefix: prefix.into(),
            as_path,
            next_hop_asn,
            recv_relationship,
            rov_invalid,
        }
    }

    /// The route an origin AS holds for its own prefix.
    pub fn seed(prefix: impl Into<Prefix>, origin_asn: ASN, rov_invalid: bool) -> Self {
        Announcement::new_with_path(
            prefix,
            vec![origin_asn],
            origin_asn,
            Relationships::Origin,
            rov_invalid,
        )
    }

    pub fn origin(&self) -> ASN {
        self.as_path.last().copied().unwrap_or(self.next_hop_asn)
    }

    /// Copy of this route as a neighbor receives it from `next_hop_asn`.
    pub fn copy_and_process(&self, next_hop_asn: ASN, recv_relationship: Relationships) -> Self {
        let mut new_ann = self.clone();
        new_ann.next_hop_asn = next_hop_asn;
        new_ann.recv_relationship = recv_relationship;
        new_ann
    }
}

/// Renders an AS path as a tuple: `(3, 2, 1)`, or `(1,)` for one hop.
pub fn format_as_path(as_path: &[ASN]) -> String {
    let mut out = String::from("(");
    match as_path {
        [single] => {
            let _ = write!(out, "{},", single);
        }
        _ => {
            for (i, asn) in as_path.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                let _ = write!(out, "{}", asn);
            }
        }
    }
    out.push(')');
    out
}

/// One row of the announcements input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedAnnouncement {
    pub origin_asn: ASN,
    pub prefix: Prefix,
    pub rov_invalid: bool,
}

impl SeedAnnouncement {
    pub fn new(origin_asn: ASN, prefix: impl Into<Prefix>, rov_invalid: bool) -> Self {
        SeedAnnouncement {
            origin_asn,
            prefix: prefix.into(),
            rov_invalid,
        }
    }

    pub fn to_announcement(&self) -> Announcement {
        Announcement::seed(self.prefix.clone(), self.origin_asn, self.rov_invalid)
    }
}

pub type LocalRIB = BTreeMap<Prefix, Announcement>;

/// Routing state and policy of one AS.
pub struct Policy {
    pub asn: ASN,
    pub extension: Box<dyn PolicyExtension>,
    pub local_rib: LocalRIB,
    /// Prefixes whose best route changed and still has to be announced.
    pub pending: BTreeSet<Prefix>,
}

impl Policy {
    pub fn new(asn: ASN) -> Self {
        Self::with_settings(asn, Settings::BaseDefense)
    }

    pub fn with_settings(asn: ASN, settings: Settings) -> Self {
        Policy {
            asn,
            extension: create_policy_extension(settings),
            local_rib: LocalRIB::new(),
            pending: BTreeSet::new(),
        }
    }

    /// Installs an origin route. ROV filtering happens before this call.
    pub fn seed_ann(&mut self, ann: Announcement) -> bool {
        self.install_if_better(ann)
    }

    pub fn valid_ann(&self, ann: &Announcement, as_obj: &AS, route_validator: &RouteValidator) -> bool {
        self.extension
            .validate_announcement(ann, ann.recv_relationship, as_obj, route_validator)
    }

    /// Prepends our ASN to a received route and keeps it if it beats the
    /// current best. Returns whether the local RIB changed.
    pub fn process_ann(&mut self, mut ann: Announcement) -> bool {
        ann.as_path.insert(0, self.asn);
        self.install_if_better(ann)
    }

    fn install_if_better(&mut self, ann: Announcement) -> bool {
        let better = match self.local_rib.get(&ann.prefix) {
            Some(current) => self.extension.compare_announcements(&ann, current) == Ordering::Less,
            None => true,
        };
        if better {
            self.pending.insert(ann.prefix.clone());
            self.local_rib.insert(ann.prefix.clone(), ann);
        }
        better
    }

    pub fn should_propagate_to_rel(&self, ann: &Announcement, rel: Relationships) -> bool {
        self.extension.should_propagate(ann, ann.recv_relationship, rel)
    }

    pub fn best(&self, prefix: &str) -> Option<&Announcement> {
        self.local_rib.get(prefix)
    }
}

/// Policies of every AS, indexed like the graph arena.
pub struct PolicyStore {
    policies: Vec<Policy>,
}

impl PolicyStore {
    pub fn new() -> Self {
        PolicyStore {
            policies: Vec::new(),
        }
    }

    pub fn create_policy(&mut self, asn: ASN, settings: Settings) -> &mut Policy {
        self.policies.push(Policy::with_settings(asn, settings));
        let last = self.policies.len() - 1;
        &mut self.policies[last]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Policy> {
        self.policies.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Policy> {
        self.policies.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.policies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }
}

impl Index<usize> for PolicyStore {
    type Output = Policy;

    fn index(&self, idx: usize) -> &Policy {
        &self.policies[idx]
    }
}

impl IndexMut<usize> for PolicyStore {
    fn index_mut(&mut self, idx: usize) -> &mut Policy {
        &mut self.policies[idx]
    }
}

impl Default for PolicyStore {
    fn default() -> Self {
        Self::new()
    }
}
