use std::collections::BTreeSet;

use crate::as_graphs::as_graph::ASN;
use crate::shared::Settings;
use crate::simulation_engine::Announcement;

/// Route Origin Validation filter.
///
/// Holds the set of ASes that enforce ROV. Whether an announcement's origin
/// is authorized is carried by the announcement itself (`rov_invalid`), so
/// the check needs no ROA lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteValidator {
    rov_asns: BTreeSet<ASN>,
}

impl RouteValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_asns(asns: impl IntoIterator<Item = ASN>) -> Self {
        RouteValidator {
            rov_asns: asns.into_iter().collect(),
        }
    }

    /// Returns false if the AS was already enforcing ROV.
    pub fn add_rov_asn(&mut self, asn: ASN) -> bool {
        self.rov_asns.insert(asn)
    }

    pub fn is_rov_enforcing(&self, asn: ASN) -> bool {
        self.rov_asns.contains(&asn)
    }

    /// Whether `receiving_asn` keeps `ann` for ranking.
    ///
    /// Non-enforcing ASes accept everything. Enforcing ASes drop
    /// origin-invalid announcements outright, whatever their path.
    pub fn is_accepted(&self, ann: &Announcement, receiving_asn: ASN) -> bool {
        !self.is_rov_enforcing(receiving_asn) || !ann.rov_invalid
    }

    pub fn settings_for(&self, asn: ASN) -> Settings {
        if self.is_rov_enforcing(asn) {
            Settings::Rov
        } else {
            Settings::BaseDefense
        }
    }

    /// Enforcing ASNs in ascending order.
    pub fn rov_asns(&self) -> impl Iterator<Item = ASN> + '_ {
        self.rov_asns.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.rov_asns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rov_asns.is_empty()
    }
}
