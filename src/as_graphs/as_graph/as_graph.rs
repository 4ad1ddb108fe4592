use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::shared::{CycleError, RecordLocation, Relationships, SimulationError};

pub type ASN = u32;

/// An AS and the ASNs of its neighbors, grouped by what each neighbor is to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AS {
    pub asn: ASN,
    pub peers: Vec<ASN>,
    pub providers: Vec<ASN>,
    pub customers: Vec<ASN>,
    pub siblings: Vec<ASN>,
}

impl AS {
    fn new(asn: ASN) -> Self {
        AS {
            asn,
            peers: Vec::new(),
            providers: Vec::new(),
            customers: Vec::new(),
            siblings: Vec::new(),
        }
    }
}

/// Builder used to describe an AS by hand (tests, small fixtures).
#[derive(Debug, Clone)]
pub struct ASBuilder {
    pub asn: ASN,
    pub peer_asns: Vec<ASN>,
    pub provider_asns: Vec<ASN>,
    pub customer_asns: Vec<ASN>,
    pub sibling_asns: Vec<ASN>,
}

impl ASBuilder {
    pub fn new(asn: ASN) -> Self {
        ASBuilder {
            asn,
            peer_asns: Vec::new(),
            provider_asns: Vec::new(),
            customer_asns: Vec::new(),
            sibling_asns: Vec::new(),
        }
    }

    pub fn with_peers(mut self, peers: Vec<ASN>) -> Self {
        self.peer_asns = peers;
        self
    }

    pub fn with_providers(mut self, providers: Vec<ASN>) -> Self {
        self.provider_asns = providers;
        self
    }

    pub fn with_customers(mut self, customers: Vec<ASN>) -> Self {
        self.customer_asns = customers;
        self
    }

    pub fn with_siblings(mut self, siblings: Vec<ASN>) -> Self {
        self.sibling_asns = siblings;
        self
    }
}

/// Key of an undirected AS pair: lower ASN first.
pub type ASPair = (ASN, ASN);

/// Normalizes "`neighbor` is `asn`'s `rel`" into a pair key and the role the
/// higher ASN plays for the lower one.
pub fn normalize_edge(asn: ASN, neighbor: ASN, rel: Relationships) -> (ASPair, Relationships) {
    if asn <= neighbor {
        ((asn, neighbor), rel)
    } else {
        ((neighbor, asn), rel.invert())
    }
}

/// Immutable AS topology.
///
/// ASes live in an arena sorted by ASN; the engine addresses them by arena
/// index. Every neighbor list is sorted by ASN, which keeps propagation order
/// reproducible.
#[derive(Debug, Clone, Default)]
pub struct ASGraph {
    ases: Vec<AS>,
    index: HashMap<ASN, usize>,
    adjacency: Vec<Vec<(usize, Relationships)>>,
}

impl ASGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from hand-written builders.
    ///
    /// Relationships only need to be declared on one side; the reverse edge is
    /// implied. Declaring the same pair twice with different roles fails.
    pub fn build(builders: Vec<ASBuilder>) -> Result<ASGraph, SimulationError> {
        let mut asns = BTreeSet::new();
        let mut pairs: BTreeMap<ASPair, Relationships> = BTreeMap::new();

        for builder in &builders {
            asns.insert(builder.asn);
            let declared = [
                (&builder.peer_asns, Relationships::Peers),
                (&builder.provider_asns, Relationships::Providers),
                (&builder.customer_asns, Relationships::Customers),
                (&builder.sibling_asns, Relationships::Siblings),
            ];
            for (neighbors, rel) in declared {
                for &neighbor in neighbors {
                    if neighbor == builder.asn {
                        return Err(SimulationError::MalformedTopology {
                            location: RecordLocation {
                                source: "builder".to_string(),
                                line: 0,
                                record: format!("AS {} {} {}", builder.asn, rel, neighbor),
                            },
                            reason: "AS cannot be its own neighbor".to_string(),
                        });
                    }
                    let (key, role) = normalize_edge(builder.asn, neighbor, rel);
                    match pairs.get(&key) {
                        Some(existing) if *existing != role => {
                            return Err(SimulationError::DuplicateEdgeConflict {
                                asn1: key.0,
                                asn2: key.1,
                                first: existing.to_string(),
                                first_source: "builder".to_string(),
                                second: role.to_string(),
                                second_source: format!("builder for AS {}", builder.asn),
                            });
                        }
                        _ => {
                            pairs.insert(key, role);
                        }
                    }
                }
            }
        }

        Ok(Self::from_pairs(asns, &pairs))
    }

    /// Build a graph from normalized pairs plus ASes that may have no edge.
    /// Self-pairs must have been rejected by the caller.
    pub fn from_pairs(
        extra_asns: impl IntoIterator<Item = ASN>,
        pairs: &BTreeMap<ASPair, Relationships>,
    ) -> ASGraph {
        let mut all: BTreeSet<ASN> = extra_asns.into_iter().collect();
        for &(low, high) in pairs.keys() {
            all.insert(low);
            all.insert(high);
        }

        let asns: Vec<ASN> = all.into_iter().collect();
        let mut ases: Vec<AS> = asns.iter().map(|&asn| AS::new(asn)).collect();
        let index: HashMap<ASN, usize> = asns.iter().enumerate().map(|(i, &asn)| (asn, i)).collect();
        let mut adjacency: Vec<Vec<(usize, Relationships)>> = vec![Vec::new(); asns.len()];

        for (&(low, high), &role) in pairs {
            let (li, hi) = (index[&low], index[&high]);
            adjacency[li].push((hi, role));
            adjacency[hi].push((li, role.invert()));
        }

        for (as_obj, neighbors) in ases.iter_mut().zip(adjacency.iter_mut()) {
            neighbors.sort_unstable_by_key(|&(idx, _)| idx);
            for &(n_idx, rel) in neighbors.iter() {
                let neighbor_asn = asns[n_idx];
                match rel {
                    Relationships::Peers => as_obj.peers.push(neighbor_asn),
                    Relationships::Providers => as_obj.providers.push(neighbor_asn),
                    Relationships::Customers => as_obj.customers.push(neighbor_asn),
                    Relationships::Siblings => as_obj.siblings.push(neighbor_asn),
                    _ => {}
                }
            }
        }

        ASGraph {
            ases,
            index,
            adjacency,
        }
    }

    pub fn get(&self, asn: &ASN) -> Option<&AS> {
        self.index.get(asn).map(|&i| &self.ases[i])
    }

    pub fn contains(&self, asn: &ASN) -> bool {
        self.index.contains_key(asn)
    }

    /// Arena index of an ASN.
    pub fn index_of(&self, asn: ASN) -> Option<usize> {
        self.index.get(&asn).copied()
    }

    /// AS stored at an arena index.
    pub fn as_at(&self, idx: usize) -> &AS {
        &self.ases[idx]
    }

    /// Neighbors of the AS at `idx` as (arena index, what the neighbor is to it).
    pub fn adjacency(&self, idx: usize) -> &[(usize, Relationships)] {
        &self.adjacency[idx]
    }

    /// Neighbors of `asn`, sorted by ASN, with the role each plays for `asn`.
    pub fn neighbors(&self, asn: ASN) -> Vec<(ASN, Relationships)> {
        match self.index.get(&asn) {
            Some(&i) => self.adjacency[i]
                .iter()
                .map(|&(n, rel)| (self.ases[n].asn, rel))
                .collect(),
            None => Vec::new(),
        }
    }

    /// Role `neighbor` plays for `asn`, if they are adjacent.
    pub fn relationship(&self, asn: ASN, neighbor: ASN) -> Option<Relationships> {
        let i = self.index_of(asn)?;
        let n = self.index_of(neighbor)?;
        self.adjacency[i]
            .binary_search_by_key(&n, |&(idx, _)| idx)
            .ok()
            .map(|pos| self.adjacency[i][pos].1)
    }

    /// All ASNs in ascending order.
    pub fn all_asns(&self) -> Vec<ASN> {
        self.ases.iter().map(|as_obj| as_obj.asn).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AS> {
        self.ases.iter()
    }

    pub fn len(&self) -> usize {
        self.ases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ases.is_empty()
    }

    /// Number of undirected edges.
    pub fn edge_count(&self) -> usize {
        self.adjacency.iter().map(Vec::len).sum::<usize>() / 2
    }

    /// Look for a cycle along provider links (A provider of B provider of ... A).
    pub fn check_for_cycles(&self) -> Result<(), CycleError> {
        // 0 = unvisited, 1 = on the current path, 2 = done
        let mut state = vec![0u8; self.ases.len()];

        for start in 0..self.ases.len() {
            if state[start] != 0 {
                continue;
            }
            state[start] = 1;
            // (node, position in its adjacency list)
            let mut stack: Vec<(usize, usize)> = vec![(start, 0)];

            while let Some(top) = stack.last_mut() {
                let (node, pos) = *top;
                let next_provider = self.adjacency[node][pos..]
                    .iter()
                    .position(|(_, rel)| *rel == Relationships::Providers);

                match next_provider {
                    Some(offset) => {
                        top.1 = pos + offset + 1;
                        let provider = self.adjacency[node][pos + offset].0;
                        match state[provider] {
                            0 => {
                                state[provider] = 1;
                                stack.push((provider, 0));
                            }
                            1 => {
                                return Err(CycleError {
                                    asn: self.ases[provider].asn,
                                })
                            }
                            _ => {}
                        }
                    }
                    None => {
                        state[node] = 2;
                        stack.pop();
                    }
                }
            }
        }

        Ok(())
    }
}

