use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

#[cfg(feature = "derive")]
use serde::{Deserialize, Serialize};

use crate::hashring::hasher::Sha256Hasher;

pub mod diagnostics;
pub mod hasher;
mod crud;
pub(crate) mod iterator;

/// Construction-time configuration of a [`ConsistentHashRing`].
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "derive", derive(Serialize, Deserialize))]
pub struct RingConfig {
    /// Number of virtual nodes placed on the ring per unit of node weight.
    /// A node with weight `w` receives `floor(vnode_count * w)` virtual nodes.
    pub vnode_count: usize,
    /// Default number of distinct nodes returned by
    /// [`get_nodes_for_key`](ConsistentHashRing::get_nodes_for_key) when the caller
    /// does not pass an explicit replica count.
    pub replication_factor: usize,
}

impl Default for RingConfig {
    fn default() -> Self {
        RingConfig {
            vnode_count: 100,
            replication_factor: 3,
        }
    }
}

/// Registry entry for one physical node.
///
/// The weight is fixed at admission; there is no update operation. Changing a node's
/// share of the ring means removing it and adding it back with a new weight.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "derive", derive(Serialize, Deserialize))]
pub struct NodeInfo {
    pub weight: f64,
}

// The entire ring state guarded by one mutex: the sorted virtual-node hashes,
// the hash -> owner map kept in lockstep with them, and the node registry.
pub(crate) struct RingState<H> {
    hasher: H,
    config: RingConfig,
    ring: Vec<u64>,
    owners: HashMap<u64, String>,
    nodes: HashMap<String, NodeInfo>,
}

impl<H> RingState<H> {
    fn vnodes_for(&self, weight: f64) -> usize {
        (self.config.vnode_count as f64 * weight) as usize
    }

    fn is_consistent(&self) -> bool {
        if !self.ring.is_sorted() {
            return false;
        }
        if self.ring.windows(2).any(|pair| pair[0] == pair[1]) {
            return false;
        }
        if self.ring.len() != self.owners.len()
            || !self.ring.iter().all(|hash| self.owners.contains_key(hash))
        {
            return false;
        }

        let mut counts: HashMap<&str, usize> = HashMap::new();
        for owner in self.owners.values() {
            *counts.entry(owner.as_str()).or_default() += 1;
        }
        if !counts.keys().all(|id| self.nodes.contains_key(*id)) {
            return false;
        }
        self.nodes.iter().all(|(id, info)| {
            counts.get(id.as_str()).copied().unwrap_or(0) == self.vnodes_for(info.weight)
        })
    }
}

/// A consistent-hashing ring mapping string keys to weighted physical nodes.
///
/// The ring is an in-process routing table only: it stores no data and talks to no
/// network. Callers are responsible for acting on the node assignments it returns.
///
/// All operations take `&self`; the state is serialized internally by a single mutex,
/// so a `ConsistentHashRing` can be shared across threads behind an `Arc`.
pub struct ConsistentHashRing<H = Sha256Hasher> {
    state: Mutex<RingState<H>>,
}

impl ConsistentHashRing<Sha256Hasher> {
    /// Create a ring with the given configuration and the default SHA-256 hasher.
    pub fn new(config: RingConfig) -> ConsistentHashRing<Sha256Hasher> {
        ConsistentHashRing::with_hasher(config, Sha256Hasher)
    }
}

impl Default for ConsistentHashRing<Sha256Hasher> {
    fn default() -> Self {
        ConsistentHashRing::new(RingConfig::default())
    }
}

impl<H> ConsistentHashRing<H> {
    /// Create an empty ring that places virtual nodes and locates keys with `hasher`.
    ///
    /// Injecting the hasher allows deterministic tests and alternate hash families;
    /// any `Fn(&str) -> u64` closure works (see [`KeyHasher`](crate::KeyHasher)).
    pub fn with_hasher(config: RingConfig, hasher: H) -> ConsistentHashRing<H> {
        ConsistentHashRing {
            state: Mutex::new(RingState {
                hasher,
                config,
                ring: Vec::new(),
                owners: HashMap::new(),
                nodes: HashMap::new(),
            }),
        }
    }

    // A poisoned lock only means another thread panicked while holding it; every
    // mutation leaves the state complete before the guard drops, so recover it.
    pub(crate) fn lock(&self) -> MutexGuard<'_, RingState<H>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn into_state(self) -> RingState<H> {
        self.state.into_inner().unwrap_or_else(PoisonError::into_inner)
    }

    /// Get the number of physical nodes registered on the ring.
    pub fn len(&self) -> usize {
        self.lock().nodes.len()
    }

    /// Get the number of virtual nodes on the ring.
    pub fn vlen(&self) -> usize {
        self.lock().ring.len()
    }

    /// Returns true if the ring holds no virtual nodes.
    pub fn is_empty(&self) -> bool {
        self.lock().ring.is_empty()
    }

    /// Returns true if `node_id` is registered.
    pub fn contains_node(&self, node_id: &str) -> bool {
        self.lock().nodes.contains_key(node_id)
    }

    /// The weight `node_id` was admitted with, or `None` if it is not registered.
    pub fn weight_of(&self, node_id: &str) -> Option<f64> {
        self.lock().nodes.get(node_id).map(|info| info.weight)
    }

    /// All registered node identifiers, sorted.
    pub fn nodes(&self) -> Vec<String> {
        let state = self.lock();
        let mut ids: Vec<String> = state.nodes.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Structural integrity check: the ring is sorted and duplicate-free, the
    /// hash -> owner map matches it exactly, every owner is a registered node and
    /// every node owns exactly `floor(vnode_count * weight)` hashes.
    ///
    /// Always true after well-formed operation sequences; can report false after the
    /// known add/remove collision-walk divergence (see
    /// [`remove_node`](ConsistentHashRing::remove_node)).
    pub fn is_consistent(&self) -> bool {
        self.lock().is_consistent()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::{ConsistentHashRing, RingConfig};

    #[test]
    fn default_config_matches_documented_values() {
        let config = RingConfig::default();
        assert_eq!(100, config.vnode_count);
        assert_eq!(3, config.replication_factor);
    }

    #[test]
    fn empty_ring_accessors() {
        let ring = ConsistentHashRing::default();
        assert_eq!(0, ring.len());
        assert_eq!(0, ring.vlen());
        assert!(ring.is_empty());
        assert!(!ring.contains_node("node-a"));
        assert_eq!(None, ring.weight_of("node-a"));
        assert!(ring.nodes().is_empty());
        assert!(ring.is_consistent());
    }

    #[test]
    fn weight_and_membership_accessors() {
        let ring = ConsistentHashRing::new(RingConfig {
            vnode_count: 10,
            replication_factor: 2,
        });
        ring.add_node("node-a");
        ring.add_node_weighted("node-b", 2.5);

        assert_eq!(2, ring.len());
        assert_eq!(10 + 25, ring.vlen());
        assert!(ring.contains_node("node-b"));
        assert_eq!(Some(1.0), ring.weight_of("node-a"));
        assert_eq!(Some(2.5), ring.weight_of("node-b"));
        assert_eq!(vec!["node-a".to_string(), "node-b".to_string()], ring.nodes());
        assert!(ring.is_consistent());
    }
}
