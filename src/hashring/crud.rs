use std::collections::HashSet;

use super::diagnostics::{Diagnostic, emit};
use super::hasher::KeyHasher;
use super::{ConsistentHashRing, NodeInfo, RingState};

impl<H> ConsistentHashRing<H>
where
    H: KeyHasher,
{
    /// Add a physical node with the default weight of 1.0.
    ///
    /// Adding an identifier that is already registered is a no-op with a diagnostic.
    pub fn add_node(&self, node_id: impl Into<String>) {
        self.add_node_weighted(node_id, 1.0);
    }

    /// Add a physical node with an explicit weight.
    ///
    /// The node receives `floor(vnode_count * weight)` virtual nodes. A weight small
    /// enough to floor to zero registers the node without placing it on the ring: it
    /// counts toward the replica clamp but can never own a key.
    pub fn add_node_weighted(&self, node_id: impl Into<String>, weight: f64) {
        self.lock().add_node(node_id.into(), weight);
    }

    /// Remove a physical node and all virtual nodes created at its admission.
    ///
    /// Removing an unknown identifier is a no-op with a diagnostic. Afterwards the
    /// remaining nodes' ownership is identical to what it would have been had the
    /// node never been added.
    ///
    /// Removal regenerates the admission hash sequence, but its collision walk
    /// advances only while a hash is occupied by a *different* node, whereas
    /// admission advances while a hash is occupied by anyone. If a node collided
    /// with one of its own earlier virtual nodes at admission, the walks diverge
    /// and the salted hash stays behind as an orphan. This asymmetry is intentional
    /// and kept observable: the dead-end case emits [`Diagnostic::MissingVnode`] and
    /// the aftermath is detectable via
    /// [`is_consistent`](ConsistentHashRing::is_consistent).
    pub fn remove_node(&self, node_id: &str) {
        self.lock().remove_node(node_id);
    }

    /// Look up the single node owning `key`.
    ///
    /// Returns `None` (with a diagnostic) if the ring has no virtual nodes. For a
    /// fixed ring state the result is deterministic: the same key maps to the same
    /// node until the ring mutates.
    pub fn get_node(&self, key: &str) -> Option<String> {
        self.lock().get_node(key)
    }

    /// Look up an ordered list of distinct nodes for `key`.
    ///
    /// `replica_count` defaults to the configured replication factor and is clamped
    /// (with a diagnostic) to the number of registered nodes. The result is the
    /// sequence of distinct owners encountered clockwise from the key's landing
    /// point, so its first entry equals [`get_node`](ConsistentHashRing::get_node).
    pub fn get_nodes_for_key(&self, key: &str, replica_count: Option<usize>) -> Vec<String> {
        self.lock().get_nodes_for_key(key, replica_count)
    }
}

impl<H> RingState<H>
where
    H: KeyHasher,
{
    pub(super) fn add_node(&mut self, node_id: String, weight: f64) {
        if self.nodes.contains_key(&node_id) {
            emit(Diagnostic::DuplicateNode { node_id });
            return;
        }

        let total_vnodes = self.vnodes_for(weight);
        self.nodes.insert(node_id.clone(), NodeInfo { weight });

        for index in 0..total_vnodes {
            let vnode_key = format!("{node_id}-{index}");
            let mut hash = self.hasher.hash_key(&vnode_key);
            let mut salt = 0u64;
            // Unbounded in principle: a densely populated hash space can keep
            // colliding on every salted variant.
            while self.owners.contains_key(&hash) {
                salt += 1;
                emit(Diagnostic::HashCollision {
                    vnode_key: vnode_key.clone(),
                    salt,
                });
                hash = self.hasher.hash_key(&format!("{vnode_key}_{salt}"));
            }
            self.ring.push(hash);
            self.owners.insert(hash, node_id.clone());
        }
        self.ring.sort_unstable();
    }

    pub(super) fn remove_node(&mut self, node_id: &str) {
        let Some(info) = self.nodes.get(node_id) else {
            emit(Diagnostic::UnknownNode {
                node_id: node_id.to_string(),
            });
            return;
        };

        let total_vnodes = self.vnodes_for(info.weight);
        let mut doomed = HashSet::with_capacity(total_vnodes);

        for index in 0..total_vnodes {
            let vnode_key = format!("{node_id}-{index}");
            let mut hash = self.hasher.hash_key(&vnode_key);
            let mut salt = 0u64;
            // Walk the same salt chain as admission, but stop at the first hash
            // this node owns or at the first unoccupied hash (see remove_node docs
            // for how this can diverge from the admission walk).
            loop {
                match self.owners.get(&hash) {
                    Some(owner) if owner == node_id => {
                        doomed.insert(hash);
                        break;
                    }
                    Some(_) => {
                        salt += 1;
                        hash = self.hasher.hash_key(&format!("{vnode_key}_{salt}"));
                    }
                    None => {
                        emit(Diagnostic::MissingVnode { vnode_key });
                        break;
                    }
                }
            }
        }

        self.ring.retain(|hash| !doomed.contains(hash));
        for hash in &doomed {
            self.owners.remove(hash);
        }
        self.nodes.remove(node_id);
    }

    pub(super) fn get_node(&self, key: &str) -> Option<String> {
        if self.ring.is_empty() {
            emit(Diagnostic::EmptyRing);
            return None;
        }

        let hash = self.hasher.hash_key(key);
        let landing = self.landing_index(hash);
        self.owners.get(&self.ring[landing]).cloned()
    }

    pub(super) fn get_nodes_for_key(&self, key: &str, replica_count: Option<usize>) -> Vec<String> {
        if self.ring.is_empty() {
            emit(Diagnostic::EmptyRing);
            return Vec::new();
        }

        let requested = replica_count.unwrap_or(self.config.replication_factor);
        let limit = if requested > self.nodes.len() {
            emit(Diagnostic::ReplicaCountClamped {
                requested,
                available: self.nodes.len(),
            });
            self.nodes.len()
        } else {
            requested
        };

        let hash = self.hasher.hash_key(key);
        let mut index = self.landing_index(hash);
        let mut result = Vec::with_capacity(limit);

        // One full lap visits every virtual node, so this terminates even when
        // zero-vnode registrations leave fewer owners on the ring than `limit`.
        let mut remaining = self.ring.len();
        while result.len() < limit && remaining > 0 {
            let owner = &self.owners[&self.ring[index]];
            if !result.iter().any(|collected| collected == owner) {
                result.push(owner.clone());
            }
            index = (index + 1) % self.ring.len();
            remaining -= 1;
        }

        result
    }

    // First ring entry >= hash, wrapping past the end back to index 0.
    fn landing_index(&self, hash: u64) -> usize {
        let index = match self.ring.binary_search(&hash) {
            Ok(index) | Err(index) => index,
        };
        index % self.ring.len()
    }
}
