//! A consistent-hashing ring that routes string keys to a dynamic set of weighted nodes
//!
//! Each physical node is placed on the ring as `floor(vnode_count * weight)` virtual nodes,
//! so adding or removing a node only moves the keys that land in the affected hash ranges
//! (roughly `1/(N+1)` of all keys when a node joins a uniform cluster of N).
//!
//! A key is routed to the owner of the first virtual node whose hash is greater than or
//! equal to the key's hash, wrapping around from the top of the 64-bit hash space to the
//! bottom. Replica selection continues clockwise from that landing point, collecting
//! distinct nodes.
//!
//! All ring state lives behind a single mutex, so a ring can be shared between threads
//! (e.g. in an `Arc`) and every operation is atomic with respect to every other. There is
//! no cross-call atomicity: a lookup followed by a membership change is two critical
//! sections, not one.
//!
//! Expected anomalies (adding a node twice, removing an unknown node, querying an empty
//! ring, requesting more replicas than there are nodes) never fail hard; they degrade to
//! no-ops or clamped results and emit a [`Diagnostic`] on the `log` facade.
//!
//! ```
//! use hashring_router::ConsistentHashRing;
//!
//! let ring = ConsistentHashRing::default();
//! ring.add_node("node-a");
//! ring.add_node("node-b");
//! ring.add_node_weighted("node-c", 2.0);
//!
//! let owner = ring.get_node("user:42").unwrap();
//! let replicas = ring.get_nodes_for_key("user:42", None);
//! assert!(replicas.contains(&owner));
//! ```

mod hashring;

pub use hashring::diagnostics::Diagnostic;
pub use hashring::hasher::{KeyHasher, Sha256Hasher, SipKeyHasher};
pub use hashring::iterator::NodeIterator;
pub use hashring::{ConsistentHashRing, NodeInfo, RingConfig};
