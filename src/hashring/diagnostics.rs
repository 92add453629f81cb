use std::fmt::Display;

/// Non-fatal anomaly observed during a ring operation.
///
/// Diagnostics replace hard errors for every expected edge case: the operation that
/// raised one has already degraded to a no-op or a clamped result, and the ring stays
/// usable. They are emitted as warnings on the `log` facade under the
/// `hashring_router` target.
#[derive(Clone, Debug, PartialEq)]
pub enum Diagnostic {
    /// `add_node` was called with an identifier that is already registered.
    DuplicateNode { node_id: String },
    /// `remove_node` was called with an identifier that is not registered.
    UnknownNode { node_id: String },
    /// A query ran against a ring with no virtual nodes.
    EmptyRing,
    /// A replica request exceeded the number of live nodes and was clamped.
    ReplicaCountClamped { requested: usize, available: usize },
    /// A virtual node's hash was already taken; a salted variant will be tried.
    HashCollision { vnode_key: String, salt: u64 },
    /// Removal could not find the hash for a virtual node it expected to own.
    MissingVnode { vnode_key: String },
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Diagnostic::DuplicateNode { node_id } => {
                write!(f, "node '{node_id}' already exists, ignoring add")
            }
            Diagnostic::UnknownNode { node_id } => {
                write!(f, "node '{node_id}' is not registered, ignoring remove")
            }
            Diagnostic::EmptyRing => write!(f, "no nodes in the hash ring"),
            Diagnostic::ReplicaCountClamped {
                requested,
                available,
            } => write!(
                f,
                "requested replica count {requested} exceeds {available} available nodes, clamping"
            ),
            Diagnostic::HashCollision { vnode_key, salt } => {
                write!(f, "hash collision for vnode '{vnode_key}', retrying with salt {salt}")
            }
            Diagnostic::MissingVnode { vnode_key } => {
                write!(f, "no ring hash found for vnode '{vnode_key}' during removal")
            }
        }
    }
}

pub(crate) fn emit(diagnostic: Diagnostic) {
    log::warn!(target: "hashring_router", "{diagnostic}");
}
