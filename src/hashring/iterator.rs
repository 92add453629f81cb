use super::ConsistentHashRing;

/// Consuming iterator over a ring's registered nodes, ordered by identifier.
pub struct NodeIterator {
    entries: std::vec::IntoIter<(String, f64)>,
}

impl Iterator for NodeIterator {
    type Item = (String, f64);

    fn next(&mut self) -> Option<Self::Item> {
        self.entries.next()
    }
}

impl<H> IntoIterator for ConsistentHashRing<H> {
    type Item = (String, f64);

    type IntoIter = NodeIterator;

    fn into_iter(self) -> Self::IntoIter {
        let state = self.into_state();
        let mut entries: Vec<(String, f64)> = state
            .nodes
            .into_iter()
            .map(|(node_id, info)| (node_id, info.weight))
            .collect();
        entries.sort_by(|left, right| left.0.cmp(&right.0));
        NodeIterator {
            entries: entries.into_iter(),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::hashring::{ConsistentHashRing, RingConfig};

    #[test]
    fn into_iter_yields_nodes_sorted_by_id() {
        let ring = ConsistentHashRing::new(RingConfig {
            vnode_count: 5,
            replication_factor: 1,
        });
        ring.add_node_weighted("node-c", 0.5);
        ring.add_node("node-a");
        ring.add_node_weighted("node-b", 2.0);

        let entries: Vec<(String, f64)> = ring.into_iter().collect();

        assert_eq!(
            vec![
                ("node-a".to_string(), 1.0),
                ("node-b".to_string(), 2.0),
                ("node-c".to_string(), 0.5),
            ],
            entries
        );
    }
}
