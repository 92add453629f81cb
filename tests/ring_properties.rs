use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::thread;

use hashring_router::{ConsistentHashRing, RingConfig};
use pretty_assertions::assert_eq;

const NODES: [&str; 4] = ["node-a", "node-b", "node-c", "node-d"];

fn four_node_ring() -> ConsistentHashRing {
    let ring = ConsistentHashRing::new(RingConfig {
        vnode_count: 100,
        replication_factor: 3,
    });
    for node_id in NODES {
        ring.add_node(node_id);
    }
    ring
}

fn test_keys(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("key-{i}")).collect()
}

fn mapping(ring: &ConsistentHashRing, keys: &[String]) -> HashMap<String, String> {
    keys.iter()
        .map(|key| {
            let owner = ring.get_node(key).expect("ring is not empty");
            (key.clone(), owner)
        })
        .collect()
}

#[test]
fn lookup_is_deterministic_for_a_fixed_ring() {
    let ring = four_node_ring();
    let key = "my-test-key-123";

    let first = ring.get_node(key).expect("ring is not empty");
    assert!(NODES.contains(&first.as_str()));

    for _ in 0..100 {
        assert_eq!(Some(first.clone()), ring.get_node(key));
    }
}

#[test]
fn replica_selection_returns_distinct_nodes() {
    let ring = four_node_ring();

    let replicas = ring.get_nodes_for_key("another-key-456", Some(3));

    assert_eq!(3, replicas.len());
    let distinct: HashSet<&String> = replicas.iter().collect();
    assert_eq!(3, distinct.len());
    for node_id in &replicas {
        assert!(NODES.contains(&node_id.as_str()));
    }
    // the first replica is the single-owner lookup
    assert_eq!(ring.get_node("another-key-456"), replicas.first().cloned());
}

#[test]
fn join_displaces_a_bounded_fraction_onto_the_new_node() {
    let ring = four_node_ring();
    let keys = test_keys(10_000);
    let before = mapping(&ring, &keys);

    ring.add_node("node-e");

    let mut moved = 0usize;
    for key in &keys {
        let owner = ring.get_node(key).expect("ring is not empty");
        if before[key] != owner {
            moved += 1;
            // displaced keys may only land on the new node
            assert_eq!("node-e", owner, "key '{key}' moved to an existing node");
        }
    }

    // 5 uniform nodes: expect ~1/5 of keys to move, with a 50% margin for
    // vnode-placement variance at 100 vnodes per node
    let moved_fraction = moved as f64 / keys.len() as f64;
    assert!(
        (0.10..=0.30).contains(&moved_fraction),
        "moved fraction {moved_fraction} outside [0.10, 0.30]"
    );
}

#[test]
fn removal_redistributes_exactly_the_removed_nodes_keys() {
    let ring = four_node_ring();
    let keys = test_keys(10_000);
    ring.add_node("node-e");
    let before = mapping(&ring, &keys);
    let owned_by_removed = before.values().filter(|owner| *owner == "node-c").count();
    assert!(owned_by_removed > 0);

    ring.remove_node("node-c");

    let mut moved = 0usize;
    let mut destinations: HashSet<String> = HashSet::new();
    for key in &keys {
        let owner = ring.get_node(key).expect("ring is not empty");
        assert_ne!("node-c", owner, "removed node still owns key '{key}'");
        if before[key] != owner {
            moved += 1;
            // only keys of the removed node may move
            assert_eq!("node-c", before[key], "key '{key}' moved off a surviving node");
            destinations.insert(owner);
        }
    }

    assert_eq!(owned_by_removed, moved);
    // the displaced keys spread over all four survivors
    assert_eq!(4, destinations.len());
    assert!(!destinations.contains("node-c"));
}

#[test]
fn add_then_remove_is_symmetric() {
    let ring = four_node_ring();
    let keys = test_keys(10_000);
    let before = mapping(&ring, &keys);

    ring.add_node("node-x");
    let during = mapping(&ring, &keys);
    let moved_on = keys.iter().filter(|key| before[*key] != during[*key]).count();

    ring.remove_node("node-x");
    let after = mapping(&ring, &keys);
    let moved_off = keys.iter().filter(|key| during[*key] != after[*key]).count();

    assert_eq!(before, after, "ring did not return to its pre-add state");
    assert_eq!(moved_on, moved_off);
    assert!(ring.is_consistent());
}

#[test]
fn weight_scales_the_virtual_node_count() {
    let ring = ConsistentHashRing::new(RingConfig {
        vnode_count: 100,
        replication_factor: 3,
    });
    ring.add_node_weighted("node-a", 1.0);
    assert_eq!(100, ring.vlen());
    ring.add_node_weighted("node-b", 2.5);
    assert_eq!(100 + 250, ring.vlen());
    ring.add_node_weighted("node-c", 0.4);
    assert_eq!(100 + 250 + 40, ring.vlen());
    assert!(ring.is_consistent());
}

#[test]
fn concurrent_membership_and_lookups_keep_the_ring_consistent() {
    let ring = Arc::new(four_node_ring());
    let added: Vec<String> = (100..110).map(|i| format!("node-{i}")).collect();
    let removed = ["node-a", "node-c"];

    let mut workers = Vec::new();
    for (i, node_to_add) in added.iter().cloned().enumerate() {
        let ring = Arc::clone(&ring);
        let node_to_remove = removed[i % removed.len()];
        workers.push(thread::spawn(move || {
            ring.add_node(node_to_add);
            ring.remove_node(node_to_remove);
            for k in 0..100 {
                ring.get_node(&format!("key-{k}"));
                ring.get_nodes_for_key(&format!("key-{k}"), None);
            }
        }));
    }
    for worker in workers {
        worker.join().expect("worker panicked");
    }

    let mut expected: Vec<String> = NODES
        .iter()
        .filter(|node_id| !removed.contains(*node_id))
        .map(|node_id| node_id.to_string())
        .chain(added.iter().cloned())
        .collect();
    expected.sort();

    assert_eq!(expected, ring.nodes());
    assert!(ring.vlen() > 0);
    assert!(ring.is_consistent());
}
