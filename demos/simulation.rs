//! Simulation driver: measures key distribution across a cluster and key movement
//! when a node joins and leaves.
//!
//! Run with `cargo run --example simulation`; set `RUST_LOG=warn` to see ring
//! diagnostics.

use std::collections::HashMap;

use hashring_router::{ConsistentHashRing, RingConfig};
use rand::Rng;

const NUM_NODES: usize = 10;
const NUM_KEYS: usize = 100_000;
const VNODES_PER_NODE: usize = 100;
const REPLICATION_FACTOR: usize = 3;

fn main() {
    env_logger::init();

    println!("--- Consistent Hashing Simulation ---");
    println!("Initial Nodes (N): {NUM_NODES}");
    println!("Keys (M):          {NUM_KEYS}");
    println!("VNodes per Node:   {VNODES_PER_NODE}");
    println!("Replication (R):   {REPLICATION_FACTOR}");
    println!("---------------------------------------");

    let mut rng = rand::rng();
    let keys: Vec<String> = (0..NUM_KEYS)
        .map(|_| format!("key-{}", rng.random_range(0..NUM_KEYS * 10)))
        .collect();

    let ring = ConsistentHashRing::new(RingConfig {
        vnode_count: VNODES_PER_NODE,
        replication_factor: REPLICATION_FACTOR,
    });
    let nodes: Vec<String> = (0..NUM_NODES).map(|i| format!("node-{i}")).collect();
    for node_id in &nodes {
        ring.add_node(node_id.clone());
    }
    println!("\nRing created with {NUM_NODES} nodes.");

    println!("\n--- Measuring Initial Distribution ---");
    let mut distribution: HashMap<String, usize> = HashMap::new();
    for key in &keys {
        let owner = ring.get_node(key).expect("ring is not empty");
        *distribution.entry(owner).or_default() += 1;
    }

    println!("Key distribution per node:");
    for node_id in &nodes {
        let count = distribution.get(node_id).copied().unwrap_or(0);
        let percentage = (count as f64 / NUM_KEYS as f64) * 100.0;
        println!("  {node_id}: {count} keys ({percentage:.2}%)");
    }

    let counts: Vec<usize> = distribution.values().copied().collect();
    let mean = counts.iter().sum::<usize>() as f64 / counts.len() as f64;
    let variance = counts
        .iter()
        .map(|&count| (count as f64 - mean).powi(2))
        .sum::<f64>()
        / (counts.len() - 1) as f64;
    let stddev = variance.sqrt();
    println!("\nStats (N={NUM_NODES}):");
    println!("  Mean:   {mean:.2} keys per node");
    println!("  StdDev: {stddev:.2} ({:.2}% of mean)", (stddev / mean) * 100.0);
    println!("  Min:    {} keys", counts.iter().min().expect("counts not empty"));
    println!("  Max:    {} keys", counts.iter().max().expect("counts not empty"));

    println!("\n--- Measuring Movement (Node Join) ---");
    let initial_mapping: HashMap<&String, String> = keys
        .iter()
        .map(|key| (key, ring.get_node(key).expect("ring is not empty")))
        .collect();

    let new_node_id = format!("node-{NUM_NODES}");
    println!("Adding node '{new_node_id}'...");
    ring.add_node(new_node_id.clone());

    let mut intermediate_mapping: HashMap<&String, String> = HashMap::new();
    let mut moved_count_join = 0usize;
    for key in &keys {
        let owner = ring.get_node(key).expect("ring is not empty");
        if initial_mapping[key] != owner {
            moved_count_join += 1;
            // on a join, keys may only move to the new node
            assert_eq!(new_node_id, owner, "key moved to an unexpected node");
        }
        intermediate_mapping.insert(key, owner);
    }

    let moved_fraction = moved_count_join as f64 / NUM_KEYS as f64;
    let expected_fraction = 1.0 / (NUM_NODES + 1) as f64;
    println!("Keys remapped: {moved_count_join} / {NUM_KEYS} ({moved_fraction:.4})");
    println!("Expected:      ~{expected_fraction:.4} (1 / {})", NUM_NODES + 1);

    println!("\n--- Measuring Movement (Node Remove) ---");
    println!("Removing node '{new_node_id}'...");
    ring.remove_node(&new_node_id);

    let mut moved_count_remove = 0usize;
    let mut consistency_errors = 0usize;
    for key in &keys {
        let final_owner = ring.get_node(key).expect("ring is not empty");

        if intermediate_mapping[key] != final_owner {
            moved_count_remove += 1;
            assert_eq!(
                new_node_id, intermediate_mapping[key],
                "a key moved from a non-removed node"
            );
        }

        if initial_mapping[key] != final_owner {
            consistency_errors += 1;
            println!("ERROR: Key {key} did not return to original state.");
        }
    }

    println!("Keys remapped *off* '{new_node_id}': {moved_count_remove} / {NUM_KEYS}");
    println!("Total consistency errors: {consistency_errors}");

    assert_eq!(0, consistency_errors, "ring did not return to its original state");
    assert_eq!(
        moved_count_join, moved_count_remove,
        "move-on count does not equal move-off count"
    );

    println!("\nSimulation complete. Ring is consistent.");
}
