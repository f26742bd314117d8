//! Integration tests for node-to-node synchronization.
//!
//! Tests cover:
//! - Basic pull of a new record, and re-sync idempotence
//! - LWW resolution of concurrent edits with equipment union, in both directions
//! - Three-way convergence under every reconciliation order
//! - Audit chain validity and outcome tagging across syncs
//! - Copy-at-boundary and concurrent access from many threads

use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::thread;
use tsync_audit::{AuditAction, AuditOutcome};
use tsync_core::{IntelligenceReport, RecordId, ReportFields, ReportPatch, VectorClock};
use tsync_node::{NetworkController, Node, SyncResult};

fn base_fields() -> ReportFields {
    ReportFields::new("Armor column sighted", 8, "48.1,37.8", "Tank platoon")
        .with_equipment(["T-72"])
}

fn equipment(report: &IntelligenceReport) -> BTreeSet<String> {
    report.equipment.iter().cloned().collect()
}

/// X creates the base record and Y pulls it.
fn shared_pair() -> (Node, Node, RecordId) {
    let x = Node::new("X");
    let y = Node::new("Y");
    let report = x.create_record(base_fields());
    y.sync_with(&x).unwrap();
    (x, y, report.id)
}

#[test]
fn test_basic_sync_and_idempotence() {
    let x = Node::new("X");
    let y = Node::new("Y");
    let report = x.create_record(base_fields());
    assert_eq!(report.clock, VectorClock::from_entries([("X", 1)]));

    let result = y.sync_with(&x).unwrap();
    assert_eq!(
        result,
        SyncResult {
            received: 1,
            updated: 0,
            conflicts_resolved: 0,
        }
    );

    let received = y.get_record(&report.id).unwrap();
    assert_eq!(received, report);
    assert_eq!(received.clock, VectorClock::from_entries([("X", 1)]));
    assert_eq!(y.node_clock(), VectorClock::from_entries([("X", 1)]));

    let audit_len = y.audit_trail().len();
    let again = y.sync_with(&x).unwrap();
    assert!(again.is_empty());
    assert_eq!(y.audit_trail().len(), audit_len);

    let entry = &y.audit_trail()[0];
    assert_eq!(entry.action, AuditAction::Sync);
    assert_eq!(entry.outcome, AuditOutcome::Success);
    assert_eq!(entry.details, "Received new report from X");
}

#[test]
fn test_causal_update_is_caught_up() {
    let (x, y, id) = shared_pair();
    assert!(x.apply_patch(&id, &ReportPatch::new().size(30).add_equipment("BTR-80")));

    let result = y.sync_with(&x).unwrap();
    assert_eq!(
        result,
        SyncResult {
            received: 0,
            updated: 1,
            conflicts_resolved: 0,
        }
    );
    assert_eq!(y.get_record(&id), x.get_record(&id));

    // Both copies are identical now; pulling back changes nothing.
    let audit_len = x.audit_trail().len();
    assert!(x.sync_with(&y).unwrap().is_empty());
    assert_eq!(x.audit_trail().len(), audit_len);
}

#[test]
fn test_pull_from_stale_peer_is_recorded() {
    let (x, y, id) = shared_pair();
    assert!(x.apply_patch(&id, &ReportPatch::new().size(25)));
    let ours = x.get_record(&id).unwrap();
    let audit_len = x.audit_trail().len();

    // Y still holds the older version; X's copy wins but the pass is logged.
    let result = x.sync_with(&y).unwrap();
    assert_eq!(
        result,
        SyncResult {
            received: 0,
            updated: 1,
            conflicts_resolved: 0,
        }
    );
    assert_eq!(x.get_record(&id).unwrap(), ours);

    let trail = x.audit_trail();
    assert_eq!(trail.len(), audit_len + 1);
    let last = &trail[audit_len];
    assert_eq!(last.action, AuditAction::Sync);
    assert_eq!(last.outcome, AuditOutcome::Success);
    assert_eq!(last.resource_id, id.as_str());
    assert_eq!(last.details, "Updated from Y");
    assert!(x.verify_audit_chain());

    // Y catches up; afterwards both sides are identical and quiet.
    assert_eq!(y.sync_with(&x).unwrap().updated, 1);
    assert!(x.sync_with(&y).unwrap().is_empty());
}

#[test]
fn test_concurrent_edits_merge_identically_in_both_directions() {
    let (x, y, id) = shared_pair();

    assert!(x.update_record(&id, |r| {
        r.set_size(25).add_equipment("BMP-2");
    }));
    assert!(y.update_record(&id, |r| {
        r.set_activity("Armor column halted").add_equipment("ZSU-23-4");
    }));

    let from_x = x.get_record(&id).unwrap();
    let from_y = y.get_record(&id).unwrap();
    assert_eq!(from_x.clock, VectorClock::from_entries([("X", 2)]));
    assert_eq!(from_y.clock, VectorClock::from_entries([("X", 1), ("Y", 1)]));

    let on_x = x.merge_incoming("Y", vec![from_y.clone()]).unwrap();
    let on_y = y.merge_incoming("X", vec![from_x.clone()]).unwrap();
    assert_eq!(on_x.conflicts_resolved, 1);
    assert_eq!(on_y.conflicts_resolved, 1);

    let merged_x = x.get_record(&id).unwrap();
    let merged_y = y.get_record(&id).unwrap();
    assert_eq!(merged_x, merged_y);

    // Y wrote last, so its LWW fields win as a unit.
    assert_eq!(merged_x.activity, "Armor column halted");
    assert_eq!(merged_x.size, 8);
    assert_eq!(merged_x.clock, VectorClock::from_entries([("X", 2), ("Y", 1)]));
    assert_eq!(
        equipment(&merged_x),
        ["BMP-2", "T-72", "ZSU-23-4"].iter().map(|s| s.to_string()).collect::<BTreeSet<_>>()
    );

    let last = x.audit_trail().pop().unwrap();
    assert_eq!(last.outcome, AuditOutcome::ConflictResolved);
    assert_eq!(last.details, "Resolved conflict with Y");
    assert!(x.verify_audit_chain());
    assert!(y.verify_audit_chain());
}

#[test]
fn test_three_way_convergence_in_every_order() {
    let pairs = [(0usize, 1usize), (0, 2), (1, 2)];
    let orders: [[usize; 3]; 6] = [
        [0, 1, 2],
        [0, 2, 1],
        [1, 0, 2],
        [1, 2, 0],
        [2, 0, 1],
        [2, 1, 0],
    ];

    for order in orders {
        let network = NetworkController::new();
        let nodes: Vec<Node> = ["A", "B", "C"].into_iter().map(Node::new).collect();
        let id = nodes[0]
            .create_record(ReportFields::new("Battery emplaced", 40, "47.9,37.6", "Artillery"))
            .id;
        network.try_sync(&nodes[0], &nodes[1]).unwrap();
        network.try_sync(&nodes[0], &nodes[2]).unwrap();

        let refs: Vec<&Node> = nodes.iter().collect();
        network.partition_all(&refs);
        for (node, item) in nodes.iter().zip(["Sagger", "Grail", "Spigot"]) {
            assert!(node.update_record(&id, |r| {
                r.add_equipment(item);
            }));
            for other in &nodes {
                let synced = network.try_sync(node, other).unwrap().is_some();
                assert_eq!(synced, node.id() == other.id());
            }
        }
        network.heal_all();

        for pick in order {
            let (a, b) = pairs[pick];
            network.try_sync(&nodes[a], &nodes[b]).unwrap();
        }

        let records: Vec<IntelligenceReport> =
            nodes.iter().map(|n| n.get_record(&id).unwrap()).collect();
        assert_eq!(records[0], records[1], "order {:?}", order);
        assert_eq!(records[1], records[2], "order {:?}", order);
        assert_eq!(records[0].equipment.len(), 3);
        assert_eq!(
            records[0].clock,
            VectorClock::from_entries([("A", 2), ("B", 1), ("C", 1)])
        );
        assert!(nodes.iter().all(Node::verify_audit_chain));
    }
}

#[test]
fn test_random_schedule_converges() {
    let mut rng = StdRng::seed_from_u64(7);
    let network = NetworkController::new();
    let nodes: Vec<Node> = ["n0", "n1", "n2", "n3"].into_iter().map(Node::new).collect();
    let id = nodes[0].create_record(base_fields()).id;

    let mut pairs = Vec::new();
    for a in 0..nodes.len() {
        for b in a + 1..nodes.len() {
            pairs.push((a, b));
        }
    }

    for round in 0..5 {
        for (i, node) in nodes.iter().enumerate() {
            if node.get_record(&id).is_some() {
                node.update_record(&id, |r| {
                    r.add_equipment(format!("n{}-r{}", i, round));
                });
            }
        }
        pairs.shuffle(&mut rng);
        for &(a, b) in pairs.iter().take(3) {
            network.try_sync(&nodes[a], &nodes[b]).unwrap();
        }
    }

    // Two full passes reach every node.
    for _ in 0..2 {
        pairs.shuffle(&mut rng);
        for &(a, b) in &pairs {
            network.try_sync(&nodes[a], &nodes[b]).unwrap();
        }
    }

    let first = nodes[0].get_all_records();
    for node in &nodes[1..] {
        assert_eq!(node.get_all_records(), first);
    }
}

#[test]
fn test_deleted_record_replicates_as_tombstone() {
    let (x, y, id) = shared_pair();
    assert!(x.delete_record(&id));

    y.sync_with(&x).unwrap();
    let record = y.get_record(&id).unwrap();
    assert!(record.deleted);
    assert_eq!(y.record_count(), 1);
}

#[test]
fn test_returned_copies_do_not_alias_store() {
    let (x, y, id) = shared_pair();

    let mut copy = y.get_record(&id).unwrap();
    copy.equipment.insert("Phantom".to_string());
    copy.clock.increment("Y");
    copy.size = 999;

    let mut trail = y.audit_trail();
    trail[0].details = "rewritten".to_string();

    assert_eq!(y.get_record(&id), x.get_record(&id));
    assert!(y.verify_audit_chain());
    assert!(y.sync_with(&x).unwrap().is_empty());
}

#[test]
fn test_audit_export_after_sync() {
    let (_x, y, _id) = shared_pair();
    let json = y.export_audit_json().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value[0]["action"], "SYNC");
    assert_eq!(value[0]["actor"], "node_Y");
    assert_eq!(value[0]["verified"], true);
}

#[test]
fn test_concurrent_mutation_and_sync() {
    let alpha = Arc::new(Node::new("alpha"));
    let bravo = Arc::new(Node::new("bravo"));

    let writers: Vec<_> = (0..4)
        .map(|t| {
            let node = if t % 2 == 0 { Arc::clone(&alpha) } else { Arc::clone(&bravo) };
            thread::spawn(move || {
                for i in 0..25 {
                    let report = node.create_record(
                        ReportFields::new(format!("t{}-{}", t, i), i, "0,0", "Observer"),
                    );
                    node.update_record(&report.id, |r| {
                        r.add_equipment(format!("t{}-item", t));
                    });
                }
            })
        })
        .collect();

    let syncers: Vec<_> = (0..2)
        .map(|t| {
            let (a, b) = if t == 0 {
                (Arc::clone(&alpha), Arc::clone(&bravo))
            } else {
                (Arc::clone(&bravo), Arc::clone(&alpha))
            };
            thread::spawn(move || {
                for _ in 0..10 {
                    a.sync_with(&*b).unwrap();
                }
            })
        })
        .collect();

    for handle in writers.into_iter().chain(syncers) {
        handle.join().unwrap();
    }

    alpha.sync_with(&*bravo).unwrap();
    bravo.sync_with(&*alpha).unwrap();

    assert_eq!(alpha.record_count(), 100);
    assert_eq!(alpha.get_all_records(), bravo.get_all_records());
    assert!(alpha.verify_audit_chain());
    assert!(bravo.verify_audit_chain());
}

#[derive(Clone, Debug)]
enum Op {
    Add { node: usize, item: u8 },
    Pull { into: usize, from: usize },
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0usize..3, any::<u8>()).prop_map(|(node, item)| Op::Add { node, item }),
        (0usize..3, 0usize..3).prop_map(|(into, from)| Op::Pull { into, from }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn equipment_never_shrinks_and_replicas_converge(
        ops in prop::collection::vec(op_strategy(), 1..40)
    ) {
        let nodes: Vec<Node> = ["A", "B", "C"].into_iter().map(Node::new).collect();
        let id = nodes[0].create_record(base_fields()).id;
        nodes[1].sync_with(&nodes[0]).unwrap();
        nodes[2].sync_with(&nodes[0]).unwrap();

        let mut seen: Vec<BTreeSet<String>> =
            nodes.iter().map(|n| equipment(&n.get_record(&id).unwrap())).collect();

        for op in ops {
            match op {
                Op::Add { node, item } => {
                    nodes[node].update_record(&id, |r| {
                        r.add_equipment(format!("item-{}", item));
                    });
                }
                Op::Pull { into, from } => {
                    nodes[into].sync_with(&nodes[from]).unwrap();
                }
            }
            for (i, node) in nodes.iter().enumerate() {
                let now = equipment(&node.get_record(&id).unwrap());
                prop_assert!(now.is_superset(&seen[i]));
                seen[i] = now;
            }
        }

        for _ in 0..2 {
            for a in 0..3 {
                for b in 0..3 {
                    nodes[a].sync_with(&nodes[b]).unwrap();
                }
            }
        }
        let first = nodes[0].get_record(&id).unwrap();
        prop_assert_eq!(&nodes[1].get_record(&id).unwrap(), &first);
        prop_assert_eq!(&nodes[2].get_record(&id).unwrap(), &first);
        prop_assert!(nodes.iter().all(Node::verify_audit_chain));
    }
}
