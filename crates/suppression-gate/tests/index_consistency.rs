//! # Index Consistency Under Arbitrary Mutation Sequences
//!
//! For any sequence of create/update/delete, every lookup must equal the
//! answer a full rebuild from the surviving lists would give.

use proptest::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use suppression_gate::{SuppressionListDraft, SuppressionRegistry};

const ADVERTISERS: [&str; 3] = ["adv1", "adv2", "adv3"];
const IDENTIFIERS: [&str; 6] = ["u0", "u1", "u2", "u3", "u4", "u5"];

#[derive(Debug, Clone)]
enum Op {
    Create { advertiser: usize, identifiers: Vec<usize> },
    Update { slot: usize, advertiser: usize, identifiers: Vec<usize> },
    Delete { slot: usize },
}

fn op_strategy() -> impl Strategy<Value = Op> {
    let ids = prop::collection::vec(0..IDENTIFIERS.len(), 1..5);
    prop_oneof![
        3 => (0..ADVERTISERS.len(), ids.clone())
            .prop_map(|(advertiser, identifiers)| Op::Create { advertiser, identifiers }),
        2 => (0..8usize, 0..ADVERTISERS.len(), ids)
            .prop_map(|(slot, advertiser, identifiers)| Op::Update { slot, advertiser, identifiers }),
        2 => (0..8usize).prop_map(|slot| Op::Delete { slot }),
    ]
}

fn draft(advertiser: usize, identifiers: &[usize]) -> SuppressionListDraft {
    SuppressionListDraft::new(
        ADVERTISERS[advertiser],
        "generated",
        identifiers.iter().map(|i| IDENTIFIERS[*i].to_string()).collect(),
    )
}

/// Expected lookups computed directly from the surviving lists.
fn expected(lists: &BTreeMap<String, (usize, Vec<usize>)>) -> BTreeMap<&'static str, BTreeSet<String>> {
    let mut out: BTreeMap<&'static str, BTreeSet<String>> = BTreeMap::new();
    for (advertiser, identifiers) in lists.values() {
        for i in identifiers {
            out.entry(IDENTIFIERS[*i])
                .or_default()
                .insert(ADVERTISERS[*advertiser].to_string());
        }
    }
    out
}

proptest! {
    #[test]
    fn lookups_match_full_rebuild(ops in prop::collection::vec(op_strategy(), 1..40)) {
        let registry = SuppressionRegistry::new();
        let mut live: BTreeMap<String, (usize, Vec<usize>)> = BTreeMap::new();

        for op in ops {
            match op {
                Op::Create { advertiser, identifiers } => {
                    let list = registry.create(draft(advertiser, &identifiers)).unwrap();
                    live.insert(list.id, (advertiser, identifiers));
                }
                Op::Update { slot, advertiser, identifiers } => {
                    let Some(id) = live.keys().nth(slot % live.len().max(1)).cloned() else {
                        continue;
                    };
                    let updated = registry.update(&id, draft(advertiser, &identifiers)).unwrap();
                    prop_assert!(updated.is_some());
                    live.insert(id, (advertiser, identifiers));
                }
                Op::Delete { slot } => {
                    let Some(id) = live.keys().nth(slot % live.len().max(1)).cloned() else {
                        continue;
                    };
                    prop_assert!(registry.delete(&id).unwrap());
                    live.remove(&id);
                }
            }
        }

        let expected = expected(&live);
        for identifier in IDENTIFIERS {
            let want = expected.get(identifier).cloned().unwrap_or_default();
            prop_assert_eq!(registry.lookup(identifier), want);
        }
        prop_assert!(registry.verify_consistency().is_ok());
        prop_assert_eq!(registry.stats().total_lists, live.len());
    }
}

#[test]
fn concurrent_readers_never_see_partial_update() {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    let registry = Arc::new(SuppressionRegistry::new());
    let list = registry
        .create(SuppressionListDraft::new(
            "adv1",
            "swap",
            vec!["a".to_string(), "b".to_string()],
        ))
        .unwrap();
    let done = Arc::new(AtomicBool::new(false));

    let reader = {
        let registry = registry.clone();
        let done = done.clone();
        std::thread::spawn(move || {
            while !done.load(Ordering::Relaxed) {
                // Ownership flips between adv1 and adv2; never zero or both.
                assert_eq!(registry.lookup("a").len(), 1);
                assert_eq!(registry.lookup("b").len(), 1);
            }
        })
    };

    for round in 0..500 {
        let advertiser = if round % 2 == 0 { "adv2" } else { "adv1" };
        registry
            .update(
                &list.id,
                SuppressionListDraft::new(advertiser, "swap", vec!["a".to_string(), "b".to_string()]),
            )
            .unwrap();
    }
    done.store(true, Ordering::Relaxed);
    reader.join().unwrap();
    assert!(registry.verify_consistency().is_ok());
}
