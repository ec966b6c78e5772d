use std::collections::BTreeMap;

use pskiplist::{Config, SkipList};
use proptest::collection::vec as prop_vec;
use proptest::prelude::*;

#[derive(Clone, Debug)]
enum Op {
    Insert(u32, u32),
    Erase(u32),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0u32..200, any::<u32>()).prop_map(|(k, v)| Op::Insert(k, v)),
        (0u32..200).prop_map(Op::Erase),
    ]
}

proptest! {
    /// The list's ascending iteration always agrees with a `BTreeMap` driven
    /// by the same operation sequence (order law + insert/erase correctness).
    #[test]
    fn matches_btreemap_reference(ops in prop_vec(op_strategy(), 0..300)) {
        let list: SkipList<u32, u32> = SkipList::new(Config::default()).unwrap();
        let mut model: BTreeMap<u32, u32> = BTreeMap::new();

        for op in ops {
            match op {
                Op::Insert(k, v) => {
                    let (_, inserted) = list.try_emplace(k, v).unwrap();
                    let model_inserted = model.insert(k, v).is_none();
                    prop_assert_eq!(inserted, model_inserted);
                }
                Op::Erase(k) => {
                    let removed = list.erase(&k);
                    let model_removed = model.remove(&k).is_some() as usize;
                    prop_assert_eq!(removed, model_removed);
                }
            }
        }

        let list_view: Vec<(u32, u32)> = list.iter().collect();
        let model_view: Vec<(u32, u32)> = model.iter().map(|(&k, &v)| (k, v)).collect();
        prop_assert_eq!(&list_view, &model_view);
        prop_assert_eq!(list.size(), model.len());
    }

    /// `lower_bound`/`upper_bound` agree with a linear scan over the same
    /// set of keys, for any subset of `0..200` and any probe key.
    #[test]
    fn bounds_match_linear_scan(keys in prop::collection::btree_set(0u32..200, 0..100), probe in 0u32..200) {
        let list: SkipList<u32, u32> = SkipList::new(Config::default()).unwrap();
        for &k in &keys {
            list.try_emplace(k, k).unwrap();
        }

        let expected_lower = keys.iter().find(|&&k| k >= probe).copied();
        let expected_upper = keys.iter().find(|&&k| k > probe).copied();

        prop_assert_eq!(list.lower_bound(&probe).map(|(k, _)| k), expected_lower);
        prop_assert_eq!(list.upper_bound(&probe).map(|(k, _)| k), expected_upper);
    }

    /// `range(start, end)` always returns exactly the half-open interval
    /// `[start, end)` of whatever keys were inserted.
    #[test]
    fn range_matches_half_open_interval(
        keys in prop::collection::btree_set(0u32..200, 0..100),
        start in 0u32..200,
        len in 0u32..50,
    ) {
        let end = start.saturating_add(len);
        let list: SkipList<u32, u32> = SkipList::new(Config::default()).unwrap();
        for &k in &keys {
            list.try_emplace(k, k).unwrap();
        }

        let expected: Vec<(u32, u32)> = keys
            .range(start..end)
            .map(|&k| (k, k))
            .collect();
        prop_assert_eq!(list.range(&start, &end), expected);
    }
}

/// A process restart only changes the pool's base marker; every previously
/// inserted key is still reachable afterward.
#[test]
fn simulated_restart_preserves_contents() {
    let list: SkipList<u32, u32> = SkipList::new(Config::default()).unwrap();
    for i in 0..500u32 {
        list.try_emplace(i, i * 2).unwrap();
    }

    let before = list.pool_handle();
    let after = list.simulate_restart();

    assert_eq!(before.uuid(), after.uuid());
    assert_ne!(before.base(), after.base());

    for i in 0..500u32 {
        assert_eq!(list.find(&i), Some((i, i * 2)));
    }
    assert_eq!(list.size(), 500);
}

/// A list built from 10,000 keys iterates the whole thing in sorted order
/// with none dropped.
#[test]
fn ten_thousand_keys_iterate_in_full_sorted_order() {
    let list: SkipList<u64, u64> = SkipList::new(Config::default()).unwrap();
    for i in 0..10_000u64 {
        list.try_emplace(i, i).unwrap();
    }

    let collected: Vec<_> = list.iter().map(|(k, _)| k).collect();
    assert_eq!(collected.len(), 10_000);
    assert_eq!(collected, (0..10_000u64).collect::<Vec<_>>());
}
