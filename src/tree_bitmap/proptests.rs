use super::*;

use proptest::prelude::*;
use std::collections::BTreeMap;

use crate::types::af::DEPTH_LEVELS;

// Walk the whole tree and check that every set bit has an allocated array
// behind it, that nothing hangs below the last level, and that the number
// of set prefix bits matches the counter.
pub(super) fn validate_tree<P>(t: &TreeBitMap<P>) {
    let mut stack: Vec<(&TreeBitMapNode<P>, u8)> = vec![(&t.root, 0)];
    let mut prefix_count = 0_usize;

    while let Some((node, depth)) = stack.pop() {
        assert!(depth < DEPTH_LEVELS, "node below the last level");
        if node.pfxbitarr != 0 {
            assert_eq!(node.pfx_vec.len(), 15, "prefix bit without array");
        }
        assert_eq!(node.pfxbitarr & 1, 0, "unused last prefix bit is set");
        prefix_count += node.pfxbitarr.count_ones() as usize;

        if node.ptrbitarr != 0 {
            assert_eq!(node.ptr_vec.len(), 8, "child bit without array");
        }
        for (nibble, child) in node.ptr_vec.iter().enumerate() {
            if node.ptrbitarr & (0x80 >> nibble) != 0 {
                stack.push((child, depth + 1));
            }
        }
    }

    assert_eq!(prefix_count, t.len(), "set prefix bits must match len()");
}

// The longest match, the slow way.
fn model_lookup(m: &BTreeMap<(u32, u8), u64>, addr: u32) -> Option<u64> {
    (0..=32_u8)
        .rev()
        .find_map(|len| m.get(&(truncate_to_len(addr, len), len)).copied())
}

#[derive(Clone, Debug)]
enum Op {
    Insert(u32, u8, u64),
    Delete(u32, u8),
    Get(u32, u8),
    Lookup(u32),
    Cleanup,
}

// Addresses are drawn from a few small pools, so that prefixes overlap a lot
// and lookups actually hit something.
fn addr_strategy() -> impl Strategy<Value = u32> + Clone {
    prop_oneof![
        any::<u32>(),
        any::<u8>().prop_map(|b| 0xc0a8_0000 | b as u32),
        any::<u8>().prop_map(|b| 0xffff_ff00 | b as u32),
        (0_u32..8).prop_map(|b| b << 29),
    ]
}

fn ops_strategy() -> impl Strategy<Value = Vec<Op>> {
    let addr = addr_strategy();
    let len = 0_u8..=32;
    let op = prop_oneof![
        40 => (addr.clone(), len.clone(), any::<u64>())
            .prop_map(|(a, l, v)| Op::Insert(a, l, v)),
        20 => (addr.clone(), len.clone()).prop_map(|(a, l)| Op::Delete(a, l)),
        10 => (addr.clone(), len.clone()).prop_map(|(a, l)| Op::Get(a, l)),
        28 => addr.clone().prop_map(Op::Lookup),
        2 => Just(Op::Cleanup),
    ];
    prop::collection::vec(op, 0..=500)
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        max_shrink_iters: 10_000,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_equivalence_lpm(ops in ops_strategy()) {
        let mut t: TreeBitMap<u64> = TreeBitMap::new();
        let mut m: BTreeMap<(u32, u8), u64> = BTreeMap::new();

        for op in ops {
            match op {
                Op::Insert(addr, len, value) => {
                    let is_new = t.insert(addr, Cidr::new(len)?, value)?;
                    let old = m.insert((truncate_to_len(addr, len), len), value);
                    prop_assert_eq!(is_new, old.is_none());
                }
                Op::Delete(addr, len) => {
                    let found = t.delete(addr, Cidr::new(len)?);
                    let old = m.remove(&(truncate_to_len(addr, len), len));
                    prop_assert_eq!(found, old.is_some());
                }
                Op::Get(addr, len) => {
                    let got_t = t.get(addr, Cidr::new(len)?).copied();
                    let got_m = m.get(&(truncate_to_len(addr, len), len)).copied();
                    prop_assert_eq!(got_t, got_m);
                }
                Op::Lookup(addr) => {
                    prop_assert_eq!(t.lookup(addr).copied(), model_lookup(&m, addr));
                }
                Op::Cleanup => {
                    let root_dead = t.cleanup_dead_entries();
                    prop_assert_eq!(root_dead, m.is_empty());
                }
            }

            prop_assert_eq!(t.len(), m.len());
        }

        validate_tree(&t);
        let mut got: Vec<((u32, u8), u64)> = t
            .iter()
            .map(|e| ((e.prefix.get_net(), e.prefix.get_len().get()), *e.route))
            .collect();
        got.sort();
        let expected: Vec<((u32, u8), u64)> =
            m.iter().map(|(k, v)| (*k, *v)).collect();
        prop_assert_eq!(got, expected);

        // Reclamation never changes what the table answers.
        t.cleanup_dead_entries();
        validate_tree(&t);
        prop_assert_eq!(t.iter().count(), m.len());
        for ((net, len), value) in m.iter() {
            prop_assert_eq!(t.lookup(*net).copied(), model_lookup(&m, *net));
            prop_assert_eq!(t.get(*net, Cidr::new(*len)?), Some(value));
        }
    }
}
