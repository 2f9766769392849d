use std::error::Error;
use std::net::Ipv4Addr;

use super::*;
use crate::types::Ipv4Route;

fn route(last_octet: u8, metric: u16) -> Ipv4Route {
    Ipv4Route::new(Ipv4Addr::new(10, 0, 0, last_octet), metric)
}

#[test]
fn test_empty_table() -> Result<(), Box<dyn Error>> {
    let tree = TreeBitMap::<Ipv4Route>::new();

    assert!(tree.is_empty());
    assert_eq!(tree.lookup(0), None);
    assert_eq!(tree.lookup(u32::MAX), None);
    assert_eq!(tree.iter().count(), 0);
    assert_eq!(tree.stats().nodes(), 1);

    Ok(())
}

#[test]
fn test_sample_routes() -> Result<(), Box<dyn Error>> {
    let mut tree = TreeBitMap::new();
    tree.insert(0xffff_fffc, Cidr::new(30)?, route(30, 1))?;
    tree.insert(0x1000_0000, Cidr::new(15)?, route(15, 1))?;
    tree.insert(0xffff_fff0, Cidr::new(28)?, route(28, 1))?;

    assert_eq!(tree.len(), 3);
    assert_eq!(tree.lookup(0xffff_ffff), Some(&route(30, 1)));
    assert_eq!(tree.lookup(0xffff_fff3), Some(&route(28, 1)));
    assert_eq!(tree.lookup(0x1001_2345), Some(&route(15, 1)));
    assert_eq!(tree.lookup(0x1002_0000), None);

    let found = tree.longest_match(0xffff_ffff).ok_or("no match")?;
    assert_eq!(found.prefix.to_string(), "255.255.255.252/30");

    Ok(())
}

#[test]
fn test_placement() -> Result<(), Box<dyn Error>> {
    let mut tree = TreeBitMap::new();
    tree.insert(0x1000_0000, Cidr::new(15)?, 15_u32)?;

    // /15 is hosted by the node at depth 4, in the slot for a 3-bit span.
    let mut node = &tree.root;
    for depth in 0..4 {
        assert_eq!(node.pfxbitarr, 0, "prefix at depth {}", depth);
        node = node
            .child(nibble_at(0x1000_0000, depth))
            .ok_or("missing child")?;
    }
    assert_eq!(node.ptrbitarr, 0);
    assert_eq!(node.pfxbitarr, 1 << (15 - 7));
    assert_eq!(node.pfxbitarr.count_ones(), 1);

    Ok(())
}

#[test]
fn test_default_route() -> Result<(), Box<dyn Error>> {
    let mut tree = TreeBitMap::new();
    tree.insert(0xdead_beef, Cidr::MIN, route(1, 0))?;

    assert_eq!(tree.root.pfxbitarr, 0x8000);
    assert_eq!(tree.root.ptrbitarr, 0);
    for addr in [0, 1, 0x7fff_ffff, 0x8000_0000, u32::MAX] {
        assert_eq!(tree.lookup(addr), Some(&route(1, 0)));
    }

    let entry = tree.iter().next().ok_or("empty iterator")?;
    assert_eq!(entry.prefix.get_net(), 0);
    assert_eq!(entry.prefix.get_len(), Cidr::MIN);

    Ok(())
}

#[test]
fn test_host_routes() -> Result<(), Box<dyn Error>> {
    let mut tree = TreeBitMap::new();
    for last in 0..4_u32 {
        tree.insert(0xc0a8_0100 | last, Cidr::MAX, last)?;
    }
    tree.insert(0xc0a8_0102, Cidr::new(31)?, 31)?;

    for last in 0..4_u32 {
        assert_eq!(tree.lookup(0xc0a8_0100 | last), Some(&last));
        assert!(tree.contains(0xc0a8_0100 | last, Cidr::MAX));
    }
    assert_eq!(tree.lookup(0xc0a8_0104), None);
    assert_eq!(tree.get(0xc0a8_0103, Cidr::new(31)?), Some(&31));

    assert!(tree.delete(0xc0a8_0103, Cidr::MAX));
    assert_eq!(tree.lookup(0xc0a8_0103), Some(&31));

    let mut pfxs = tree
        .iter()
        .map(|e| (e.prefix.get_net(), e.prefix.get_len().get()))
        .collect::<Vec<_>>();
    pfxs.sort();
    assert_eq!(
        pfxs,
        vec![
            (0xc0a8_0100, 32),
            (0xc0a8_0101, 32),
            (0xc0a8_0102, 31),
            (0xc0a8_0102, 32)
        ]
    );

    Ok(())
}

#[test]
fn test_longest_match_precedence() -> Result<(), Box<dyn Error>> {
    let mut tree = TreeBitMap::new();
    tree.insert(0x0a00_0000, Cidr::new(8)?, 8)?;
    tree.insert(0x0a01_0000, Cidr::new(16)?, 16)?;
    tree.insert(0x0a01_0200, Cidr::new(24)?, 24)?;

    assert_eq!(tree.lookup(0x0a01_0203), Some(&24));
    assert!(tree.delete(0x0a01_0200, Cidr::new(24)?));
    assert_eq!(tree.lookup(0x0a01_0203), Some(&16));
    assert!(tree.delete(0x0a01_0000, Cidr::new(16)?));
    assert_eq!(tree.lookup(0x0a01_0203), Some(&8));
    assert!(tree.delete(0x0a00_0000, Cidr::new(8)?));
    assert_eq!(tree.lookup(0x0a01_0203), None);

    assert!(!tree.delete(0x0a00_0000, Cidr::new(8)?));
    assert_eq!(
        tree.remove(0x0a00_0000, Cidr::new(8)?),
        Err(RibError::PrefixNotFound)
    );

    Ok(())
}

#[test]
fn test_idempotent_insert() -> Result<(), Box<dyn Error>> {
    let mut tree = TreeBitMap::new();
    assert!(tree.insert(0xc633_6400, Cidr::new(24)?, route(1, 10))?);
    assert!(!tree.insert(0xc633_64ff, Cidr::new(24)?, route(2, 20))?);

    assert_eq!(tree.len(), 1);
    assert_eq!(tree.lookup(0xc633_6401), Some(&route(2, 20)));
    assert_eq!(tree.stats().routes(), 1);

    Ok(())
}

#[test]
fn test_delete_leaves_storage() -> Result<(), Box<dyn Error>> {
    let mut tree = TreeBitMap::new();
    tree.insert(0xc633_6400, Cidr::new(24)?, 24_u32)?;
    let before = tree.stats();

    assert!(tree.delete(0xc633_6400, Cidr::new(24)?));
    let after = tree.stats();
    assert_eq!(after.routes(), 0);
    assert_eq!(after.nodes(), before.nodes());
    assert_eq!(after.slot_arrays, before.slot_arrays);
    assert_eq!(after.children_arrays, before.children_arrays);

    // Deleting something below an absent child doesn't allocate.
    assert!(!tree.delete(0x0a00_0000, Cidr::new(24)?));
    assert_eq!(tree.stats(), after);

    Ok(())
}

#[test]
fn test_enumeration_order() -> Result<(), Box<dyn Error>> {
    let mut tree = TreeBitMap::new();
    tree.insert(0x0a00_0000, Cidr::new(8)?, 8_u32)?;
    tree.insert(0x0a00_0000, Cidr::new(24)?, 24)?;
    tree.insert(0x0a00_0000, Cidr::new(7)?, 7)?;
    tree.insert(0x0000_0000, Cidr::new(2)?, 2)?;
    tree.insert(0x2000_0000, Cidr::new(3)?, 3)?;

    let order = tree.iter().map(|e| *e.route).collect::<Vec<_>>();

    // The root holds /2 (slot 3) and /3 (slot 8). The node at depth 2 holds
    // /7 (slot 2) and /8 (slot 5), the /24 is further down.
    assert_eq!(order, vec![2, 3, 7, 8, 24]);
    assert_eq!(tree.iter().len(), 5);

    Ok(())
}

#[test]
fn test_reclaim_all() -> Result<(), Box<dyn Error>> {
    let mut tree = TreeBitMap::new();
    let pfxs = [
        (0x1000_0000, 15),
        (0xffff_fffc, 30),
        (0xffff_fff0, 28),
        (0xffff_ffff, 32),
        (0, 0),
    ];
    for (net, len) in pfxs {
        tree.insert(net, Cidr::new(len)?, len)?;
    }
    assert!(!tree.cleanup_dead_entries());

    for (net, len) in pfxs {
        assert!(tree.delete(net, Cidr::new(len)?));
    }
    let reclaimed = tree.reclaim();
    assert!(reclaimed.root_dead);
    assert!(reclaimed.freed_arrays > 0);

    assert!(tree.root.ptr_vec.is_empty());
    assert!(tree.root.pfx_vec.is_empty());
    assert_eq!(tree.stats().nodes(), 1);
    assert_eq!(tree.lookup(0xffff_ffff), None);

    // A second pass has nothing left to do.
    assert_eq!(
        tree.reclaim(),
        Reclaimed {
            freed_arrays: 0,
            root_dead: true
        }
    );

    Ok(())
}

#[test]
fn test_reclaim_partial() -> Result<(), Box<dyn Error>> {
    let mut tree = TreeBitMap::new();
    tree.insert(0x0a00_0000, Cidr::new(8)?, 8_u32)?;
    tree.insert(0x0a01_0200, Cidr::new(24)?, 24)?;
    tree.insert(0xc0a8_0000, Cidr::new(16)?, 16)?;

    assert!(tree.delete(0x0a01_0200, Cidr::new(24)?));
    assert!(tree.delete(0xc0a8_0000, Cidr::new(16)?));
    let before = tree.stats();
    assert!(!tree.cleanup_dead_entries());
    let after = tree.stats();

    assert!(after.nodes() < before.nodes());
    assert!(after.children_arrays < before.children_arrays);
    assert_eq!(after.routes(), 1);
    assert_eq!(tree.lookup(0x0a01_0203), Some(&8));
    assert_eq!(tree.lookup(0xc0a8_0001), None);

    // The /8 lives at depth 2, so the path down to it is all that's left.
    assert_eq!(after.nodes_per_depth[1], 8);
    assert_eq!(after.nodes_per_depth[2], 8);
    assert_eq!(after.nodes_per_depth[3], 0);

    // Things can be inserted into reclaimed parts of the tree again.
    tree.insert(0xc0a8_0000, Cidr::new(16)?, 160)?;
    assert_eq!(tree.lookup(0xc0a8_0001), Some(&160));

    Ok(())
}

#[test]
fn test_clear() -> Result<(), Box<dyn Error>> {
    let mut tree = TreeBitMap::new();
    tree.insert(0x0a00_0000, Cidr::new(8)?, 8_u32)?;
    tree.insert(0, Cidr::MIN, 0)?;
    tree.clear();

    assert!(tree.is_empty());
    assert_eq!(tree.lookup(0x0a00_0001), None);
    assert_eq!(
        tree.stats(),
        TableStats {
            nodes_per_depth: [1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0],
            ..Default::default()
        }
    );

    Ok(())
}

#[test]
fn test_apply_updates() -> Result<(), Box<dyn Error>> {
    let mut tree = TreeBitMap::new();
    let pfx = PrefixId::new(0xc633_6400, Cidr::new(24)?);

    assert_eq!(
        tree.apply(RouteUpdate::announce(pfx, route(1, 1)))?,
        UpdateOutcome::Added
    );
    assert_eq!(
        tree.apply(RouteUpdate::announce(pfx, route(2, 1)))?,
        UpdateOutcome::Replaced
    );
    assert_eq!(
        tree.apply(RouteUpdate::withdraw(pfx))?,
        UpdateOutcome::Withdrawn
    );
    assert_eq!(
        tree.apply(RouteUpdate::withdraw(pfx))?,
        UpdateOutcome::NotFound
    );

    Ok(())
}

#[test]
fn test_insert_prefix() -> Result<(), Box<dyn Error>> {
    use std::str::FromStr;

    use inetnum::addr::Prefix;

    let mut tree = TreeBitMap::new();
    tree.insert_prefix(&Prefix::from_str("185.34.0.0/16")?, 16_u32)?;
    assert_eq!(tree.lookup(0xb922_0a01), Some(&16));

    assert_eq!(
        tree.insert_prefix(&Prefix::from_str("2001:db8::/32")?, 32),
        Err(RibError::UnsupportedAddressFamily)
    );
    assert_eq!(tree.len(), 1);

    Ok(())
}

#[test]
fn test_out_of_memory_leaves_table_unchanged() -> Result<(), Box<dyn Error>> {
    use super::proptests::validate_tree;
    use super::tree_bitmap_node::alloc_failure;

    fn base_table() -> Result<TreeBitMap<Ipv4Route>, RibError> {
        let mut table = TreeBitMap::new();
        table.insert(0x0a00_0000, Cidr::new(8)?, route(1, 10))?;
        table.insert(0xc0a8_0000, Cidr::new(16)?, route(2, 10))?;
        table.insert(0xc0a8_0100, Cidr::new(24)?, route(3, 10))?;
        // Deleting leaves the arrays on this path allocated.
        table.insert(0xc0a8_0280, Cidr::new(25)?, route(4, 10))?;
        table.delete(0xc0a8_0280, Cidr::new(25)?);
        Ok(table)
    }

    // One address next to existing routes, one in an empty part of the
    // tree, where every level needs fresh arrays.
    for addr in [0xc0a8_02ff_u32, 0x7f00_0001] {
        for len in 0..=32 {
            let len = Cidr::new(len)?;
            let mut failures = 0;
            loop {
                let mut table = base_table()?;
                let stats = table.stats();
                let entries =
                    table.iter().map(|e| e.to_pair()).collect::<Vec<_>>();
                let existing = table.get(addr, len).copied();

                alloc_failure::fail_after(failures);
                let res = table.insert(addr, len, route(9, 1));
                alloc_failure::reset();

                validate_tree(&table);
                match res {
                    Err(RibError::OutOfMemory) => {
                        assert_eq!(table.stats(), stats);
                        assert_eq!(table.len(), entries.len());
                        assert_eq!(
                            table.iter().map(|e| e.to_pair()).collect::<Vec<_>>(),
                            entries
                        );
                        assert_eq!(table.get(addr, len).copied(), existing);
                        failures += 1;
                    }
                    Ok(_) => {
                        assert_eq!(table.get(addr, len), Some(&route(9, 1)));
                        break;
                    }
                    Err(err) => return Err(err.into()),
                }
                assert!(failures < 24, "insert keeps failing");
            }
            if addr == 0x7f00_0001 {
                assert!(failures > 0, "/{} allocated nothing", len);
            }
        }
    }

    Ok(())
}
