mod iterators;
mod tree_bitmap_node;

#[cfg(test)]
mod proptests;
#[cfg(test)]
mod tests;

pub use iterators::Iter;
pub(crate) use tree_bitmap_node::TreeBitMapNode;

#[cfg(test)]
pub(crate) use tree_bitmap_node::alloc_failure;

use log::{debug, trace};

use crate::rib::update::{RouteUpdate, UpdateOutcome};
use crate::types::af::{nibble_at, truncate_to_len, IPv4, STRIDE_SIZE};
use crate::types::errors::RibError;
use crate::types::stats::TableStats;
use crate::types::{Cidr, PrefixId, RouteEntry};

//------------ TreeBitMap ---------------------------------------------------

// A tree bitmap, as described in [^1], with a fixed stride of three bits.
// Eleven levels of nodes cover an IPv4 address: ten levels of three bits,
// and a last level that covers the two remaining bits. A prefix of length
// `len` is hosted by the node at depth `(len - 1) / 3`, the node whose
// stride holds the last bit of the prefix. The default route lives in the
// first slot of the root node.
//
// depth        0     1     2   ...     9      10
// prefixes  /0-3  /4-6  /7-9   ... /28-30  /31-32
//
// Every node owns its children, so the tree is freed when the
// `TreeBitMap` is dropped, and every node is freed exactly once.
//
// The tree does no synchronisation whatsoever: it has exactly one owner,
// and mutating methods take `&mut self`. See [crate::rib::Rib] for a
// version that can be shared between threads.
//
// [^1]: <https://www.cs.cornell.edu/courses/cs419/2005sp/tree-bitmap.pdf>

/// A longest-prefix-match table for IPv4 prefixes, mapping each prefix to
/// a route of type `P`.
pub struct TreeBitMap<P> {
    root: TreeBitMapNode<P>,
    // number of prefixes that have their bit set
    count: usize,
}

/// The result of a reclamation pass over a [TreeBitMap].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Reclaimed {
    /// The number of children arrays and prefix arrays that were released.
    pub freed_arrays: usize,
    /// Whether nothing is left in the tree.
    pub root_dead: bool,
}

impl<P> TreeBitMap<P> {
    pub fn new() -> Self {
        TreeBitMap {
            root: TreeBitMapNode::new(),
            count: 0,
        }
    }

    /// Store `route` for the prefix `net/len`. Any host bits set in `net`
    /// are ignored. A route that was already stored for this prefix is
    /// replaced.
    ///
    /// Returns `true` if the prefix was not in the table before. If the
    /// memory for a node could not be allocated, [RibError::OutOfMemory] is
    /// returned, and the table is left as it was.
    pub fn insert(
        &mut self,
        net: IPv4,
        len: Cidr,
        route: P,
    ) -> Result<bool, RibError>
    where
        P: Default,
    {
        let pfx = PrefixId::new(net, len);
        trace!("insert {}", pfx);
        let is_new = self.root.insert_at(pfx, 0, route)?;
        if is_new {
            self.count += 1;
        }
        Ok(is_new)
    }

    /// Store `route` for an [inetnum::addr::Prefix]. IPv6 prefixes are
    /// refused with [RibError::UnsupportedAddressFamily].
    pub fn insert_prefix(
        &mut self,
        prefix: &inetnum::addr::Prefix,
        route: P,
    ) -> Result<bool, RibError>
    where
        P: Default,
    {
        let pfx = PrefixId::try_from(*prefix)?;
        self.insert(pfx.get_net(), pfx.get_len(), route)
    }

    /// Returns the route of the most specific prefix that contains `addr`,
    /// or `None` if no prefix in the table contains it.
    pub fn lookup(&self, addr: IPv4) -> Option<&P> {
        self.longest_match(addr).map(|entry| entry.route)
    }

    /// Like [TreeBitMap::lookup], but also returns the prefix that matched.
    pub fn longest_match(&self, addr: IPv4) -> Option<RouteEntry<'_, P>> {
        let mut node = &self.root;
        let mut depth = 0;
        let mut best = None;

        loop {
            let nibble = nibble_at(addr, depth);
            if let Some((bit_span, route)) = node.longest_match_in(nibble) {
                best = Some(RouteEntry {
                    prefix: PrefixId::from_bit_span(
                        truncate_to_len(addr, STRIDE_SIZE * depth),
                        depth,
                        bit_span,
                    ),
                    route,
                });
            }
            match node.child(nibble) {
                Some(child) => {
                    node = child;
                    depth += 1;
                }
                None => break,
            }
        }

        trace!(
            "longest match for {} at depth {}: {:?}",
            std::net::Ipv4Addr::from(addr),
            depth,
            best.map(|e| e.prefix)
        );
        best
    }

    /// The route stored for exactly `net/len`, if any.
    pub fn get(&self, net: IPv4, len: Cidr) -> Option<&P> {
        let pfx = PrefixId::new(net, len);
        let target = pfx.node_depth();
        let mut node = &self.root;
        for depth in 0..target {
            node = node.child(nibble_at(pfx.get_net(), depth))?;
        }
        node.prefix(pfx.bit_span())
    }

    pub fn contains(&self, net: IPv4, len: Cidr) -> bool {
        self.get(net, len).is_some()
    }

    /// Remove the prefix `net/len` from the table. Only the bit for the
    /// prefix is cleared, nothing is freed: the space is recovered by
    /// [TreeBitMap::cleanup_dead_entries].
    ///
    /// Returns whether the prefix was in the table.
    pub fn delete(&mut self, net: IPv4, len: Cidr) -> bool {
        let pfx = PrefixId::new(net, len);
        let target = pfx.node_depth();
        let mut node = &mut self.root;
        for depth in 0..target {
            match node.child_mut(nibble_at(pfx.get_net(), depth)) {
                Some(child) => node = child,
                None => return false,
            }
        }

        let removed = node.clear_prefix(pfx.bit_span());
        if removed {
            self.count -= 1;
        }
        trace!("delete {} (found: {})", pfx, removed);
        removed
    }

    /// Like [TreeBitMap::delete], but reports a missing prefix as
    /// [RibError::PrefixNotFound].
    pub fn remove(&mut self, net: IPv4, len: Cidr) -> Result<(), RibError> {
        if self.delete(net, len) {
            Ok(())
        } else {
            Err(RibError::PrefixNotFound)
        }
    }

    /// Release the memory of every part of the tree that doesn't hold any
    /// prefixes anymore.
    pub fn reclaim(&mut self) -> Reclaimed {
        let mut freed_arrays = 0;
        let root_dead = self.root.reclaim(&mut freed_arrays);
        debug!(
            "reclaimed {} arrays, {} prefixes left",
            freed_arrays, self.count
        );
        Reclaimed {
            freed_arrays,
            root_dead,
        }
    }

    /// Run a reclamation pass. Returns `true` if the table is completely
    /// empty afterwards, with only the bare root node left.
    pub fn cleanup_dead_entries(&mut self) -> bool {
        self.reclaim().root_dead
    }

    /// Remove all prefixes, and release all memory except for the root.
    pub fn clear(&mut self) {
        debug!("clear table with {} prefixes", self.count);
        self.root = TreeBitMapNode::new();
        self.count = 0;
    }

    /// Apply an announce or a withdraw to the table.
    pub fn apply(
        &mut self,
        update: RouteUpdate<P>,
    ) -> Result<UpdateOutcome, RibError>
    where
        P: Default,
    {
        match update {
            RouteUpdate::Announce { prefix, route } => {
                if self.insert(prefix.get_net(), prefix.get_len(), route)? {
                    Ok(UpdateOutcome::Added)
                } else {
                    Ok(UpdateOutcome::Replaced)
                }
            }
            RouteUpdate::Withdraw { prefix } => {
                if self.delete(prefix.get_net(), prefix.get_len()) {
                    Ok(UpdateOutcome::Withdrawn)
                } else {
                    Ok(UpdateOutcome::NotFound)
                }
            }
        }
    }

    /// Iterate over all prefixes in the table. Within a node the prefixes
    /// come first, ordered by length, then the subtrees of the children, so
    /// the order is *not* the order of the addresses.
    pub fn iter(&self) -> Iter<'_, P> {
        Iter::new(&self.root, self.count)
    }

    /// The number of prefixes in the table.
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn stats(&self) -> TableStats {
        let mut stats = TableStats::default();
        self.root.collect_stats(0, &mut stats);
        stats
    }
}

impl<P> Default for TreeBitMap<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, P> IntoIterator for &'a TreeBitMap<P> {
    type Item = RouteEntry<'a, P>;
    type IntoIter = Iter<'a, P>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<P> std::fmt::Debug for TreeBitMap<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TreeBitMap")
            .field("root", &self.root)
            .field("count", &self.count)
            .finish()
    }
}
