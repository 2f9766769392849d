use std::fmt::Debug;

use log::{log_enabled, trace};

use crate::types::af::{nibble_at, STRIDE_SIZE};
use crate::types::bit_span::SLOTS;
use crate::types::errors::RibError;
use crate::types::stats::TableStats;
use crate::types::{BitSpan, PrefixId};

/// The number of children of a node: one for every value of a 3-bit
/// nibble.
pub(crate) const CHILDREN: usize = 8;

// Makes the allocation after the next `n` succeeding ones fail, so that
// tests can reach the out of memory path at every depth.
#[cfg(test)]
pub(crate) mod alloc_failure {
    use std::cell::Cell;

    thread_local! {
        static COUNTDOWN: Cell<Option<usize>> = const { Cell::new(None) };
    }

    pub(crate) fn fail_after(n: usize) {
        COUNTDOWN.with(|c| c.set(Some(n)));
    }

    pub(crate) fn reset() {
        COUNTDOWN.with(|c| c.set(None));
    }

    pub(crate) fn should_fail() -> bool {
        COUNTDOWN.with(|c| match c.get() {
            Some(0) => {
                c.set(None);
                true
            }
            Some(n) => {
                c.set(Some(n - 1));
                false
            }
            None => false,
        })
    }
}

#[cfg(test)]
fn alloc_fails() -> bool {
    alloc_failure::should_fail()
}

#[cfg(not(test))]
#[inline(always)]
fn alloc_fails() -> bool {
    false
}

// The position of a child in the children bitmap, most significant bit
// first.
pub(crate) fn child_bit(nibble: u8) -> u8 {
    0x80 >> (nibble & 0b111)
}

//------------ TreeBitMap Node ----------------------------------------------

// A node in the tree holds two bitmaps, `ptrbitarr` for its children and
// `pfxbitarr` for the prefixes it hosts, together with the arrays that
// hold the children and the payloads. A node has no clue where it sits in
// the tree: its base address and depth are implied by the path taken to
// reach it, that's why several methods take a `depth` or a `base` argument.
//
// Both arrays are allocated lazily, and always at their full size, so the
// position in the array is the nibble (for children) or the slot (for
// prefixes). An empty vec means the array is not allocated. A set bit in a
// bitmap always has an allocated array behind it, the reverse is not true:
// deleting a prefix only clears its bit, and leaves the array (and the stale
// payload in it) in place until the next reclamation pass.
pub(crate) struct TreeBitMapNode<P> {
    pub ptrbitarr: u8,
    pub pfxbitarr: u16,
    pub ptr_vec: Vec<TreeBitMapNode<P>>,
    pub pfx_vec: Vec<P>,
}

impl<P> Debug for TreeBitMapNode<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TreeBitMapNode")
            .field("ptrbitarr", &format_args!("{:08b}", self.ptrbitarr))
            .field("pfxbitarr", &format_args!("{:016b}", self.pfxbitarr))
            .field("ptr_vec", &self.ptr_vec.len())
            .field("pfx_vec", &self.pfx_vec.len())
            .finish()
    }
}

impl<P> std::fmt::Display for TreeBitMapNode<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "TreeBitMapNode {{ ptrbitarr: {:08b}, pfxbitarr: {:016b} }}",
            self.ptrbitarr, self.pfxbitarr,
        )
    }
}

impl<P> Default for TreeBitMapNode<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> TreeBitMapNode<P> {
    pub(crate) fn new() -> Self {
        TreeBitMapNode {
            ptrbitarr: 0,
            pfxbitarr: 0,
            ptr_vec: vec![],
            pfx_vec: vec![],
        }
    }

    // ------- Accessors ----------------------------------------------------

    pub(crate) fn child(&self, nibble: u8) -> Option<&TreeBitMapNode<P>> {
        if self.ptrbitarr & child_bit(nibble) == 0 {
            return None;
        }
        self.ptr_vec.get(nibble as usize)
    }

    pub(crate) fn child_mut(
        &mut self,
        nibble: u8,
    ) -> Option<&mut TreeBitMapNode<P>> {
        if self.ptrbitarr & child_bit(nibble) == 0 {
            return None;
        }
        self.ptr_vec.get_mut(nibble as usize)
    }

    pub(crate) fn prefix(&self, bit_span: BitSpan) -> Option<&P> {
        if self.pfxbitarr & bit_span.into_bit_pos() == 0 {
            return None;
        }
        self.pfx_vec.get(bit_span.slot())
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.ptrbitarr == 0 && self.pfxbitarr == 0
    }

    // ------- Allocation ---------------------------------------------------

    // Allocate the children array, if it isn't there yet. Returns whether
    // it was allocated by this call, so that the caller can undo it.
    fn alloc_children(&mut self) -> Result<bool, RibError> {
        if !self.ptr_vec.is_empty() {
            return Ok(false);
        }
        if alloc_fails() {
            return Err(RibError::OutOfMemory);
        }
        self.ptr_vec
            .try_reserve_exact(CHILDREN)
            .map_err(|_| RibError::OutOfMemory)?;
        self.ptr_vec.resize_with(CHILDREN, TreeBitMapNode::new);
        Ok(true)
    }

    fn alloc_prefixes(&mut self) -> Result<(), RibError>
    where
        P: Default,
    {
        if !self.pfx_vec.is_empty() {
            return Ok(());
        }
        if alloc_fails() {
            return Err(RibError::OutOfMemory);
        }
        self.pfx_vec
            .try_reserve_exact(SLOTS)
            .map_err(|_| RibError::OutOfMemory)?;
        self.pfx_vec.resize_with(SLOTS, P::default);
        Ok(())
    }

    // ------- Insert -------------------------------------------------------

    // Walk down from this node, which sits at `depth`, to the node that
    // hosts `pfx`, and store `route` there. Returns whether the prefix is
    // new to the tree.
    //
    // A bit in a bitmap is only set after everything below it succeeded, and
    // an array that was allocated on the way down is released again if the
    // descent fails, so a failed insert leaves the tree as it was.
    pub(crate) fn insert_at(
        &mut self,
        pfx: PrefixId,
        depth: u8,
        route: P,
    ) -> Result<bool, RibError>
    where
        P: Default,
    {
        if depth == pfx.node_depth() {
            let bit_span = pfx.bit_span();
            self.alloc_prefixes()?;
            let slot = self
                .pfx_vec
                .get_mut(bit_span.slot())
                .ok_or(RibError::FatalError)?;
            *slot = route;

            let bit_pos = bit_span.into_bit_pos();
            let is_new = self.pfxbitarr & bit_pos == 0;
            self.pfxbitarr |= bit_pos;
            trace!(
                "stored {} at depth {} slot {} (new: {})",
                pfx,
                depth,
                bit_span.slot(),
                is_new
            );
            return Ok(is_new);
        }

        let nibble = nibble_at(pfx.get_net(), depth);
        let fresh = self.alloc_children()?;
        let res = match self.ptr_vec.get_mut(nibble as usize) {
            Some(child) => child.insert_at(pfx, depth + 1, route),
            None => Err(RibError::FatalError),
        };

        match res {
            Ok(is_new) => {
                self.ptrbitarr |= child_bit(nibble);
                Ok(is_new)
            }
            Err(err) => {
                if fresh {
                    self.ptr_vec = vec![];
                }
                Err(err)
            }
        }
    }

    // ------- Search -------------------------------------------------------

    // The most specific prefix in this node that covers `nibble`. Evaluates
    // the slots for a bit span of 3, 2, 1 and 0 bits, in that order.
    pub(crate) fn longest_match_in(
        &self,
        nibble: u8,
    ) -> Option<(BitSpan, &P)> {
        if self.pfxbitarr == 0 {
            return None;
        }
        (0..=STRIDE_SIZE).rev().find_map(|len| {
            let bit_span = BitSpan::from_nibble(nibble, len);
            self.prefix(bit_span).map(|route| (bit_span, route))
        })
    }

    // Clear the bit for `bit_span`, if it was set. The payload stays where
    // it is.
    pub(crate) fn clear_prefix(&mut self, bit_span: BitSpan) -> bool {
        let bit_pos = bit_span.into_bit_pos();
        if self.pfxbitarr & bit_pos == 0 {
            return false;
        }
        self.pfxbitarr &= !bit_pos;
        true
    }

    // ------- Reclamation --------------------------------------------------

    // Post-order sweep of the subtree below this node. A child without any
    // prefixes in it or below it is dead: its bit is cleared, and once all
    // children are dead the children array is released. A prefix array
    // without any bits set is released as well. Returns whether this node
    // itself is dead now. `freed` counts the released arrays.
    pub(crate) fn reclaim(&mut self, freed: &mut usize) -> bool {
        if !self.ptr_vec.is_empty() {
            for (nibble, child) in self.ptr_vec.iter_mut().enumerate() {
                let bit = child_bit(nibble as u8);
                if self.ptrbitarr & bit != 0 && child.reclaim(freed) {
                    self.ptrbitarr &= !bit;
                }
            }
            if self.ptrbitarr == 0 {
                self.ptr_vec = vec![];
                *freed += 1;
            }
        }

        if self.pfxbitarr == 0 && !self.pfx_vec.is_empty() {
            self.pfx_vec = vec![];
            *freed += 1;
        }

        if log_enabled!(log::Level::Trace) && self.is_empty() {
            trace!("dead node {}", self);
        }
        self.is_empty()
    }

    // ------- Statistics ---------------------------------------------------

    pub(crate) fn collect_stats(&self, depth: u8, stats: &mut TableStats) {
        stats.inc_node(depth);

        if !self.pfx_vec.is_empty() {
            stats.slot_arrays += 1;
            for slot in 0..SLOTS as u8 {
                let bit_span = BitSpan::from_slot(slot);
                if self.pfxbitarr & bit_span.into_bit_pos() != 0 {
                    stats.inc_prefix(STRIDE_SIZE * depth + bit_span.len);
                }
            }
        }

        if !self.ptr_vec.is_empty() {
            stats.children_arrays += 1;
            for child in self.ptr_vec.iter() {
                child.collect_stats(depth + 1, stats);
            }
        }
    }
}
