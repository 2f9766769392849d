//------------ Types for Statistics -----------------------------------------

use std::fmt::{Debug, Display};

use crate::types::af::{DEPTH_LEVELS, MAX_LEN};

/// A snapshot of the shape of a table, computed by walking all of it.
#[derive(Clone, PartialEq, Eq)]
pub struct TableStats {
    // number of nodes (including the root) at each depth of the tree
    pub nodes_per_depth: [usize; DEPTH_LEVELS as usize],
    // number of live routes for each prefix length
    pub prefixes_per_len: [usize; MAX_LEN as usize + 1],
    // number of allocated 8-entry children arrays
    pub children_arrays: usize,
    // number of allocated 15-entry prefix arrays
    pub slot_arrays: usize,
}

impl TableStats {
    pub fn routes(&self) -> usize {
        self.prefixes_per_len.iter().sum()
    }

    /// The number of nodes in the tree. A node that is part of an allocated
    /// children array, but has nothing below it or in it, still counts.
    pub fn nodes(&self) -> usize {
        self.nodes_per_depth.iter().sum()
    }

    pub(crate) fn inc_node(&mut self, depth: u8) {
        if let Some(n) = self.nodes_per_depth.get_mut(depth as usize) {
            *n += 1;
        }
    }

    pub(crate) fn inc_prefix(&mut self, len: u8) {
        if let Some(p) = self.prefixes_per_len.get_mut(len as usize) {
            *p += 1;
        }
    }

    /// Estimated size in bytes of all the arrays in the tree, for a payload
    /// of `payload_size` bytes.
    pub fn mem_usage(&self, payload_size: usize, node_size: usize) -> usize {
        self.children_arrays * 8 * node_size
            + self.slot_arrays * 15 * payload_size
    }
}

impl Default for TableStats {
    fn default() -> Self {
        Self {
            nodes_per_depth: [0; DEPTH_LEVELS as usize],
            prefixes_per_len: [0; MAX_LEN as usize + 1],
            children_arrays: 0,
            slot_arrays: 0,
        }
    }
}

impl Debug for TableStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableStats")
            .field("routes", &self.routes())
            .field("nodes", &self.nodes())
            .field("children_arrays", &self.children_arrays)
            .field("slot_arrays", &self.slot_arrays)
            .finish()
    }
}

impl Display for TableStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "routes: {} nodes: {} (children arrays {}, prefix arrays {})",
            self.routes(),
            self.nodes(),
            self.children_arrays,
            self.slot_arrays
        )?;
        for (depth, count) in self.nodes_per_depth.iter().enumerate() {
            if *count != 0 {
                writeln!(f, "depth {:>2}: {:>8} nodes", depth, count)?;
            }
        }
        for (len, count) in self.prefixes_per_len.iter().enumerate() {
            if *count != 0 {
                writeln!(f, "/{:<2}: {:>8} routes", len, count)?;
            }
        }
        Ok(())
    }
}
