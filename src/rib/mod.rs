pub mod config;
pub mod reclaim;
pub mod routing_tables;
pub mod update;

pub use reclaim::{reclaim_all, Reclaimer};
pub use routing_tables::{RoutingTables, TableId, VrfId};
pub use update::{RouteUpdate, UpdateOutcome};

use log::{debug, trace};
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use serde_derive::Serialize;

use crate::tree_bitmap::{Reclaimed, TreeBitMap};
use crate::types::af::IPv4;
use crate::types::errors::RibError;
use crate::types::stats::TableStats;
use crate::types::{Cidr, PrefixId};

//------------ Rib -----------------------------------------------------------

/// A routing table that can be shared between threads.
///
/// Every operation takes a lock on the whole table: lookups and iteration
/// take the read lock, so they run side by side, while inserts, deletes and
/// reclamation take the write lock. A reader never sees a change that is
/// only partly applied.
///
/// ```
/// use std::net::Ipv4Addr;
/// use dnrd_rib::{Cidr, Ipv4Route, Rib};
///
/// let rib = Rib::new();
/// let route = Ipv4Route::new(Ipv4Addr::LOCALHOST, 1);
/// rib.insert(0x0a00_0000, Cidr::new(8)?, route)?;
/// assert_eq!(rib.lookup(0x0a01_0203).map(|r| r.metric), Some(1));
/// # Ok::<(), dnrd_rib::errors::RibError>(())
/// ```
pub struct Rib<P> {
    tree: RwLock<TreeBitMap<P>>,
}

impl<P> Rib<P> {
    pub fn new() -> Self {
        Rib {
            tree: RwLock::new(TreeBitMap::new()),
        }
    }

    /// Take the read lock, to do a series of reads on the same version of
    /// the table. No writes happen while the guard is held.
    pub fn read(&self) -> RwLockReadGuard<'_, TreeBitMap<P>> {
        self.tree.read()
    }

    /// Take the write lock, to apply a series of changes that readers get
    /// to see all at once.
    pub fn write(&self) -> RwLockWriteGuard<'_, TreeBitMap<P>> {
        self.tree.write()
    }

    pub fn insert(
        &self,
        net: IPv4,
        len: Cidr,
        route: P,
    ) -> Result<bool, RibError>
    where
        P: Default,
    {
        self.tree.write().insert(net, len, route)
    }

    /// The route for the most specific prefix that contains `addr`.
    pub fn lookup(&self, addr: IPv4) -> Option<P>
    where
        P: Clone,
    {
        self.tree.read().lookup(addr).cloned()
    }

    /// The most specific prefix that contains `addr`, and its route.
    pub fn longest_match(&self, addr: IPv4) -> Option<(PrefixId, P)>
    where
        P: Clone,
    {
        self.tree
            .read()
            .longest_match(addr)
            .map(|entry| entry.to_pair())
    }

    pub fn get(&self, net: IPv4, len: Cidr) -> Option<P>
    where
        P: Clone,
    {
        self.tree.read().get(net, len).cloned()
    }

    pub fn contains(&self, net: IPv4, len: Cidr) -> bool {
        self.tree.read().contains(net, len)
    }

    pub fn delete(&self, net: IPv4, len: Cidr) -> bool {
        self.tree.write().delete(net, len)
    }

    pub fn remove(&self, net: IPv4, len: Cidr) -> Result<(), RibError> {
        self.tree.write().remove(net, len)
    }

    pub fn reclaim(&self) -> Reclaimed {
        self.tree.write().reclaim()
    }

    pub fn cleanup_dead_entries(&self) -> bool {
        self.tree.write().cleanup_dead_entries()
    }

    pub fn clear(&self) {
        self.tree.write().clear()
    }

    pub fn apply(
        &self,
        update: RouteUpdate<P>,
    ) -> Result<UpdateOutcome, RibError>
    where
        P: Default,
    {
        self.tree.write().apply(update)
    }

    /// Apply a batch of updates under one write lock. As long as every
    /// update succeeds, readers see either none or all of them.
    ///
    /// The batch stops at the first update that fails. The updates before
    /// it stay applied and are not rolled back, so after an error readers
    /// see the first part of the batch only.
    pub fn apply_all(
        &self,
        updates: impl IntoIterator<Item = RouteUpdate<P>>,
    ) -> Result<Vec<UpdateOutcome>, RibError>
    where
        P: Default,
    {
        let mut tree = self.tree.write();
        let outcomes = updates
            .into_iter()
            .map(|update| tree.apply(update))
            .collect::<Result<Vec<_>, _>>()?;
        trace!("applied {} updates", outcomes.len());
        Ok(outcomes)
    }

    /// A copy of all prefixes and their routes, in enumeration order.
    pub fn entries(&self) -> Vec<(PrefixId, P)>
    where
        P: Clone,
    {
        self.tree.read().iter().map(|entry| entry.to_pair()).collect()
    }

    pub fn len(&self) -> usize {
        self.tree.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.read().is_empty()
    }

    pub fn stats(&self) -> TableStats {
        self.tree.read().stats()
    }

    /// Write all prefixes and their routes as a JSON array of
    /// `{ "prefix": .., "route": .. }` objects.
    pub fn export_json(&self) -> Result<String, RibError>
    where
        P: serde::Serialize,
    {
        #[derive(Serialize)]
        struct ExportEntry<'a, P> {
            prefix: String,
            route: &'a P,
        }

        let tree = self.tree.read();
        let entries = tree
            .iter()
            .map(|entry| ExportEntry {
                prefix: entry.prefix.to_string(),
                route: entry.route,
            })
            .collect::<Vec<_>>();
        debug!("export {} routes", entries.len());
        serde_json::to_string(&entries)
            .map_err(|e| RibError::Export(e.to_string()))
    }
}

impl<P> Default for Rib<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> std::fmt::Debug for Rib<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rib").field("len", &self.len()).finish()
    }
}
