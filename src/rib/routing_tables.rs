use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use log::{debug, info};
use parking_lot::RwLock;

use crate::rib::config::RibConfig;
use crate::rib::update::{RouteUpdate, UpdateOutcome};
use crate::rib::Rib;
use crate::types::errors::RibError;
use crate::types::Ipv4Route;

//------------ VrfId ---------------------------------------------------------

/// The identifier of a VRF table. Identifiers are handed out in order of
/// creation, and are never reused, not even after the VRF is removed.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VrfId(u32);

impl VrfId {
    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for VrfId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

//------------ TableId -------------------------------------------------------

/// Names one of the tables in [RoutingTables]. A BGP neighbour carries a
/// list of these, the tables its routes get imported into.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TableId {
    MasterIpv4,
    Vrf(VrfId),
}

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableId::MasterIpv4 => write!(f, "master-ipv4"),
            TableId::Vrf(id) => write!(f, "vrf-{}", id),
        }
    }
}

//------------ RoutingTables -------------------------------------------------

struct VrfTable {
    index: HashMap<String, VrfId>,
    tables: BTreeMap<VrfId, (String, Arc<Rib<Ipv4Route>>)>,
    next_id: u32,
}

/// All the routing tables of a router: the master IPv4 table, and one table
/// per VRF. Every component that needs a table gets handed a reference to
/// this, there is no global state.
pub struct RoutingTables {
    master_ipv4: Arc<Rib<Ipv4Route>>,
    vrfs: RwLock<VrfTable>,
}

impl RoutingTables {
    /// Create a registry with only the master table in it.
    pub fn new() -> Self {
        RoutingTables {
            master_ipv4: Arc::new(Rib::new()),
            vrfs: RwLock::new(VrfTable {
                index: HashMap::new(),
                tables: BTreeMap::new(),
                next_id: 0,
            }),
        }
    }

    /// Create a registry with the master table, and an empty table for every
    /// VRF in `config`.
    pub fn with_config(config: &RibConfig) -> Result<Self, RibError> {
        config.validate()?;
        let tables = Self::new();
        for name in config.vrfs.iter() {
            tables.add_vrf(name)?;
        }
        Ok(tables)
    }

    /// Create an empty table for VRF `name`.
    pub fn add_vrf(&self, name: &str) -> Result<VrfId, RibError> {
        if name.trim().is_empty() {
            return Err(RibError::Config("empty VRF name".to_string()));
        }

        let mut vrfs = self.vrfs.write();
        if vrfs.index.contains_key(name) {
            return Err(RibError::VrfExists(name.to_string()));
        }
        let id = VrfId(vrfs.next_id);
        vrfs.next_id += 1;
        vrfs.index.insert(name.to_string(), id);
        vrfs.tables
            .insert(id, (name.to_string(), Arc::new(Rib::new())));

        info!("created VRF '{}' with id {}", name, id);
        Ok(id)
    }

    /// Remove the table for VRF `name` from the registry. The table itself
    /// lives on for as long as somebody holds on to the returned handle.
    pub fn remove_vrf(
        &self,
        name: &str,
    ) -> Result<Arc<Rib<Ipv4Route>>, RibError> {
        let mut vrfs = self.vrfs.write();
        let id = vrfs
            .index
            .remove(name)
            .ok_or_else(|| RibError::VrfNotFound(name.to_string()))?;
        let (_, table) =
            vrfs.tables.remove(&id).ok_or(RibError::FatalError)?;

        info!("removed VRF '{}' with {} routes", name, table.len());
        Ok(table)
    }

    pub fn vrf_id(&self, name: &str) -> Result<VrfId, RibError> {
        self.vrfs
            .read()
            .index
            .get(name)
            .copied()
            .ok_or_else(|| RibError::VrfNotFound(name.to_string()))
    }

    pub fn vrf_name(&self, id: VrfId) -> Option<String> {
        self.vrfs.read().tables.get(&id).map(|(name, _)| name.clone())
    }

    /// The names of all VRFs, in order of creation.
    pub fn vrf_names(&self) -> Vec<String> {
        self.vrfs
            .read()
            .tables
            .values()
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// The master IPv4 table.
    pub fn master(&self) -> Arc<Rib<Ipv4Route>> {
        Arc::clone(&self.master_ipv4)
    }

    pub fn table(&self, id: TableId) -> Result<Arc<Rib<Ipv4Route>>, RibError> {
        match id {
            TableId::MasterIpv4 => Ok(self.master()),
            TableId::Vrf(vrf_id) => self
                .vrfs
                .read()
                .tables
                .get(&vrf_id)
                .map(|(_, table)| Arc::clone(table))
                .ok_or(RibError::TableNotFound),
        }
    }

    /// The table for VRF `name`.
    pub fn vrf(&self, name: &str) -> Result<Arc<Rib<Ipv4Route>>, RibError> {
        self.table(TableId::Vrf(self.vrf_id(name)?))
    }

    /// Every table in the registry, the master table first.
    pub fn tables(&self) -> Vec<(TableId, Arc<Rib<Ipv4Route>>)> {
        let vrfs = self.vrfs.read();
        let mut tables = Vec::with_capacity(vrfs.tables.len() + 1);
        tables.push((TableId::MasterIpv4, self.master()));
        tables.extend(
            vrfs.tables
                .iter()
                .map(|(id, (_, table))| (TableId::Vrf(*id), Arc::clone(table))),
        );
        tables
    }

    pub fn apply(
        &self,
        id: TableId,
        update: RouteUpdate<Ipv4Route>,
    ) -> Result<UpdateOutcome, RibError> {
        let outcome = self.table(id)?.apply(update)?;
        debug!("{}: {}", id, outcome);
        Ok(outcome)
    }

    /// Apply `update` to each of the tables in `ids`, the way the routes
    /// learned from a neighbour go into all of its import tables. All the
    /// tables are looked up first, so an unknown table leaves every table
    /// untouched.
    pub fn apply_to(
        &self,
        ids: &[TableId],
        update: RouteUpdate<Ipv4Route>,
    ) -> Result<Vec<UpdateOutcome>, RibError> {
        let tables = ids
            .iter()
            .map(|id| self.table(*id).map(|table| (*id, table)))
            .collect::<Result<Vec<_>, _>>()?;

        let mut outcomes = Vec::with_capacity(tables.len());
        for (id, table) in tables {
            let outcome = table.apply(update.clone())?;
            debug!("{}: {} {}", id, update.prefix(), outcome);
            outcomes.push(outcome);
        }
        Ok(outcomes)
    }
}

impl Default for RoutingTables {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RoutingTables {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoutingTables")
            .field("master_ipv4", &self.master_ipv4)
            .field("vrfs", &self.vrf_names())
            .finish()
    }
}
