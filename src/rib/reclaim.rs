use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::{debug, info, warn};

use crate::rib::config::RibConfig;
use crate::rib::routing_tables::{RoutingTables, TableId};
use crate::tree_bitmap::Reclaimed;
use crate::types::errors::RibError;

/// Run one reclamation pass over every table in `tables`, one table at a
/// time. Each table is write-locked only for the duration of its own pass.
pub fn reclaim_all(tables: &RoutingTables) -> Vec<(TableId, Reclaimed)> {
    tables
        .tables()
        .into_iter()
        .map(|(id, table)| {
            let reclaimed = table.reclaim();
            if reclaimed.freed_arrays > 0 {
                debug!(
                    "{}: freed {} arrays (empty: {})",
                    id, reclaimed.freed_arrays, reclaimed.root_dead
                );
            }
            (id, reclaimed)
        })
        .collect()
}

//------------ Reclaimer -----------------------------------------------------

/// A background thread that periodically releases the memory of the parts
/// of all tables that were emptied by deletes. Deletes only clear bits, so
/// without this (or calling [reclaim_all] by hand) a table never shrinks.
///
/// The thread is stopped when the `Reclaimer` is stopped or dropped.
pub struct Reclaimer {
    stop_tx: Option<mpsc::Sender<()>>,
    handle: Option<JoinHandle<()>>,
    passes: Arc<AtomicUsize>,
}

impl Reclaimer {
    pub fn spawn(
        tables: Arc<RoutingTables>,
        interval: Duration,
    ) -> Result<Self, RibError> {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let passes = Arc::new(AtomicUsize::new(0));
        let thread_passes = Arc::clone(&passes);

        let handle = thread::Builder::new()
            .name("rib-reclaimer".to_string())
            .spawn(move || {
                info!("reclaimer started, interval {:?}", interval);
                loop {
                    match stop_rx.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => {
                            let freed: usize = reclaim_all(&tables)
                                .iter()
                                .map(|(_, r)| r.freed_arrays)
                                .sum();
                            let pass =
                                thread_passes.fetch_add(1, Ordering::Relaxed);
                            debug!("reclaim pass {} freed {} arrays", pass, freed);
                        }
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                info!("reclaimer stopped");
            })
            .map_err(|e| RibError::ThreadSpawn(e.to_string()))?;

        Ok(Reclaimer {
            stop_tx: Some(stop_tx),
            handle: Some(handle),
            passes,
        })
    }

    /// Start a reclaimer if `config` has a reclaim interval.
    pub fn from_config(
        tables: Arc<RoutingTables>,
        config: &RibConfig,
    ) -> Result<Option<Self>, RibError> {
        match config.reclaim_interval() {
            Some(interval) => Self::spawn(tables, interval).map(Some),
            None => Ok(None),
        }
    }

    /// The number of passes completed so far.
    pub fn passes(&self) -> usize {
        self.passes.load(Ordering::Relaxed)
    }

    /// Stop the thread, and wait for it to finish its current pass.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            // the thread may have exited already
            let _ = stop_tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("reclaimer thread panicked");
            }
        }
    }
}

impl Drop for Reclaimer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for Reclaimer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reclaimer")
            .field("running", &self.handle.is_some())
            .field("passes", &self.passes())
            .finish()
    }
}
