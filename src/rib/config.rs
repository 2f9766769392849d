//! Configuration options for the set of routing tables of a router.
//!
//! A configuration is usually read from JSON, and handed to
//! [RoutingTables::with_config](super::RoutingTables::with_config):
//!
//! ```
//! use dnrd_rib::rib::config::RibConfig;
//! use dnrd_rib::rib::RoutingTables;
//!
//! let config = RibConfig::from_json(
//!     r#"{ "vrfs": ["blue", "red"], "reclaim_interval_ms": 30000 }"#,
//! ).unwrap();
//! let tables = RoutingTables::with_config(&config).unwrap();
//! assert_eq!(tables.vrf_names(), vec!["blue", "red"]);
//! ```

use std::time::Duration;

use serde_derive::{Deserialize, Serialize};

use crate::types::errors::RibError;

/// The interval between reclamation passes if none is configured.
pub const DEFAULT_RECLAIM_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RibConfig {
    /// The names of the VRF tables to create next to the master table.
    pub vrfs: Vec<String>,
    /// The number of milliseconds between two background reclamation
    /// passes. No background reclamation happens if this is not set.
    pub reclaim_interval_ms: Option<u64>,
}

impl RibConfig {
    /// Parse and validate a configuration in JSON.
    pub fn from_json(json: &str) -> Result<Self, RibError> {
        let config: RibConfig = serde_json::from_str(json)
            .map_err(|e| RibError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_vrf(mut self, name: impl Into<String>) -> Self {
        self.vrfs.push(name.into());
        self
    }

    pub fn with_reclaim_interval(mut self, interval: Duration) -> Self {
        self.reclaim_interval_ms =
            Some(u64::try_from(interval.as_millis()).unwrap_or(u64::MAX));
        self
    }

    /// The interval for background reclamation, if it is enabled.
    pub fn reclaim_interval(&self) -> Option<Duration> {
        self.reclaim_interval_ms.map(Duration::from_millis)
    }

    /// Check that the VRF names are unique and not empty, and that the
    /// reclamation interval, if set, is not zero.
    pub fn validate(&self) -> Result<(), RibError> {
        for (i, name) in self.vrfs.iter().enumerate() {
            if name.trim().is_empty() {
                return Err(RibError::Config("empty VRF name".to_string()));
            }
            if self.vrfs.iter().skip(i + 1).any(|other| other == name) {
                return Err(RibError::Config(format!(
                    "duplicate VRF name '{}'",
                    name
                )));
            }
        }
        if self.reclaim_interval_ms == Some(0) {
            return Err(RibError::Config(
                "reclaim_interval_ms cannot be zero".to_string(),
            ));
        }
        Ok(())
    }
}
