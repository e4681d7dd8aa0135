//! `SimulationConfig` — the single validated run configuration.
//!
//! ```json
//! {
//!   "ticks": 100, "seed": 42, "numCustomers": 20, "numServiceAgents": 2,
//!   "hmm": { "states": [...], "observations": [...], "start": [...],
//!            "transition": [[...]], "emission": [[...]] },
//!   "inventory": [ { "sku": "BK-001", "title": "...", "price": 12.5,
//!                    "onHand": 20, "threshold": 5, "restockAmount": 10 } ],
//!   "behavior": { "purchaseProbability": 0.5 },
//!   "restockDelayTicks": 3,
//!   "catalogAgents": false,
//!   "outputIntervalTicks": 1
//! }
//! ```
//!
//! `ticks`, `seed`, `numCustomers`, `numServiceAgents`, `hmm`, and
//! `inventory` are required.  Unknown fields are rejected.

use std::path::Path;

use serde::{Deserialize, Serialize};

use mas_agent::CustomerBehavior;
use mas_hmm::{HmmParams, StateModel};
use mas_ledger::{
    CatalogSource, InventoryLedger, ItemSpec, MAX_RESTOCK_DELAY_TICKS, RESTOCK_DELAY_TICKS,
};

use crate::{SimError, SimResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SimulationConfig {
    /// Number of ticks in a run.
    pub ticks:                 u64,
    pub seed:                  u64,
    pub num_customers:         u32,
    pub num_service_agents:    u32,
    pub hmm:                   HmmParams,
    pub inventory:             Vec<ItemSpec>,
    #[serde(default)]
    pub behavior:              CustomerBehavior,
    #[serde(default = "default_restock_delay")]
    pub restock_delay_ticks:   u64,
    /// Add one passive catalog agent per SKU to the roster.
    #[serde(default)]
    pub catalog_agents:        bool,
    /// Snapshot cadence for output observers.
    #[serde(default = "default_output_interval")]
    pub output_interval_ticks: u64,
}

fn default_restock_delay() -> u64 {
    RESTOCK_DELAY_TICKS
}

fn default_output_interval() -> u64 {
    1
}

impl SimulationConfig {
    /// Parse and validate a JSON configuration.
    pub fn from_json_str(json: &str) -> SimResult<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| SimError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse, and validate a JSON configuration file.
    pub fn from_path(path: impl AsRef<Path>) -> SimResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn to_json_pretty(&self) -> SimResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| SimError::Config(e.to_string()))
    }

    /// Check every field, building the state model and ledger once so that
    /// all validation errors surface here rather than mid-run.
    pub fn validate(&self) -> SimResult<()> {
        if self.ticks == 0 {
            return Err(SimError::Config("ticks must be at least 1".into()));
        }
        if !(1..=MAX_RESTOCK_DELAY_TICKS).contains(&self.restock_delay_ticks) {
            return Err(SimError::Config(format!(
                "restockDelayTicks {} outside 1..={MAX_RESTOCK_DELAY_TICKS}",
                self.restock_delay_ticks
            )));
        }
        if self.output_interval_ticks == 0 {
            return Err(SimError::Config("outputIntervalTicks must be at least 1".into()));
        }
        let roster = u64::from(self.num_customers)
            + u64::from(self.num_service_agents)
            + if self.catalog_agents { self.inventory.len() as u64 } else { 0 };
        if roster >= u64::from(u32::MAX) {
            return Err(SimError::Config(format!("roster of {roster} agents is too large")));
        }

        let model = self.build_model()?;
        self.behavior.validate(&model)?;
        self.build_ledger()?;
        Ok(())
    }

    pub(crate) fn build_model(&self) -> SimResult<StateModel> {
        Ok(self.hmm.build()?)
    }

    pub(crate) fn build_ledger(&self) -> SimResult<InventoryLedger> {
        Ok(InventoryLedger::from_catalog(self)?.with_restock_delay(self.restock_delay_ticks)?)
    }
}

impl CatalogSource for SimulationConfig {
    fn inventory_items(&self) -> Vec<ItemSpec> {
        self.inventory.clone()
    }
}
