//! Fluent builder for constructing a [`Sim`].

use std::sync::Arc;

use tracing::info;

use mas_agent::{Agent, CatalogAgent, CustomerAgent, ServiceAgent};
use mas_bus::Mailbox;
use mas_core::{AgentId, SimClock};

use crate::{
    AuditSink, MetricsCollector, NoopAuditSink, Sim, SimError, SimResult, SimulationConfig,
};

/// Builds an agent for the roster slot it is given.
pub type AgentFactory = Box<dyn FnOnce(AgentId) -> Box<dyn Agent>>;

/// Fluent builder for [`Sim`].
///
/// The roster is laid out in ascending id order:
///
/// | Ids                                   | Agents                                   |
/// |---------------------------------------|------------------------------------------|
/// | `0 .. numCustomers`                   | `CustomerAgent`                          |
/// | next `numServiceAgents`               | `ServiceAgent`                           |
/// | next `inventory.len()`                | `CatalogAgent` (only if `catalogAgents`) |
/// | remaining                             | agents added with [`agent`](Self::agent) |
///
/// # Example
///
/// ```rust,ignore
/// let config = SimulationConfig::from_path("bookstore.json")?;
/// let mut sim = SimBuilder::new(config)
///     .audit_sink(Box::new(MemoryAuditSink::new()))
///     .build()?;
/// let metrics = sim.run(&mut NoopObserver)?;
/// ```
pub struct SimBuilder {
    config:    SimulationConfig,
    factories: Vec<AgentFactory>,
    audit:     Option<Box<dyn AuditSink>>,
}

impl SimBuilder {
    pub fn new(config: SimulationConfig) -> Self {
        Self { config, factories: Vec::new(), audit: None }
    }

    /// Append an externally defined agent after the built-in roster.
    ///
    /// The factory receives the id the agent must report from
    /// [`Agent::id`]; `build` rejects agents that report another id.
    pub fn agent<F>(mut self, factory: F) -> Self
    where
        F: FnOnce(AgentId) -> Box<dyn Agent> + 'static,
    {
        self.factories.push(Box::new(factory));
        self
    }

    /// Send per-tick facts to `sink`.  Default: [`NoopAuditSink`].
    pub fn audit_sink(mut self, sink: Box<dyn AuditSink>) -> Self {
        self.audit = Some(sink);
        self
    }

    /// Validate the configuration, build the model, the ledger, and the
    /// roster, and return a [`Sim`] positioned before tick 1.
    pub fn build(self) -> SimResult<Sim> {
        let config = self.config;
        config.validate()?;

        let model = config.build_model()?;
        let ledger = config.build_ledger()?;
        let behavior = Arc::new(config.behavior.clone());

        let mut agents: Vec<Box<dyn Agent>> = Vec::new();
        let mut next = 0u32;
        let mut slot = || {
            let id = AgentId(next);
            next += 1;
            id
        };

        for _ in 0..config.num_customers {
            let customer =
                CustomerAgent::new(slot(), config.seed, &model, Arc::clone(&behavior))?;
            agents.push(Box::new(customer));
        }
        for _ in 0..config.num_service_agents {
            agents.push(Box::new(ServiceAgent::new(slot())));
        }
        if config.catalog_agents {
            for item in ledger.items() {
                agents.push(Box::new(CatalogAgent::new(slot(), item.sku.clone())));
            }
        }
        for factory in self.factories {
            let id = slot();
            let agent = factory(id);
            if agent.id() != id {
                return Err(SimError::Config(format!(
                    "agent built for slot {id} reports {}",
                    agent.id()
                )));
            }
            agents.push(agent);
        }

        info!(
            agents    = agents.len(),
            customers = config.num_customers,
            service   = config.num_service_agents,
            items     = ledger.items().len(),
            ticks     = config.ticks,
            seed      = config.seed,
            "simulation built"
        );

        Ok(Sim {
            clock:      SimClock::new(config.ticks),
            metrics:    MetricsCollector::from_behavior(&config.behavior),
            mailbox:    Mailbox::new(),
            events:     Default::default(),
            audit:      self.audit.unwrap_or_else(|| Box::new(NoopAuditSink)),
            terminated: false,
            config,
            model,
            ledger,
            agents,
        })
    }
}
