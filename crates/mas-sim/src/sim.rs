//! The `Sim` struct and its tick loop.

use tracing::{debug, error, info};

use mas_agent::{Agent, AgentContext, AgentError, EventLog, EventPayload, InventoryEvent};
use mas_bus::{Mailbox, MessagePayload, Sender, Topic};
use mas_core::{SimClock, SimRng, Tick};
use mas_hmm::StateModel;
use mas_ledger::InventoryLedger;

use crate::{
    audit, AuditSink, Metrics, MetricsCollector, SimError, SimObserver, SimResult,
    SimulationConfig, TickReport,
};

/// The simulation context: every piece of run state, owned in one place.
///
/// `advance` drives one tick through five phases:
///
/// 1. **Deliveries**: the supplier acknowledges `restock_request` messages,
///    then every pending restock due at or before this tick is applied and
///    announced on `restock_done`, before any agent acts.
/// 2. **Order**: a permutation of the roster seeded from `(seed, tick)`.
/// 3. **Step**: each agent acts once, in permutation order, through its own
///    [`AgentContext`].
/// 4. **Inference**: each agent's `on_tick_end`, in ascending id order.
/// 5. **Aggregate**: the tick's event log is taken, folded into the metrics,
///    exported as audit facts, and returned inside a [`TickReport`].
///
/// Any error inside a tick terminates the run; later calls fail with
/// [`SimError::InvalidState`].
///
/// Create via [`SimBuilder`][crate::SimBuilder].
pub struct Sim {
    pub(crate) config:     SimulationConfig,
    pub(crate) clock:      SimClock,
    pub(crate) model:      StateModel,
    pub(crate) ledger:     InventoryLedger,
    pub(crate) mailbox:    Mailbox,
    /// Indexed by `AgentId`.
    pub(crate) agents:     Vec<Box<dyn Agent>>,
    pub(crate) events:     EventLog,
    pub(crate) metrics:    MetricsCollector,
    pub(crate) audit:      Box<dyn AuditSink>,
    pub(crate) terminated: bool,
}

impl Sim {
    // ── Public API ────────────────────────────────────────────────────────

    /// Process the next tick.
    pub fn advance(&mut self) -> SimResult<TickReport> {
        if self.terminated {
            return Err(SimError::InvalidState("run has terminated".into()));
        }
        if self.clock.is_finished() {
            return Err(SimError::InvalidState(format!(
                "all {} ticks have been processed",
                self.clock.total_ticks
            )));
        }

        let now = self.clock.advance();
        match self.process_tick(now) {
            Ok(report) => {
                if self.clock.is_finished() {
                    info!(tick = %now, "final tick processed");
                }
                Ok(report)
            }
            Err(e) => {
                error!(tick = %now, error = %e, "tick failed; run terminated");
                self.terminated = true;
                Err(e)
            }
        }
    }

    /// Run every remaining tick, calling observer hooks at tick boundaries.
    pub fn run<O: SimObserver>(&mut self, observer: &mut O) -> SimResult<Metrics> {
        while !self.clock.is_finished() {
            self.step_observed(observer)?;
        }
        let metrics = self.metrics.metrics();
        observer.on_sim_end(self.clock.current_tick, &metrics);
        Ok(metrics)
    }

    /// Run exactly `n` more ticks.
    ///
    /// Fails with `InvalidState`, without processing any tick, if the run
    /// has terminated or fewer than `n` ticks remain.
    pub fn run_ticks<O: SimObserver>(&mut self, n: u64, observer: &mut O) -> SimResult<()> {
        if self.terminated {
            return Err(SimError::InvalidState("run has terminated".into()));
        }
        let remaining = self.clock.remaining();
        if remaining < n {
            return Err(SimError::InvalidState(format!(
                "{n} ticks requested but only {remaining} remain"
            )));
        }
        for _ in 0..n {
            self.step_observed(observer)?;
        }
        Ok(())
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn clock(&self) -> &SimClock {
        &self.clock
    }

    /// The last tick processed (`Tick::ZERO` before the first advance).
    pub fn current_tick(&self) -> Tick {
        self.clock.current_tick
    }

    pub fn is_finished(&self) -> bool {
        self.clock.is_finished()
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    pub fn metrics(&self) -> Metrics {
        self.metrics.metrics()
    }

    pub fn model(&self) -> &StateModel {
        &self.model
    }

    pub fn ledger(&self) -> &InventoryLedger {
        &self.ledger
    }

    pub fn mailbox(&self) -> &Mailbox {
        &self.mailbox
    }

    pub fn agents(&self) -> &[Box<dyn Agent>] {
        &self.agents
    }

    // ── Core tick processing ──────────────────────────────────────────────

    /// Only called while ticks remain, so the next tick is in range.
    fn step_observed<O: SimObserver>(&mut self, observer: &mut O) -> SimResult<()> {
        observer.on_tick_start(Tick(self.clock.current_tick.0 + 1));
        let report = self.advance()?;
        observer.on_tick_end(&report);
        Ok(())
    }

    fn process_tick(&mut self, now: Tick) -> SimResult<TickReport> {
        // ── Phase 1: deliveries ───────────────────────────────────────────
        self.run_supplier(now)?;

        // ── Phase 2: activation order ─────────────────────────────────────
        let order = SimRng::for_tick(self.config.seed, now).permutation(self.agents.len());

        // ── Phase 3: step ─────────────────────────────────────────────────
        //
        // Messages published by an agent are visible to every agent that
        // acts after it in `order`, and to everyone else next tick.
        for idx in order {
            let agent = &mut self.agents[idx];
            let mut ctx = AgentContext::new(
                now,
                agent.id(),
                &mut self.mailbox,
                &mut self.ledger,
                &self.model,
                &mut self.events,
            );
            agent.step(&mut ctx)?;
        }

        // ── Phase 4: inference ────────────────────────────────────────────
        for agent in &mut self.agents {
            let mut ctx = AgentContext::new(
                now,
                agent.id(),
                &mut self.mailbox,
                &mut self.ledger,
                &self.model,
                &mut self.events,
            );
            agent.on_tick_end(&mut ctx)?;
        }

        // ── Phase 5: aggregate ────────────────────────────────────────────
        let events = self.events.take();
        self.metrics.fold(&events)?;
        for fact in audit::facts_for(&events) {
            self.audit.record(fact);
        }
        debug!(tick = %now, events = events.len(), queued = self.mailbox.len(), "tick complete");

        Ok(TickReport {
            tick:             now,
            metrics:          self.metrics.metrics(),
            customer_states:  self
                .agents
                .iter()
                .filter_map(|a| a.customer_snapshot(&self.model))
                .collect(),
            inventory:        self.ledger.inventory_snapshot(),
            pending_restocks: self.ledger.pending_snapshot(now),
            events,
        })
    }

    /// The supplier side of the restock loop.
    fn run_supplier(&mut self, now: Tick) -> SimResult<()> {
        for message in self.mailbox.drain(Topic::RestockRequest) {
            match message.payload {
                MessagePayload::RestockRequest { sku, amount, delivery_tick } => {
                    debug!(tick = %now, %sku, amount, due = %delivery_tick, "restock order received");
                }
                other => {
                    return Err(AgentError::Protocol {
                        topic:  Topic::RestockRequest,
                        detail: format!("{other:?}"),
                    }
                    .into());
                }
            }
        }

        for delivery in self.ledger.deliver_due(now)? {
            self.events.emit(
                now,
                EventPayload::Inventory(InventoryEvent::RestockDelivered {
                    sku:          delivery.sku.clone(),
                    title:        delivery.title,
                    amount:       delivery.amount,
                    on_hand:      delivery.on_hand,
                    ordered_tick: delivery.ordered_tick,
                }),
            );
            let message = self.mailbox.send(
                Topic::RestockDone,
                Sender::Supplier,
                MessagePayload::RestockDone {
                    sku:     delivery.sku,
                    amount:  delivery.amount,
                    on_hand: delivery.on_hand,
                },
            );
            self.events.emit(now, EventPayload::Message(message));
        }
        Ok(())
    }
}

impl std::fmt::Debug for Sim {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sim")
            .field("clock", &self.clock)
            .field("agents", &self.agents.len())
            .field("mailbox", &self.mailbox)
            .field("metrics", &self.metrics.metrics())
            .field("terminated", &self.terminated)
            .finish()
    }
}
