//! Unit and integration tests for mas-sim.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use proptest::prelude::*;

use mas_agent::{
    Agent, AgentContext, AgentError, AgentKind, AgentResult, Event, EventPayload,
    InventoryEvent, ObservationEvent,
};
use mas_bus::{MessagePayload, Topic};
use mas_core::{AgentId, ConversationId, Sku, Tick};
use mas_ledger::MAX_RESTOCK_DELAY_TICKS;

use crate::{
    CollectingObserver, MemoryAuditSink, MetricsCollector, NoopObserver, RunPhase, Sim,
    SimBuilder, SimController, SimError, SimulationConfig, TickReport,
};

// ── Helpers ───────────────────────────────────────────────────────────────────

const HMM: &str = r#"{
    "states":       ["Happy", "Neutral", "Angry"],
    "observations": ["Purchase", "Complaint", "Silence"],
    "start":        [0.5, 0.3, 0.2],
    "transition":   [[0.7, 0.2, 0.1], [0.3, 0.4, 0.3], [0.2, 0.3, 0.5]],
    "emission":     [[0.6, 0.1, 0.3], [0.3, 0.2, 0.5], [0.1, 0.6, 0.3]]
}"#;

const BOOKS: &str = r#"[
    { "sku": "BK-001", "title": "Rust in Action", "price": 12.5,
      "onHand": 20, "threshold": 5, "restockAmount": 10 },
    { "sku": "BK-002", "title": "Hidden Markov Models", "price": 8.99,
      "onHand": 3, "threshold": 2, "restockAmount": 5 }
]"#;

fn config_json(ticks: u64, seed: u64, customers: u32, services: u32) -> String {
    format!(
        r#"{{ "ticks": {ticks}, "seed": {seed}, "numCustomers": {customers},
             "numServiceAgents": {services}, "hmm": {HMM}, "inventory": {BOOKS} }}"#
    )
}

fn config(ticks: u64, seed: u64, customers: u32, services: u32) -> SimulationConfig {
    SimulationConfig::from_json_str(&config_json(ticks, seed, customers, services)).unwrap()
}

/// No built-in agents; one item with onHand 5, threshold 5, restockAmount 10.
fn single_item_config(ticks: u64) -> SimulationConfig {
    let json = format!(
        r#"{{ "ticks": {ticks}, "seed": 7, "numCustomers": 0, "numServiceAgents": 0,
             "hmm": {HMM},
             "inventory": [ {{ "sku": "BK-9", "title": "Ledger Basics", "price": 10.0,
                              "onHand": 5, "threshold": 5, "restockAmount": 10 }} ] }}"#
    );
    SimulationConfig::from_json_str(&json).unwrap()
}

fn run_reports(config: SimulationConfig) -> Vec<TickReport> {
    let mut sim = SimBuilder::new(config).build().unwrap();
    let mut observer = CollectingObserver::default();
    sim.run(&mut observer).unwrap();
    observer.reports
}

fn all_events(reports: &[TickReport]) -> impl Iterator<Item = &Event> {
    reports.iter().flat_map(|r| r.events.iter())
}

/// Logs `(tick, id)` for every activation.
struct Recorder {
    id:  AgentId,
    log: Arc<Mutex<Vec<(Tick, AgentId)>>>,
}

impl Agent for Recorder {
    fn id(&self) -> AgentId {
        self.id
    }

    fn kind(&self) -> AgentKind {
        AgentKind::Other
    }

    fn step(&mut self, ctx: &mut AgentContext<'_>) -> AgentResult<()> {
        self.log.lock().push((ctx.tick(), self.id));
        Ok(())
    }
}

/// Buys one unit of `sku` straight from the ledger on tick `at`.
struct Buyer {
    id:  AgentId,
    sku: Sku,
    at:  Tick,
}

impl Agent for Buyer {
    fn id(&self) -> AgentId {
        self.id
    }

    fn kind(&self) -> AgentKind {
        AgentKind::Other
    }

    fn step(&mut self, ctx: &mut AgentContext<'_>) -> AgentResult<()> {
        if ctx.tick() == self.at {
            let now = ctx.tick();
            ctx.ledger_mut().purchase(&self.sku, 1, now)?;
        }
        Ok(())
    }
}

/// Fails on tick `at`, by panicking or by returning an error.
struct Faulty {
    id:    AgentId,
    at:    Tick,
    panic: bool,
}

impl Agent for Faulty {
    fn id(&self) -> AgentId {
        self.id
    }

    fn kind(&self) -> AgentKind {
        AgentKind::Other
    }

    fn step(&mut self, ctx: &mut AgentContext<'_>) -> AgentResult<()> {
        if ctx.tick() == self.at {
            if self.panic {
                panic!("boom at {}", self.at);
            }
            return Err(AgentError::Config("faulty agent".into()));
        }
        Ok(())
    }
}

fn faulty_sim(at: u64, panic: bool) -> Sim {
    SimBuilder::new(config(10, 1, 2, 1))
        .agent(move |id| Box::new(Faulty { id, at: Tick(at), panic }) as Box<dyn Agent>)
        .build()
        .unwrap()
}

// ── Configuration ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod config_tests {
    use super::*;

    #[test]
    fn defaults_fill_optional_fields() {
        let c = config(10, 42, 3, 1);
        assert_eq!(c.ticks, 10);
        assert_eq!(c.restock_delay_ticks, 3);
        assert_eq!(c.output_interval_ticks, 1);
        assert!(!c.catalog_agents);
        assert_eq!(c.behavior.purchase_symbol, "Purchase");
        assert_eq!(c.behavior.purchase_probability, 0.5);
        assert_eq!(c.inventory.len(), 2);
    }

    #[test]
    fn missing_inventory_is_a_config_error() {
        let json = format!(
            r#"{{ "ticks": 5, "seed": 1, "numCustomers": 1, "numServiceAgents": 1, "hmm": {HMM} }}"#
        );
        let err = SimulationConfig::from_json_str(&json).unwrap_err();
        assert!(matches!(err, SimError::Config(_)), "{err}");
        assert!(err.is_validation());
    }

    #[test]
    fn empty_inventory_is_rejected() {
        let json = format!(
            r#"{{ "ticks": 5, "seed": 1, "numCustomers": 1, "numServiceAgents": 1,
                 "hmm": {HMM}, "inventory": [] }}"#
        );
        let err = SimulationConfig::from_json_str(&json).unwrap_err();
        assert!(err.is_validation(), "{err}");
    }

    #[test]
    fn unknown_field_is_rejected() {
        let json = config_json(5, 1, 1, 1).replacen('{', r#"{ "tempo": 3,"#, 1);
        assert!(matches!(
            SimulationConfig::from_json_str(&json),
            Err(SimError::Config(_))
        ));
    }

    #[test]
    fn malformed_matrix_is_a_validation_error() {
        let json = config_json(5, 1, 1, 1).replace("[0.7, 0.2, 0.1]", "[0.7, 0.2, 0.2]");
        let err = SimulationConfig::from_json_str(&json).unwrap_err();
        assert!(matches!(err, SimError::Hmm(_)), "{err}");
        assert!(err.is_validation());
    }

    #[test]
    fn zero_ticks_rejected() {
        assert!(SimulationConfig::from_json_str(&config_json(0, 1, 1, 1)).is_err());
    }

    #[test]
    fn restock_delay_is_bounded() {
        let json = config_json(5, 1, 1, 1)
            .replacen('{', r#"{ "restockDelayTicks": 18446744073709551615,"#, 1);
        let err = SimulationConfig::from_json_str(&json).unwrap_err();
        assert!(matches!(err, SimError::Config(_)), "{err}");
        assert!(err.is_validation());

        let json = config_json(5, 1, 1, 1)
            .replacen('{', &format!(r#"{{ "restockDelayTicks": {MAX_RESTOCK_DELAY_TICKS},"#), 1);
        let c = SimulationConfig::from_json_str(&json).unwrap();
        assert_eq!(c.restock_delay_ticks, MAX_RESTOCK_DELAY_TICKS);
    }

    #[test]
    fn oversized_price_is_a_validation_error() {
        let json = config_json(5, 1, 1, 1).replace(r#""price": 12.5"#, r#""price": 1e30"#);
        let err = SimulationConfig::from_json_str(&json).unwrap_err();
        assert!(matches!(err, SimError::Ledger(_)), "{err}");
        assert!(err.is_validation());
    }

    #[test]
    fn sub_cent_price_is_accepted() {
        let json = config_json(5, 1, 1, 1).replace(r#""price": 12.5"#, r#""price": 12.345"#);
        let c = SimulationConfig::from_json_str(&json).unwrap();
        assert_eq!(c.inventory[0].price, 12.345);
    }

    #[test]
    fn purchase_symbol_must_be_in_alphabet() {
        let json = config_json(5, 1, 1, 1)
            .replacen('{', r#"{ "behavior": { "purchaseSymbol": "Browse" },"#, 1);
        assert!(SimulationConfig::from_json_str(&json).is_err());
    }

    #[test]
    fn behavior_probability_out_of_range() {
        let json = config_json(5, 1, 1, 1)
            .replacen('{', r#"{ "behavior": { "transitionProbability": 1.5 },"#, 1);
        let err = SimulationConfig::from_json_str(&json).unwrap_err();
        assert!(err.is_validation(), "{err}");
    }

    #[test]
    fn json_round_trip_preserves_config() {
        let c = config(10, 42, 3, 1);
        let again = SimulationConfig::from_json_str(&c.to_json_pretty().unwrap()).unwrap();
        assert_eq!(c, again);
    }

    #[test]
    fn from_path_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sim.json");
        std::fs::write(&path, config_json(4, 9, 2, 1)).unwrap();
        let c = SimulationConfig::from_path(&path).unwrap();
        assert_eq!(c.seed, 9);
        assert!(matches!(
            SimulationConfig::from_path(dir.path().join("absent.json")),
            Err(SimError::Io(_))
        ));
    }
}

// ── SimBuilder ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod builder_tests {
    use super::*;

    #[test]
    fn roster_is_customers_then_service() {
        let sim = SimBuilder::new(config(5, 1, 3, 2)).build().unwrap();
        let kinds: Vec<AgentKind> = sim.agents().iter().map(|a| a.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                AgentKind::Customer,
                AgentKind::Customer,
                AgentKind::Customer,
                AgentKind::Service,
                AgentKind::Service,
            ]
        );
        for (i, agent) in sim.agents().iter().enumerate() {
            assert_eq!(agent.id(), AgentId(i as u32));
        }
    }

    #[test]
    fn catalog_agents_follow_service() {
        let mut c = config(5, 1, 1, 1);
        c.catalog_agents = true;
        let sim = SimBuilder::new(c).build().unwrap();
        assert_eq!(sim.agents().len(), 4);
        assert_eq!(sim.agents()[2].kind(), AgentKind::Catalog);
        assert_eq!(sim.agents()[3].kind(), AgentKind::Catalog);
    }

    #[test]
    fn custom_agents_come_last() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sim = SimBuilder::new(config(5, 1, 2, 1))
            .agent({
                let log = Arc::clone(&log);
                move |id| Box::new(Recorder { id, log }) as Box<dyn Agent>
            })
            .build()
            .unwrap();
        assert_eq!(sim.agents()[3].id(), AgentId(3));
        assert_eq!(sim.agents()[3].kind(), AgentKind::Other);
    }

    #[test]
    fn mismatched_agent_id_rejected() {
        let result = SimBuilder::new(config(5, 1, 1, 1))
            .agent(|_| {
                Box::new(Buyer { id: AgentId(99), sku: Sku::from("BK-001"), at: Tick(1) }) as Box<dyn Agent>
            })
            .build();
        assert!(matches!(result, Err(SimError::Config(_))));
    }

    #[test]
    fn invalid_config_rejected_at_build() {
        let mut c = config(5, 1, 1, 1);
        c.inventory.clear();
        assert!(SimBuilder::new(c).build().is_err());
    }
}

// ── Tick loop ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod sim_tests {
    use super::*;

    #[test]
    fn ticks_are_one_based_and_bounded() {
        let mut sim = SimBuilder::new(config(3, 1, 2, 1)).build().unwrap();
        assert_eq!(sim.current_tick(), Tick::ZERO);
        for expected in 1..=3 {
            let report = sim.advance().unwrap();
            assert_eq!(report.tick, Tick(expected));
        }
        assert!(sim.is_finished());
        assert!(matches!(sim.advance(), Err(SimError::InvalidState(_))));
        assert!(!sim.is_terminated());
    }

    #[test]
    fn every_agent_acts_once_per_tick() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut builder = SimBuilder::new(config(20, 3, 0, 0));
        for _ in 0..6 {
            let log = Arc::clone(&log);
            builder = builder.agent(move |id| Box::new(Recorder { id, log }) as Box<dyn Agent>);
        }
        let mut sim = builder.build().unwrap();
        sim.run(&mut NoopObserver).unwrap();

        let log = log.lock();
        assert_eq!(log.len(), 20 * 6);
        let mut per_tick: BTreeMap<Tick, Vec<AgentId>> = BTreeMap::new();
        for &(tick, id) in log.iter() {
            per_tick.entry(tick).or_default().push(id);
        }
        let orders: Vec<Vec<AgentId>> = per_tick.into_values().collect();
        for order in &orders {
            let mut sorted = order.clone();
            sorted.sort();
            assert_eq!(sorted, (0..6).map(AgentId).collect::<Vec<_>>());
        }
        // 20 independent shuffles of 6 agents are not all identical.
        assert!(orders.iter().any(|o| o != &orders[0]));
    }

    #[test]
    fn activation_order_reproducible() {
        let orders = |seed| {
            let log = Arc::new(Mutex::new(Vec::new()));
            let mut builder = SimBuilder::new(config(10, seed, 0, 0));
            for _ in 0..5 {
                let log = Arc::clone(&log);
                builder = builder.agent(move |id| Box::new(Recorder { id, log }) as Box<dyn Agent>);
            }
            builder.build().unwrap().run(&mut NoopObserver).unwrap();
            let v = log.lock().clone();
            v
        };
        assert_eq!(orders(11), orders(11));
        assert_ne!(orders(11), orders(12));
    }

    #[test]
    fn restock_arrives_three_ticks_after_order() {
        let mut sim = SimBuilder::new(single_item_config(6))
            .agent(|id| {
                Box::new(Buyer { id, sku: Sku::from("BK-9"), at: Tick(1) }) as Box<dyn Agent>
            })
            .build()
            .unwrap();

        let t1 = sim.advance().unwrap();
        assert_eq!(t1.inventory[0].on_hand, 4);
        assert_eq!(t1.pending_restocks.len(), 1);
        assert_eq!(t1.pending_restocks[0].delivery_tick, Tick(4));
        assert_eq!(t1.pending_restocks[0].ticks_remaining, 3);

        for tick in 2..=3 {
            let report = sim.advance().unwrap();
            assert_eq!(report.tick, Tick(tick));
            assert_eq!(report.inventory[0].on_hand, 4);
            assert_eq!(report.pending_restocks.len(), 1);
        }

        let t4 = sim.advance().unwrap();
        assert_eq!(t4.inventory[0].on_hand, 14);
        assert!(t4.pending_restocks.is_empty());
        assert_eq!(t4.metrics.restocks, 1);
        assert!(t4.events.iter().any(|e| matches!(
            &e.payload,
            EventPayload::Inventory(InventoryEvent::RestockDelivered { amount: 10, on_hand: 14, .. })
        )));
        // No service agent drains the supplier's acknowledgement.
        assert_eq!(sim.mailbox().queued(Topic::RestockDone), 1);

        let t5 = sim.advance().unwrap();
        assert_eq!(t5.inventory[0].on_hand, 14);
    }

    #[test]
    fn request_response_latency_is_zero_or_one_tick() {
        let reports = run_reports(config(40, 5, 15, 1));

        let mut requested: HashMap<ConversationId, Tick> = HashMap::new();
        let mut answered: Vec<(ConversationId, Tick)> = Vec::new();
        for event in all_events(&reports) {
            if let EventPayload::Message(m) = &event.payload {
                match &m.payload {
                    MessagePayload::PurchaseRequest { .. } => {
                        requested.insert(m.conversation_id, event.tick);
                    }
                    MessagePayload::PurchaseResult { reply_to, .. } => {
                        answered.push((*reply_to, event.tick));
                    }
                    _ => {}
                }
            }
        }

        assert!(answered.len() > 20, "only {} results", answered.len());
        let mut latencies = Vec::new();
        for (reply_to, tick) in answered {
            let asked = requested[&reply_to];
            latencies.push(asked.until(tick));
        }
        assert!(latencies.iter().all(|&l| l <= 1), "{latencies:?}");
        assert!(latencies.contains(&0));
        assert!(latencies.contains(&1));
    }

    #[test]
    fn revenue_matches_purchases() {
        let reports = run_reports(config(60, 21, 20, 2));
        let metrics = reports.last().unwrap().metrics;

        let mut sold: BTreeMap<String, u64> = BTreeMap::new();
        for event in all_events(&reports) {
            if let EventPayload::Inventory(InventoryEvent::Purchase { sku, qty, .. }) = &event.payload {
                *sold.entry(sku.to_string()).or_default() += u64::from(*qty);
            }
        }
        let n1 = sold.get("BK-001").copied().unwrap_or(0);
        let n2 = sold.get("BK-002").copied().unwrap_or(0);
        assert!(n1 + n2 > 0);
        assert_eq!(metrics.purchases, n1 + n2);
        assert_eq!(metrics.revenue_cents(), n1 * 1250 + n2 * 899);
        let expected = ((n1 as f64 * 12.5 + n2 as f64 * 8.99) * 100.0).round() / 100.0;
        assert!((metrics.revenue() - expected).abs() < 1e-9);
    }

    #[test]
    fn sub_cent_revenue_is_rounded_total() {
        let json = config_json(60, 21, 20, 2)
            .replace(r#""price": 12.5"#, r#""price": 12.345"#)
            .replace(r#""price": 8.99"#, r#""price": 12.345"#);
        let reports = run_reports(SimulationConfig::from_json_str(&json).unwrap());
        let metrics = reports.last().unwrap().metrics;

        let n: u64 = all_events(&reports)
            .filter_map(|e| match &e.payload {
                EventPayload::Inventory(InventoryEvent::Purchase { qty, .. }) => Some(u64::from(*qty)),
                _ => None,
            })
            .sum();
        assert!(n > 0);
        assert_eq!(metrics.revenue_micros, n * 12_345_000);
        assert_eq!(metrics.revenue_cents(), (n * 12_345 + 5) / 10);
    }

    #[test]
    fn longest_restock_delay_orders_without_overflow() {
        let mut c = single_item_config(2);
        c.restock_delay_ticks = MAX_RESTOCK_DELAY_TICKS;
        let mut sim = SimBuilder::new(c)
            .agent(|id| Box::new(Buyer { id, sku: Sku::from("BK-9"), at: Tick(1) }) as Box<dyn Agent>)
            .build()
            .unwrap();
        sim.advance().unwrap();
        let order = sim.ledger().pending(&Sku::from("BK-9")).unwrap();
        assert_eq!(order.delivery_tick, Tick(1 + MAX_RESTOCK_DELAY_TICKS));
        assert!(order.delivery_tick > order.ordered_tick);
        sim.advance().unwrap();
    }

    #[test]
    fn unbounded_restock_delay_fails_at_build() {
        let mut c = single_item_config(2);
        c.restock_delay_ticks = u64::MAX;
        assert!(matches!(SimBuilder::new(c).build(), Err(SimError::Config(_))));
    }

    #[test]
    fn stockouts_happen_with_scarce_stock() {
        let reports = run_reports(config(60, 21, 20, 2));
        let metrics = reports.last().unwrap().metrics;
        assert!(metrics.stockouts > 0 || metrics.restock_orders > 0);
        assert!(metrics.restock_orders >= metrics.restocks);
    }

    #[test]
    fn customer_snapshots_track_observations() {
        let reports = run_reports(config(8, 2, 4, 1));
        let last = reports.last().unwrap();
        assert_eq!(last.customer_states.len(), 4);
        for (i, snap) in last.customer_states.iter().enumerate() {
            assert_eq!(snap.cust_id, AgentId(i as u32));
            assert_eq!(snap.observation_count, 8);
            assert_ne!(snap.inferred_state, "Unknown");
            assert!(snap.log_prob < 0.0);
        }
        assert_eq!(last.metrics.inferences, 8 * 4);
    }

    #[test]
    fn metrics_are_monotone() {
        let reports = run_reports(config(30, 8, 10, 1));
        for pair in reports.windows(2) {
            let (a, b) = (pair[0].metrics, pair[1].metrics);
            assert!(b.purchases >= a.purchases);
            assert!(b.stockouts >= a.stockouts);
            assert!(b.restocks >= a.restocks);
            assert!(b.revenue_micros >= a.revenue_micros);
            assert!(b.complaints + b.silence >= a.complaints + a.silence);
        }
    }

    #[test]
    fn identical_runs_are_byte_identical() {
        let a = serde_json::to_string(&run_reports(config(25, 99, 12, 2))).unwrap();
        let b = serde_json::to_string(&run_reports(config(25, 99, 12, 2))).unwrap();
        assert_eq!(a, b);
        let c = serde_json::to_string(&run_reports(config(25, 100, 12, 2))).unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn agent_error_terminates_run() {
        let mut sim = faulty_sim(2, false);
        sim.advance().unwrap();
        assert!(matches!(sim.advance(), Err(SimError::Agent(AgentError::Config(_)))));
        assert!(sim.is_terminated());
        assert!(matches!(sim.advance(), Err(SimError::InvalidState(_))));
    }

    #[test]
    fn observer_sees_every_tick() {
        let mut sim = SimBuilder::new(config(5, 1, 2, 1)).build().unwrap();
        let mut observer = CollectingObserver::default();
        let metrics = sim.run(&mut observer).unwrap();
        let ticks: Vec<Tick> = observer.reports.iter().map(|r| r.tick).collect();
        assert_eq!(ticks, (1..=5).map(Tick).collect::<Vec<_>>());
        assert_eq!(observer.finished, Some((Tick(5), metrics)));
    }

    #[test]
    fn run_ticks_past_end_fails() {
        let mut sim = SimBuilder::new(config(3, 1, 1, 1)).build().unwrap();
        sim.run_ticks(2, &mut NoopObserver).unwrap();
        let err = sim.run_ticks(2, &mut NoopObserver).unwrap_err();
        assert!(matches!(err, SimError::InvalidState(_)), "{err}");
        assert_eq!(sim.current_tick(), Tick(2));
        assert!(!sim.is_terminated());
        sim.run_ticks(1, &mut NoopObserver).unwrap();
        assert!(sim.is_finished());
    }

    #[test]
    fn run_ticks_rejects_overlong_request_before_observing() {
        let mut sim = SimBuilder::new(config(3, 1, 1, 1)).build().unwrap();
        let mut observer = CollectingObserver::default();
        assert!(sim.run_ticks(4, &mut observer).is_err());
        assert!(observer.reports.is_empty());
        assert_eq!(sim.current_tick(), Tick::ZERO);
    }

    #[test]
    fn report_serializes_camel_case() {
        let mut sim = SimBuilder::new(config(2, 1, 2, 1)).build().unwrap();
        let json = serde_json::to_value(sim.advance().unwrap()).unwrap();
        assert_eq!(json["tick"], 1);
        assert!(json["customerStates"][0].get("custId").is_some());
        assert!(json["customerStates"][0].get("logprob").is_some());
        assert!(json["inventory"][0].get("restockAmount").is_some());
        assert!(json["pendingRestocks"].is_array());
        assert!(json["metrics"].get("revenue").is_some());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(12))]

        #[test]
        fn same_seed_same_run(seed in any::<u64>()) {
            let a = serde_json::to_string(&run_reports(config(12, seed, 6, 1))).unwrap();
            let b = serde_json::to_string(&run_reports(config(12, seed, 6, 1))).unwrap();
            prop_assert_eq!(a, b);
        }

        #[test]
        fn stock_is_conserved_and_pending_unique(seed in any::<u64>(), services in 1u32..3) {
            let cfg = config(30, seed, 12, services);
            let initial: HashMap<String, i64> = cfg
                .inventory
                .iter()
                .map(|i| (i.sku.to_string(), i64::from(i.on_hand)))
                .collect();
            let reports = run_reports(cfg);

            let mut delta: HashMap<String, i64> = HashMap::new();
            for report in &reports {
                let mut skus: Vec<&Sku> = report.pending_restocks.iter().map(|p| &p.sku).collect();
                let before = skus.len();
                skus.dedup();
                prop_assert_eq!(skus.len(), before);

                for event in &report.events {
                    match &event.payload {
                        EventPayload::Inventory(InventoryEvent::Purchase { sku, qty, .. }) => {
                            *delta.entry(sku.to_string()).or_default() -= i64::from(*qty);
                        }
                        EventPayload::Inventory(InventoryEvent::RestockDelivered { sku, amount, .. }) => {
                            *delta.entry(sku.to_string()).or_default() += i64::from(*amount);
                        }
                        _ => {}
                    }
                }
            }
            for item in &reports.last().unwrap().inventory {
                let sku = item.sku.to_string();
                let expected = initial[&sku] + delta.get(&sku).copied().unwrap_or(0);
                prop_assert_eq!(i64::from(item.on_hand), expected);
            }
        }
    }
}

// ── Metrics ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod metrics_tests {
    use super::*;

    fn purchase(price_micros: u64) -> Event {
        Event {
            tick:    Tick(1),
            payload: EventPayload::Inventory(InventoryEvent::Purchase {
                customer:         AgentId(0),
                sku:              Sku::from("BK-002"),
                title:            "Hidden Markov Models".into(),
                qty:              1,
                unit_price_micros: price_micros,
                remaining:        1,
            }),
        }
    }

    fn observation(symbol: &str) -> Event {
        Event {
            tick:    Tick(1),
            payload: EventPayload::Observation(ObservationEvent {
                agent:        AgentId(0),
                symbol:       symbol.into(),
                hidden_state: "Angry".into(),
            }),
        }
    }

    #[test]
    fn revenue_is_exact_for_repeated_purchases() {
        let mut collector = MetricsCollector::new("Complaint", "Silence");
        let events: Vec<Event> = (0..7).map(|_| purchase(8_990_000)).collect();
        collector.fold(&events).unwrap();
        let m = collector.metrics();
        assert_eq!(m.purchases, 7);
        assert_eq!(m.revenue_cents(), 6293);
        assert_eq!(m.revenue(), 62.93);
    }

    #[test]
    fn revenue_rounds_the_total_for_sub_cent_prices() {
        let mut collector = MetricsCollector::new("Complaint", "Silence");
        for n in 1..=40u64 {
            collector.fold(&[purchase(12_345_000)]).unwrap();
            let m = collector.metrics();
            assert_eq!(m.revenue_micros, n * 12_345_000);
            // round(n * 12.345, 2), halves up.
            assert_eq!(m.revenue_cents(), (n * 12_345 + 5) / 10, "n = {n}");
        }
        let mut single = MetricsCollector::new("Complaint", "Silence");
        single.fold(&[purchase(12_345_000)]).unwrap();
        assert_eq!(single.metrics().revenue(), 12.35);
        single.fold(&[purchase(12_345_000)]).unwrap();
        assert_eq!(single.metrics().revenue(), 24.69);
    }

    #[test]
    fn revenue_overflow_is_an_error_and_keeps_counters() {
        let mut collector = MetricsCollector::new("Complaint", "Silence");
        collector.fold(&[purchase(u64::MAX - 1)]).unwrap();
        let before = collector.metrics();

        let err = collector.fold(&[observation("Complaint"), purchase(2)]).unwrap_err();
        assert!(matches!(err, SimError::Overflow("revenue")), "{err}");
        assert_eq!(collector.metrics(), before);
    }

    #[test]
    fn mood_tallies() {
        let mut collector = MetricsCollector::new("Complaint", "Silence");
        collector
            .fold(&[observation("Complaint"), observation("Silence"), observation("Purchase")])
            .unwrap();
        collector.fold(&[observation("Complaint")]).unwrap();
        let m = collector.metrics();
        assert_eq!(m.complaints, 2);
        assert_eq!(m.silence, 1);
        assert_eq!(m.purchases, 0);
    }

    #[test]
    fn stockout_and_restock_counters() {
        let mut collector = MetricsCollector::new("Complaint", "Silence");
        let sku = Sku::from("BK-9");
        collector.fold(&[
            Event {
                tick:    Tick(2),
                payload: EventPayload::Inventory(InventoryEvent::Stockout {
                    customer:  AgentId(1),
                    sku:       sku.clone(),
                    title:     "t".into(),
                    available: 0,
                }),
            },
            Event {
                tick:    Tick(2),
                payload: EventPayload::Inventory(InventoryEvent::RestockDelivered {
                    sku,
                    title:        "t".into(),
                    amount:       10,
                    on_hand:      10,
                    ordered_tick: Tick(0),
                }),
            },
        ])
        .unwrap();
        let m = collector.metrics();
        assert_eq!((m.stockouts, m.restocks, m.restock_orders), (1, 1, 0));
    }

    #[test]
    fn revenue_serializes_as_amount() {
        let mut collector = MetricsCollector::new("Complaint", "Silence");
        collector.fold(&[purchase(12_500_000), purchase(12_500_000)]).unwrap();
        let json = serde_json::to_value(collector.metrics()).unwrap();
        assert_eq!(json["revenue"], 25.0);
        assert_eq!(json["purchases"], 2);
        assert!(json.get("restockOrders").is_some());
    }
}

// ── Audit ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod audit_tests {
    use super::*;

    #[test]
    fn observations_become_three_facts() {
        let facts = crate::audit::facts_for(&[Event {
            tick:    Tick(4),
            payload: EventPayload::Observation(ObservationEvent {
                agent:        AgentId(2),
                symbol:       "Silence".into(),
                hidden_state: "Neutral".into(),
            }),
        }]);
        let triples: Vec<(&str, &str, &str)> = facts
            .iter()
            .map(|f| (f.subject.as_str(), f.predicate.as_str(), f.object.as_str()))
            .collect();
        assert_eq!(
            triples,
            vec![
                ("obs/2/4", "observedBy", "customer/2"),
                ("obs/2/4", "observationType", "Silence"),
                ("obs/2/4", "atTick", "4"),
            ]
        );
    }

    #[test]
    fn sink_receives_facts_during_run() {
        let sink = MemoryAuditSink::new();
        let mut sim = SimBuilder::new(config(5, 1, 3, 1))
            .audit_sink(Box::new(sink.clone()))
            .build()
            .unwrap();
        sim.run(&mut NoopObserver).unwrap();

        let facts = sink.facts();
        let observed = facts.iter().filter(|f| f.predicate == "observedBy").count();
        assert_eq!(observed, 5 * 3);
        let purchased = facts.iter().filter(|f| f.predicate == "purchased").count() as u64;
        assert_eq!(purchased, sim.metrics().purchases);
    }
}

// ── Controller ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod controller_tests {
    use super::*;

    fn fast() -> SimController {
        SimController::new().with_tick_interval(Duration::ZERO)
    }

    #[test]
    fn step_and_start_require_configure() {
        let mut c = fast();
        assert_eq!(c.status().phase, RunPhase::Idle);
        assert!(matches!(c.step(), Err(SimError::InvalidState(_))));
        assert!(matches!(c.start(), Err(SimError::InvalidState(_))));
        assert!(c.stop().is_ok());
    }

    #[test]
    fn invalid_configuration_leaves_controller_idle() {
        let mut c = fast();
        let mut bad = config(5, 1, 1, 1);
        bad.inventory.clear();
        assert!(c.configure(bad).is_err());
        let status = c.status();
        assert_eq!(status.phase, RunPhase::Idle);
        assert!(!status.configured);
    }

    #[test]
    fn manual_steps_run_to_completion() {
        let mut c = fast();
        c.configure(config(4, 3, 3, 1)).unwrap();
        assert_eq!(c.status().phase, RunPhase::Configured);
        for tick in 1..=4 {
            let report = c.step().unwrap();
            assert_eq!(report.tick, Tick(tick));
            assert_eq!(c.metrics(), (Tick(tick), report.metrics));
        }
        assert_eq!(c.status().phase, RunPhase::Finished);
        assert!(matches!(c.step(), Err(SimError::InvalidState(_))));
    }

    #[test]
    fn background_run_matches_direct_run() {
        let cfg = config(15, 77, 8, 2);
        let direct = SimBuilder::new(cfg.clone()).build().unwrap().run(&mut NoopObserver).unwrap();

        let mut c = fast();
        c.configure(cfg).unwrap();
        c.start().unwrap();
        c.wait();

        let status = c.status();
        assert_eq!(status.phase, RunPhase::Finished);
        assert!(!status.running);
        assert_eq!(status.tick, Tick(15));
        assert_eq!(c.metrics(), (Tick(15), direct));
    }

    #[test]
    fn subscribers_receive_each_report() {
        let mut c = fast();
        c.configure(config(5, 4, 3, 1)).unwrap();
        let mut rx = c.subscribe();
        c.start().unwrap();
        c.wait();

        let ticks: Vec<Tick> = std::iter::from_fn(|| rx.try_recv().ok()).map(|r| r.tick).collect();
        assert_eq!(ticks, (1..=5).map(Tick).collect::<Vec<_>>());
    }

    #[test]
    fn start_while_running_and_stop() {
        let mut c = SimController::new().with_tick_interval(Duration::from_secs(30));
        c.configure(config(100, 4, 3, 1)).unwrap();
        c.start().unwrap();
        assert!(c.status().running);
        assert!(matches!(c.start(), Err(SimError::InvalidState(_))));
        assert!(matches!(c.step(), Err(SimError::InvalidState(_))));
        let mut other = config(5, 1, 1, 1);
        other.seed = 2;
        assert!(matches!(c.configure(other), Err(SimError::InvalidState(_))));

        c.stop().unwrap();
        let status = c.status();
        assert_eq!(status.phase, RunPhase::Stopped);
        assert!(status.tick < Tick(100));

        // The stopped run can be advanced by hand.
        let before = status.tick;
        assert_eq!(c.step().unwrap().tick, Tick(before.0 + 1));
    }

    #[test]
    fn restart_begins_a_fresh_run() {
        let mut c = fast();
        c.configure(config(6, 4, 3, 1)).unwrap();
        c.start().unwrap();
        c.wait();
        let first = c.metrics();
        c.start().unwrap();
        c.wait();
        assert_eq!(c.metrics(), first);
    }

    #[test]
    fn tick_error_marks_run_errored() {
        let mut c = fast();
        c.configure(config(10, 1, 2, 1)).unwrap();
        c.launch(faulty_sim(3, false)).unwrap();
        c.wait();
        match c.status().phase {
            RunPhase::Errored(msg) => assert!(msg.contains("faulty agent"), "{msg}"),
            other => panic!("expected errored, got {other:?}"),
        }
        assert_eq!(c.metrics().0, Tick(2));

        let err = c.step().unwrap_err();
        assert!(matches!(err, SimError::InvalidState(_)), "{err}");
        let msg = err.to_string();
        assert!(msg.contains("background run errored"), "{msg}");
        assert!(msg.contains("faulty agent"), "{msg}");
        assert!(!msg.contains("before configure"), "{msg}");
    }

    #[test]
    fn tick_panic_marks_run_errored() {
        let mut c = fast();
        c.configure(config(10, 1, 2, 1)).unwrap();
        c.launch(faulty_sim(2, true)).unwrap();
        c.wait();
        match c.status().phase {
            RunPhase::Errored(msg) => assert!(msg.contains("boom"), "{msg}"),
            other => panic!("expected errored, got {other:?}"),
        }
        // The panicked simulation is discarded.
        let err = c.step().unwrap_err();
        assert!(matches!(err, SimError::InvalidState(_)), "{err}");
        assert!(err.to_string().contains("boom"), "{err}");
        // A fresh start still works.
        c.start().unwrap();
        c.wait();
        assert_eq!(c.status().phase, RunPhase::Finished);
    }

    #[test]
    fn status_serializes() {
        let mut c = fast();
        c.configure(config(3, 1, 1, 1)).unwrap();
        let json = serde_json::to_value(c.status()).unwrap();
        assert_eq!(json["phase"]["phase"], "configured");
        assert_eq!(json["totalTicks"], 3);
    }
}
