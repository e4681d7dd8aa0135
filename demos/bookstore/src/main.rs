//! bookstore — a small shop with moody customers.
//!
//! Twenty customers with a three-mood hidden state browse four titles while
//! two employees serve requests and reorder stock.  Pass a path to a JSON
//! configuration to run something else.
//!
//! ```text
//! RUST_LOG=debug cargo run -p bookstore -- my_shop.json
//! ```

use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::{bail, Result};
use tokio::sync::broadcast::error::TryRecvError;
use tracing::info;
use tracing_subscriber::EnvFilter;

use mas_output::{CsvWriter, SimOutputObserver};
use mas_sim::{RunPhase, SimBuilder, SimController, SimulationConfig};

const OUTPUT_DIR: &str = "output/bookstore";

// ── Configuration ─────────────────────────────────────────────────────────────

const CONFIG_JSON: &str = r#"{
    "ticks": 48,
    "seed": 42,
    "numCustomers": 20,
    "numServiceAgents": 2,
    "hmm": {
        "states":       ["Happy", "Neutral", "Angry"],
        "observations": ["Purchase", "Complaint", "Silence"],
        "start":        [0.5, 0.3, 0.2],
        "transition":   [[0.7, 0.2, 0.1],
                         [0.3, 0.4, 0.3],
                         [0.2, 0.3, 0.5]],
        "emission":     [[0.6, 0.1, 0.3],
                         [0.3, 0.2, 0.5],
                         [0.1, 0.6, 0.3]]
    },
    "inventory": [
        { "sku": "BK-001", "title": "The Rust Programming Language", "price": 39.95,
          "onHand": 12, "threshold": 4, "restockAmount": 10 },
        { "sku": "BK-002", "title": "Hidden Markov Models for Time Series", "price": 74.5,
          "onHand": 3, "threshold": 1, "restockAmount": 4 },
        { "sku": "BK-003", "title": "Agent-Based Modeling", "price": 28.0,
          "onHand": 6, "threshold": 2, "restockAmount": 6 },
        { "sku": "BK-004", "title": "Operations Management", "price": 55.25,
          "onHand": 2, "threshold": 2, "restockAmount": 5 }
    ],
    "behavior": { "purchaseProbability": 0.5, "transitionProbability": 0.3 },
    "outputIntervalTicks": 4
}"#;

fn load_config() -> Result<SimulationConfig> {
    match std::env::args().nth(1) {
        Some(path) => Ok(SimulationConfig::from_path(&path)?),
        None => Ok(SimulationConfig::from_json_str(CONFIG_JSON)?),
    }
}

// ── main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = load_config()?;
    println!("=== bookstore — retail marketplace simulation ===");
    println!(
        "Customers: {}  |  Service agents: {}  |  Titles: {}  |  Ticks: {}  |  Seed: {}",
        config.num_customers,
        config.num_service_agents,
        config.inventory.len(),
        config.ticks,
        config.seed,
    );
    println!();

    // 1. Direct run with CSV output.
    let mut sim = SimBuilder::new(config.clone()).build()?;
    let writer = CsvWriter::new(Path::new(OUTPUT_DIR))?;
    let mut obs = SimOutputObserver::new(writer, &config);

    let t0 = Instant::now();
    let metrics = sim.run(&mut obs)?;
    let elapsed = t0.elapsed();
    if let Some(e) = obs.take_error() {
        eprintln!("output error: {e}");
    }
    println!("Simulation complete in {:.3} s, output in {OUTPUT_DIR}/", elapsed.as_secs_f64());
    println!();

    // 2. Final shelf.
    println!("{:<8} {:<40} {:>8} {:>10}", "SKU", "Title", "On hand", "Pending");
    println!("{}", "-".repeat(70));
    let now = sim.current_tick();
    let pending = sim.ledger().pending_snapshot(now);
    for item in sim.ledger().inventory_snapshot() {
        let due = pending
            .iter()
            .find(|p| p.sku == item.sku)
            .map_or_else(|| "-".to_owned(), |p| format!("{}", p.delivery_tick));
        println!("{:<8} {:<40} {:>8} {:>10}", item.sku.as_str(), item.title, item.on_hand, due);
    }
    println!();

    // 3. Same configuration through the controller, watched by a subscriber.
    let mut controller = SimController::new().with_tick_interval(Duration::ZERO);
    controller.configure(config)?;
    let mut reports = controller.subscribe();
    controller.start()?;
    controller.wait();

    let (mut seen, mut skipped) = (0u64, 0u64);
    loop {
        match reports.try_recv() {
            Ok(report) => {
                seen += 1;
                if report.tick.is_multiple_of(12) {
                    info!(tick = %report.tick, purchases = report.metrics.purchases, "broadcast report");
                }
            }
            Err(TryRecvError::Lagged(n)) => skipped += n,
            Err(_) => break,
        }
    }
    let status = controller.status();
    if status.phase != RunPhase::Finished {
        bail!("controller run ended in {:?}", status.phase);
    }
    let (tick, replayed) = controller.metrics();
    if replayed != metrics {
        bail!("controller run diverged from the direct run at {tick}");
    }
    println!("Controller replay: {seen} reports received ({skipped} dropped), metrics identical.");
    println!();

    println!("{}", serde_json::to_string_pretty(&metrics)?);
    Ok(())
}
