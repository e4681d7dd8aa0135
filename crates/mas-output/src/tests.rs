//! Integration tests for mas-output.

use tempfile::TempDir;

use mas_agent::{Event, EventPayload, InventoryEvent};
use mas_core::{AgentId, Sku, Tick};
use mas_sim::{NoopObserver, SimBuilder, SimulationConfig};

use crate::csv::{CUSTOMER_HEADER, EVENT_HEADER, INVENTORY_HEADER, TICK_SUMMARY_HEADER};
use crate::row::{CustomerStateRow, EventRow, InventoryRow, TickSummaryRow};
use crate::writer::OutputWriter;
use crate::{CsvWriter, SimOutputObserver};

// ── Helpers ───────────────────────────────────────────────────────────────────

fn tmp() -> TempDir {
    tempfile::tempdir().expect("create temp dir")
}

fn headers(dir: &TempDir, file: &str) -> Vec<String> {
    let mut rdr = csv::Reader::from_path(dir.path().join(file)).unwrap();
    rdr.headers().unwrap().iter().map(str::to_owned).collect()
}

fn records(dir: &TempDir, file: &str) -> Vec<csv::StringRecord> {
    let mut rdr = csv::Reader::from_path(dir.path().join(file)).unwrap();
    rdr.records().map(|r| r.unwrap()).collect()
}

fn config(ticks: u64, output_interval: u64) -> SimulationConfig {
    let json = format!(
        r#"{{
            "ticks": {ticks}, "seed": 3, "numCustomers": 4, "numServiceAgents": 1,
            "outputIntervalTicks": {output_interval},
            "hmm": {{
                "states": ["Happy", "Angry"],
                "observations": ["Purchase", "Complaint", "Silence"],
                "start": [0.6, 0.4],
                "transition": [[0.8, 0.2], [0.3, 0.7]],
                "emission": [[0.7, 0.1, 0.2], [0.1, 0.6, 0.3]]
            }},
            "inventory": [
                {{ "sku": "BK-001", "title": "Rust, Quoted", "price": 12.5,
                   "onHand": 4, "threshold": 2, "restockAmount": 6 }}
            ]
        }}"#
    );
    SimulationConfig::from_json_str(&json).unwrap()
}

// ── CsvWriter ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod csv_tests {
    use super::*;

    #[test]
    fn csv_files_created_with_headers() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.finish().unwrap();
        assert_eq!(headers(&dir, "tick_summaries.csv"), TICK_SUMMARY_HEADER);
        assert_eq!(headers(&dir, "inventory_snapshots.csv"), INVENTORY_HEADER);
        assert_eq!(headers(&dir, "customer_states.csv"), CUSTOMER_HEADER);
        assert_eq!(headers(&dir, "events.csv"), EVENT_HEADER);
    }

    #[test]
    fn creates_missing_directory() {
        let dir = tmp();
        let nested = dir.path().join("runs").join("a");
        let _w = CsvWriter::new(&nested).unwrap();
        assert!(nested.join("events.csv").exists());
    }

    #[test]
    fn tick_summary_revenue_has_two_decimals() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.write_tick_summary(&TickSummaryRow {
            tick:             3,
            purchases:        2,
            stockouts:        1,
            restocks:         0,
            restock_orders:   1,
            complaints:       4,
            silence:          5,
            revenue:          25.0,
            events:           17,
            pending_restocks: 1,
        })
        .unwrap();
        w.finish().unwrap();

        let rows = records(&dir, "tick_summaries.csv");
        assert_eq!(rows.len(), 1);
        assert_eq!(&rows[0][0], "3");
        assert_eq!(&rows[0][7], "25.00");
        assert_eq!(&rows[0][9], "1");
    }

    #[test]
    fn inventory_title_with_comma_is_quoted() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.write_inventory(&[InventoryRow {
            tick:           2,
            sku:            "BK-001".into(),
            title:          "Rust, Quoted".into(),
            on_hand:        4,
            threshold:      2,
            restock_amount: 6,
            price:          12.5,
            pending:        true,
        }])
        .unwrap();
        w.finish().unwrap();

        let rows = records(&dir, "inventory_snapshots.csv");
        assert_eq!(&rows[0][2], "Rust, Quoted");
        assert_eq!(&rows[0][6], "12.5");
        assert_eq!(&rows[0][7], "1");
    }

    #[test]
    fn customer_rows_round_trip() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.write_customers(&[
            CustomerStateRow {
                tick:              1,
                cust_id:           0,
                inferred_state:    "Happy".into(),
                log_prob:          -1.5,
                observation_count: 1,
            },
            CustomerStateRow {
                tick:              1,
                cust_id:           1,
                inferred_state:    "Unknown".into(),
                log_prob:          0.0,
                observation_count: 0,
            },
        ])
        .unwrap();
        w.finish().unwrap();

        let rows = records(&dir, "customer_states.csv");
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[0][2], "Happy");
        assert_eq!(rows[0][3].parse::<f64>().unwrap(), -1.5);
        assert_eq!(&rows[1][2], "Unknown");
    }

    #[test]
    fn csv_finish_idempotent() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.finish().unwrap();
        w.finish().unwrap();
    }
}

// ── Rows ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod row_tests {
    use super::*;

    #[test]
    fn event_row_holds_payload_body() {
        let event = Event {
            tick:    Tick(4),
            payload: EventPayload::Inventory(InventoryEvent::Stockout {
                customer:  AgentId(2),
                sku:       Sku::from("BK-001"),
                title:     "Rust, Quoted".into(),
                available: 0,
            }),
        };
        let row = EventRow::from_event(&event).unwrap();
        assert_eq!(row.tick, 4);
        assert_eq!(row.event_type, "inventory");

        let body: serde_json::Value = serde_json::from_str(&row.payload).unwrap();
        assert_eq!(body["category"], "stockout");
        assert_eq!(body["sku"], "BK-001");
        assert_eq!(body["customer"], 2);
    }
}

// ── SimOutputObserver ─────────────────────────────────────────────────────────

#[cfg(test)]
mod observer_tests {
    use super::*;

    #[test]
    fn snapshots_follow_output_interval() {
        let config = config(6, 2);
        let mut sim = SimBuilder::new(config.clone()).build().unwrap();

        let dir = tmp();
        let writer = CsvWriter::new(dir.path()).unwrap();
        let mut obs = SimOutputObserver::new(writer, &config);
        sim.run(&mut obs).unwrap();
        assert!(obs.take_error().is_none(), "no write errors expected");

        // Summaries every tick.
        let summaries = records(&dir, "tick_summaries.csv");
        assert_eq!(summaries.len(), 6);
        assert_eq!(&summaries[5][0], "6");

        // Snapshots at ticks 2, 4, 6: one item, four customers.
        let inventory = records(&dir, "inventory_snapshots.csv");
        let ticks: Vec<&str> = inventory.iter().map(|r| r.get(0).unwrap()).collect();
        assert_eq!(ticks, ["2", "4", "6"]);
        assert_eq!(records(&dir, "customer_states.csv").len(), 3 * 4);

        // Every customer observes every tick.
        let observations = records(&dir, "events.csv")
            .iter()
            .filter(|r| &r[1] == "observation")
            .count();
        assert_eq!(observations, 6 * 4);
    }

    #[test]
    fn summary_matches_final_metrics() {
        let config = config(10, 5);
        let mut sim = SimBuilder::new(config.clone()).build().unwrap();
        let dir = tmp();
        let mut obs = SimOutputObserver::new(CsvWriter::new(dir.path()).unwrap(), &config);
        let metrics = sim.run(&mut obs).unwrap();
        assert!(obs.take_error().is_none());

        let summaries = records(&dir, "tick_summaries.csv");
        let last = summaries.last().unwrap();
        assert_eq!(last[1].parse::<u64>().unwrap(), metrics.purchases);
        assert_eq!(last[2].parse::<u64>().unwrap(), metrics.stockouts);
        assert_eq!(&last[7], format!("{:.2}", metrics.revenue()));
    }

    #[test]
    fn noop_run_writes_nothing() {
        let config = config(3, 1);
        let mut sim = SimBuilder::new(config).build().unwrap();
        let dir = tmp();
        let writer = CsvWriter::new(dir.path()).unwrap();
        sim.run(&mut NoopObserver).unwrap();
        drop(writer);
        assert!(records(&dir, "tick_summaries.csv").is_empty());
    }
}
