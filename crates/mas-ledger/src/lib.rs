//! `mas-ledger` — per-item stock and the restock state machine.
//!
//! # Crate layout
//!
//! | Module        | Contents                                                        |
//! |---------------|-----------------------------------------------------------------|
//! | [`item`]      | `ItemSpec` (configuration), `InventoryItem` (live stock)         |
//! | [`restock`]   | `needs_restock` predicate, `PendingRestock`, `Delivery`         |
//! | [`ledger`]    | `InventoryLedger`, `PurchaseReceipt`, `PurchaseOutcome`         |
//! | [`snapshot`]  | `InventorySnapshot`, `PendingRestockSnapshot`                   |
//! | [`catalog`]   | `CatalogSource` — where the initial item list comes from        |
//! | [`error`]     | `LedgerError`, `LedgerResult<T>`                                |
//!
//! # Restock state machine (per SKU)
//!
//! ```text
//!            purchase leaves on_hand ≤ threshold
//!   Idle ───────────────────────────────────────▶ Pending { delivery_tick = now + delay }
//!    ▲                                                 │
//!    └──────── deliver_due(now ≥ delivery_tick) ───────┘  on_hand += amount
//! ```
//!
//! [`needs_restock`] is the only place the threshold is compared.  Both the
//! post-purchase check and [`InventoryLedger::review_restocks`] go through
//! it, so at most one order is ever outstanding per SKU.
//!
//! Prices are held as integer millionths of a currency unit, so revenue
//! accumulates exactly and is rounded to cents only when reported.

pub mod catalog;
pub mod error;
pub mod item;
pub mod ledger;
pub mod restock;
pub mod snapshot;


pub use catalog::CatalogSource;
pub use error::{LedgerError, LedgerResult};
pub use item::{InventoryItem, ItemSpec, MAX_PRICE};
pub use ledger::{InventoryLedger, PurchaseOutcome, PurchaseReceipt};
pub use restock::{
    needs_restock, Delivery, PendingRestock, MAX_RESTOCK_DELAY_TICKS, RESTOCK_DELAY_TICKS,
};
pub use snapshot::{InventorySnapshot, PendingRestockSnapshot};
