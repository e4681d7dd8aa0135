//! `mas-bus` — the inter-agent message protocol.
//!
//! # Crate layout
//!
//! | Module        | Contents                                                     |
//! |---------------|--------------------------------------------------------------|
//! | [`topic`]     | `Topic` — the closed set of queues agents talk over          |
//! | [`message`]   | `Message`, `MessagePayload`, `Sender`, `ResultStatus`        |
//! | [`mailbox`]   | `Mailbox` (`BTreeMap<Topic, VecDeque<Message>>`)             |
//!
//! # Delivery model
//!
//! Publishing appends to the topic's FIFO queue; draining removes and returns
//! everything queued at that instant.  Nothing is pushed to consumers during
//! a tick, so whether a consumer sees a message in the tick it was published
//! depends only on whether the consumer is activated after the publisher.
//! Request/response latency is therefore 0 or 1 tick, decided by the
//! activation permutation.
//!
//! ```text
//! Customer ──purchase_request──▶ Service ──purchase_result/<id>──▶ Customer
//!                                Service ──restock_request──▶ Supplier
//!                                Supplier ──restock_done──▶ Service
//! ```
//!
//! `subscribe` + `deliver` is a synchronous push alternative for callers
//! outside the tick loop; it drains the same queues, so a message is handed
//! out at most once whichever path consumes it.

pub mod mailbox;
pub mod message;
pub mod topic;


pub use mailbox::{Mailbox, Subscriber};
pub use message::{Message, MessagePayload, ResultStatus, Sender};
pub use topic::Topic;
