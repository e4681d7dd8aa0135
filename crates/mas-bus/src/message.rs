use serde::Serialize;

use mas_core::{AgentId, ConversationId, Sku, Tick};

use crate::Topic;

/// Who published a message.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    Agent(AgentId),
    /// The external supplier, simulated by the scheduler's delivery phase.
    Supplier,
}

/// Result of a purchase request as reported back to the customer.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultStatus {
    Success,
    Stockout,
}

/// Typed message bodies, one variant per topic family.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MessagePayload {
    PurchaseRequest {
        customer: AgentId,
        sku:      Sku,
        qty:      u32,
    },
    PurchaseResult {
        customer:  AgentId,
        sku:       Sku,
        status:    ResultStatus,
        remaining: u32,
        /// Conversation id of the request this answers.
        reply_to:  ConversationId,
    },
    RestockRequest {
        sku:           Sku,
        amount:        u32,
        delivery_tick: Tick,
    },
    RestockDone {
        sku:     Sku,
        amount:  u32,
        on_hand: u32,
    },
}

/// One queued message.  Consumed exactly once by a drain or a delivery.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Message {
    pub topic:           Topic,
    pub sender:          Sender,
    pub payload:         MessagePayload,
    pub conversation_id: ConversationId,
}
