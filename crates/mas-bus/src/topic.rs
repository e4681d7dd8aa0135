use std::fmt;

use serde::{Serialize, Serializer};

use mas_core::AgentId;

/// A message queue name.
///
/// Purchase results are addressed per customer so each customer drains only
/// its own replies.  `Ord` gives the mailbox a stable topic iteration order.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Topic {
    PurchaseRequest,
    PurchaseResult(AgentId),
    RestockRequest,
    RestockDone,
}

impl Topic {
    /// Wire name of the queue family, without the per-customer suffix.
    pub fn family(self) -> &'static str {
        match self {
            Topic::PurchaseRequest   => "purchase_request",
            Topic::PurchaseResult(_) => "purchase_result",
            Topic::RestockRequest    => "restock_request",
            Topic::RestockDone       => "restock_done",
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Topic::PurchaseResult(customer) => write!(f, "purchase_result/{}", customer.0),
            other => f.write_str(other.family()),
        }
    }
}

impl Serialize for Topic {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
