//! `ServiceAgent` — the employee role.

use tracing::debug;

use mas_bus::{MessagePayload, ResultStatus, Topic};
use mas_core::AgentId;
use mas_ledger::{PendingRestock, PurchaseOutcome};

use crate::{Agent, AgentContext, AgentError, AgentKind, AgentResult, EventPayload, InventoryEvent};

/// Serves every purchase request visible when it activates and keeps the
/// shelves stocked through the ledger's restock rule.
///
/// Requests published after this agent acted in a tick wait for its next
/// activation; nothing here forces same-tick delivery.
#[derive(Debug, Clone)]
pub struct ServiceAgent {
    id:               AgentId,
    served:           u64,
    orders_placed:    u64,
    deliveries_acked: u64,
}

impl ServiceAgent {
    pub fn new(id: AgentId) -> Self {
        Self { id, served: 0, orders_placed: 0, deliveries_acked: 0 }
    }

    /// Purchase requests handled so far.
    pub fn served(&self) -> u64 {
        self.served
    }

    pub fn orders_placed(&self) -> u64 {
        self.orders_placed
    }

    pub fn deliveries_acked(&self) -> u64 {
        self.deliveries_acked
    }

    fn acknowledge_deliveries(&mut self, ctx: &mut AgentContext<'_>) -> AgentResult<()> {
        for message in ctx.drain(Topic::RestockDone) {
            let (sku, amount, on_hand) = match message.payload {
                MessagePayload::RestockDone { sku, amount, on_hand } => (sku, amount, on_hand),
                other => return Err(unexpected(Topic::RestockDone, &other)),
            };
            debug!(agent = %self.id, %sku, amount, on_hand, "delivery acknowledged");
            self.deliveries_acked += 1;
        }
        Ok(())
    }

    fn serve_requests(&mut self, ctx: &mut AgentContext<'_>) -> AgentResult<()> {
        let now = ctx.tick();
        for message in ctx.drain(Topic::PurchaseRequest) {
            let (customer, sku, qty) = match message.payload {
                MessagePayload::PurchaseRequest { customer, sku, qty } => (customer, sku, qty),
                other => return Err(unexpected(Topic::PurchaseRequest, &other)),
            };
            let receipt = ctx.ledger_mut().purchase(&sku, qty, now)?;
            self.served += 1;

            let (status, remaining, event) = match receipt.outcome {
                PurchaseOutcome::Sold { qty, unit_price_micros, remaining } => (
                    ResultStatus::Success,
                    remaining,
                    InventoryEvent::Purchase {
                        customer,
                        sku: sku.clone(),
                        title: receipt.title.clone(),
                        qty,
                        unit_price_micros,
                        remaining,
                    },
                ),
                PurchaseOutcome::OutOfStock { available } => (
                    ResultStatus::Stockout,
                    available,
                    InventoryEvent::Stockout {
                        customer,
                        sku: sku.clone(),
                        title: receipt.title.clone(),
                        available,
                    },
                ),
            };
            ctx.emit(EventPayload::Inventory(event));
            ctx.publish(
                Topic::PurchaseResult(customer),
                MessagePayload::PurchaseResult {
                    customer,
                    sku,
                    status,
                    remaining,
                    reply_to: message.conversation_id,
                },
            );

            if let Some(order) = receipt.restock {
                self.place_order(ctx, &order, receipt.title);
            }
        }
        Ok(())
    }

    fn place_order(&mut self, ctx: &mut AgentContext<'_>, order: &PendingRestock, title: String) {
        self.orders_placed += 1;
        ctx.emit(EventPayload::Inventory(InventoryEvent::RestockOrdered {
            sku:             order.sku.clone(),
            title,
            amount:          order.amount,
            ordered_tick:    order.ordered_tick,
            delivery_tick:   order.delivery_tick,
            ticks_remaining: order.ordered_tick.until(order.delivery_tick),
        }));
        ctx.publish(
            Topic::RestockRequest,
            MessagePayload::RestockRequest {
                sku:           order.sku.clone(),
                amount:        order.amount,
                delivery_tick: order.delivery_tick,
            },
        );
    }
}

impl Agent for ServiceAgent {
    fn id(&self) -> AgentId {
        self.id
    }

    fn kind(&self) -> AgentKind {
        AgentKind::Service
    }

    fn step(&mut self, ctx: &mut AgentContext<'_>) -> AgentResult<()> {
        self.acknowledge_deliveries(ctx)?;
        self.serve_requests(ctx)?;

        // Items that sit at or below threshold without a fresh sale (e.g. a
        // delivery smaller than the gap) still get reordered.
        let now = ctx.tick();
        for order in ctx.ledger_mut().review_restocks(now)? {
            let title = ctx
                .ledger()
                .get(&order.sku)
                .map(|i| i.title.clone())
                .unwrap_or_default();
            self.place_order(ctx, &order, title);
        }
        Ok(())
    }
}

fn unexpected(topic: Topic, payload: &MessagePayload) -> AgentError {
    AgentError::Protocol { topic, detail: format!("{payload:?}") }
}
