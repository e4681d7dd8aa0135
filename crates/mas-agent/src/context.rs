//! `AgentContext` — the narrow handle an agent acts through.

use mas_bus::{Mailbox, Message, MessagePayload, Sender, Topic};
use mas_core::{AgentId, Tick};
use mas_hmm::StateModel;
use mas_ledger::InventoryLedger;

use crate::{EventLog, EventPayload};

/// Borrowed engine state for one activation.
///
/// Built by the scheduler immediately before calling into an agent and
/// dropped when the call returns, so no agent can keep a reference to shared
/// state across activations.
pub struct AgentContext<'a> {
    tick:    Tick,
    agent:   AgentId,
    mailbox: &'a mut Mailbox,
    ledger:  &'a mut InventoryLedger,
    model:   &'a StateModel,
    events:  &'a mut EventLog,
}

impl<'a> AgentContext<'a> {
    #[inline]
    pub fn new(
        tick:    Tick,
        agent:   AgentId,
        mailbox: &'a mut Mailbox,
        ledger:  &'a mut InventoryLedger,
        model:   &'a StateModel,
        events:  &'a mut EventLog,
    ) -> Self {
        Self { tick, agent, mailbox, ledger, model, events }
    }

    #[inline]
    pub fn tick(&self) -> Tick {
        self.tick
    }

    /// The agent this context was lent to.
    #[inline]
    pub fn agent(&self) -> AgentId {
        self.agent
    }

    /// Publish on behalf of the acting agent and record it in the event log.
    pub fn publish(&mut self, topic: Topic, payload: MessagePayload) -> Message {
        let message = self.mailbox.send(topic, Sender::Agent(self.agent), payload);
        self.events.emit(self.tick, EventPayload::Message(message.clone()));
        message
    }

    /// Take every message currently visible on `topic`.
    pub fn drain(&mut self, topic: Topic) -> Vec<Message> {
        self.mailbox.drain(topic)
    }

    pub fn ledger(&self) -> &InventoryLedger {
        self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut InventoryLedger {
        self.ledger
    }

    pub fn model(&self) -> &'a StateModel {
        self.model
    }

    pub fn emit(&mut self, payload: EventPayload) {
        self.events.emit(self.tick, payload);
    }
}
