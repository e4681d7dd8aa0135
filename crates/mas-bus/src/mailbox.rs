//! `Mailbox` — topic-keyed FIFO queues.
//!
//! # Invariants
//!
//! - Within a topic, messages leave in publish order.
//! - A message leaves its queue exactly once, through `drain` or `deliver`;
//!   no later call can return it again.
//! - Conversation ids come from a per-mailbox counter, so they are unique
//!   within a run and identical across runs with the same seed.

use std::collections::{BTreeMap, VecDeque};
use std::fmt;

use mas_core::ConversationId;

use crate::{Message, MessagePayload, Sender, Topic};

/// A push-mode consumer registered with [`Mailbox::subscribe`].
pub type Subscriber = Box<dyn FnMut(&Message) + Send>;

#[derive(Default)]
pub struct Mailbox {
    queues:      BTreeMap<Topic, VecDeque<Message>>,
    subscribers: BTreeMap<Topic, Vec<Subscriber>>,
    next_id:     u64,
    /// Cached total message count for O(1) `len()`.
    total:       usize,
}

impl Mailbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve the next conversation id.
    pub fn next_conversation(&mut self) -> ConversationId {
        let id = ConversationId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Append a fully built message to its topic's queue.
    pub fn publish(&mut self, message: Message) {
        self.queues.entry(message.topic).or_default().push_back(message);
        self.total += 1;
    }

    /// Build a message with a fresh conversation id, publish it, and return
    /// a copy of what was queued.
    pub fn send(&mut self, topic: Topic, sender: Sender, payload: MessagePayload) -> Message {
        let message = Message {
            topic,
            sender,
            payload,
            conversation_id: self.next_conversation(),
        };
        self.publish(message.clone());
        message
    }

    /// Remove and return everything queued on `topic`, oldest first.
    ///
    /// Returns an empty `Vec` (no allocation) when the topic is empty.
    pub fn drain(&mut self, topic: Topic) -> Vec<Message> {
        match self.queues.remove(&topic) {
            Some(queue) => {
                self.total -= queue.len();
                queue.into()
            }
            None => Vec::new(),
        }
    }

    /// Register a push-mode consumer for `topic`.
    ///
    /// Nothing is delivered until [`deliver`](Self::deliver) runs.
    pub fn subscribe(&mut self, topic: Topic, subscriber: Subscriber) {
        self.subscribers.entry(topic).or_default().push(subscriber);
    }

    /// Push every queued message on a subscribed topic to all of that
    /// topic's subscribers, removing it from the queue.
    ///
    /// Topics with no subscribers are left untouched for a later `drain`.
    /// Returns the number of messages removed.
    pub fn deliver(&mut self) -> usize {
        let mut delivered = 0;
        let topics: Vec<Topic> = self.subscribers.keys().copied().collect();
        for topic in topics {
            let messages = self.drain(topic);
            if messages.is_empty() {
                continue;
            }
            if let Some(subs) = self.subscribers.get_mut(&topic) {
                for message in &messages {
                    for sub in subs.iter_mut() {
                        sub(message);
                    }
                }
            }
            delivered += messages.len();
        }
        delivered
    }

    /// Messages currently queued on `topic`.
    pub fn queued(&self, topic: Topic) -> usize {
        self.queues.get(&topic).map_or(0, VecDeque::len)
    }

    /// Total queued messages across all topics.
    pub fn len(&self) -> usize {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Number of conversation ids handed out so far.
    pub fn issued(&self) -> u64 {
        self.next_id
    }
}

impl fmt::Debug for Mailbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mailbox")
            .field("queues", &self.queues)
            .field("subscribed_topics", &self.subscribers.keys().collect::<Vec<_>>())
            .field("next_id", &self.next_id)
            .finish()
    }
}
