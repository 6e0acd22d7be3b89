//! SubscriptionManager - turns subscription intents into control frames.
//!
//! Sending is gated on the connection being open: while it is not, no
//! frame leaves the client. Intents are still remembered so they can be
//! replayed by [`SubscriptionManager::resubscribe_all`] once the
//! connection is back.

use std::collections::BTreeSet;
use std::sync::{Arc, RwLock};

use crate::domain::frames::{OutboundFrame, SendOutcome};
use crate::ports::FrameSink;

/// Tracks which nodes the client wants scoped updates for.
pub struct SubscriptionManager {
    sink: Arc<dyn FrameSink>,
    intents: RwLock<BTreeSet<String>>,
}

impl SubscriptionManager {
    pub fn new(sink: Arc<dyn FrameSink>) -> Self {
        Self {
            sink,
            intents: RwLock::new(BTreeSet::new()),
        }
    }

    /// Records the intent and sends `subscribe_node` if the connection is open.
    pub async fn subscribe(&self, node: &str) -> SendOutcome {
        self.write_intents(|set| {
            set.insert(node.to_string());
        });
        self.send(OutboundFrame::SubscribeNode(node.to_string())).await
    }

    /// Drops the intent and sends `unsubscribe_node` if the connection is open.
    pub async fn unsubscribe(&self, node: &str) -> SendOutcome {
        self.write_intents(|set| {
            set.remove(node);
        });
        self.send(OutboundFrame::UnsubscribeNode(node.to_string())).await
    }

    /// Asks for a fresh update of one node. Not remembered.
    pub async fn request_update(&self, node: &str) -> SendOutcome {
        self.send(OutboundFrame::RequestNodeUpdate(node.to_string()))
            .await
    }

    /// Re-sends `subscribe_node` for every remembered intent.
    ///
    /// Returns how many frames were sent.
    pub async fn resubscribe_all(&self) -> usize {
        let nodes = self.intents();
        if nodes.is_empty() {
            return 0;
        }

        let mut sent = 0;
        for node in nodes {
            if !self.send(OutboundFrame::SubscribeNode(node)).await.is_sent() {
                break;
            }
            sent += 1;
        }
        tracing::debug!(sent, "Replayed subscriptions");
        sent
    }

    /// Remembered intents, sorted.
    pub fn intents(&self) -> Vec<String> {
        match self.intents.read() {
            Ok(set) => set.iter().cloned().collect(),
            Err(poisoned) => poisoned.into_inner().iter().cloned().collect(),
        }
    }

    pub fn is_subscribed(&self, node: &str) -> bool {
        match self.intents.read() {
            Ok(set) => set.contains(node),
            Err(poisoned) => poisoned.into_inner().contains(node),
        }
    }

    fn write_intents(&self, f: impl FnOnce(&mut BTreeSet<String>)) {
        match self.intents.write() {
            Ok(mut set) => f(&mut set),
            Err(poisoned) => f(&mut poisoned.into_inner()),
        }
    }

    async fn send(&self, frame: OutboundFrame) -> SendOutcome {
        let kind = frame.kind();
        let node = frame.node_name().to_string();
        let outcome = self.sink.send_frame(frame).await;
        match outcome {
            SendOutcome::Sent => tracing::debug!(kind, node = %node, "Sent control frame"),
            SendOutcome::NotOpen => {
                tracing::debug!(kind, node = %node, "Connection not open; control frame skipped")
            }
            SendOutcome::Failed => {
                tracing::warn!(kind, node = %node, "Control frame could not be sent")
            }
        }
        outcome
    }
}
