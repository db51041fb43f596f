//! Domain event system — lets observers follow a run without touching it.
//!
//! The agent publishes events as it iterates; a CLI progress printer or a
//! test can subscribe and filter for what it cares about. Publishing never
//! blocks and never fails the run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::step::RunOutcome;

/// All domain events in the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DomainEvent {
    /// A run began
    RunStarted {
        run_id: String,
        query_preview: String,
        timestamp: DateTime<Utc>,
    },

    /// The model produced a completion
    ResponseGenerated {
        run_id: String,
        iteration: usize,
        model: String,
        tokens_used: Option<u32>,
        timestamp: DateTime<Utc>,
    },

    /// An action was dispatched to a tool
    ActionExecuted {
        run_id: String,
        action_type: String,
        success: bool,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },

    /// A run reached a terminal state
    RunFinished {
        run_id: String,
        outcome: RunOutcome,
        iterations: usize,
        timestamp: DateTime<Utc>,
    },
}

/// A broadcast-based event bus for domain events.
///
/// Uses `tokio::sync::broadcast` for multi-consumer pub/sub.
pub struct EventBus {
    sender: broadcast::Sender<Arc<DomainEvent>>,
}

impl EventBus {
    /// Create a new event bus with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all subscribers.
    pub fn publish(&self, event: DomainEvent) {
        // No subscribers is fine
        let _ = self.sender.send(Arc::new(event));
    }

    /// Subscribe to receive events.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<DomainEvent>> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn event_bus_publish_subscribe() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        bus.publish(DomainEvent::ActionExecuted {
            run_id: "run-1".into(),
            action_type: "calculate".into(),
            success: true,
            duration_ms: 42,
            timestamp: Utc::now(),
        });

        let event = rx.recv().await.unwrap();
        match event.as_ref() {
            DomainEvent::ActionExecuted {
                action_type,
                success,
                ..
            } => {
                assert_eq!(action_type, "calculate");
                assert!(success);
            }
            _ => panic!("Expected ActionExecuted event"),
        }
    }

    #[test]
    fn event_bus_no_subscribers_doesnt_panic() {
        let bus = EventBus::new(16);
        bus.publish(DomainEvent::RunFinished {
            run_id: "run-1".into(),
            outcome: RunOutcome::NoModel,
            iterations: 1,
            timestamp: Utc::now(),
        });
    }
}
