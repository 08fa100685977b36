// src/core/events.rs
use crate::types::EngineEvent;
use tokio::sync::mpsc;
use tracing::error;

/// Outbound diagnostics port. Never blocks the decision loop: when the
/// reporter falls behind, events are dropped.
#[derive(Debug, Clone)]
pub struct EventSink {
    sender: mpsc::Sender<EngineEvent>,
}

impl EventSink {
    pub fn new(sender: mpsc::Sender<EngineEvent>) -> Self {
        Self { sender }
    }

    pub fn send(&self, event: EngineEvent) {
        match self.sender.try_send(event) {
            Ok(_) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {}
            Err(mpsc::error::TrySendError::Closed(_)) => {
                error!("Event channel closed! Reporter is likely dead.");
            }
        }
    }
}
