use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Domain events published after a lifecycle transition commits. Delivery is
/// best-effort; a failed send is logged by the caller, never propagated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    RequestSubmitted(i64),
    RequestApproved(i64),
    RequestRejected(i64),
    ItemsReleased { request_id: i64, full: bool },
    MarkedNotAvailable(i64),
    PickupConfirmed(i64),
    ReturnRegistered(i64),
    ReturnConfirmed(i64),
    RequestFinalized(i64),
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Convenience constructor returning the paired receiver.
    pub fn channel(buffer: usize) -> (Self, mpsc::Receiver<Event>) {
        let (tx, rx) = mpsc::channel(buffer);
        (Self::new(tx), rx)
    }

    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}
