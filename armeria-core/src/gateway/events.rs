//! Session signals raised by the gateway
//!
//! The gateway never navigates. When the backend rejects the credential it
//! clears the token store and broadcasts [`SessionEvent::Expired`]; whoever
//! hosts the console (and the session manager) subscribes and reacts.

use tokio::sync::broadcast;

/// Capacity of the event channel; slow receivers only miss duplicate expiries
const EVENT_CAPACITY: usize = 16;

/// Signal emitted by the gateway
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The backend answered 401; the user must sign in again at `redirect_to`
    Expired { endpoint: String, redirect_to: String },
}

/// Broadcast hub for [`SessionEvent`]s
#[derive(Debug, Clone)]
pub struct SessionEvents {
    sender: broadcast::Sender<SessionEvent>,
}

impl Default for SessionEvents {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionEvents {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(EVENT_CAPACITY);
        Self { sender }
    }

    /// Subscribe to future events
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.sender.subscribe()
    }

    /// Publish an event; having no subscribers is fine
    pub fn emit(&self, event: SessionEvent) {
        let receivers = self.sender.send(event).unwrap_or(0);
        log::debug!("Session event delivered to {} subscriber(s)", receivers);
    }
}
