//! Session lifecycle broadcast.
//!
//! One [`SessionEvents`] is created at the composition root and its handle is
//! passed to whatever emits or observes session changes. Emission is
//! fire-and-forget: having no subscribers is not an error, and a slow
//! subscriber that lags simply misses older events.

use sourcechat_shared::DataError;
use tokio::sync::broadcast;
use tracing::{debug, info};

/// Buffered events per subscriber before lagging.
const CHANNEL_CAPACITY: usize = 16;

/// A change in session state observed by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// A call failed with a session-invalidating error; re-authentication
    /// is required.
    Expired { cause: DataError },
}

/// Cloneable handle to the session broadcast channel.
#[derive(Debug, Clone)]
pub struct SessionEvents {
    tx: broadcast::Sender<SessionEvent>,
}

impl SessionEvents {
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    /// Receive all events emitted after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.tx.subscribe()
    }

    /// Announce that the session expired because of `cause`.
    pub fn notify_expired(&self, cause: DataError) {
        match self.tx.send(SessionEvent::Expired { cause }) {
            Ok(receivers) => info!(%cause, receivers, "session expired"),
            Err(_) => debug!(%cause, "session expired, no listeners"),
        }
    }
}

impl Default for SessionEvents {
    fn default() -> Self {
        Self::new()
    }
}
