use signal_relay_protocol::{ConnectionId, ServerMessage};
use std::collections::HashMap;
use tokio::sync::{mpsc, RwLock};

/// Outbound queue of one connection, drained by its WebSocket writer task.
pub type OutboundSender = mpsc::UnboundedSender<String>;

/// Registry of live WebSocket connections.
///
/// A connection is live from `register` until `unregister`; forwarding to
/// anything else is a no-op.
pub struct ConnectionRegistry {
    /// Map from connection ID to message sender channel
    senders: RwLock<HashMap<ConnectionId, OutboundSender>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            senders: RwLock::new(HashMap::new()),
        }
    }

    /// Assign a fresh id to a new connection and start routing to `sender`.
    pub async fn register(&self, sender: OutboundSender) -> ConnectionId {
        let mut senders = self.senders.write().await;

        let connection_id = loop {
            let candidate = ConnectionId::new_v4();
            if !senders.contains_key(&candidate) {
                break candidate;
            }
        };
        senders.insert(connection_id, sender);

        tracing::debug!(
            "Registered connection {} ({} live)",
            connection_id,
            senders.len()
        );

        connection_id
    }

    /// Returns `false` if the connection was already gone.
    pub async fn unregister(&self, connection_id: ConnectionId) -> bool {
        self.senders.write().await.remove(&connection_id).is_some()
    }

    pub async fn is_alive(&self, connection_id: ConnectionId) -> bool {
        self.senders
            .read()
            .await
            .get(&connection_id)
            .map(|sender| !sender.is_closed())
            .unwrap_or(false)
    }

    /// Queue `message` for `connection_id`. Returns whether it was accepted.
    pub async fn send_to_connection(
        &self,
        connection_id: ConnectionId,
        message: &ServerMessage,
    ) -> bool {
        let json = match message.to_json() {
            Ok(j) => j,
            Err(e) => {
                tracing::error!("Failed to serialize message: {}", e);
                return false;
            }
        };

        let senders = self.senders.read().await;

        match senders.get(&connection_id) {
            Some(sender) => match sender.send(json) {
                Ok(()) => true,
                Err(e) => {
                    tracing::debug!("Outbound queue of {} is closed: {}", connection_id, e);
                    false
                }
            },
            None => false,
        }
    }

    pub async fn connection_count(&self) -> usize {
        self.senders.read().await.len()
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
