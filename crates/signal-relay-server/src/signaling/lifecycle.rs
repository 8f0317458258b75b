use crate::signaling::PublisherDirectory;
use crate::ws::connections::ConnectionRegistry;
use signal_relay_protocol::{ConnectionId, PublisherId};
use std::sync::Arc;

/// Cleans up after a connection closes.
///
/// Peers that were mid-negotiation with the closed connection are not told;
/// their next forward to it is dropped and their next subscribe to one of
/// its identities gets "publisher not found".
#[derive(Clone)]
pub struct LifecycleManager {
    connections: Arc<ConnectionRegistry>,
    directory: Arc<PublisherDirectory>,
}

impl LifecycleManager {
    pub fn new(connections: Arc<ConnectionRegistry>, directory: Arc<PublisherDirectory>) -> Self {
        Self {
            connections,
            directory,
        }
    }

    /// Drop every publisher identity owned by `connection_id`, then remove the
    /// connection from the registry. Returns the identities removed; a second
    /// call for the same connection removes nothing.
    ///
    /// Identities go first so none of them ever resolves to an unregistered
    /// connection.
    pub async fn connection_closed(&self, connection_id: ConnectionId) -> Vec<PublisherId> {
        let removed = self.directory.unbind(connection_id).await;
        let was_live = self.connections.unregister(connection_id).await;

        for publisher_id in &removed {
            tracing::info!("Publisher {} removed ({} closed)", publisher_id, connection_id);
        }

        if was_live {
            tracing::info!(
                "Connection {} closed ({} still live)",
                connection_id,
                self.connections.connection_count().await
            );
        }

        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signaling::NegotiationRouter;
    use signal_relay_protocol::{ClientMessage, ServerMessage};
    use tokio::sync::mpsc;

    fn setup() -> (Arc<ConnectionRegistry>, Arc<PublisherDirectory>, LifecycleManager) {
        let connections = Arc::new(ConnectionRegistry::new());
        let directory = Arc::new(PublisherDirectory::new());
        let lifecycle = LifecycleManager::new(connections.clone(), directory.clone());
        (connections, directory, lifecycle)
    }

    #[tokio::test]
    async fn test_close_purges_registry_and_directory() {
        let (connections, directory, lifecycle) = setup();
        let (tx, _rx) = mpsc::unbounded_channel();
        let conn = connections.register(tx).await;
        let first = directory.register_publisher(conn).await;
        let second = directory.register_publisher(conn).await;

        let removed = lifecycle.connection_closed(conn).await;

        assert_eq!(removed.len(), 2);
        assert!(!connections.is_alive(conn).await);
        assert_eq!(directory.resolve(&first).await, None);
        assert_eq!(directory.resolve(&second).await, None);
    }

    #[tokio::test]
    async fn test_close_twice_is_harmless() {
        let (connections, directory, lifecycle) = setup();
        let (tx, _rx) = mpsc::unbounded_channel();
        let conn = connections.register(tx).await;
        directory.register_publisher(conn).await;

        assert_eq!(lifecycle.connection_closed(conn).await.len(), 1);
        assert!(lifecycle.connection_closed(conn).await.is_empty());
        assert_eq!(connections.connection_count().await, 0);
    }

    #[tokio::test]
    async fn test_peers_are_not_notified_and_late_offer_is_dropped() {
        let (connections, directory, lifecycle) = setup();
        let router = NegotiationRouter::new(connections.clone(), directory.clone());

        let (p_tx, mut p_rx) = mpsc::unbounded_channel();
        let (s_tx, mut s_rx) = mpsc::unbounded_channel();
        let p = connections.register(p_tx).await;
        let s = connections.register(s_tx).await;

        let publisher_id = directory.register_publisher(p).await;
        router
            .handle(s, ClientMessage::SubscriberSubscribe(publisher_id.to_string()))
            .await;
        assert!(p_rx.try_recv().is_ok());

        // Subscriber vanishes mid-negotiation.
        lifecycle.connection_closed(s).await;
        assert!(p_rx.try_recv().is_err());

        router
            .handle(
                p,
                ClientMessage::PublisherSendOffer {
                    subscriber_id: s,
                    offer: serde_json::json!({ "sdp": "late" }),
                },
            )
            .await;
        assert!(p_rx.try_recv().is_err());
        assert!(s_rx.try_recv().is_err());

        // Publisher vanishes; its identity is gone for new subscribers.
        lifecycle.connection_closed(p).await;
        let (late_tx, mut late_rx) = mpsc::unbounded_channel();
        let late = connections.register(late_tx).await;
        router
            .handle(late, ClientMessage::SubscriberSubscribe(publisher_id.to_string()))
            .await;

        let reply: ServerMessage = serde_json::from_str(&late_rx.try_recv().unwrap()).unwrap();
        assert!(matches!(reply, ServerMessage::Error(_)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_identity_never_resolves_to_unregistered_connection() {
        let (connections, directory, lifecycle) = setup();
        let (tx, _rx) = mpsc::unbounded_channel();
        let p = connections.register(tx).await;
        let publisher_id = directory.register_publisher(p).await;

        let watchers: Vec<_> = (0..8)
            .map(|_| {
                let connections = connections.clone();
                let directory = directory.clone();
                tokio::spawn(async move {
                    for _ in 0..200 {
                        if let Some(owner) = directory.resolve(&publisher_id).await {
                            // A resolvable identity must still have a live connection;
                            // the entry can only vanish after the identity did.
                            let alive = connections.is_alive(owner).await;
                            let still_bound = directory.resolve(&publisher_id).await.is_some();
                            assert!(alive || !still_bound);
                        }
                        tokio::task::yield_now().await;
                    }
                })
            })
            .collect();

        lifecycle.connection_closed(p).await;

        for watcher in watchers {
            watcher.await.unwrap();
        }
        assert_eq!(directory.resolve(&publisher_id).await, None);
    }
}
