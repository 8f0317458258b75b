use crate::signaling::PublisherDirectory;
use crate::ws::connections::ConnectionRegistry;
use signal_relay_protocol::{ClientMessage, ConnectionId, PublisherId, ServerMessage};
use std::sync::Arc;

pub const PUBLISHER_NOT_FOUND: &str = "publisher not found";
pub const INVALID_MESSAGE: &str = "invalid message format";

/// Routes negotiation messages between publishers and subscribers.
///
/// No per-session state is kept: every forwarded message carries the
/// sender's connection id, and the only lookup is publisher identity to
/// connection. Forwards to a connection that is no longer live are dropped
/// without telling the sender.
#[derive(Clone)]
pub struct NegotiationRouter {
    connections: Arc<ConnectionRegistry>,
    directory: Arc<PublisherDirectory>,
}

impl NegotiationRouter {
    pub fn new(connections: Arc<ConnectionRegistry>, directory: Arc<PublisherDirectory>) -> Self {
        Self {
            connections,
            directory,
        }
    }

    /// Decode one text frame from `sender` and route it. Frames that do not
    /// decode are answered with an `error` and otherwise ignored.
    pub async fn handle_frame(&self, sender: ConnectionId, text: &str) {
        match ClientMessage::from_json(text) {
            Ok(message) => self.handle(sender, message).await,
            Err(e) => {
                tracing::warn!("Invalid message from {}: {}", sender, e);
                self.reply(sender, ServerMessage::Error(INVALID_MESSAGE.to_string()))
                    .await;
            }
        }
    }

    pub async fn handle(&self, sender: ConnectionId, message: ClientMessage) {
        match message {
            ClientMessage::PublisherRegister => {
                let publisher_id = self.directory.register_publisher(sender).await;
                tracing::info!("Publisher {} registered on {}", publisher_id, sender);

                self.reply(sender, ServerMessage::PublisherIdAssigned(publisher_id))
                    .await;
            }
            ClientMessage::SubscriberSubscribe(identity) => {
                self.handle_subscribe(sender, &identity).await;
            }
            ClientMessage::PublisherSendOffer {
                subscriber_id,
                offer,
            } => {
                tracing::debug!("Offer {} -> {}", sender, subscriber_id);
                self.forward(
                    subscriber_id,
                    ServerMessage::PublisherOffer {
                        offer,
                        sender_id: sender,
                    },
                )
                .await;
            }
            ClientMessage::SubscriberSendAnswer {
                publisher_id,
                answer,
            } => {
                tracing::debug!("Answer {} -> {}", sender, publisher_id);
                self.forward(
                    publisher_id,
                    ServerMessage::SubscriberAnswer {
                        answer,
                        sender_id: sender,
                    },
                )
                .await;
            }
            ClientMessage::IceCandidate {
                target_id,
                candidate,
            } => {
                tracing::debug!("ICE candidate {} -> {}", sender, target_id);
                self.forward(
                    target_id,
                    ServerMessage::IceCandidate {
                        candidate,
                        sender_id: sender,
                    },
                )
                .await;
            }
            ClientMessage::Ping => {
                self.reply(sender, ServerMessage::Pong).await;
            }
        }
    }

    async fn handle_subscribe(&self, subscriber: ConnectionId, identity: &str) {
        let publisher = match identity.parse::<PublisherId>() {
            Ok(publisher_id) => self.directory.resolve(&publisher_id).await,
            Err(_) => None,
        };

        match publisher {
            Some(publisher_conn) => {
                tracing::info!(
                    "Subscriber {} requested an offer from publisher {} ({})",
                    subscriber,
                    identity,
                    publisher_conn
                );
                let delivered = self
                    .connections
                    .send_to_connection(
                        publisher_conn,
                        &ServerMessage::SubscriberOfferRequest(subscriber),
                    )
                    .await;

                // The publisher's connection is closing and its identities
                // are about to be unbound.
                if !delivered {
                    tracing::debug!("Publisher {} is gone ({})", identity, publisher_conn);
                    self.reply(
                        subscriber,
                        ServerMessage::Error(PUBLISHER_NOT_FOUND.to_string()),
                    )
                    .await;
                }
            }
            None => {
                tracing::info!(
                    "Subscriber {} asked for unknown publisher {:?}",
                    subscriber,
                    identity
                );
                self.reply(subscriber, ServerMessage::Error(PUBLISHER_NOT_FOUND.to_string()))
                    .await;
            }
        }
    }

    async fn reply(&self, connection_id: ConnectionId, message: ServerMessage) {
        self.connections
            .send_to_connection(connection_id, &message)
            .await;
    }

    async fn forward(&self, target: ConnectionId, message: ServerMessage) {
        if !self.connections.send_to_connection(target, &message).await {
            tracing::debug!("Dropping message for dead connection {}", target);
        }
    }
}
