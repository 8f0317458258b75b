use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{ConnectionId, ProtocolError, PublisherId};

/// Messages sent from client to server via WebSocket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum ClientMessage {
    /// Ask for a fresh publisher identity
    PublisherRegister,

    /// Request an offer from the publisher owning this identity.
    /// Kept as a raw string so an unparseable identity reads as "not found".
    SubscriberSubscribe(String),

    /// SDP offer for a subscriber that asked for one
    PublisherSendOffer {
        subscriber_id: ConnectionId,
        offer: Value,
    },

    /// SDP answer back to the publisher
    SubscriberSendAnswer {
        publisher_id: ConnectionId,
        answer: Value,
    },

    /// ICE candidate for the other side, relayed verbatim
    IceCandidate {
        target_id: ConnectionId,
        candidate: Value,
    },

    /// Ping to keep connection alive
    Ping,
}

impl ClientMessage {
    pub fn from_json(text: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(text)?)
    }
}

/// Messages sent from server to client via WebSocket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum ServerMessage {
    /// First frame on every connection
    ConnectionEstablished { connection_id: ConnectionId },

    /// Reply to `publisher-register`
    PublisherIdAssigned(PublisherId),

    /// A subscriber wants an offer; carries the subscriber's connection id
    SubscriberOfferRequest(ConnectionId),

    /// Offer forwarded from a publisher
    PublisherOffer { offer: Value, sender_id: ConnectionId },

    /// Answer forwarded from a subscriber
    SubscriberAnswer { answer: Value, sender_id: ConnectionId },

    /// ICE candidate forwarded from either side
    IceCandidate { candidate: Value, sender_id: ConnectionId },

    /// Pong response to ping
    Pong,

    /// Error message
    Error(String),
}

impl ServerMessage {
    pub fn to_json(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }
}
