use signal_relay_protocol::{ConnectionId, PublisherId};
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;

#[derive(Default)]
struct DirectoryTable {
    /// Map from publisher identity to the connection that owns it
    owners: HashMap<PublisherId, ConnectionId>,
    /// Map from connection ID to every identity it registered
    by_connection: HashMap<ConnectionId, HashSet<PublisherId>>,
}

/// Directory of publisher identities.
///
/// Both indexes sit behind one lock, so `register_publisher`, `resolve`
/// and `unbind` never observe each other half-applied.
pub struct PublisherDirectory {
    table: RwLock<DirectoryTable>,
}

impl PublisherDirectory {
    pub fn new() -> Self {
        Self {
            table: RwLock::new(DirectoryTable::default()),
        }
    }

    /// Mint a new identity owned by `connection_id`.
    ///
    /// A connection may call this any number of times; each call yields an
    /// independent identity.
    pub async fn register_publisher(&self, connection_id: ConnectionId) -> PublisherId {
        let mut table = self.table.write().await;

        let publisher_id = loop {
            let candidate = PublisherId::new_v4();
            if !table.owners.contains_key(&candidate) {
                break candidate;
            }
        };

        table.owners.insert(publisher_id, connection_id);
        table
            .by_connection
            .entry(connection_id)
            .or_default()
            .insert(publisher_id);

        publisher_id
    }

    /// Current owner of `publisher_id`, or `None` if it was never
    /// registered or its connection has gone away.
    pub async fn resolve(&self, publisher_id: &PublisherId) -> Option<ConnectionId> {
        self.table.read().await.owners.get(publisher_id).copied()
    }

    /// Drop every identity owned by `connection_id` and return them.
    /// Calling it again for the same connection returns an empty list.
    pub async fn unbind(&self, connection_id: ConnectionId) -> Vec<PublisherId> {
        let mut table = self.table.write().await;

        let Some(owned) = table.by_connection.remove(&connection_id) else {
            return Vec::new();
        };

        for publisher_id in &owned {
            table.owners.remove(publisher_id);
        }

        owned.into_iter().collect()
    }

    pub async fn publisher_count(&self) -> usize {
        self.table.read().await.owners.len()
    }
}

impl Default for PublisherDirectory {
    fn default() -> Self {
        Self::new()
    }
}
