use crate::error::RegistryError;
use crate::signaling::ConnectionHandle;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Arc;
use switchboard_core::PeerId;
use tracing::error;

/// Live connections by peer identity.
///
/// Lookups and removals of the same identity exclude each other through the map's
/// shard locks; operations on different identities do not contend.
#[derive(Clone, Default)]
pub struct ConnectionRegistry {
    connections: Arc<DashMap<PeerId, ConnectionHandle>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, handle: ConnectionHandle) -> Result<(), RegistryError> {
        match self.connections.entry(handle.peer_id().clone()) {
            Entry::Occupied(existing) => {
                error!(
                    peer = %existing.key(),
                    "Refusing to register a second connection under a live identity"
                );
                Err(RegistryError::DuplicateIdentity(existing.key().clone()))
            }
            Entry::Vacant(slot) => {
                slot.insert(handle);
                Ok(())
            }
        }
    }

    pub fn lookup(&self, peer_id: &PeerId) -> Result<ConnectionHandle, RegistryError> {
        self.connections
            .get(peer_id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| RegistryError::NotFound(peer_id.clone()))
    }

    /// Removes whatever is registered under `peer_id`. Missing ids are ignored.
    pub fn remove(&self, peer_id: &PeerId) -> Option<ConnectionHandle> {
        self.connections.remove(peer_id).map(|(_, handle)| handle)
    }

    /// Removes `handle` only if it is still the registered connection for its identity.
    pub fn remove_connection(&self, handle: &ConnectionHandle) -> bool {
        self.connections
            .remove_if(handle.peer_id(), |_, current| {
                current.conn_id() == handle.conn_id()
            })
            .is_some()
    }

    pub fn contains(&self, peer_id: &PeerId) -> bool {
        self.connections.contains_key(peer_id)
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}
