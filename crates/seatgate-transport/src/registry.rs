//! Connection registry: which wrapper belongs to which live connection.
//!
//! Entries are keyed by [`ConnectionId`], never by position, so removing
//! one connection can't disturb another even when closes interleave.
//! The registry tracks association only; it doesn't keep connections
//! alive or close them.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::{ClientWrapper, ConnectionId};

/// Keyed store of every live connection's [`ClientWrapper`].
///
/// Cheap to clone; clones share the same map.
#[derive(Clone, Default)]
pub struct ConnectionRegistry {
    entries: Arc<DashMap<ConnectionId, ClientWrapper>>,
}

impl ConnectionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the wrapper for a newly accepted connection.
    ///
    /// Returns `false` (and keeps the existing entry) if the connection is
    /// already registered.
    pub fn add(&self, id: ConnectionId, wrapper: ClientWrapper) -> bool {
        match self.entries.entry(id) {
            Entry::Occupied(_) => {
                tracing::warn!(conn_id = %id, "connection already registered");
                false
            }
            Entry::Vacant(slot) => {
                slot.insert(wrapper);
                true
            }
        }
    }

    /// Removes a connection's entry, returning its wrapper.
    ///
    /// Removing an unknown or already removed connection returns `None`.
    pub fn remove(&self, id: &ConnectionId) -> Option<ClientWrapper> {
        self.entries.remove(id).map(|(_, wrapper)| wrapper)
    }

    /// Looks up the wrapper for a connection.
    pub fn get(&self, id: &ConnectionId) -> Option<ClientWrapper> {
        self.entries.get(id).map(|entry| entry.value().clone())
    }

    /// Returns `true` if the connection is registered.
    pub fn contains(&self, id: &ConnectionId) -> bool {
        self.entries.contains_key(id)
    }

    /// Number of registered connections.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no connections are registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for ConnectionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionRegistry")
            .field("len", &self.len())
            .finish()
    }
}
