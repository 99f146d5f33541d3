//! In-memory room directory.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::{Room, RoomDirectory, RoomError};

/// Keeps every live room, keyed by room id.
///
/// Reads (the onboarder looking a room up) vastly outnumber writes (rooms
/// being created or disposed), hence the `RwLock`.
#[derive(Default)]
pub struct RoomRegistry {
    rooms: RwLock<HashMap<String, Arc<dyn Room>>>,
}

impl RoomRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a room under its own id.
    ///
    /// # Errors
    /// [`RoomError::AlreadyRegistered`] if the id is taken.
    pub fn insert(&self, room: Arc<dyn Room>) -> Result<(), RoomError> {
        let room_id = room.room_id().to_string();
        let mut rooms = self.rooms.write();
        if rooms.contains_key(&room_id) {
            return Err(RoomError::AlreadyRegistered(room_id));
        }
        tracing::info!(%room_id, "room registered");
        rooms.insert(room_id, room);
        Ok(())
    }

    /// Unregisters a room.
    ///
    /// # Errors
    /// [`RoomError::NotFound`] if no room has this id.
    pub fn remove(&self, room_id: &str) -> Result<Arc<dyn Room>, RoomError> {
        let room = self
            .rooms
            .write()
            .remove(room_id)
            .ok_or_else(|| RoomError::NotFound(room_id.to_string()))?;
        tracing::info!(%room_id, "room unregistered");
        Ok(room)
    }

    /// Lists the ids of every registered room.
    pub fn room_ids(&self) -> Vec<String> {
        self.rooms.read().keys().cloned().collect()
    }

    /// Number of registered rooms.
    pub fn len(&self) -> usize {
        self.rooms.read().len()
    }

    /// Returns `true` if no rooms are registered.
    pub fn is_empty(&self) -> bool {
        self.rooms.read().is_empty()
    }
}

impl RoomDirectory for RoomRegistry {
    fn get_room_by_id(&self, room_id: &str) -> Option<Arc<dyn Room>> {
        self.rooms.read().get(room_id).cloned()
    }
}
