//! Error types for the room layer.

/// Errors from registering or removing rooms.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// The room does not exist.
    #[error("room {0} not found")]
    NotFound(String),

    /// A room with this id is already registered.
    #[error("room {0} is already registered")]
    AlreadyRegistered(String),
}
