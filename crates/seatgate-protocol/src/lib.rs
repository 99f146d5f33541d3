//! Wire protocol for Seatgate.
//!
//! This crate defines what the server says to clients and how failures are
//! described, on both the socket and the HTTP side:
//!
//! - **Types** ([`ServerMessage`], [`ErrorCode`], [`RoomListing`],
//!   [`ErrorBody`]): the structures that travel on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how those structures
//!   are converted to/from bytes.
//! - **Errors**: [`ProtocolError`] for encode/decode failures and
//!   [`ServerError`], the single tagged error shared by connection
//!   onboarding and matchmake dispatch.
//!
//! ```text
//! Transport (bytes) → Protocol (frames, ServerError) → Session / Room
//! ```

mod codec;
mod error;
mod server_error;
mod types;

pub use codec::{Codec, JsonCodec};
pub use error::ProtocolError;
pub use server_error::{ErrorKind, ServerError};
pub use types::{ErrorBody, ErrorCode, RoomListing, ServerMessage};
