//! Data Transfer Objects for REST request/response serialization.
//!
//! Identifiers are plain UUIDs on the wire. The client library reuses
//! these types to decode responses.

pub mod event_dto;
pub mod gift_dto;
pub mod participant_dto;

pub use event_dto::*;
pub use gift_dto::*;
pub use participant_dto::*;
