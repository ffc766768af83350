//! Service layer: authorization and state transitions.
//!
//! [`ExchangeService`] authenticates callers by player key, enforces
//! per-row ownership, runs the lock and reveal transitions and redacts
//! gifts for the viewer before they leave the process.

pub mod exchange_service;

pub use exchange_service::{
    Credentials, EventStatus, ExchangeService, JoinReceipt, ParticipantUpdate,
};
