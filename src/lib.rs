//! # secret-santa
//!
//! A small gift-exchange service. Participants join with a shared
//! passcode, record gifts for each other, lock or unlock each gift's
//! contents, and reveal every sender together once everyone is ready.
//!
//! The server owns the data and redacts every gift for the caller before
//! it leaves the process. The [`client`] module is the sync layer a
//! front end drives: it polls the server, caches names, remembers the
//! local identity and can run fully offline against a JSON file.
//!
//! ## Architecture
//!
//! ```text
//! Front end
//!     │
//!     ├── Session / GiftCard (client/)
//!     ├── HttpBackend ─────────┐      OfflineBackend (local JSON)
//!     │                        │
//! REST Handlers (api/)  ◄──────┘
//!     │
//!     ├── ExchangeService (service/)
//!     ├── visibility policy (domain/)
//!     │
//!     └── ExchangeStore (store/): memory or PostgreSQL
//! ```

pub mod api;
pub mod app_state;
pub mod client;
pub mod config;
pub mod domain;
pub mod error;
pub mod service;
pub mod store;
