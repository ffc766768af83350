//! Client-side sync layer.
//!
//! A [`Session`] talks to an [`ExchangeBackend`]: either the REST server
//! through [`HttpBackend`] or a local JSON file through [`OfflineBackend`].
//! [`Session::spawn_polling`] keeps it fresh on a [`RefreshSchedule`], and
//! [`GiftCard`]s turn the redacted gifts into something drawable.

pub mod backend;
pub mod card;
pub mod config;
pub mod error;
pub mod http;
pub mod identity;
pub mod names;
pub mod offline;
pub mod poll;
pub mod session;

pub use backend::{EventState, ExchangeBackend, Identity};
pub use card::{CardActions, GiftCard, gallery};
pub use config::{ClientConfig, StorageConfig};
pub use error::ClientError;
pub use http::HttpBackend;
pub use identity::IdentityStore;
pub use names::NameCache;
pub use offline::{LocalGift, OfflineBackend};
pub use poll::{PollHandle, RefreshSchedule};
pub use session::{GiftDraft, Notice, Session};
