//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::service::ExchangeService;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Exchange service for all business logic.
    pub exchange_service: Arc<ExchangeService>,
}
