//! REST endpoint handlers organized by resource.

pub mod event;
pub mod gifts;
pub mod participants;
pub mod system;

use axum::Router;

use crate::app_state::AppState;

/// Composes all resource routes under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(participants::routes())
        .merge(gifts::routes())
        .merge(event::routes())
}
