//! Event status and reveal handlers.

use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::auth::require_credentials;
use crate::api::dto::{EventDto, RevealResponse};
use crate::app_state::AppState;
use crate::error::{ErrorResponse, ExchangeError};

/// `GET /event`: Event state and readiness.
///
/// # Errors
///
/// Returns [`ExchangeError`] on store failures.
#[utoipa::path(
    get,
    path = "/api/v1/event",
    tag = "Event",
    summary = "Get event status",
    description = "Returns the event, whether it has been revealed, and how many participants are ready.",
    responses(
        (status = 200, description = "Event status", body = EventDto),
    )
)]
pub async fn get_event(State(state): State<AppState>) -> Result<impl IntoResponse, ExchangeError> {
    let status = state.exchange_service.event_status().await?;
    Ok(Json(EventDto::from(status)))
}

/// `POST /event/reveal`: Ask to reveal every sender.
///
/// # Errors
///
/// Returns [`ExchangeError`] on bad credentials.
#[utoipa::path(
    post,
    path = "/api/v1/event/reveal",
    tag = "Event",
    summary = "Request the reveal",
    description = "Reveals all senders if every participant is ready. Otherwise returns `not_yet` and changes nothing. Revealing is permanent.",
    responses(
        (status = 200, description = "Reveal outcome", body = RevealResponse),
        (status = 401, description = "Missing or invalid credentials", body = ErrorResponse),
    )
)]
pub async fn request_reveal(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ExchangeError> {
    let creds = require_credentials(&headers)?;
    let outcome = state.exchange_service.request_reveal(&creds).await?;
    let status = state.exchange_service.event_status().await?;
    Ok(Json(RevealResponse::new(outcome, EventDto::from(status))))
}

/// Event routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/event", get(get_event))
        .route("/event/reveal", post(request_reveal))
}
