//! Join and participant handlers.

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{delete, get, patch, post};
use axum::{Json, Router};

use crate::api::auth::require_credentials;
use crate::api::dto::{
    JoinRequest, JoinResponse, ParticipantDto, ParticipantListResponse, UpdateMeRequest,
};
use crate::app_state::AppState;
use crate::domain::ParticipantId;
use crate::error::{ErrorResponse, ExchangeError};
use crate::service::ParticipantUpdate;

/// `POST /join`: Join the event with the shared passcode.
///
/// # Errors
///
/// Returns [`ExchangeError`] on a wrong passcode or a bad or taken name.
#[utoipa::path(
    post,
    path = "/api/v1/join",
    tag = "Participants",
    summary = "Join the event",
    description = "Checks the event passcode, creates a participant and returns a player key. The key is shown only once.",
    request_body = JoinRequest,
    responses(
        (status = 201, description = "Joined", body = JoinResponse),
        (status = 400, description = "Invalid display name", body = ErrorResponse),
        (status = 401, description = "Wrong passcode", body = ErrorResponse),
        (status = 409, description = "Display name taken", body = ErrorResponse),
    )
)]
pub async fn join(
    State(state): State<AppState>,
    Json(req): Json<JoinRequest>,
) -> Result<impl IntoResponse, ExchangeError> {
    let receipt = state
        .exchange_service
        .join(&req.passcode, &req.display_name)
        .await?;
    let response = JoinResponse {
        participant: ParticipantDto::from(&receipt.participant),
        player_key: receipt.player_key.expose().to_string(),
        event_id: receipt.event_id.into(),
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// `GET /participants`: List participants.
///
/// # Errors
///
/// Returns [`ExchangeError`] on store failures.
#[utoipa::path(
    get,
    path = "/api/v1/participants",
    tag = "Participants",
    summary = "List participants",
    description = "Returns every participant in join order, including readiness.",
    responses(
        (status = 200, description = "Participant roster", body = ParticipantListResponse),
    )
)]
pub async fn list_participants(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ExchangeError> {
    let participants = state.exchange_service.list_participants().await?;
    Ok(Json(ParticipantListResponse {
        data: participants.iter().map(ParticipantDto::from).collect(),
    }))
}

/// `PATCH /participants/me`: Rename or change readiness.
///
/// # Errors
///
/// Returns [`ExchangeError`] on bad credentials or an invalid rename.
#[utoipa::path(
    patch,
    path = "/api/v1/participants/me",
    tag = "Participants",
    summary = "Update own participant",
    description = "Changes the caller's display name and/or readiness for the reveal.",
    request_body = UpdateMeRequest,
    responses(
        (status = 200, description = "Updated participant", body = ParticipantDto),
        (status = 400, description = "Invalid display name", body = ErrorResponse),
        (status = 401, description = "Missing or invalid credentials", body = ErrorResponse),
        (status = 409, description = "Display name taken", body = ErrorResponse),
    )
)]
pub async fn update_me(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<UpdateMeRequest>,
) -> Result<impl IntoResponse, ExchangeError> {
    let creds = require_credentials(&headers)?;
    let update = ParticipantUpdate {
        display_name: req.display_name,
        is_ready: req.is_ready,
    };
    let me = state.exchange_service.update_me(&creds, update).await?;
    Ok(Json(ParticipantDto::from(&me)))
}

/// `DELETE /participants/{id}`: Leave the event.
///
/// # Errors
///
/// Returns [`ExchangeError::Forbidden`] when removing someone else.
#[utoipa::path(
    delete,
    path = "/api/v1/participants/{id}",
    tag = "Participants",
    summary = "Leave the event",
    description = "Removes the caller and every gift they sent or received. Participants can only remove themselves.",
    params(
        ("id" = uuid::Uuid, Path, description = "Participant UUID"),
    ),
    responses(
        (status = 204, description = "Participant removed"),
        (status = 401, description = "Missing or invalid credentials", body = ErrorResponse),
        (status = 403, description = "Not the caller", body = ErrorResponse),
    )
)]
pub async fn remove_participant(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, ExchangeError> {
    let creds = require_credentials(&headers)?;
    state
        .exchange_service
        .remove_participant(&creds, ParticipantId::from_uuid(id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Participant routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/join", post(join))
        .route("/participants", get(list_participants))
        .route("/participants/me", patch(update_me))
        .route("/participants/{id}", delete(remove_participant))
}
