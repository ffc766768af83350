//! Gift handlers: list, create, update, toggle lock, delete.

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, patch, post};
use axum::{Json, Router};

use crate::api::auth::{optional_credentials, require_credentials};
use crate::api::dto::{CreateGiftRequest, GiftDto, GiftListResponse, UpdateGiftRequest};
use crate::app_state::AppState;
use crate::domain::{GiftId, GiftPatch, NewGift};
use crate::error::{ErrorResponse, ExchangeError};

/// `GET /gifts`: List gifts redacted for the caller.
///
/// # Errors
///
/// Returns [`ExchangeError::InvalidCredentials`] if credentials are sent
/// but wrong.
#[utoipa::path(
    get,
    path = "/api/v1/gifts",
    tag = "Gifts",
    summary = "List gifts",
    description = "Returns all gifts in creation order. Senders, contents and status are hidden according to the caller's relationship to each gift and the reveal state. Anonymous callers see only public fields.",
    responses(
        (status = 200, description = "Redacted gift list", body = GiftListResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
    )
)]
pub async fn list_gifts(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ExchangeError> {
    let creds = optional_credentials(&headers)?;
    let views = state.exchange_service.list_gifts(creds.as_ref()).await?;
    Ok(Json(GiftListResponse {
        data: views.into_iter().map(GiftDto::from).collect(),
    }))
}

/// `POST /gifts`: Record a gift from the caller.
///
/// # Errors
///
/// Returns [`ExchangeError`] on validation failure or after the reveal.
#[utoipa::path(
    post,
    path = "/api/v1/gifts",
    tag = "Gifts",
    summary = "Add a gift",
    description = "Creates a gift sent by the caller. Gifts start locked unless `is_unlocked` is set.",
    request_body = CreateGiftRequest,
    responses(
        (status = 201, description = "Gift created", body = GiftDto),
        (status = 400, description = "Invalid gift", body = ErrorResponse),
        (status = 401, description = "Missing or invalid credentials", body = ErrorResponse),
        (status = 409, description = "Event already revealed", body = ErrorResponse),
    )
)]
pub async fn create_gift(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateGiftRequest>,
) -> Result<impl IntoResponse, ExchangeError> {
    let creds = require_credentials(&headers)?;
    let new_gift = NewGift::try_from(req)?;
    let view = state.exchange_service.add_gift(&creds, new_gift).await?;
    Ok((StatusCode::CREATED, Json(GiftDto::from(view))))
}

/// `PATCH /gifts/{id}`: Edit a gift.
///
/// # Errors
///
/// Returns [`ExchangeError::Forbidden`] unless the caller sent the gift.
#[utoipa::path(
    patch,
    path = "/api/v1/gifts/{id}",
    tag = "Gifts",
    summary = "Update a gift",
    description = "Changes status, images, message or lock flag. Only the sender may do this.",
    params(
        ("id" = uuid::Uuid, Path, description = "Gift UUID"),
    ),
    request_body = UpdateGiftRequest,
    responses(
        (status = 200, description = "Updated gift", body = GiftDto),
        (status = 400, description = "Invalid update", body = ErrorResponse),
        (status = 403, description = "Not the sender", body = ErrorResponse),
        (status = 404, description = "Gift not found", body = ErrorResponse),
    )
)]
pub async fn update_gift(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<uuid::Uuid>,
    Json(req): Json<UpdateGiftRequest>,
) -> Result<impl IntoResponse, ExchangeError> {
    let creds = require_credentials(&headers)?;
    let patch = GiftPatch::try_from(req)?;
    let view = state
        .exchange_service
        .update_gift(&creds, GiftId::from_uuid(id), patch)
        .await?;
    Ok(Json(GiftDto::from(view)))
}

/// `POST /gifts/{id}/toggle-lock`: Lock or unlock a gift.
///
/// # Errors
///
/// Returns [`ExchangeError::Forbidden`] unless the caller sent the gift.
#[utoipa::path(
    post,
    path = "/api/v1/gifts/{id}/toggle-lock",
    tag = "Gifts",
    summary = "Toggle gift lock",
    description = "Flips the lock. An unlocked gift shows its contents to the recipient; the sender stays hidden until the reveal.",
    params(
        ("id" = uuid::Uuid, Path, description = "Gift UUID"),
    ),
    responses(
        (status = 200, description = "Gift with new lock state", body = GiftDto),
        (status = 403, description = "Not the sender", body = ErrorResponse),
        (status = 404, description = "Gift not found", body = ErrorResponse),
    )
)]
pub async fn toggle_lock(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, ExchangeError> {
    let creds = require_credentials(&headers)?;
    let view = state
        .exchange_service
        .toggle_lock(&creds, GiftId::from_uuid(id))
        .await?;
    Ok(Json(GiftDto::from(view)))
}

/// `DELETE /gifts/{id}`: Delete a gift.
///
/// # Errors
///
/// Returns [`ExchangeError::Forbidden`] unless the caller sent the gift.
#[utoipa::path(
    delete,
    path = "/api/v1/gifts/{id}",
    tag = "Gifts",
    summary = "Delete a gift",
    description = "Removes a gift. Only the sender may do this.",
    params(
        ("id" = uuid::Uuid, Path, description = "Gift UUID"),
    ),
    responses(
        (status = 204, description = "Gift deleted"),
        (status = 403, description = "Not the sender", body = ErrorResponse),
        (status = 404, description = "Gift not found", body = ErrorResponse),
    )
)]
pub async fn delete_gift(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, ExchangeError> {
    let creds = require_credentials(&headers)?;
    state
        .exchange_service
        .delete_gift(&creds, GiftId::from_uuid(id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Gift routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/gifts", get(list_gifts).post(create_gift))
        .route("/gifts/{id}", patch(update_gift).delete(delete_gift))
        .route("/gifts/{id}/toggle-lock", post(toggle_lock))
}
