//! OpenAPI document for the exchange API.

use utoipa::OpenApi;

use crate::api::dto::{
    CreateGiftRequest, EventDto, GiftAccessDto, GiftDto, GiftImageDto, GiftListResponse,
    JoinRequest, JoinResponse, ParticipantDto, ParticipantListResponse, RevealResponse,
    UpdateGiftRequest, UpdateMeRequest,
};
use crate::api::handlers::{event, gifts, participants, system};
use crate::error::{ErrorBody, ErrorResponse};

/// Generated OpenAPI specification, served by Swagger UI when the
/// `swagger-ui` feature is enabled.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "Secret Santa API",
        description = "Gift exchange with hidden senders, per-gift locks and a group reveal."
    ),
    paths(
        participants::join,
        participants::list_participants,
        participants::update_me,
        participants::remove_participant,
        gifts::list_gifts,
        gifts::create_gift,
        gifts::update_gift,
        gifts::toggle_lock,
        gifts::delete_gift,
        event::get_event,
        event::request_reveal,
        system::health_handler,
    ),
    components(schemas(
        JoinRequest,
        JoinResponse,
        ParticipantDto,
        ParticipantListResponse,
        UpdateMeRequest,
        CreateGiftRequest,
        UpdateGiftRequest,
        GiftImageDto,
        GiftAccessDto,
        GiftDto,
        GiftListResponse,
        EventDto,
        RevealResponse,
        system::HealthResponse,
        ErrorResponse,
        ErrorBody,
    )),
    tags(
        (name = "Participants", description = "Joining, roster and readiness"),
        (name = "Gifts", description = "Gift records and locks"),
        (name = "Event", description = "Event status and the group reveal"),
        (name = "System", description = "Health"),
    )
)]
pub struct ApiDoc;
