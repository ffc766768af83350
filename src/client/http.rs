//! Backend that talks to the exchange server over HTTP.

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;

use crate::api::auth::{PARTICIPANT_ID_HEADER, PLAYER_KEY_HEADER};
use crate::api::dto::{
    CreateGiftRequest, EventDto, GiftDto, GiftImageDto, GiftListResponse, JoinRequest,
    JoinResponse, ParticipantDto, ParticipantListResponse, RevealResponse, UpdateGiftRequest,
    UpdateMeRequest,
};
use crate::client::backend::{EventState, ExchangeBackend, Identity};
use crate::client::{ClientConfig, ClientError};
use crate::domain::{
    EventId, GiftId, GiftPatch, GiftView, NewGift, Participant, ParticipantId, Readiness,
    RevealOutcome,
};
use crate::error::ErrorResponse;

/// HTTP/JSON backend built on `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    http: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    /// Creates a backend for `config.base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Transport`] if the HTTP client cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1{path}", self.base_url)
    }

    fn signed(request: RequestBuilder, me: &Identity) -> RequestBuilder {
        request
            .header(PARTICIPANT_ID_HEADER, me.participant_id.to_string())
            .header(PLAYER_KEY_HEADER, me.player_key.as_str())
    }
}

async fn ensure_success(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let text = response.text().await.unwrap_or_default();
    let err = match serde_json::from_str::<ErrorResponse>(&text) {
        Ok(body) => ClientError::from_response(status.as_u16(), body),
        Err(_) if text.is_empty() => ClientError::from_status(status.as_u16(), status.to_string()),
        Err(_) => ClientError::from_status(status.as_u16(), text),
    };
    Err(err)
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    Ok(ensure_success(response).await?.json::<T>().await?)
}

fn participant(dto: ParticipantDto) -> Result<Participant, ClientError> {
    Participant::try_from(dto).map_err(|e| ClientError::Server(format!("malformed participant: {e}")))
}

fn gift_view(dto: GiftDto) -> Result<GiftView, ClientError> {
    GiftView::try_from(dto).map_err(|e| ClientError::Server(format!("malformed gift: {e}")))
}

#[async_trait]
impl ExchangeBackend for HttpBackend {
    async fn join(&self, passcode: &str, display_name: &str) -> Result<Identity, ClientError> {
        let body = JoinRequest {
            passcode: passcode.to_string(),
            display_name: display_name.to_string(),
        };
        let response = self.http.post(self.url("/join")).json(&body).send().await?;
        let joined: JoinResponse = read_json(response).await?;
        Ok(Identity {
            participant_id: ParticipantId::from_uuid(joined.participant.id),
            display_name: joined.participant.display_name,
            player_key: joined.player_key,
            event_id: Some(EventId::from_uuid(joined.event_id)),
        })
    }

    async fn participants(&self) -> Result<Vec<Participant>, ClientError> {
        let response = self.http.get(self.url("/participants")).send().await?;
        let list: ParticipantListResponse = read_json(response).await?;
        list.data.into_iter().map(participant).collect()
    }

    async fn gifts(&self, me: Option<&Identity>) -> Result<Vec<GiftView>, ClientError> {
        let mut request = self.http.get(self.url("/gifts"));
        if let Some(me) = me {
            request = Self::signed(request, me);
        }
        let list: GiftListResponse = read_json(request.send().await?).await?;
        list.data.into_iter().map(gift_view).collect()
    }

    async fn event(&self) -> Result<EventState, ClientError> {
        let response = self.http.get(self.url("/event")).send().await?;
        let event: EventDto = read_json(response).await?;
        Ok(EventState {
            name: event.name,
            is_revealed: event.is_revealed,
            readiness: Readiness {
                ready: event.ready_count,
                total: event.participant_count,
            },
        })
    }

    async fn add_gift(&self, me: &Identity, gift: NewGift) -> Result<GiftView, ClientError> {
        let body = CreateGiftRequest {
            to_participant_id: gift.to.into(),
            status: Some(gift.status.as_str().to_string()),
            images: gift.images.into_iter().map(GiftImageDto::from).collect(),
            message: gift.message,
            is_unlocked: gift.is_unlocked,
        };
        let request = Self::signed(self.http.post(self.url("/gifts")), me).json(&body);
        gift_view(read_json(request.send().await?).await?)
    }

    async fn update_gift(
        &self,
        me: &Identity,
        id: GiftId,
        patch: GiftPatch,
    ) -> Result<GiftView, ClientError> {
        let body = UpdateGiftRequest {
            status: patch.status.map(|s| s.as_str().to_string()),
            images: patch
                .images
                .map(|list| list.into_iter().map(GiftImageDto::from).collect()),
            message: patch.message,
            is_unlocked: patch.is_unlocked,
        };
        let request =
            Self::signed(self.http.patch(self.url(&format!("/gifts/{id}"))), me).json(&body);
        gift_view(read_json(request.send().await?).await?)
    }

    async fn toggle_lock(&self, me: &Identity, id: GiftId) -> Result<GiftView, ClientError> {
        let request = Self::signed(
            self.http.post(self.url(&format!("/gifts/{id}/toggle-lock"))),
            me,
        );
        gift_view(read_json(request.send().await?).await?)
    }

    async fn delete_gift(&self, me: &Identity, id: GiftId) -> Result<(), ClientError> {
        let request = Self::signed(self.http.delete(self.url(&format!("/gifts/{id}"))), me);
        ensure_success(request.send().await?).await?;
        Ok(())
    }

    async fn update_me(
        &self,
        me: &Identity,
        display_name: Option<String>,
        is_ready: Option<bool>,
    ) -> Result<Participant, ClientError> {
        let body = UpdateMeRequest {
            display_name,
            is_ready,
        };
        let request =
            Self::signed(self.http.patch(self.url("/participants/me")), me).json(&body);
        participant(read_json(request.send().await?).await?)
    }

    async fn request_reveal(&self, me: &Identity) -> Result<RevealOutcome, ClientError> {
        let request = Self::signed(self.http.post(self.url("/event/reveal")), me);
        let reveal: RevealResponse = read_json(request.send().await?).await?;
        match reveal.outcome.as_str() {
            "revealed" => Ok(RevealOutcome::Revealed),
            "already_revealed" => Ok(RevealOutcome::AlreadyRevealed),
            "not_yet" => Ok(RevealOutcome::NotYet {
                ready: reveal.event.ready_count,
                total: reveal.event.participant_count,
            }),
            other => Err(ClientError::Server(format!("unknown reveal outcome: {other}"))),
        }
    }

    async fn leave(&self, me: &Identity) -> Result<(), ClientError> {
        let path = format!("/participants/{}", me.participant_id);
        let request = Self::signed(self.http.delete(self.url(&path)), me);
        ensure_success(request.send().await?).await?;
        Ok(())
    }
}
