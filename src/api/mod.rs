//! REST API layer: route handlers, DTOs, and router composition.
//!
//! All endpoints are mounted under `/api/v1`. Callers identify themselves
//! with the `x-participant-id` and `x-player-key` headers.

pub mod auth;
pub mod dto;
pub mod handlers;
pub mod openapi;

use std::time::Duration;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::app_state::AppState;

/// Builds the complete API router with all REST endpoints.
pub fn build_router() -> Router<AppState> {
    Router::new()
        .nest("/api/v1", handlers::routes())
        .merge(handlers::system::routes())
}

/// Builds the router with tracing, CORS and request timeout layers and
/// binds it to `state`.
pub fn build_app(state: AppState, request_timeout: Duration) -> Router {
    build_router()
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use super::*;
    use crate::domain::PasscodeGate;
    use crate::service::ExchangeService;
    use crate::store::MemoryStore;

    fn app() -> Router {
        let Ok(gate) = PasscodeGate::new("open-sesame") else {
            panic!("gate creation failed");
        };
        let service = ExchangeService::new(Arc::new(MemoryStore::new("Router Test")), gate);
        build_app(
            AppState {
                exchange_service: Arc::new(service),
            },
            Duration::from_secs(5),
        )
    }

    async fn status_of(request: Request<Body>) -> StatusCode {
        let Ok(response) = app().oneshot(request).await else {
            panic!("router failed");
        };
        response.status()
    }

    #[tokio::test]
    async fn health_is_mounted_at_root() {
        let Ok(request) = Request::get("/health").body(Body::empty()) else {
            panic!("request build failed");
        };
        assert_eq!(status_of(request).await, StatusCode::OK);
    }

    #[tokio::test]
    async fn mutations_without_credentials_are_unauthorized() {
        let Ok(request) = Request::post("/api/v1/event/reveal").body(Body::empty()) else {
            panic!("request build failed");
        };
        assert_eq!(status_of(request).await, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn join_with_wrong_passcode_is_unauthorized() {
        let Ok(request) = Request::post("/api/v1/join")
            .header("content-type", "application/json")
            .body(Body::from(
                r#"{"passcode":"nope","display_name":"Alice"}"#,
            ))
        else {
            panic!("request build failed");
        };
        assert_eq!(status_of(request).await, StatusCode::UNAUTHORIZED);
    }
}
