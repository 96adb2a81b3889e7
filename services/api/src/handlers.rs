//! Axum Handlers for the REST API
//!
//! Health and session lookup endpoints. The voice traffic itself goes over
//! the websocket route in `ws`. Handlers carry `utoipa` annotations for the
//! OpenAPI document.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use ego_core::session::SessionKey;
use std::sync::Arc;
use tracing::error;

use crate::{
    models::{ErrorResponse, HealthResponse, SessionInfo},
    state::AppState,
};

pub enum ApiError {
    NotFound(String),
    InternalServerError(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::NotFound(message) => {
                (StatusCode::NOT_FOUND, Json(ErrorResponse { message })).into_response()
            }
            ApiError::InternalServerError(err) => {
                error!("Internal Server Error: {:?}", err);
                let message = "An internal server error occurred.".to_string();
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse { message }),
                )
                    .into_response()
            }
        }
    }
}

impl<E> From<E> for ApiError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self::InternalServerError(err.into())
    }
}

/// Liveness probe.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is up", body = HealthResponse)
    )
)]
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}

/// Look up a voice session opened by an earlier websocket connection.
#[utoipa::path(
    get,
    path = "/sessions/{user_id}/{session_id}",
    responses(
        (status = 200, description = "Session details", body = SessionInfo),
        (status = 404, description = "Session not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    params(
        ("user_id" = String, Path, description = "The user that owns the session"),
        ("session_id" = String, Path, description = "The client-chosen session identifier")
    )
)]
pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path((user_id, session_id)): Path<(String, String)>,
) -> Result<Json<SessionInfo>, ApiError> {
    let key = SessionKey::new(user_id, session_id);
    let session = state
        .sessions
        .get_session(&key)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Session {} not found", key)))?;
    Ok(Json(SessionInfo::from(session.as_ref())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, Provider};
    use ego_core::live::SilentAgent;
    use ego_core::session::{InMemorySessionService, SessionService};
    use std::path::PathBuf;

    fn app_state() -> Arc<AppState> {
        let config = Config {
            bind_address: "127.0.0.1:0".parse().unwrap(),
            provider: Provider::Silent,
            google_api_key: None,
            live_model: "gemini-live-2.5-flash-native-audio".to_string(),
            log_level: tracing::Level::INFO,
            prompts_path: PathBuf::from("./prompts"),
        };
        Arc::new(AppState::new(
            config,
            Arc::new(InMemorySessionService::new()),
            Arc::new(SilentAgent),
        ))
    }

    #[tokio::test]
    async fn test_health_check() {
        let Json(body) = health_check().await;
        assert_eq!(body, HealthResponse::ok());
    }

    #[tokio::test]
    async fn test_get_session_found() {
        let state = app_state();
        let key = SessionKey::new("u1", "s1");
        state.sessions.create_session(&key).await.unwrap();

        let result = get_session(State(state), Path(("u1".to_string(), "s1".to_string()))).await;

        let Json(info) = result.ok().unwrap();
        assert_eq!(info.user_id, "u1");
        assert_eq!(info.session_id, "s1");
    }

    #[tokio::test]
    async fn test_get_session_not_found() {
        let result = get_session(
            State(app_state()),
            Path(("u1".to_string(), "missing".to_string())),
        )
        .await;

        let response = result.err().unwrap().into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
