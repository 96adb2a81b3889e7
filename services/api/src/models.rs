//! REST response bodies.

use chrono::{DateTime, Utc};
use ego_core::session::Session;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema, Debug, PartialEq)]
pub struct HealthResponse {
    pub status: String,
}

impl HealthResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }
}

/// A voice session as known to this process.
#[derive(Serialize, ToSchema, Debug, Clone, PartialEq)]
pub struct SessionInfo {
    pub user_id: String,
    pub session_id: String,
    pub created_at: DateTime<Utc>,
}

impl From<&Session> for SessionInfo {
    fn from(session: &Session) -> Self {
        Self {
            user_id: session.key.user_id.clone(),
            session_id: session.key.session_id.clone(),
            created_at: session.created_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use ego_core::session::SessionKey;

    #[test]
    fn test_health_response_serialization() {
        let json = serde_json::to_string(&HealthResponse::ok()).unwrap();
        assert_eq!(json, r#"{"status":"ok"}"#);
    }

    #[test]
    fn test_session_info_from_session() {
        let created_at = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let session = Session {
            key: SessionKey::new("player-1", "world-9"),
            created_at,
        };

        let info = SessionInfo::from(&session);
        let json = serde_json::to_value(&info).unwrap();

        assert_eq!(json["user_id"], "player-1");
        assert_eq!(json["session_id"], "world-9");
        assert_eq!(json["created_at"], "2026-03-01T12:00:00Z");
    }

    #[test]
    fn test_error_response_serialization() {
        let error = ErrorResponse {
            message: "Session not found".to_string(),
        };

        let json = serde_json::to_string(&error).unwrap();
        assert_eq!(json, r#"{"message":"Session not found"}"#);
    }
}
