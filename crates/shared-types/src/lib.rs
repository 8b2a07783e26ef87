use serde::{Deserialize, Serialize};

/// Body of `GET /api/auth/check`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStatus {
    pub authenticated: bool,
}

/// Body of `GET /api/auth/me`.
///
/// Profile fields are only present when `authenticated` is true.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeResponse {
    pub authenticated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
}

impl MeResponse {
    pub fn anonymous() -> Self {
        Self::default()
    }
}

/// JSON error body returned by the API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Summary of the last data sync, as served by `GET /api/data/sync-status`.
///
/// The sync job writes a larger `sync-log.json`; only these fields are exposed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_sync: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anonymous_me_has_no_profile_fields() {
        let json = serde_json::to_string(&MeResponse::anonymous()).unwrap();
        assert_eq!(json, r#"{"authenticated":false}"#);
    }

    #[test]
    fn test_error_response_serde() {
        let body = ErrorResponse::new("Unauthorized");
        assert_eq!(
            serde_json::to_string(&body).unwrap(),
            r#"{"error":"Unauthorized"}"#
        );

        let body = ErrorResponse::new("Sync log not found").with_message("No sync yet");
        let parsed: ErrorResponse =
            serde_json::from_str(&serde_json::to_string(&body).unwrap()).unwrap();
        assert_eq!(parsed.message.as_deref(), Some("No sync yet"));
    }

    #[test]
    fn test_sync_status_ignores_extra_log_fields() {
        let log = r#"{
            "last_sync": "2024-05-01T02:00:00Z",
            "status": "success",
            "duration_seconds": 12.5,
            "files": [{"name": "revenue-history.csv", "rows": 120}]
        }"#;
        let status: SyncStatus = serde_json::from_str(log).unwrap();
        assert_eq!(status.status.as_deref(), Some("success"));
        assert_eq!(status.duration_seconds, Some(12.5));
    }
}
