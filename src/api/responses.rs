//! API request and response structures

use axum::{http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{error::ControllerError, state::PopupSnapshot};

/// Response for intent endpoints: the outcome plus the popup as it now renders
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse {
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub popup: PopupSnapshot,
}

impl ApiResponse {
    pub fn new(status: &str, message: String, popup: PopupSnapshot) -> Self {
        Self {
            status: status.to_string(),
            message,
            timestamp: Utc::now(),
            popup,
        }
    }

    /// Status reflecting the master toggle
    pub fn for_popup(message: String, popup: PopupSnapshot) -> Self {
        let status = if popup.extension.active {
            "active"
        } else {
            "inactive"
        };
        Self::new(status, message, popup)
    }
}

/// Error body; `message` is the text the popup alerts with
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

/// Build an error response
pub fn api_error(code: StatusCode, message: impl Into<String>) -> ApiError {
    (
        code,
        Json(ErrorResponse {
            status: "error".to_string(),
            message: message.into(),
            timestamp: Utc::now(),
        }),
    )
}

impl From<ControllerError> for ErrorResponse {
    fn from(error: ControllerError) -> Self {
        Self {
            status: "error".to_string(),
            message: error.to_string(),
            timestamp: Utc::now(),
        }
    }
}

/// Map a controller error onto an HTTP status
pub fn controller_error(error: ControllerError) -> ApiError {
    let code = match &error {
        ControllerError::Settings(_) => StatusCode::UNPROCESSABLE_ENTITY,
        ControllerError::FeaturesSuspended(_) => StatusCode::CONFLICT,
        ControllerError::PopupClosed => StatusCode::SERVICE_UNAVAILABLE,
        ControllerError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (code, Json(ErrorResponse::from(error)))
}

/// Status response with the elapsed clock
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub popup: PopupSnapshot,
    pub status_text: String,
    /// `m:ss` since the popup opened
    pub elapsed: String,
    pub opened_at: DateTime<Utc>,
    pub active_tab: Option<u32>,
    pub host: String,
    pub port: u16,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl HealthResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Body of `POST /active`
#[derive(Debug, Clone, Deserialize)]
pub struct ActiveRequest {
    pub active: bool,
}

/// Body of `POST /features/:feature`
#[derive(Debug, Clone, Deserialize)]
pub struct FeatureRequest {
    pub enabled: bool,
}

/// Body of `POST /developer/settings`. Missing fields take the form defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsRequest {
    pub countdown_duration: Option<i64>,
    pub auto_turn_on_time: Option<i64>,
}
