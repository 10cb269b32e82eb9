//! HTTP endpoint handlers
//!
//! Each intent handler forwards to the popup event loop and answers with the
//! snapshot rendered after the intent was applied.

use std::{convert::Infallible, sync::Arc, time::Duration};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        Json,
    },
};
use futures::stream::{Stream, StreamExt};
use tracing::{error, info, warn};

use super::{
    app_state::AppState,
    responses::{
        api_error, controller_error, ActiveRequest, ApiError, ApiResponse, FeatureRequest,
        HealthResponse, SettingsRequest, StatusResponse,
    },
};
use crate::{
    messaging::TabId,
    state::{Feature, UnlockProgress, DEFAULT_AUTO_TURN_ON_MINUTES, DEFAULT_COUNTDOWN_MINUTES},
};

/// Handle POST /toggle - Main toggle click
pub async fn toggle_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse>, ApiError> {
    let extension = state.popup.toggle().await.map_err(|e| {
        error!("Failed to flip main toggle: {}", e);
        controller_error(e)
    })?;

    let message = if extension.active {
        "Blocking turned on".to_string()
    } else {
        format!("Blocking turned off for {}", state.snapshot().countdown.remaining)
    };
    Ok(Json(ApiResponse::for_popup(message, state.snapshot())))
}

/// Handle POST /active - Extension checkbox in the menu
pub async fn active_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ActiveRequest>,
) -> Result<Json<ApiResponse>, ApiError> {
    let extension = state.popup.set_active(request.active).await.map_err(|e| {
        error!("Failed to set master toggle: {}", e);
        controller_error(e)
    })?;

    info!("Extension toggle changed: {}", extension.active);
    Ok(Json(ApiResponse::for_popup(
        format!("Extension enabled: {}", extension.active),
        state.snapshot(),
    )))
}

/// Handle POST /features/:feature - Feature checkbox change
pub async fn feature_handler(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Json(request): Json<FeatureRequest>,
) -> Result<Json<ApiResponse>, ApiError> {
    let Some(feature) = Feature::from_name(&name) else {
        warn!("Unknown feature requested: {}", name);
        return Err(api_error(
            StatusCode::NOT_FOUND,
            format!("Unknown feature: {}", name),
        ));
    };

    state
        .popup
        .set_feature(feature, request.enabled)
        .await
        .map_err(controller_error)?;

    Ok(Json(ApiResponse::for_popup(
        format!("{} set to {}", feature.as_str(), request.enabled),
        state.snapshot(),
    )))
}

/// Handle POST /developer/unlock - Click on the hidden developer control
pub async fn developer_unlock_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse>, ApiError> {
    let progress = state
        .popup
        .click_developer_unlock()
        .await
        .map_err(controller_error)?;

    let message = match progress {
        UnlockProgress::Counting { clicks, required } => {
            format!("Developer unlock click: {}/{}", clicks, required)
        }
        UnlockProgress::Unlocked => "Developer mode unlocked".to_string(),
        UnlockProgress::OptionsToggled { visible: true } => "Developer options shown".to_string(),
        UnlockProgress::OptionsToggled { visible: false } => {
            "Developer options hidden".to_string()
        }
    };
    Ok(Json(ApiResponse::for_popup(message, state.snapshot())))
}

/// Handle POST /developer/settings - Save developer settings
pub async fn developer_settings_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SettingsRequest>,
) -> Result<Json<ApiResponse>, ApiError> {
    let countdown = request
        .countdown_duration
        .unwrap_or(i64::from(DEFAULT_COUNTDOWN_MINUTES));
    let auto_turn_on = request
        .auto_turn_on_time
        .unwrap_or(i64::from(DEFAULT_AUTO_TURN_ON_MINUTES));

    let settings = state
        .popup
        .save_developer_settings(countdown, auto_turn_on)
        .await
        .map_err(controller_error)?;

    Ok(Json(ApiResponse::for_popup(
        format!(
            "Saved: countdown {} min, auto turn-on {} min",
            settings.countdown_duration_minutes, settings.auto_turn_on_time_minutes
        ),
        state.snapshot(),
    )))
}

/// Handle GET /status - Render the popup
pub async fn status_handler(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let popup = state.snapshot();
    Json(StatusResponse {
        status_text: popup.status_text().to_string(),
        popup,
        elapsed: state.elapsed_display(),
        opened_at: state.elapsed.start_time(),
        active_tab: state.active_tab(),
        host: state.host.clone(),
        port: state.port,
    })
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}

/// Handle POST /tabs/:tab/focus - Mark a tab as the active tab
pub async fn focus_tab_handler(
    State(state): State<Arc<AppState>>,
    Path(tab): Path<u32>,
) -> StatusCode {
    state.bridge.focus(TabId(tab));
    StatusCode::NO_CONTENT
}

/// Handle GET /tabs/:tab/messages - Content-script message stream
pub async fn tab_messages_handler(
    State(state): State<Arc<AppState>>,
    Path(tab): Path<u32>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let listener = state.bridge.subscribe(TabId(tab));

    let stream = listener.into_stream().filter_map(|message| async move {
        let data = serde_json::to_string(&message).ok()?;
        Some(Ok(Event::default().event(message.action()).data(data)))
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}
