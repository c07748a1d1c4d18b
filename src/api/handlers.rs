//! HTTP endpoint handlers

use std::{convert::Infallible, sync::Arc};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Json, Response,
    },
};
use futures::stream::{self, Stream};
use tokio::sync::broadcast::error::RecvError;
use tracing::{error, info, warn};

use crate::state::{duration_config, AppState, MarkerPosition, SessionMarker, TimerState};
use super::responses::{
    HealthResponse, SessionsResponse, SettingsRequest, SettingsResponse, SettingsUpdateResponse,
    StatusResponse, StepField, StepRequest, StepResponse, ThemeResponse, TimerResponse,
};

fn timer_result(action: &str, result: Result<TimerState, String>) -> Result<Json<TimerResponse>, StatusCode> {
    match result {
        Ok(timer_state) => {
            info!("{} endpoint called - {} with {}s remaining",
                  action, timer_state.phase.label(), timer_state.remaining_seconds);
            Ok(Json(TimerResponse::new(timer_state)))
        }
        Err(e) => {
            error!("Failed to {} timer: {}", action, e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Handle POST /start - Start the countdown
pub async fn start_handler(State(state): State<Arc<AppState>>) -> Result<Json<TimerResponse>, StatusCode> {
    timer_result("start", state.start())
}

/// Handle POST /pause - Pause the countdown
pub async fn pause_handler(State(state): State<Arc<AppState>>) -> Result<Json<TimerResponse>, StatusCode> {
    timer_result("pause", state.pause())
}

/// Handle POST /toggle - Start if paused, pause if running
pub async fn toggle_handler(State(state): State<Arc<AppState>>) -> Result<Json<TimerResponse>, StatusCode> {
    timer_result("toggle", state.toggle())
}

/// Handle POST /reset - Back to a paused work phase
pub async fn reset_handler(State(state): State<Arc<AppState>>) -> Result<Json<TimerResponse>, StatusCode> {
    timer_result("reset", state.reset())
}

/// Handle GET /status - Return current timer status
pub async fn status_handler(State(state): State<Arc<AppState>>) -> Result<Json<StatusResponse>, StatusCode> {
    let timer_state = state.get_timer_state().map_err(internal_error)?;
    let durations = state.get_durations().map_err(internal_error)?;
    let sessions = state.get_sessions().map_err(internal_error)?;
    let theme = state.get_theme().map_err(internal_error)?;
    let (last_action, last_action_time) = state.get_last_action();

    Ok(Json(StatusResponse {
        timer: TimerResponse::new(timer_state),
        work_minutes: durations.work_minutes(),
        break_minutes: durations.break_minutes(),
        completed_sessions: sessions.completed,
        theme,
        uptime: state.get_uptime(),
        port: state.port,
        host: state.host.clone(),
        last_action,
        last_action_time,
    }))
}

/// Handle GET /settings - Current durations, defaults and bounds
pub async fn settings_handler(State(state): State<Arc<AppState>>) -> Result<Json<SettingsResponse>, StatusCode> {
    let durations = state.get_durations().map_err(internal_error)?;
    Ok(Json(SettingsResponse::new(durations)))
}

/// Handle POST /settings/validate - Check raw inputs without applying them
pub async fn validate_settings_handler(Json(request): Json<SettingsRequest>) -> Json<duration_config::ValidationResult> {
    Json(duration_config::validate(&request.work, &request.break_minutes))
}

/// Handle PUT /settings - Validate and apply new durations
pub async fn update_settings_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SettingsRequest>,
) -> Response {
    let validation = duration_config::validate(&request.work, &request.break_minutes);
    let Some((work, brk)) = validation.minutes else {
        warn!("Rejected settings: work={:?}, break={:?}", validation.work_error, validation.break_error);
        return (StatusCode::UNPROCESSABLE_ENTITY, Json(validation)).into_response();
    };

    let timer_state = match state.apply_durations(work, brk) {
        Ok(timer_state) => timer_state,
        Err(e) => {
            error!("Failed to apply settings: {}", e);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    match state.get_durations() {
        Ok(durations) => Json(SettingsUpdateResponse {
            settings: SettingsResponse::new(durations),
            timer: TimerResponse::new(timer_state),
        })
        .into_response(),
        Err(e) => internal_error(e).into_response(),
    }
}

/// Handle POST /settings/step - Apply a stepper click, always in bounds
pub async fn step_settings_handler(Json(request): Json<StepRequest>) -> Json<StepResponse> {
    Json(StepResponse {
        field: request.field,
        value: duration_config::step_minutes(&request.current, request.delta),
    })
}

/// Handle GET /settings/default/:field - Default value for one field
pub async fn default_settings_handler(Path(field): Path<String>) -> Result<Json<StepResponse>, StatusCode> {
    let (field, value) = match field.as_str() {
        "work" => (StepField::Work, duration_config::DEFAULT_WORK_MINUTES),
        "break" => (StepField::Break, duration_config::DEFAULT_BREAK_MINUTES),
        _ => return Err(StatusCode::BAD_REQUEST),
    };
    Ok(Json(StepResponse { field, value }))
}

/// Handle GET /sessions - Completed sessions and markers
pub async fn sessions_handler(State(state): State<Arc<AppState>>) -> Result<Json<SessionsResponse>, StatusCode> {
    let log = state.get_sessions().map_err(internal_error)?;
    Ok(Json(SessionsResponse { log }))
}

/// Handle PUT /sessions/markers/:index - Store where a marker was dropped
pub async fn place_marker_handler(
    State(state): State<Arc<AppState>>,
    Path(index): Path<usize>,
    Json(position): Json<MarkerPosition>,
) -> Result<Json<SessionMarker>, StatusCode> {
    match state.place_marker(index, position).map_err(internal_error)? {
        Some(marker) => {
            state.persist().await;
            Ok(Json(marker))
        }
        None => Err(StatusCode::NOT_FOUND),
    }
}

/// Handle DELETE /sessions - Forget all completed sessions
pub async fn clear_sessions_handler(State(state): State<Arc<AppState>>) -> Result<Json<SessionsResponse>, StatusCode> {
    let log = state.clear_sessions().map_err(internal_error)?;
    state.persist().await;
    Ok(Json(SessionsResponse { log }))
}

/// Handle GET /theme
pub async fn theme_handler(State(state): State<Arc<AppState>>) -> Result<Json<ThemeResponse>, StatusCode> {
    let theme = state.get_theme().map_err(internal_error)?;
    Ok(Json(ThemeResponse { theme }))
}

/// Handle POST /theme/toggle
pub async fn toggle_theme_handler(State(state): State<Arc<AppState>>) -> Result<Json<ThemeResponse>, StatusCode> {
    let theme = state.toggle_theme().map_err(internal_error)?;
    state.persist().await;
    Ok(Json(ThemeResponse { theme }))
}

/// Handle GET /events - Stream engine events as server-sent events
pub async fn events_handler(State(state): State<Arc<AppState>>) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let event_rx = state.event_tx.subscribe();

    let stream = stream::unfold(event_rx, |mut event_rx| async move {
        loop {
            match event_rx.recv().await {
                Ok(timer_event) => {
                    let event = match Event::default().json_data(&timer_event) {
                        Ok(event) => event,
                        Err(e) => {
                            warn!("Failed to encode event: {}", e);
                            continue;
                        }
                    };
                    return Some((Ok(event), event_rx));
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Event stream client lagged by {} events", skipped);
                }
                Err(RecvError::Closed) => return None,
            }
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}

fn internal_error(e: String) -> StatusCode {
    error!("{}", e);
    StatusCode::INTERNAL_SERVER_ERROR
}
