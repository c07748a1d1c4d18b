//! API request and response structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::state::{
    duration_config::{DEFAULT_BREAK_MINUTES, DEFAULT_WORK_MINUTES, MAX_MINUTES, MIN_MINUTES},
    DurationConfig, Phase, SessionLog, Theme, TimerState,
};

/// Countdown snapshot as shown to clients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerResponse {
    pub phase: Phase,
    pub phase_label: String,
    pub remaining_seconds: u32,
    pub display: String,
    pub running: bool,
    pub timestamp: DateTime<Utc>,
}

impl TimerResponse {
    pub fn new(state: TimerState) -> Self {
        Self {
            phase: state.phase,
            phase_label: state.phase.label().to_string(),
            remaining_seconds: state.remaining_seconds,
            display: state.display(),
            running: state.running,
            timestamp: Utc::now(),
        }
    }
}

/// Current durations with the bounds and defaults a settings form needs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingsResponse {
    pub work_minutes: u32,
    pub break_minutes: u32,
    pub default_work_minutes: u32,
    pub default_break_minutes: u32,
    pub min_minutes: u32,
    pub max_minutes: u32,
}

impl SettingsResponse {
    pub fn new(config: DurationConfig) -> Self {
        Self {
            work_minutes: config.work_minutes(),
            break_minutes: config.break_minutes(),
            default_work_minutes: DEFAULT_WORK_MINUTES,
            default_break_minutes: DEFAULT_BREAK_MINUTES,
            min_minutes: MIN_MINUTES,
            max_minutes: MAX_MINUTES,
        }
    }
}

/// Raw form contents for the two duration fields
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingsRequest {
    pub work: String,
    #[serde(rename = "break")]
    pub break_minutes: String,
}

/// Result of a successful settings update
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingsUpdateResponse {
    pub settings: SettingsResponse,
    pub timer: TimerResponse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepField {
    Work,
    Break,
}

/// One click on a stepper control
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepRequest {
    pub field: StepField,
    /// Raw contents of the field before the click
    #[serde(default)]
    pub current: String,
    pub delta: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResponse {
    pub field: StepField,
    pub value: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThemeResponse {
    pub theme: Theme,
}

/// Full status including sessions and server metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub timer: TimerResponse,
    pub work_minutes: u32,
    pub break_minutes: u32,
    pub completed_sessions: u32,
    pub theme: Theme,
    pub uptime: String,
    pub port: u16,
    pub host: String,
    pub last_action: Option<String>,
    pub last_action_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionsResponse {
    #[serde(flatten)]
    pub log: SessionLog,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl HealthResponse {
    /// Create a new health response
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
