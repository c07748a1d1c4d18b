//! State management module
//!
//! This module contains the timer state machine, its duration configuration
//! and the externally owned session log and theme.

pub mod duration_config;
pub mod timer_state;
pub mod engine;
pub mod session_log;
pub mod theme;
pub mod app_state;

// Re-export main types
pub use duration_config::{DurationConfig, ValidationResult};
pub use timer_state::{Phase, TimerState};
pub use engine::{TimerEngine, TimerEvent};
pub use session_log::{MarkerPosition, SessionLog, SessionMarker};
pub use theme::Theme;
pub use app_state::AppState;
