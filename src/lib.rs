//! Pomodoro Server - a work/break countdown timer served over HTTP
//!
//! The core is a small state machine ([`state::TimerEngine`]) that alternates
//! work and break phases and validates duration settings. The rest of the
//! crate hosts it: a ticker task drives the countdown, a recorder task keeps
//! the completed-session log, and an HTTP API exposes state and events to
//! whatever renders them.

pub mod config;
pub mod state;
pub mod api;
pub mod services;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use state::{AppState, TimerEngine, TimerEvent};
pub use api::create_router;
pub use utils::signals::shutdown_signal;
