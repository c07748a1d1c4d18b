//! Background tasks module
//!
//! This module contains the background tasks that run alongside the HTTP server.

pub mod ticker;
pub mod session_recorder;

// Re-export main functions
pub use ticker::ticker_task;
pub use session_recorder::session_recorder_task;
