//! External service module
//!
//! This module contains the persistence layer that keeps session markers
//! and the theme across restarts.

pub mod storage;

// Re-export main types
pub use storage::{PersistedState, StateStore};
