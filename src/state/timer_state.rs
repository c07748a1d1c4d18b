//! Countdown state and phase definitions

use serde::{Deserialize, Serialize};

use crate::utils::format_clock;

/// The two alternating timer modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Work,
    Break,
}

impl Phase {
    /// The phase that follows this one
    pub fn next(self) -> Self {
        match self {
            Phase::Work => Phase::Break,
            Phase::Break => Phase::Work,
        }
    }

    /// Human readable label
    pub fn label(self) -> &'static str {
        match self {
            Phase::Work => "Work",
            Phase::Break => "Break",
        }
    }
}

/// Snapshot of the countdown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerState {
    pub phase: Phase,
    pub remaining_seconds: u32,
    pub running: bool,
}

impl TimerState {
    /// Paused at the start of a work phase of the given length
    pub fn new(work_seconds: u32) -> Self {
        Self {
            phase: Phase::Work,
            remaining_seconds: work_seconds,
            running: false,
        }
    }

    /// Check if the countdown is advancing
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Remaining time as `MM:SS`
    pub fn display(&self) -> String {
        format_clock(self.remaining_seconds)
    }
}
