//! Work/break duration configuration and candidate validation

use std::num::IntErrorKind;

use serde::{Deserialize, Serialize};

/// Default work phase length in minutes
pub const DEFAULT_WORK_MINUTES: u32 = 25;
/// Default break phase length in minutes
pub const DEFAULT_BREAK_MINUTES: u32 = 5;
/// Smallest accepted phase length in minutes
pub const MIN_MINUTES: u32 = 1;
/// Largest accepted phase length in minutes
pub const MAX_MINUTES: u32 = 999;

/// Validated phase durations, stored in seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DurationConfig {
    work_seconds: u32,
    break_seconds: u32,
}

impl DurationConfig {
    /// Create a configuration with the default 25/5 minute split
    pub fn new() -> Self {
        Self::from_minutes(DEFAULT_WORK_MINUTES, DEFAULT_BREAK_MINUTES)
    }

    /// Create a configuration from minute counts that are already in bounds
    pub fn from_minutes(work_minutes: u32, break_minutes: u32) -> Self {
        let mut config = Self {
            work_seconds: 0,
            break_seconds: 0,
        };
        config.apply(work_minutes, break_minutes);
        config
    }

    pub fn work_seconds(&self) -> u32 {
        self.work_seconds
    }

    pub fn break_seconds(&self) -> u32 {
        self.break_seconds
    }

    pub fn work_minutes(&self) -> u32 {
        self.work_seconds / 60
    }

    pub fn break_minutes(&self) -> u32 {
        self.break_seconds / 60
    }

    /// Store new durations.
    ///
    /// The values are expected to have gone through [`validate`] or
    /// [`clamp_minutes`] already; nothing is re-checked here.
    pub fn apply(&mut self, work_minutes: u32, break_minutes: u32) {
        debug_assert!((MIN_MINUTES..=MAX_MINUTES).contains(&work_minutes));
        debug_assert!((MIN_MINUTES..=MAX_MINUTES).contains(&break_minutes));

        self.work_seconds = work_minutes * 60;
        self.break_seconds = break_minutes * 60;
    }
}

impl Default for DurationConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of validating a pair of raw duration inputs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub work_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub break_error: Option<String>,
    /// Parsed minute counts, present only when both fields are valid
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minutes: Option<(u32, u32)>,
}

/// Validate raw work and break inputs independently of each other
pub fn validate(raw_work: &str, raw_break: &str) -> ValidationResult {
    let work = parse_field("Work", raw_work);
    let brk = parse_field("Break", raw_break);

    match (work, brk) {
        (Ok(work), Ok(brk)) => ValidationResult {
            valid: true,
            work_error: None,
            break_error: None,
            minutes: Some((work, brk)),
        },
        (work, brk) => ValidationResult {
            valid: false,
            work_error: work.err(),
            break_error: brk.err(),
            minutes: None,
        },
    }
}

fn parse_field(label: &str, raw: &str) -> Result<u32, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(format!("{} duration is required", label));
    }

    match trimmed.parse::<i64>() {
        Ok(value) if value >= i64::from(MIN_MINUTES) && value <= i64::from(MAX_MINUTES) => {
            Ok(value as u32)
        }
        Ok(_) => Err(out_of_range(label)),
        Err(e) => match e.kind() {
            IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => Err(out_of_range(label)),
            _ => Err(format!("{} duration must be a whole number of minutes", label)),
        },
    }
}

fn out_of_range(label: &str) -> String {
    format!(
        "{} duration must be between {} and {} minutes",
        label, MIN_MINUTES, MAX_MINUTES
    )
}

/// Bound a value into `[min, max]`; a missing (non-numeric) value maps to `min`.
///
/// `min` must not exceed `max`.
pub fn clamp_minutes(value: Option<i64>, min: u32, max: u32) -> u32 {
    match value {
        None => min,
        Some(v) => v.clamp(i64::from(min), i64::from(max)) as u32,
    }
}

/// Lenient numeric reading used by the stepper controls.
///
/// Empty text counts as zero. Otherwise the leading integer is read and any
/// trailing text ignored (`"12abc"` is 12, `"7.9"` is 7); text that does not
/// start with digits is `None`. Digits past `i64` saturate.
pub fn parse_stepper_value(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Some(0);
    }

    let (negative, rest) = match trimmed.as_bytes()[0] {
        b'-' => (true, &trimmed[1..]),
        b'+' => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let digits = rest.bytes().take_while(u8::is_ascii_digit);
    let mut value: i64 = 0;
    let mut seen = false;
    for digit in digits {
        seen = true;
        value = value.saturating_mul(10).saturating_add(i64::from(digit - b'0'));
    }

    if !seen {
        return None;
    }
    Some(if negative { -value } else { value })
}

/// Apply one stepper click to the raw contents of a minutes field
pub fn step_minutes(raw: &str, delta: i64) -> u32 {
    let next = parse_stepper_value(raw).map(|v| v.saturating_add(delta));
    clamp_minutes(next, MIN_MINUTES, MAX_MINUTES)
}
