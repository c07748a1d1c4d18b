//! JSON file persistence for session count, marker positions and theme
//!
//! Every key is read on its own: a missing or malformed key falls back to
//! its default without affecting the others, and storage failures are
//! logged rather than returned.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::state::{MarkerPosition, Theme};

const COMPLETED_KEY: &str = "completed_sessions";
const MARKERS_KEY: &str = "marker_positions";
const THEME_KEY: &str = "theme";

/// Everything that survives a restart
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistedState {
    pub completed_sessions: u32,
    pub marker_positions: Vec<Option<MarkerPosition>>,
    pub theme: Theme,
}

/// Location of the persisted state; `None` keeps everything in memory
#[derive(Debug, Clone)]
pub struct StateStore {
    path: Option<PathBuf>,
}

impl StateStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path: Some(path) }
    }

    /// A store that never touches the filesystem
    pub fn in_memory() -> Self {
        Self { path: None }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Load persisted state, degrading to defaults on any failure
    pub fn load(&self) -> PersistedState {
        let Some(path) = &self.path else {
            return PersistedState::default();
        };

        match read_object(path) {
            Ok(Some(object)) => {
                let state = from_object(&object);
                info!(
                    "Loaded persisted state from {}: {} sessions, theme={}",
                    path.display(),
                    state.completed_sessions,
                    state.theme
                );
                state
            }
            Ok(None) => {
                debug!("No persisted state at {}, starting fresh", path.display());
                PersistedState::default()
            }
            Err(e) => {
                warn!("Ignoring unreadable state file: {:#}", e);
                PersistedState::default()
            }
        }
    }

    /// Save state, logging instead of failing
    pub fn save(&self, state: &PersistedState) {
        let Some(path) = &self.path else {
            return;
        };

        match write_state(path, state) {
            Ok(()) => debug!("Persisted state to {}", path.display()),
            Err(e) => warn!("Failed to persist state: {:#}", e),
        }
    }
}

fn read_object(path: &Path) -> Result<Option<Map<String, Value>>> {
    if !path.exists() {
        return Ok(None);
    }

    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let value: Value = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    match value {
        Value::Object(object) => Ok(Some(object)),
        _ => anyhow::bail!("{} does not hold a JSON object", path.display()),
    }
}

fn from_object(object: &Map<String, Value>) -> PersistedState {
    PersistedState {
        completed_sessions: read_key(object, COMPLETED_KEY),
        marker_positions: read_key(object, MARKERS_KEY),
        theme: read_key(object, THEME_KEY),
    }
}

fn read_key<T>(object: &Map<String, Value>, key: &str) -> T
where
    T: for<'de> Deserialize<'de> + Default,
{
    match object.get(key) {
        None => T::default(),
        Some(value) => serde_json::from_value(value.clone()).unwrap_or_else(|e| {
            warn!("Discarding malformed '{}' in state file: {}", key, e);
            T::default()
        }),
    }
}

fn write_state(path: &Path, state: &PersistedState) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }

    let json = serde_json::to_string_pretty(state)?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}
