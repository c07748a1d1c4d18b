//! Main application state management

use std::{
    sync::{Arc, Mutex},
    time::Instant,
};
use chrono::{DateTime, Utc};
use tokio::sync::{broadcast, mpsc, watch};
use tracing::{debug, info, warn};

use crate::services::{PersistedState, StateStore};
use crate::utils::format_uptime;
use super::{
    DurationConfig, MarkerPosition, SessionLog, SessionMarker, Theme, TimerEngine, TimerEvent,
    TimerState,
};

/// Shared state behind the HTTP API and the background tasks
#[derive(Debug)]
pub struct AppState {
    /// Countdown state machine and its durations
    pub engine: Arc<Mutex<TimerEngine>>,
    /// Completed sessions and their markers
    pub sessions: Arc<Mutex<SessionLog>>,
    pub theme: Arc<Mutex<Theme>>,
    pub store: StateStore,
    /// Serializes snapshot-and-write so saves land in order
    persist_lock: tokio::sync::Mutex<()>,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
    /// Last action tracking
    pub last_action: Arc<Mutex<Option<String>>>,
    pub last_action_time: Arc<Mutex<Option<DateTime<Utc>>>>,
    /// Every event produced by the engine, for live clients; lossy
    pub event_tx: broadcast::Sender<TimerEvent>,
    /// One message per completed work session; never drops
    session_tx: mpsc::UnboundedSender<()>,
    session_rx: Mutex<Option<mpsc::UnboundedReceiver<()>>>,
    /// Latest countdown snapshot, watched by the ticker
    pub timer_update_tx: watch::Sender<TimerState>,
    /// Keep the receiver alive to prevent channel closure
    pub _timer_update_rx: watch::Receiver<TimerState>,
}

impl AppState {
    /// Create a new AppState, restoring sessions and theme from the store
    pub fn new(port: u16, host: String, durations: DurationConfig, store: StateStore) -> Self {
        let persisted = store.load();
        let engine = TimerEngine::new(durations);
        let (event_tx, _) = broadcast::channel(100);
        let (session_tx, session_rx) = mpsc::unbounded_channel();
        let (timer_update_tx, timer_update_rx) = watch::channel(engine.state());

        Self {
            engine: Arc::new(Mutex::new(engine)),
            sessions: Arc::new(Mutex::new(SessionLog::restore(
                persisted.completed_sessions,
                persisted.marker_positions,
            ))),
            theme: Arc::new(Mutex::new(persisted.theme)),
            store,
            persist_lock: tokio::sync::Mutex::new(()),
            start_time: Instant::now(),
            port,
            host,
            last_action: Arc::new(Mutex::new(None)),
            last_action_time: Arc::new(Mutex::new(None)),
            event_tx,
            session_tx,
            session_rx: Mutex::new(Some(session_rx)),
            timer_update_tx,
            _timer_update_rx: timer_update_rx,
        }
    }

    /// Hand out the completed-session queue; only the first caller gets it
    pub fn take_session_receiver(&self) -> Option<mpsc::UnboundedReceiver<()>> {
        self.session_rx.lock().ok().and_then(|mut rx| rx.take())
    }

    /// Run an engine operation and publish the events it produced
    pub fn update_engine<F>(&self, action: Option<&str>, op: F) -> Result<TimerState, String>
    where
        F: FnOnce(&mut TimerEngine) -> Vec<TimerEvent>,
    {
        let mut engine = self.engine.lock()
            .map_err(|e| format!("Failed to lock timer engine: {}", e))?;

        let events = op(&mut *engine);
        let new_state = engine.state();

        // Publish under the lock so subscribers see events in engine order
        self.publish(events);
        drop(engine);

        if let Some(action) = action {
            self.record_action(action);
        }

        Ok(new_state)
    }

    fn publish(&self, events: Vec<TimerEvent>) {
        for event in events {
            match &event {
                TimerEvent::StateChanged(timer_state) => {
                    // The ticker keys off `running`, so this must never be skipped
                    self.timer_update_tx.send_replace(*timer_state);
                }
                TimerEvent::SessionCompleted => {
                    if self.session_tx.send(()).is_err() {
                        warn!("Session queue closed, completed session not recorded");
                    }
                }
                TimerEvent::PhaseCompleted { .. } => {}
            }

            // No subscribers is fine; nobody may be streaming events
            let _ = self.event_tx.send(event);
        }
    }

    fn record_action(&self, action: &str) {
        if let Ok(mut last_action) = self.last_action.lock() {
            *last_action = Some(action.to_string());
        }
        if let Ok(mut last_time) = self.last_action_time.lock() {
            *last_time = Some(Utc::now());
        }
    }

    pub fn start(&self) -> Result<TimerState, String> {
        self.update_engine(Some("start"), TimerEngine::start)
    }

    pub fn pause(&self) -> Result<TimerState, String> {
        self.update_engine(Some("pause"), TimerEngine::pause)
    }

    pub fn toggle(&self) -> Result<TimerState, String> {
        self.update_engine(Some("toggle"), TimerEngine::toggle)
    }

    pub fn reset(&self) -> Result<TimerState, String> {
        self.update_engine(Some("reset"), TimerEngine::reset)
    }

    /// One scheduler tick
    pub fn advance(&self) -> Result<TimerState, String> {
        self.update_engine(None, TimerEngine::advance)
    }

    /// Apply validated durations and resync the running phase
    pub fn apply_durations(&self, work_minutes: u32, break_minutes: u32) -> Result<TimerState, String> {
        info!("Applying durations: work={}min, break={}min", work_minutes, break_minutes);
        self.update_engine(Some("settings"), |engine| {
            engine.apply_durations(work_minutes, break_minutes)
        })
    }

    /// Get current timer state
    pub fn get_timer_state(&self) -> Result<TimerState, String> {
        self.engine.lock()
            .map(|engine| engine.state())
            .map_err(|e| format!("Failed to lock timer engine: {}", e))
    }

    /// Get current durations
    pub fn get_durations(&self) -> Result<DurationConfig, String> {
        self.engine.lock()
            .map(|engine| engine.config())
            .map_err(|e| format!("Failed to lock timer engine: {}", e))
    }

    pub fn get_sessions(&self) -> Result<SessionLog, String> {
        self.sessions.lock()
            .map(|log| log.clone())
            .map_err(|e| format!("Failed to lock session log: {}", e))
    }

    /// Record a completed work session; call [`AppState::persist`] to save it
    pub fn record_session(&self) -> Result<SessionMarker, String> {
        let mut log = self.sessions.lock()
            .map_err(|e| format!("Failed to lock session log: {}", e))?;

        let marker = log.record_completion();
        info!("Session #{} completed", log.completed);
        Ok(marker)
    }

    /// Move a marker; `Ok(None)` when the index is unknown
    pub fn place_marker(&self, index: usize, position: MarkerPosition) -> Result<Option<SessionMarker>, String> {
        let mut log = self.sessions.lock()
            .map_err(|e| format!("Failed to lock session log: {}", e))?;

        let marker = log.place_marker(index, position).cloned();
        if marker.is_none() {
            warn!("No marker at index {}", index);
        }
        Ok(marker)
    }

    pub fn clear_sessions(&self) -> Result<SessionLog, String> {
        let mut log = self.sessions.lock()
            .map_err(|e| format!("Failed to lock session log: {}", e))?;

        log.clear();
        let cleared = log.clone();
        drop(log);

        info!("Session log cleared");
        self.record_action("clear-sessions");
        Ok(cleared)
    }

    pub fn get_theme(&self) -> Result<Theme, String> {
        self.theme.lock()
            .map(|theme| *theme)
            .map_err(|e| format!("Failed to lock theme: {}", e))
    }

    pub fn toggle_theme(&self) -> Result<Theme, String> {
        let mut theme = self.theme.lock()
            .map_err(|e| format!("Failed to lock theme: {}", e))?;

        *theme = theme.toggled();
        let new_theme = *theme;
        drop(theme);

        info!("Theme switched to {}", new_theme);
        self.record_action("theme");
        Ok(new_theme)
    }

    /// Snapshot the externally owned state
    pub fn snapshot(&self) -> Result<PersistedState, String> {
        let log = self.get_sessions()?;
        let theme = self.get_theme()?;
        Ok(PersistedState {
            completed_sessions: log.completed,
            marker_positions: log.positions(),
            theme,
        })
    }

    /// Write the externally owned state to the store off the async runtime
    pub async fn persist(&self) {
        let _guard = self.persist_lock.lock().await;

        let snapshot = match self.snapshot() {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!("Skipping persistence: {}", e);
                return;
            }
        };

        let store = self.store.clone();
        if let Err(e) = tokio::task::spawn_blocking(move || store.save(&snapshot)).await {
            warn!("Persistence task failed: {}", e);
        } else {
            debug!("Persistence finished");
        }
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        format_uptime(self.start_time.elapsed())
    }

    /// Get last action information
    pub fn get_last_action(&self) -> (Option<String>, Option<DateTime<Utc>>) {
        let last_action = self.last_action.lock().ok().and_then(|a| a.clone());
        let last_action_time = self.last_action_time.lock().ok().and_then(|t| *t);
        (last_action, last_action_time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Phase;

    fn test_state(work: u32, brk: u32) -> AppState {
        AppState::new(
            0,
            "127.0.0.1".to_string(),
            DurationConfig::from_minutes(work, brk),
            StateStore::in_memory(),
        )
    }

    #[test]
    fn operations_update_the_watch_channel() {
        let state = test_state(25, 5);
        state.start().unwrap();
        assert!(state.timer_update_tx.borrow().running);

        state.advance().unwrap();
        assert_eq!(state.timer_update_tx.borrow().remaining_seconds, 1499);

        state.pause().unwrap();
        assert!(!state.timer_update_tx.borrow().running);
    }

    #[tokio::test]
    async fn transitions_are_broadcast() {
        let state = test_state(1, 1);
        let mut rx = state.event_tx.subscribe();
        state.start().unwrap();
        for _ in 0..60 {
            state.advance().unwrap();
        }

        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        assert!(events.contains(&TimerEvent::PhaseCompleted { ended: Phase::Work }));
        assert_eq!(
            events.iter().filter(|e| **e == TimerEvent::SessionCompleted).count(),
            1
        );
    }

    #[test]
    fn session_queue_keeps_every_completion() {
        let state = test_state(1, 1);
        state.start().unwrap();
        // Ten work phases, far more events than the broadcast channel holds
        for _ in 0..1200 {
            state.advance().unwrap();
        }

        let mut rx = state.take_session_receiver().unwrap();
        let mut completions = 0;
        while rx.try_recv().is_ok() {
            completions += 1;
        }
        assert_eq!(completions, 10);
        assert!(state.take_session_receiver().is_none());
    }

    #[test]
    fn watch_matches_engine_after_racing_threads() {
        let state = Arc::new(test_state(1, 1));
        state.start().unwrap();

        let ticker = {
            let state = Arc::clone(&state);
            std::thread::spawn(move || {
                for _ in 0..5000 {
                    state.advance().unwrap();
                }
            })
        };
        let toggler = {
            let state = Arc::clone(&state);
            std::thread::spawn(move || {
                for _ in 0..5000 {
                    state.toggle().unwrap();
                }
            })
        };
        ticker.join().unwrap();
        toggler.join().unwrap();

        assert_eq!(*state.timer_update_tx.borrow(), state.get_timer_state().unwrap());
    }

    #[test]
    fn last_action_tracks_user_operations_only() {
        let state = test_state(25, 5);
        state.start().unwrap();
        state.advance().unwrap();
        let (action, time) = state.get_last_action();
        assert_eq!(action.as_deref(), Some("start"));
        assert!(time.is_some());
    }

    #[test]
    fn sessions_and_theme() {
        let state = test_state(25, 5);
        state.record_session().unwrap();
        state.record_session().unwrap();
        assert_eq!(state.get_sessions().unwrap().completed, 2);

        let moved = state
            .place_marker(1, MarkerPosition { top: 3.0, left: 4.0 })
            .unwrap();
        assert_eq!(moved.map(|m| m.index), Some(1));
        assert!(state
            .place_marker(9, MarkerPosition { top: 0.0, left: 0.0 })
            .unwrap()
            .is_none());

        assert_eq!(state.toggle_theme().unwrap(), Theme::Dark);
        assert_eq!(state.clear_sessions().unwrap().completed, 0);
    }

    #[tokio::test]
    async fn persist_writes_through_the_store() {
        let path = std::env::temp_dir()
            .join(format!("pomodoro-server-test-{}", std::process::id()))
            .join("app-state-persist.json");
        let _ = std::fs::remove_file(&path);

        let state = AppState::new(
            0,
            "127.0.0.1".to_string(),
            DurationConfig::default(),
            StateStore::new(path.clone()),
        );
        state.record_session().unwrap();
        state.toggle_theme().unwrap();
        state.persist().await;

        let reloaded = StateStore::new(path.clone()).load();
        assert_eq!(reloaded.completed_sessions, 1);
        assert_eq!(reloaded.theme, Theme::Dark);
        let _ = std::fs::remove_file(path);
    }
}
