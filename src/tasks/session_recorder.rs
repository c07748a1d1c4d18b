//! Session recorder background task

use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::state::AppState;

/// Background task that turns completed work phases into session markers.
///
/// Completions arrive on the unbounded session queue rather than the lossy
/// event broadcast, so a slow recorder catches up instead of skipping any.
pub async fn session_recorder_task(state: Arc<AppState>) {
    let Some(mut session_rx) = state.take_session_receiver() else {
        warn!("Session queue already taken, recorder not started");
        return;
    };

    info!("Starting session recorder task");

    while session_rx.recv().await.is_some() {
        match state.record_session() {
            Ok(marker) => debug!("Recorded session marker #{}", marker.index),
            Err(e) => {
                error!("Failed to record session: {}", e);
                continue;
            }
        }

        // Fold any backlog into a single save
        while session_rx.try_recv().is_ok() {
            if let Err(e) = state.record_session() {
                error!("Failed to record session: {}", e);
            }
        }

        state.persist().await;
    }

    debug!("Session queue closed, stopping session recorder");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use crate::{services::StateStore, state::DurationConfig};

    fn test_state() -> Arc<AppState> {
        Arc::new(AppState::new(
            0,
            "127.0.0.1".to_string(),
            DurationConfig::from_minutes(1, 1),
            StateStore::in_memory(),
        ))
    }

    async fn wait_for_sessions(state: &AppState, expected: u32) -> u32 {
        for _ in 0..100 {
            let completed = state.get_sessions().unwrap().completed;
            if completed == expected {
                return completed;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        state.get_sessions().unwrap().completed
    }

    #[tokio::test]
    async fn records_one_marker_per_work_phase() {
        let state = test_state();
        tokio::spawn(session_recorder_task(Arc::clone(&state)));
        tokio::task::yield_now().await;

        state.start().unwrap();
        // Two work phases and one break
        for _ in 0..180 {
            state.advance().unwrap();
            tokio::task::yield_now().await;
        }

        assert_eq!(wait_for_sessions(&state, 2).await, 2);
        assert_eq!(state.get_sessions().unwrap().markers.len(), 2);
    }

    #[tokio::test]
    async fn burst_of_phases_without_yielding_loses_nothing() {
        let state = test_state();
        tokio::spawn(session_recorder_task(Arc::clone(&state)));
        tokio::task::yield_now().await;

        state.start().unwrap();
        // Five work phases back to back, hundreds of events in between
        for _ in 0..600 {
            state.advance().unwrap();
        }

        assert_eq!(wait_for_sessions(&state, 5).await, 5);
        let log = state.get_sessions().unwrap();
        assert_eq!(log.markers.len(), 5);
        assert_eq!(log.markers[4].index, 4);
    }

    #[tokio::test]
    async fn completions_before_startup_are_kept() {
        let state = test_state();
        state.start().unwrap();
        for _ in 0..60 {
            state.advance().unwrap();
        }

        tokio::spawn(session_recorder_task(Arc::clone(&state)));
        assert_eq!(wait_for_sessions(&state, 1).await, 1);
    }
}
