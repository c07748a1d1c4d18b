//! Countdown ticker background task

use std::{sync::Arc, time::Duration};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info};

use crate::state::AppState;

/// Background task that advances the engine once per `period` while it runs.
///
/// This is the only tick source in the process. It follows the `running`
/// flag published on the timer watch channel: a fresh interval is armed
/// whenever the timer goes from paused to running and dropped as soon as it
/// pauses. A tick that races with a pause is harmless because the engine
/// ignores advances while paused.
pub async fn ticker_task(state: Arc<AppState>, period: Duration) {
    info!("Starting ticker task with a {:?} period", period);

    let mut timer_rx = state.timer_update_tx.subscribe();

    loop {
        // Wait until the timer is running
        if !timer_rx.borrow_and_update().running {
            if timer_rx.changed().await.is_err() {
                debug!("Timer channel closed, stopping ticker");
                return;
            }
            continue;
        }

        debug!("Timer running, arming interval");
        let mut interval = interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(e) = state.advance() {
                        error!("Failed to advance timer: {}", e);
                    }
                }

                changed = timer_rx.changed() => {
                    if changed.is_err() {
                        debug!("Timer channel closed, stopping ticker");
                        return;
                    }
                    if !timer_rx.borrow_and_update().running {
                        debug!("Timer paused, disarming interval");
                        break;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        services::StateStore,
        state::{DurationConfig, Phase},
    };

    fn spawn_ticker(work: u32, brk: u32) -> Arc<AppState> {
        let state = Arc::new(AppState::new(
            0,
            "127.0.0.1".to_string(),
            DurationConfig::from_minutes(work, brk),
            StateStore::in_memory(),
        ));
        tokio::spawn(ticker_task(Arc::clone(&state), Duration::from_secs(1)));
        state
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_once_per_period_while_running() {
        let state = spawn_ticker(25, 5);
        state.start().unwrap();

        tokio::time::sleep(Duration::from_millis(3500)).await;
        assert_eq!(state.get_timer_state().unwrap().remaining_seconds, 1497);
    }

    #[tokio::test(start_paused = true)]
    async fn pause_stops_ticking() {
        let state = spawn_ticker(25, 5);
        state.start().unwrap();
        tokio::time::sleep(Duration::from_millis(2500)).await;
        state.pause().unwrap();
        let paused = state.get_timer_state().unwrap();

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(state.get_timer_state().unwrap(), paused);
        assert_eq!(paused.remaining_seconds, 1498);
    }

    #[tokio::test(start_paused = true)]
    async fn repeated_start_does_not_double_tick() {
        let state = spawn_ticker(25, 5);
        state.start().unwrap();
        tokio::time::sleep(Duration::from_millis(500)).await;
        state.start().unwrap();
        state.start().unwrap();

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(state.get_timer_state().unwrap().remaining_seconds, 1498);
    }

    #[tokio::test(start_paused = true)]
    async fn rolls_over_into_break() {
        let state = spawn_ticker(1, 1);
        state.start().unwrap();

        tokio::time::sleep(Duration::from_millis(60_500)).await;
        let timer = state.get_timer_state().unwrap();
        assert_eq!(timer.phase, Phase::Break);
        assert_eq!(timer.remaining_seconds, 60);
    }
}
