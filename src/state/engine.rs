//! Timer engine: the countdown state machine
//!
//! The engine knows nothing about wall-clock time. Something outside calls
//! [`TimerEngine::advance`] once per elapsed tick while the timer runs, and
//! every operation hands back the events it produced so the caller can fan
//! them out to consumers.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{DurationConfig, Phase, TimerState};

/// Notifications emitted by the engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TimerEvent {
    /// The countdown changed and should be re-rendered
    StateChanged(TimerState),
    /// A phase ran out; carries the phase that just ended
    PhaseCompleted { ended: Phase },
    /// A work phase ran out
    SessionCompleted,
}

/// Owns the duration configuration and the countdown state
#[derive(Debug, Clone)]
pub struct TimerEngine {
    config: DurationConfig,
    state: TimerState,
}

impl TimerEngine {
    /// Create a paused engine at the start of a work phase
    pub fn new(config: DurationConfig) -> Self {
        Self {
            state: TimerState::new(config.work_seconds()),
            config,
        }
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn config(&self) -> DurationConfig {
        self.config
    }

    /// Begin counting down; does nothing to the state if already running
    pub fn start(&mut self) -> Vec<TimerEvent> {
        if !self.state.running {
            self.state.running = true;
            info!(
                "Timer started: {} with {}s remaining",
                self.state.phase.label(),
                self.state.remaining_seconds
            );
        }
        vec![self.state_changed()]
    }

    /// Stop counting down, keeping the remaining time as is
    pub fn pause(&mut self) -> Vec<TimerEvent> {
        if self.state.running {
            self.state.running = false;
            info!(
                "Timer paused: {} with {}s remaining",
                self.state.phase.label(),
                self.state.remaining_seconds
            );
        }
        vec![self.state_changed()]
    }

    /// Flip between running and paused
    pub fn toggle(&mut self) -> Vec<TimerEvent> {
        if self.state.running {
            self.pause()
        } else {
            self.start()
        }
    }

    /// Return to a paused work phase using the current work duration
    pub fn reset(&mut self) -> Vec<TimerEvent> {
        self.state = TimerState::new(self.config.work_seconds());
        info!("Timer reset to {}s of work", self.state.remaining_seconds);
        vec![self.state_changed()]
    }

    /// One tick of the countdown.
    ///
    /// Does nothing while paused. When the countdown hits zero the phase
    /// flips in the same call and the new phase starts at its full length.
    pub fn advance(&mut self) -> Vec<TimerEvent> {
        if !self.state.running {
            return Vec::new();
        }

        self.state.remaining_seconds = self.state.remaining_seconds.saturating_sub(1);

        let mut events = Vec::new();
        if self.state.remaining_seconds == 0 {
            let ended = self.state.phase;
            self.state.phase = ended.next();
            self.state.remaining_seconds = self.duration_of(self.state.phase);
            info!(
                "{} phase completed, starting {} ({}s)",
                ended.label(),
                self.state.phase.label(),
                self.state.remaining_seconds
            );

            events.push(TimerEvent::PhaseCompleted { ended });
            if ended == Phase::Work {
                events.push(TimerEvent::SessionCompleted);
            }
        } else {
            debug!("Tick: {}s remaining", self.state.remaining_seconds);
        }

        events.push(self.state_changed());
        events
    }

    /// Store new durations and restart the current phase at its new length
    pub fn apply_durations(&mut self, work_minutes: u32, break_minutes: u32) -> Vec<TimerEvent> {
        self.config.apply(work_minutes, break_minutes);
        self.state.remaining_seconds = self.duration_of(self.state.phase);
        info!(
            "Durations set to {}min work / {}min break, {} restarted at {}s",
            work_minutes,
            break_minutes,
            self.state.phase.label(),
            self.state.remaining_seconds
        );
        vec![self.state_changed()]
    }

    fn duration_of(&self, phase: Phase) -> u32 {
        match phase {
            Phase::Work => self.config.work_seconds(),
            Phase::Break => self.config.break_seconds(),
        }
    }

    fn state_changed(&self) -> TimerEvent {
        TimerEvent::StateChanged(self.state)
    }
}

impl Default for TimerEngine {
    fn default() -> Self {
        Self::new(DurationConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count_sessions(events: &[TimerEvent]) -> usize {
        events
            .iter()
            .filter(|e| matches!(e, TimerEvent::SessionCompleted))
            .count()
    }

    fn count_phase_completions(events: &[TimerEvent]) -> usize {
        events
            .iter()
            .filter(|e| matches!(e, TimerEvent::PhaseCompleted { .. }))
            .count()
    }

    #[test]
    fn starts_paused_in_work() {
        let engine = TimerEngine::default();
        assert_eq!(engine.state(), TimerState::new(1500));
    }

    #[test]
    fn full_work_phase_flips_to_break_once() {
        let mut engine = TimerEngine::default();
        engine.start();

        let mut events = Vec::new();
        for _ in 0..1500 {
            events.extend(engine.advance());
        }

        let state = engine.state();
        assert_eq!(state.phase, Phase::Break);
        assert_eq!(state.remaining_seconds, 300);
        assert!(state.running);
        assert_eq!(count_sessions(&events), 1);
        assert_eq!(count_phase_completions(&events), 1);
        assert!(events.contains(&TimerEvent::PhaseCompleted { ended: Phase::Work }));
    }

    #[test]
    fn break_completion_is_not_a_session() {
        let mut engine = TimerEngine::new(DurationConfig::from_minutes(1, 1));
        engine.start();

        let mut events = Vec::new();
        for _ in 0..120 {
            events.extend(engine.advance());
        }

        assert_eq!(engine.state().phase, Phase::Work);
        assert_eq!(engine.state().remaining_seconds, 60);
        assert_eq!(count_phase_completions(&events), 2);
        assert_eq!(count_sessions(&events), 1);
        assert!(events.contains(&TimerEvent::PhaseCompleted { ended: Phase::Break }));
    }

    #[test]
    fn never_rests_at_zero() {
        let mut engine = TimerEngine::new(DurationConfig::from_minutes(1, 1));
        engine.start();
        for _ in 0..500 {
            engine.advance();
            assert!(engine.state().remaining_seconds > 0);
            assert!(engine.state().remaining_seconds <= 60);
        }
    }

    #[test]
    fn transition_events_precede_state_change() {
        let mut engine = TimerEngine::new(DurationConfig::from_minutes(1, 1));
        engine.start();
        for _ in 0..59 {
            engine.advance();
        }

        let events = engine.advance();
        assert_eq!(
            events,
            vec![
                TimerEvent::PhaseCompleted { ended: Phase::Work },
                TimerEvent::SessionCompleted,
                TimerEvent::StateChanged(TimerState {
                    phase: Phase::Break,
                    remaining_seconds: 60,
                    running: true,
                }),
            ]
        );
    }

    #[test]
    fn advance_is_a_no_op_while_paused() {
        let mut engine = TimerEngine::default();
        engine.start();
        for _ in 0..10 {
            engine.advance();
        }
        engine.pause();
        let paused = engine.state();

        for _ in 0..5000 {
            assert!(engine.advance().is_empty());
        }
        assert_eq!(engine.state(), paused);
        assert_eq!(paused.remaining_seconds, 1490);
    }

    #[test]
    fn start_twice_keeps_running() {
        let mut engine = TimerEngine::default();
        engine.start();
        engine.advance();
        engine.start();
        assert!(engine.state().running);
        assert_eq!(engine.state().remaining_seconds, 1499);
    }

    #[test]
    fn toggle_flips_running() {
        let mut engine = TimerEngine::default();
        engine.toggle();
        assert!(engine.state().running);
        engine.toggle();
        assert!(!engine.state().running);
    }

    #[test]
    fn reset_uses_current_work_duration() {
        let mut engine = TimerEngine::default();
        engine.apply_durations(10, 2);
        engine.start();
        for _ in 0..700 {
            engine.advance();
        }
        assert_eq!(engine.state().phase, Phase::Break);

        let events = engine.reset();
        let expected = TimerState {
            phase: Phase::Work,
            remaining_seconds: 600,
            running: false,
        };
        assert_eq!(engine.state(), expected);
        assert_eq!(events, vec![TimerEvent::StateChanged(expected)]);
    }

    #[test]
    fn apply_resyncs_current_phase() {
        let mut engine = TimerEngine::new(DurationConfig::from_minutes(1, 1));
        engine.start();
        for _ in 0..90 {
            engine.advance();
        }
        assert_eq!(engine.state().phase, Phase::Break);
        assert_eq!(engine.state().remaining_seconds, 30);

        engine.apply_durations(10, 2);
        let state = engine.state();
        assert_eq!(state.phase, Phase::Break);
        assert_eq!(state.remaining_seconds, 120);
        assert!(state.running);
    }

    #[test]
    fn apply_resyncs_while_paused() {
        let mut engine = TimerEngine::default();
        engine.start();
        engine.advance();
        engine.pause();

        engine.apply_durations(3, 1);
        assert_eq!(engine.state().remaining_seconds, 180);
        assert!(!engine.state().running);
        assert_eq!(engine.config().work_minutes(), 3);
        assert_eq!(engine.config().break_minutes(), 1);
    }
}
