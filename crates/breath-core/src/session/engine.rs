//! The session phase state machine.
//!
//! ```text
//! breathing --[breath_count == breaths_per_round]--> holding
//! holding   --[complete_hold(d)]-------------------> recovery
//! recovery  --[complete_recovery, rounds left]-----> breathing (round + 1)
//! recovery  --[complete_recovery, last round]------> complete
//! ```
//!
//! The engine knows nothing about timers. An external driver calls
//! `increment_breath` once per breath cycle and `complete_recovery` when the
//! recovery timer fires; the user ends a hold through `complete_hold`.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::model::{PhaseTransition, SessionPhase, SessionPhaseState};
use crate::clock::{Clock, SystemClock};
use crate::preferences::UserPreferences;

/// Drives one run through its rounds.
///
/// The preferences are copied at construction and never reloaded, so edits
/// made elsewhere mid-session cannot change an in-flight run.
pub struct PhaseEngine {
    preferences: UserPreferences,
    state: SessionPhaseState,
    clock: Arc<dyn Clock>,
}

impl PhaseEngine {
    pub fn new(preferences: UserPreferences) -> Self {
        Self::with_clock(preferences, Arc::new(SystemClock))
    }

    pub fn with_clock(preferences: UserPreferences, clock: Arc<dyn Clock>) -> Self {
        Self {
            preferences,
            state: SessionPhaseState::default(),
            clock,
        }
    }

    pub fn state(&self) -> &SessionPhaseState {
        &self.state
    }

    pub fn phase(&self) -> SessionPhase {
        self.state.current_phase
    }

    /// The snapshot this run was started with.
    pub fn preferences(&self) -> &UserPreferences {
        &self.preferences
    }

    /// Counts one breath. Ignored outside `Breathing`.
    ///
    /// The breath that reaches `breaths_per_round` moves the run to
    /// `Holding` and stamps the hold start time.
    pub fn increment_breath(&mut self) -> Option<PhaseTransition> {
        if self.state.current_phase != SessionPhase::Breathing {
            return None;
        }

        self.state.breath_count += 1;
        if self.state.breath_count < self.preferences.breaths_per_round {
            return None;
        }

        self.state.hold_start_time = Some(self.clock.now());
        Some(self.enter(SessionPhase::Holding))
    }

    /// Records a finished hold of `duration_secs`. Ignored outside `Holding`.
    pub fn complete_hold(&mut self, duration_secs: u32) -> Option<PhaseTransition> {
        if self.state.current_phase != SessionPhase::Holding {
            return None;
        }

        self.state.hold_times.push(duration_secs);
        self.state.hold_start_time = None;
        Some(self.enter(SessionPhase::Recovery))
    }

    /// Ends recovery: next round, or `Complete` after the last one.
    /// Ignored outside `Recovery`.
    pub fn complete_recovery(&mut self) -> Option<PhaseTransition> {
        if self.state.current_phase != SessionPhase::Recovery {
            return None;
        }

        if self.state.current_round >= self.preferences.number_of_rounds {
            return Some(self.enter(SessionPhase::Complete));
        }

        self.state.current_round += 1;
        self.state.breath_count = 0;
        Some(self.enter(SessionPhase::Breathing))
    }

    /// Discards the run and starts over at round 1.
    pub fn reset(&mut self) {
        self.state = SessionPhaseState::default();
    }

    /// Whole seconds since the current hold started, if holding.
    pub fn hold_elapsed_secs(&self, now: DateTime<Utc>) -> Option<u32> {
        self.state
            .hold_start_time
            .map(|start| (now - start).num_seconds().max(0) as u32)
    }

    fn enter(&mut self, to: SessionPhase) -> PhaseTransition {
        let from = self.state.current_phase;
        self.state.current_phase = to;
        PhaseTransition { from, to }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use chrono::TimeZone;

    fn prefs(breaths: u32, rounds: u32) -> UserPreferences {
        UserPreferences {
            breaths_per_round: breaths,
            number_of_rounds: rounds,
            recovery_duration: 15,
            breathing_speed: 2.0,
        }
    }

    fn breathe_through(engine: &mut PhaseEngine) -> Option<PhaseTransition> {
        let mut last = None;
        for _ in 0..engine.preferences().breaths_per_round {
            last = engine.increment_breath();
        }
        last
    }

    #[test]
    fn test_first_round_cycle() {
        let start = Utc.with_ymd_and_hms(2025, 1, 1, 8, 0, 0).unwrap();
        let mut engine = PhaseEngine::with_clock(prefs(30, 3), Arc::new(FixedClock(start)));

        for _ in 0..29 {
            assert_eq!(engine.increment_breath(), None);
        }
        assert_eq!(engine.phase(), SessionPhase::Breathing);
        assert_eq!(engine.state().breath_count, 29);

        let transition = engine.increment_breath();
        assert_eq!(
            transition,
            Some(PhaseTransition {
                from: SessionPhase::Breathing,
                to: SessionPhase::Holding
            })
        );
        assert_eq!(engine.state().hold_start_time, Some(start));

        engine.complete_hold(120);
        assert_eq!(engine.phase(), SessionPhase::Recovery);
        assert_eq!(engine.state().hold_times, vec![120]);
        assert_eq!(engine.state().hold_start_time, None);

        engine.complete_recovery();
        assert_eq!(engine.state().current_round, 2);
        assert_eq!(engine.phase(), SessionPhase::Breathing);
        assert_eq!(engine.state().breath_count, 0);
    }

    #[test]
    fn test_completes_after_configured_rounds() {
        let mut engine = PhaseEngine::new(prefs(30, 3));

        for round in 1..=3 {
            assert_eq!(engine.state().current_round, round);
            assert_eq!(engine.state().hold_times.len() as u32, round - 1);
            breathe_through(&mut engine);
            engine.complete_hold(60 + round);
            engine.complete_recovery();
        }

        assert_eq!(engine.phase(), SessionPhase::Complete);
        assert_eq!(engine.state().hold_times, vec![61, 62, 63]);
        assert_eq!(engine.state().current_round, 3);
    }

    #[test]
    fn test_phase_order_for_many_configs() {
        for breaths in 1..=4 {
            for rounds in 1..=4 {
                let mut engine = PhaseEngine::new(prefs(breaths, rounds));
                let mut visited = vec![engine.phase()];

                while !engine.phase().is_terminal() {
                    let transition = match engine.phase() {
                        SessionPhase::Breathing => {
                            assert!(engine.state().breath_count < breaths);
                            engine.increment_breath()
                        }
                        SessionPhase::Holding => engine.complete_hold(10),
                        SessionPhase::Recovery => engine.complete_recovery(),
                        SessionPhase::Complete => unreachable!(),
                    };
                    if let Some(t) = transition {
                        assert_eq!(t.from, *visited.last().unwrap());
                        visited.push(t.to);
                    }
                }

                let holds = visited
                    .iter()
                    .filter(|p| **p == SessionPhase::Holding)
                    .count();
                assert_eq!(holds as u32, rounds);
                assert_eq!(engine.state().hold_times.len() as u32, rounds);
                for pair in visited.windows(2) {
                    let ok = matches!(
                        (pair[0], pair[1]),
                        (SessionPhase::Breathing, SessionPhase::Holding)
                            | (SessionPhase::Holding, SessionPhase::Recovery)
                            | (SessionPhase::Recovery, SessionPhase::Breathing)
                            | (SessionPhase::Recovery, SessionPhase::Complete)
                    );
                    assert!(ok, "unexpected transition {:?}", pair);
                }
            }
        }
    }

    #[test]
    fn test_operations_ignored_in_wrong_phase() {
        let mut engine = PhaseEngine::new(prefs(2, 1));

        assert_eq!(engine.complete_hold(5), None);
        assert_eq!(engine.complete_recovery(), None);
        assert!(engine.state().hold_times.is_empty());

        breathe_through(&mut engine);
        assert_eq!(engine.increment_breath(), None);
        assert_eq!(engine.state().breath_count, 2);

        engine.complete_hold(5);
        engine.complete_recovery();
        assert_eq!(engine.phase(), SessionPhase::Complete);

        assert_eq!(engine.increment_breath(), None);
        assert_eq!(engine.complete_hold(9), None);
        assert_eq!(engine.complete_recovery(), None);
        assert_eq!(engine.state().hold_times, vec![5]);
    }

    #[test]
    fn test_reset_returns_to_first_round() {
        let mut engine = PhaseEngine::new(prefs(1, 2));
        engine.increment_breath();
        engine.complete_hold(42);
        engine.complete_recovery();

        engine.reset();

        assert_eq!(engine.state(), &SessionPhaseState::default());
    }

    #[test]
    fn test_preferences_frozen_at_construction() {
        let mut live = prefs(2, 1);
        let mut engine = PhaseEngine::new(live);

        live.breaths_per_round = 50;
        live.number_of_rounds = 9;

        breathe_through(&mut engine);
        assert_eq!(engine.phase(), SessionPhase::Holding);
        engine.complete_hold(30);
        engine.complete_recovery();
        assert_eq!(engine.phase(), SessionPhase::Complete);
        assert_eq!(engine.preferences().breaths_per_round, 2);
    }

    #[test]
    fn test_hold_elapsed_secs() {
        let start = Utc.with_ymd_and_hms(2025, 1, 1, 8, 0, 0).unwrap();
        let mut engine = PhaseEngine::with_clock(prefs(1, 1), Arc::new(FixedClock(start)));
        assert_eq!(engine.hold_elapsed_secs(start), None);

        engine.increment_breath();
        let later = start + chrono::Duration::milliseconds(75_900);
        assert_eq!(engine.hold_elapsed_secs(later), Some(75));
    }
}
