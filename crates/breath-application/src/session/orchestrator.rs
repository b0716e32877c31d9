//! Glue between the phase engine, the save path and the user-facing
//! collaborators.

use std::sync::Arc;

use breath_core::clock::{Clock, SystemClock};
use breath_core::cue::{Cue, CueNotifier};
use breath_core::preferences::UserPreferences;
use breath_core::session::{
    PhaseEngine, PhaseTransition, SaveStatus, SessionPhase, SessionPhaseState, SessionRecord,
};
use uuid::Uuid;

use super::saver::SessionSaver;
use crate::notification::{Navigator, Notification, UserNotifier};

pub const SAVE_FAILED_MESSAGE: &str = "Failed to save session";
pub const SAVE_RETRY_FAILED_MESSAGE: &str = "Save failed. Please try again.";
pub const SAVE_SUCCEEDED_MESSAGE: &str = "Session saved successfully";

/// Everything the orchestrator talks to besides the engine and the saver.
#[derive(Clone)]
pub struct Collaborators {
    pub cues: Arc<dyn CueNotifier>,
    pub notifier: Arc<dyn UserNotifier>,
    pub navigator: Arc<dyn Navigator>,
    pub clock: Arc<dyn Clock>,
}

impl Collaborators {
    pub fn new(
        cues: Arc<dyn CueNotifier>,
        notifier: Arc<dyn UserNotifier>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            cues,
            notifier,
            navigator,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

/// Best and average hold of a finished run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionSummary {
    pub best_hold: u32,
    pub average_hold: f64,
}

/// Owns one run: forwards driver and user events to the engine, plays cues
/// on phase changes, and saves the run once it completes.
pub struct SessionOrchestrator {
    engine: PhaseEngine,
    saver: SessionSaver,
    collaborators: Collaborators,
    /// Assigned the first time the run completes, never reassigned.
    session_id: Option<String>,
    record: Option<SessionRecord>,
}

impl SessionOrchestrator {
    /// Starts a fresh run with a frozen copy of `preferences`.
    pub fn new(
        preferences: UserPreferences,
        saver: SessionSaver,
        collaborators: Collaborators,
    ) -> Self {
        saver.reset();
        let engine = PhaseEngine::with_clock(preferences, Arc::clone(&collaborators.clock));
        Self {
            engine,
            saver,
            collaborators,
            session_id: None,
            record: None,
        }
    }

    pub fn state(&self) -> &SessionPhaseState {
        self.engine.state()
    }

    pub fn phase(&self) -> SessionPhase {
        self.engine.phase()
    }

    pub fn preferences(&self) -> &UserPreferences {
        self.engine.preferences()
    }

    pub fn save_status(&self) -> SaveStatus {
        self.saver.status()
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    /// The record built at completion, if the run produced one.
    pub fn record(&self) -> Option<&SessionRecord> {
        self.record.as_ref()
    }

    pub fn cue(&self, cue: Cue) {
        self.collaborators.cues.notify(cue);
    }

    pub fn increment_breath(&mut self) -> Option<PhaseTransition> {
        let transition = self.engine.increment_breath()?;
        tracing::debug!(
            "[Orchestrator] Round {}: {} -> {}",
            self.engine.state().current_round,
            transition.from,
            transition.to
        );
        self.cue(Cue::HoldBreath);
        Some(transition)
    }

    pub fn complete_hold(&mut self, duration_secs: u32) -> Option<PhaseTransition> {
        let transition = self.engine.complete_hold(duration_secs)?;
        tracing::debug!(
            "[Orchestrator] Round {}: hold of {}s recorded",
            self.engine.state().current_round,
            duration_secs
        );
        self.cue(Cue::HoldReleased);
        self.cue(Cue::RecoveryBreath);
        Some(transition)
    }

    /// Ends recovery. Reaching `Complete` triggers the save.
    pub async fn complete_recovery(&mut self) -> Option<PhaseTransition> {
        let transition = self.engine.complete_recovery()?;
        self.cue(Cue::Release);
        if transition.to == SessionPhase::Complete {
            self.on_complete().await;
        }
        Some(transition)
    }

    /// Handles the run reaching `Complete`. Safe to call more than once.
    ///
    /// # Returns
    ///
    /// Whether the run is settled as saved.
    pub async fn on_complete(&mut self) -> bool {
        if self.engine.phase() != SessionPhase::Complete {
            return false;
        }

        match self.saver.status() {
            SaveStatus::Saved => return true,
            SaveStatus::Saving => return self.saver.wait_for_save().await,
            SaveStatus::Idle | SaveStatus::Error => {}
        }

        let hold_times = self.engine.state().hold_times.clone();
        if hold_times.is_empty() {
            tracing::info!("[Orchestrator] No hold times recorded, skipping save");
            self.saver.mark_nothing_to_save();
            return true;
        }

        self.cue(Cue::RoundComplete);

        let session_id = self
            .session_id
            .get_or_insert_with(|| Uuid::new_v4().to_string())
            .clone();
        let completed_at = self.collaborators.clock.now();
        let preferences = *self.engine.preferences();
        // Built once per run; later attempts resend the same snapshot.
        let record = self
            .record
            .get_or_insert_with(|| {
                SessionRecord::new(session_id, completed_at, hold_times, preferences)
            })
            .clone();

        let saved = self.saver.save(&record).await;
        if !saved {
            tracing::error!("[Orchestrator] Failed to save session: {}", record.id);
            self.cue(Cue::SaveFailed);
            self.collaborators
                .notifier
                .show(Notification::retryable_error(SAVE_FAILED_MESSAGE));
        }
        saved
    }

    /// Retries the save of this run's record after a failure.
    pub async fn retry_save(&self) -> bool {
        let Some(record) = &self.record else {
            tracing::warn!("[Orchestrator] Retry requested with nothing to save");
            return false;
        };

        let saved = self.saver.retry(record).await;
        let notification = if saved {
            Notification::success(SAVE_SUCCEEDED_MESSAGE)
        } else {
            self.cue(Cue::SaveFailed);
            Notification::retryable_error(SAVE_RETRY_FAILED_MESSAGE)
        };
        self.collaborators.notifier.show(notification);
        saved
    }

    /// Leaves the completed run once any pending write has settled or timed out.
    pub async fn finish(&self) -> bool {
        let saved = self.saver.wait_for_save().await;
        if !saved {
            tracing::warn!(
                "[Orchestrator] Leaving session with save status {:?}",
                self.saver.status()
            );
        }
        self.collaborators.navigator.go_back();
        saved
    }

    /// Abandons the run. A completed run is finished instead, so its save
    /// is not cut short.
    pub async fn cancel(&self) {
        if self.engine.phase() == SessionPhase::Complete {
            self.finish().await;
            return;
        }
        tracing::info!(
            "[Orchestrator] Session cancelled in round {} ({})",
            self.engine.state().current_round,
            self.engine.phase()
        );
        self.collaborators.navigator.go_back();
    }

    /// Discards this run and starts a new one with the same preferences.
    pub fn restart(&mut self) {
        self.engine.reset();
        self.saver.reset();
        self.session_id = None;
        self.record = None;
    }

    pub fn summary(&self) -> Option<SessionSummary> {
        let holds = &self.engine.state().hold_times;
        let best_hold = holds.iter().copied().max()?;
        let total: u64 = holds.iter().map(|&h| u64::from(h)).sum();
        Some(SessionSummary {
            best_hold,
            average_hold: total as f64 / holds.len() as f64,
        })
    }
}
