//! Save coordination for completed sessions.
//!
//! `SessionSaver` sits between the session flow and the repository and makes
//! sure at most one physical write runs at a time, that a session id is
//! written at most once, and that callers can wait for a pending write
//! without starting another one.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use breath_core::config::DEFAULT_SAVE_TIMEOUT_SECS;
use breath_core::session::{SaveStatus, SessionRecord, SessionRepository};
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};

/// A write that has been started and may still be running.
#[derive(Clone)]
struct PendingSave {
    session_id: String,
    generation: u64,
    outcome: Shared<BoxFuture<'static, bool>>,
}

enum NextStep {
    Join(PendingSave),
    Drain(PendingSave),
}

#[derive(Default)]
struct SaverState {
    status: SaveStatus,
    /// Id confirmed written; later saves of it short-circuit.
    saved_session_id: Option<String>,
    in_flight: Option<PendingSave>,
    /// A write started before the last `reset`. It no longer reports into
    /// the status, but new writes still wait for it.
    draining: Option<PendingSave>,
    last_failed: Option<SessionRecord>,
    /// Bumped by `reset` and by every new write so stale completions
    /// cannot overwrite newer state.
    generation: u64,
}

/// Serializes session writes and deduplicates them by session id.
///
/// Writes run on a spawned task: dropping a caller, or giving up in
/// `wait_for_save`, never cancels a write that has started. The write still
/// finishes and still updates the status.
#[derive(Clone)]
pub struct SessionSaver {
    repository: Arc<dyn SessionRepository>,
    state: Arc<Mutex<SaverState>>,
    wait_timeout: Duration,
}

impl SessionSaver {
    pub fn new(repository: Arc<dyn SessionRepository>) -> Self {
        Self::with_timeout(repository, Duration::from_secs(DEFAULT_SAVE_TIMEOUT_SECS))
    }

    /// Same as `new` with a custom `wait_for_save` timeout.
    pub fn with_timeout(repository: Arc<dyn SessionRepository>, wait_timeout: Duration) -> Self {
        Self {
            repository,
            state: Arc::new(Mutex::new(SaverState::default())),
            wait_timeout,
        }
    }

    /// Persists `record`, at most once per session id.
    ///
    /// - An id already confirmed saved returns `true` without touching storage.
    /// - A write already running for the same id is joined, and its result
    ///   is returned to every caller.
    /// - A write running for another id is awaited first, then this one starts.
    ///
    /// Must be called inside a Tokio runtime.
    pub async fn save(&self, record: &SessionRecord) -> bool {
        loop {
            let next = {
                let mut state = lock(&self.state);
                if state.saved_session_id.as_deref() == Some(record.id.as_str()) {
                    tracing::debug!("[SessionSaver] Session already saved: {}", record.id);
                    return true;
                }
                match (state.in_flight.clone(), state.draining.clone()) {
                    (Some(pending), _) => NextStep::Join(pending),
                    (None, Some(draining)) => NextStep::Drain(draining),
                    (None, None) => NextStep::Join(self.start_write(&mut state, record.clone())),
                }
            };

            let pending = match next {
                NextStep::Join(pending) => pending,
                NextStep::Drain(draining) => {
                    self.drain(draining).await;
                    continue;
                }
            };

            if pending.session_id == record.id {
                return pending.outcome.await;
            }

            tracing::debug!(
                "[SessionSaver] Save of {} in progress, waiting before saving {}",
                pending.session_id,
                record.id
            );
            pending.outcome.await;
        }
    }

    /// Forgets the error and dedup state for `record` and saves it again.
    ///
    /// Meant for the `Error` state. While a write is running it simply joins
    /// or waits for it like `save`.
    pub async fn retry(&self, record: &SessionRecord) -> bool {
        tracing::info!("[SessionSaver] Retrying save for session: {}", record.id);
        {
            let mut state = lock(&self.state);
            if state.in_flight.is_none() {
                if state.status != SaveStatus::Error {
                    tracing::warn!(
                        "[SessionSaver] Retry requested while status is {:?}",
                        state.status
                    );
                }
                state.status = SaveStatus::Idle;
                state.saved_session_id = None;
                state.last_failed = None;
            }
        }
        self.save(record).await
    }

    /// Waits for the running write, if any, for at most the configured timeout.
    ///
    /// # Returns
    ///
    /// - No write running: whether the last known status is `Saved`
    /// - Write finished in time: its result
    /// - Timed out: `false`; the write keeps running in the background
    pub async fn wait_for_save(&self) -> bool {
        let pending = {
            let state = lock(&self.state);
            match &state.in_flight {
                Some(pending) => pending.clone(),
                None => return state.status == SaveStatus::Saved,
            }
        };

        match tokio::time::timeout(self.wait_timeout, pending.outcome).await {
            Ok(result) => result,
            Err(_) => {
                tracing::error!(
                    "[SessionSaver] Timed out after {:?} waiting for save of {}",
                    self.wait_timeout,
                    pending.session_id
                );
                false
            }
        }
    }

    pub fn status(&self) -> SaveStatus {
        lock(&self.state).status
    }

    /// Marks the run as settled without writing anything.
    ///
    /// Used when a run completes with no recorded holds.
    pub fn mark_nothing_to_save(&self) {
        let mut state = lock(&self.state);
        if state.in_flight.is_none() {
            state.status = SaveStatus::Saved;
        }
    }

    /// The record of the last failed write, kept for a retry affordance.
    pub fn last_failed(&self) -> Option<SessionRecord> {
        lock(&self.state).last_failed.clone()
    }

    /// Clears all status and dedup memory for a brand-new session.
    ///
    /// A write still running keeps running but no longer reports into this
    /// saver's status. The next write waits for it to finish.
    pub fn reset(&self) {
        let mut state = lock(&self.state);
        let generation = state.generation + 1;
        let draining = state.in_flight.take().or_else(|| state.draining.take());
        *state = SaverState {
            generation,
            draining,
            ..SaverState::default()
        };
    }

    /// Waits for a pre-reset write, then forgets it.
    async fn drain(&self, draining: PendingSave) {
        tracing::debug!(
            "[SessionSaver] Waiting for pre-reset save of {}",
            draining.session_id
        );
        draining.outcome.await;
        let mut state = lock(&self.state);
        if state
            .draining
            .as_ref()
            .is_some_and(|d| d.generation == draining.generation)
        {
            state.draining = None;
        }
    }

    fn start_write(&self, state: &mut SaverState, record: SessionRecord) -> PendingSave {
        state.generation += 1;
        state.status = SaveStatus::Saving;
        state.last_failed = None;

        let generation = state.generation;
        let session_id = record.id.clone();
        let repository = Arc::clone(&self.repository);
        let shared_state = Arc::clone(&self.state);

        let handle = tokio::spawn(async move {
            let saved = repository.save_session(&record).await;
            finish_write(&shared_state, generation, record, saved);
            saved
        });

        let cleanup_state = Arc::clone(&self.state);
        let cleanup_id = session_id.clone();
        let outcome = async move {
            match handle.await {
                Ok(saved) => saved,
                Err(e) => {
                    tracing::error!("[SessionSaver] Save task for {} failed: {}", cleanup_id, e);
                    let mut state = lock(&cleanup_state);
                    if state.generation == generation {
                        state.in_flight = None;
                        state.status = SaveStatus::Error;
                    }
                    false
                }
            }
        }
        .boxed()
        .shared();

        let pending = PendingSave {
            session_id,
            generation,
            outcome,
        };
        state.in_flight = Some(pending.clone());
        pending
    }
}

fn finish_write(state: &Mutex<SaverState>, generation: u64, record: SessionRecord, saved: bool) {
    let mut state = lock(state);
    if state.generation != generation {
        if saved {
            tracing::debug!("[SessionSaver] Pre-reset save finished: {}", record.id);
        } else {
            tracing::error!("[SessionSaver] Pre-reset save failed: {}", record.id);
        }
        return;
    }

    state.in_flight = None;
    if saved {
        tracing::info!("[SessionSaver] Successfully saved session: {}", record.id);
        state.status = SaveStatus::Saved;
        state.saved_session_id = Some(record.id);
    } else {
        tracing::error!("[SessionSaver] Save returned false for session: {}", record.id);
        state.status = SaveStatus::Error;
        state.last_failed = Some(record);
    }
}

fn lock(state: &Mutex<SaverState>) -> MutexGuard<'_, SaverState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}
