//! Timer-driven driver for a session run.
//!
//! The phase engine has no notion of time. `SessionDriver` supplies it:
//! it ticks breaths at the configured pace, measures holds on a monotonic
//! clock, and runs the recovery countdown, while user actions arrive on a
//! channel.

use std::time::Duration;

use breath_core::cue::Cue;
use breath_core::session::SessionPhase;
use tokio::sync::mpsc;
use tokio::time::{Instant, sleep, sleep_until};

use super::orchestrator::SessionOrchestrator;

/// Share of a breath cycle spent inhaling.
const INHALE_SHARE: f64 = 0.55;
const MINUTE: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserAction {
    /// Ends the current hold.
    DoneHolding,
    /// Pauses or resumes breathing. Ignored in other phases.
    TogglePause,
    /// Abandons the run.
    Cancel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverOutcome {
    /// The run reached `Complete` and the save was attempted.
    Completed,
    /// The user cancelled, or the action channel closed.
    Cancelled,
}

enum Flow {
    Continue,
    Cancelled,
}

enum Interrupt {
    Elapsed,
    Paused,
    Cancelled,
}

/// Feeds timer ticks and user actions into a `SessionOrchestrator`.
pub struct SessionDriver {
    actions: mpsc::Receiver<UserAction>,
}

impl SessionDriver {
    pub fn new(actions: mpsc::Receiver<UserAction>) -> Self {
        Self { actions }
    }

    /// Creates a driver together with the sender for its actions.
    pub fn channel(buffer: usize) -> (mpsc::Sender<UserAction>, Self) {
        let (tx, rx) = mpsc::channel(buffer);
        (tx, Self::new(rx))
    }

    /// Runs `orchestrator` until the run completes or is cancelled.
    ///
    /// Navigation is left to the caller: `finish` after `Completed`,
    /// `cancel` after `Cancelled`.
    pub async fn run(&mut self, orchestrator: &mut SessionOrchestrator) -> DriverOutcome {
        tracing::info!(
            "[Driver] Starting session: {} rounds of {} breaths",
            orchestrator.preferences().number_of_rounds,
            orchestrator.preferences().breaths_per_round
        );

        loop {
            let flow = match orchestrator.phase() {
                SessionPhase::Breathing => self.breathe(orchestrator).await,
                SessionPhase::Holding => self.hold(orchestrator).await,
                SessionPhase::Recovery => self.recover(orchestrator).await,
                SessionPhase::Complete => return DriverOutcome::Completed,
            };
            if let Flow::Cancelled = flow {
                tracing::info!("[Driver] Session cancelled during {}", orchestrator.phase());
                return DriverOutcome::Cancelled;
            }
        }
    }

    async fn breathe(&mut self, orchestrator: &mut SessionOrchestrator) -> Flow {
        let cycle = orchestrator.preferences().breath_cycle();
        let inhale = cycle.mul_f64(INHALE_SHARE);
        let exhale = cycle.saturating_sub(inhale);

        while orchestrator.phase() == SessionPhase::Breathing {
            orchestrator.cue(Cue::BreatheIn);

            let mut interrupt = self.wait_breathing(inhale).await;
            if let Interrupt::Elapsed = interrupt {
                orchestrator.cue(Cue::BreatheOut);
                interrupt = self.wait_breathing(exhale).await;
            }

            match interrupt {
                Interrupt::Elapsed => {
                    orchestrator.increment_breath();
                }
                Interrupt::Paused => {
                    tracing::debug!(
                        "[Driver] Paused at breath {}",
                        orchestrator.state().breath_count
                    );
                    if let Flow::Cancelled = self.wait_for_resume().await {
                        return Flow::Cancelled;
                    }
                    tracing::debug!("[Driver] Resumed");
                }
                Interrupt::Cancelled => return Flow::Cancelled,
            }
        }
        Flow::Continue
    }

    async fn hold(&mut self, orchestrator: &mut SessionOrchestrator) -> Flow {
        let started = Instant::now();
        let mut minutes: u32 = 0;

        loop {
            let next_marker = started + MINUTE * (minutes + 1);
            tokio::select! {
                _ = sleep_until(next_marker) => {
                    minutes += 1;
                    orchestrator.cue(Cue::MinuteMarker);
                }
                action = self.actions.recv() => match action {
                    Some(UserAction::DoneHolding) => {
                        let held = u32::try_from(started.elapsed().as_secs()).unwrap_or(u32::MAX);
                        orchestrator.complete_hold(held);
                        return Flow::Continue;
                    }
                    Some(UserAction::TogglePause) => {}
                    Some(UserAction::Cancel) | None => return Flow::Cancelled,
                },
            }
        }
    }

    async fn recover(&mut self, orchestrator: &mut SessionOrchestrator) -> Flow {
        let recovery = Duration::from_secs(u64::from(orchestrator.preferences().recovery_duration));
        let countdown = sleep(recovery);
        tokio::pin!(countdown);

        loop {
            tokio::select! {
                _ = &mut countdown => break,
                action = self.actions.recv() => match action {
                    Some(UserAction::Cancel) | None => return Flow::Cancelled,
                    Some(_) => {}
                },
            }
        }

        orchestrator.complete_recovery().await;
        Flow::Continue
    }

    async fn wait_breathing(&mut self, duration: Duration) -> Interrupt {
        let deadline = Instant::now() + duration;
        loop {
            tokio::select! {
                _ = sleep_until(deadline) => return Interrupt::Elapsed,
                action = self.actions.recv() => match action {
                    Some(UserAction::TogglePause) => return Interrupt::Paused,
                    Some(UserAction::Cancel) | None => return Interrupt::Cancelled,
                    Some(UserAction::DoneHolding) => {}
                },
            }
        }
    }

    async fn wait_for_resume(&mut self) -> Flow {
        loop {
            match self.actions.recv().await {
                Some(UserAction::TogglePause) => return Flow::Continue,
                Some(UserAction::Cancel) | None => return Flow::Cancelled,
                Some(UserAction::DoneHolding) => {}
            }
        }
    }
}
