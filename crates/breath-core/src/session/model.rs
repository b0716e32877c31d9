//! Session domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::preferences::UserPreferences;

/// The durable artifact of one completed session.
///
/// `completed_rounds == hold_times.len()` holds for every record the
/// repository hands out; records with no holds are never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    /// Assigned once when the run first reaches `Complete`.
    pub id: String,
    /// ISO-8601 completion timestamp.
    pub date: String,
    pub completed_rounds: u32,
    /// Hold durations in seconds, one per completed hold.
    pub hold_times: Vec<u32>,
    /// Preferences snapshot the session ran with.
    pub settings: UserPreferences,
}

impl SessionRecord {
    pub fn new(
        id: impl Into<String>,
        date: DateTime<Utc>,
        hold_times: Vec<u32>,
        settings: UserPreferences,
    ) -> Self {
        Self {
            id: id.into(),
            date: date.to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            completed_rounds: hold_times.len() as u32,
            hold_times,
            settings,
        }
    }

    /// A record may be written only with an id and at least one hold.
    pub fn is_persistable(&self) -> bool {
        !self.id.trim().is_empty() && !self.hold_times.is_empty()
    }

    /// Display view of a stored record: `None` when it has no holds,
    /// otherwise the record with `completed_rounds` repaired.
    pub fn normalized(mut self) -> Option<Self> {
        if self.hold_times.is_empty() {
            return None;
        }
        self.completed_rounds = self.hold_times.len() as u32;
        Some(self)
    }

    /// Parsed completion time, if the stored date is well-formed.
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.date)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }

    pub fn best_hold(&self) -> u32 {
        self.hold_times.iter().copied().max().unwrap_or(0)
    }
}

/// One of the four phases of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Breathing,
    Holding,
    Recovery,
    Complete,
}

impl SessionPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete)
    }
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Breathing => "breathing",
            Self::Holding => "holding",
            Self::Recovery => "recovery",
            Self::Complete => "complete",
        };
        f.write_str(name)
    }
}

/// Progress of the run currently owned by a `PhaseEngine`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionPhaseState {
    /// 1-based.
    pub current_round: u32,
    pub current_phase: SessionPhase,
    pub breath_count: u32,
    pub hold_start_time: Option<DateTime<Utc>>,
    pub hold_times: Vec<u32>,
}

impl Default for SessionPhaseState {
    fn default() -> Self {
        Self {
            current_round: 1,
            current_phase: SessionPhase::Breathing,
            breath_count: 0,
            hold_start_time: None,
            hold_times: Vec::new(),
        }
    }
}

/// A phase change produced by one engine operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseTransition {
    pub from: SessionPhase,
    pub to: SessionPhase,
}

/// Disposition of the save coordinator toward the last session it saw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveStatus {
    #[default]
    Idle,
    Saving,
    Saved,
    Error,
}
