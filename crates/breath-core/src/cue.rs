//! Audio and haptic cues.

use serde::{Deserialize, Serialize};

/// A cue played at a point of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cue {
    BreatheIn,
    BreatheOut,
    HoldBreath,
    MinuteMarker,
    HoldReleased,
    RecoveryBreath,
    Release,
    RoundComplete,
    SaveFailed,
}

impl Cue {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BreatheIn => "breathe_in",
            Self::BreatheOut => "breathe_out",
            Self::HoldBreath => "hold_breath",
            Self::MinuteMarker => "minute_marker",
            Self::HoldReleased => "hold_released",
            Self::RecoveryBreath => "recovery_breath",
            Self::Release => "release",
            Self::RoundComplete => "round_complete",
            Self::SaveFailed => "save_failed",
        }
    }
}

impl std::fmt::Display for Cue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fire-and-forget sink for cues.
///
/// Implementations swallow their own failures; nothing flows back into the
/// session.
pub trait CueNotifier: Send + Sync {
    fn notify(&self, cue: Cue);
}

/// Discards every cue.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentCues;

impl CueNotifier for SilentCues {
    fn notify(&self, _cue: Cue) {}
}
