//! Built-in session presets.

use serde::{Deserialize, Serialize};

use super::model::UserPreferences;

/// Quick configurations offered next to the manual settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionPreset {
    Beginner,
    Standard,
    Advanced,
}

impl SessionPreset {
    pub const ALL: [SessionPreset; 3] = [Self::Beginner, Self::Standard, Self::Advanced];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Beginner => "Beginner",
            Self::Standard => "Standard",
            Self::Advanced => "Advanced",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Beginner => "Gentle introduction with fewer breaths and slower pace",
            Self::Standard => "Classic three-round protocol",
            Self::Advanced => "Intensive session for experienced practitioners",
        }
    }

    pub fn settings(&self) -> UserPreferences {
        match self {
            Self::Beginner => UserPreferences {
                breaths_per_round: 20,
                number_of_rounds: 2,
                recovery_duration: 20,
                breathing_speed: 2.5,
            },
            Self::Standard => UserPreferences::default(),
            Self::Advanced => UserPreferences {
                breaths_per_round: 40,
                number_of_rounds: 4,
                recovery_duration: 15,
                breathing_speed: 1.5,
            },
        }
    }

    /// Case-insensitive lookup by preset name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|preset| preset.name().eq_ignore_ascii_case(name))
    }
}
