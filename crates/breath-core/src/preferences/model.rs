//! UserPreferences domain model.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{BreathError, Result};

/// Settings that shape one breathing session.
///
/// Immutable value object: an edit replaces the whole document. A session
/// takes a snapshot of these at start and never reloads them mid-run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPreferences {
    /// Breaths in the breathing phase of each round.
    pub breaths_per_round: u32,
    /// Rounds in a session.
    pub number_of_rounds: u32,
    /// Recovery hold, in seconds.
    pub recovery_duration: u32,
    /// Seconds per breath cycle (inhale + exhale).
    pub breathing_speed: f64,
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            breaths_per_round: 30,
            number_of_rounds: 3,
            recovery_duration: 15,
            breathing_speed: 2.0,
        }
    }
}

impl UserPreferences {
    /// Checks that every field is strictly positive.
    pub fn validate(&self) -> Result<()> {
        if self.breaths_per_round == 0 {
            return Err(BreathError::validation("breathsPerRound must be > 0"));
        }
        if self.number_of_rounds == 0 {
            return Err(BreathError::validation("numberOfRounds must be > 0"));
        }
        if self.recovery_duration == 0 {
            return Err(BreathError::validation("recoveryDuration must be > 0"));
        }
        if !(self.breathing_speed.is_finite() && self.breathing_speed > 0.0) {
            return Err(BreathError::validation("breathingSpeed must be > 0"));
        }
        Ok(())
    }

    /// Builds preferences from a stored JSON document, keeping every field
    /// that is present and valid and falling back to the default for the rest.
    ///
    /// Anything that is not a JSON object yields the defaults.
    pub fn merged_over_defaults(stored: &Value) -> Self {
        let mut prefs = Self::default();
        let Some(fields) = stored.as_object() else {
            return prefs;
        };

        if let Some(v) = positive_u32(fields, "breathsPerRound") {
            prefs.breaths_per_round = v;
        }
        if let Some(v) = positive_u32(fields, "numberOfRounds") {
            prefs.number_of_rounds = v;
        }
        if let Some(v) = positive_u32(fields, "recoveryDuration") {
            prefs.recovery_duration = v;
        }
        if let Some(v) = fields
            .get("breathingSpeed")
            .and_then(Value::as_f64)
            .filter(|v| v.is_finite() && *v > 0.0)
        {
            prefs.breathing_speed = v;
        }

        prefs
    }

    /// Length of one breath cycle. Falls back to the default pace when
    /// `breathing_speed` is not a positive finite number.
    pub fn breath_cycle(&self) -> std::time::Duration {
        let secs = if self.breathing_speed.is_finite() && self.breathing_speed > 0.0 {
            self.breathing_speed
        } else {
            Self::default().breathing_speed
        };
        std::time::Duration::from_secs_f64(secs)
    }
}

fn positive_u32(fields: &Map<String, Value>, key: &str) -> Option<u32> {
    fields
        .get(key)
        .and_then(Value::as_u64)
        .filter(|v| *v > 0)
        .and_then(|v| u32::try_from(v).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_values() {
        let prefs = UserPreferences::default();
        assert_eq!(prefs.breaths_per_round, 30);
        assert_eq!(prefs.number_of_rounds, 3);
        assert_eq!(prefs.recovery_duration, 15);
        assert_eq!(prefs.breathing_speed, 2.0);
        assert!(prefs.validate().is_ok());
    }

    #[test]
    fn test_serializes_camel_case() {
        let value = serde_json::to_value(UserPreferences::default()).unwrap();
        assert_eq!(value["breathsPerRound"], 30);
        assert_eq!(value["breathingSpeed"], 2.0);
    }

    #[test]
    fn test_validate_rejects_zero_fields() {
        let prefs = UserPreferences {
            number_of_rounds: 0,
            ..Default::default()
        };
        assert!(prefs.validate().unwrap_err().is_validation());

        let prefs = UserPreferences {
            breathing_speed: 0.0,
            ..Default::default()
        };
        assert!(prefs.validate().is_err());
    }

    #[test]
    fn test_merge_keeps_valid_fields_only() {
        let stored = json!({
            "breathsPerRound": 40,
            "numberOfRounds": -2,
            "breathingSpeed": "fast",
        });
        let prefs = UserPreferences::merged_over_defaults(&stored);
        assert_eq!(prefs.breaths_per_round, 40);
        assert_eq!(prefs.number_of_rounds, 3);
        assert_eq!(prefs.recovery_duration, 15);
        assert_eq!(prefs.breathing_speed, 2.0);
    }

    #[test]
    fn test_merge_non_object_yields_defaults() {
        let prefs = UserPreferences::merged_over_defaults(&json!([1, 2, 3]));
        assert_eq!(prefs, UserPreferences::default());
    }
}
