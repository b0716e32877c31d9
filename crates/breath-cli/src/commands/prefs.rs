use anyhow::{Context, Result};
use breath_core::preferences::{SessionPreset, UserPreferences};

use super::utils::AppContext;

/// Fields to override; `None` keeps the saved value.
#[derive(Debug, Default, Clone, Copy)]
pub struct PrefsChanges {
    pub breaths_per_round: Option<u32>,
    pub number_of_rounds: Option<u32>,
    pub recovery_duration: Option<u32>,
    pub breathing_speed: Option<f64>,
}

impl PrefsChanges {
    fn apply(&self, mut preferences: UserPreferences) -> UserPreferences {
        if let Some(v) = self.breaths_per_round {
            preferences.breaths_per_round = v;
        }
        if let Some(v) = self.number_of_rounds {
            preferences.number_of_rounds = v;
        }
        if let Some(v) = self.recovery_duration {
            preferences.recovery_duration = v;
        }
        if let Some(v) = self.breathing_speed {
            preferences.breathing_speed = v;
        }
        preferences
    }
}

pub async fn show(ctx: &AppContext) -> Result<()> {
    let preferences = ctx.repository.get_preferences().await;
    print_preferences(&preferences);

    println!();
    println!("Presets:");
    for preset in SessionPreset::ALL {
        let s = preset.settings();
        println!(
            "  {:<9} {} breaths x {} rounds, {}s recovery, {}s/breath  {}",
            preset.name(),
            s.breaths_per_round,
            s.number_of_rounds,
            s.recovery_duration,
            s.breathing_speed,
            preset.description()
        );
    }
    Ok(())
}

pub async fn set(ctx: &AppContext, changes: PrefsChanges) -> Result<()> {
    let current = ctx.repository.get_preferences().await;
    let updated = changes.apply(current);
    save(ctx, &updated).await
}

pub async fn apply_preset(ctx: &AppContext, name: &str) -> Result<()> {
    let preset = SessionPreset::from_name(name).with_context(|| {
        let names: Vec<&str> = SessionPreset::ALL.iter().map(|p| p.name()).collect();
        format!("Unknown preset '{}'. Available: {}", name, names.join(", "))
    })?;
    println!("Applying preset {}", preset.name());
    save(ctx, &preset.settings()).await
}

async fn save(ctx: &AppContext, preferences: &UserPreferences) -> Result<()> {
    ctx.repository
        .save_preferences(preferences)
        .await
        .context("Failed to save preferences")?;
    println!("✅ Preferences saved");
    print_preferences(preferences);
    Ok(())
}

fn print_preferences(preferences: &UserPreferences) {
    println!("Breaths per round: {}", preferences.breaths_per_round);
    println!("Rounds:            {}", preferences.number_of_rounds);
    println!("Recovery:          {}s", preferences.recovery_duration);
    println!("Breathing speed:   {}s per breath", preferences.breathing_speed);
}
