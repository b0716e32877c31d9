use std::sync::Arc;

use anyhow::{Context, Result};
use breath_application::session::{
    Collaborators, DriverOutcome, SessionDriver, SessionOrchestrator, SessionSaver,
};
use breath_core::preferences::SessionPreset;
use breath_core::session::SaveStatus;
use breath_core::stats::format_time;

use super::utils::AppContext;
use crate::terminal::{self, TerminalCues, TerminalNavigator, TerminalNotifier};

pub async fn run(ctx: &AppContext, preset: Option<&str>) -> Result<()> {
    let preferences = match preset {
        Some(name) => SessionPreset::from_name(name)
            .with_context(|| format!("Unknown preset '{}'", name))?
            .settings(),
        None => ctx.repository.get_preferences().await,
    };
    preferences.validate().context("Invalid session preferences")?;

    println!(
        "{} rounds of {} breaths, {}s per breath, {}s recovery.",
        preferences.number_of_rounds,
        preferences.breaths_per_round,
        preferences.breathing_speed,
        preferences.recovery_duration
    );
    println!("Enter ends a hold, p pauses breathing, q quits.");
    println!();

    let saver = SessionSaver::with_timeout(Arc::clone(&ctx.repository), ctx.config.save_timeout());
    let collaborators = Collaborators::new(
        Arc::new(TerminalCues::default()),
        Arc::new(TerminalNotifier),
        Arc::new(TerminalNavigator),
    );
    let mut orchestrator = SessionOrchestrator::new(preferences, saver, collaborators);

    let mut lines = terminal::spawn_line_reader();
    let (actions, mut driver) = SessionDriver::channel(16);

    let forward = async {
        while let Some(line) = lines.recv().await {
            if let Some(action) = terminal::parse_action(&line) {
                if actions.send(action).await.is_err() {
                    break;
                }
            }
        }
    };

    let outcome = tokio::select! {
        outcome = driver.run(&mut orchestrator) => outcome,
        _ = forward => DriverOutcome::Cancelled,
    };

    if outcome == DriverOutcome::Cancelled {
        orchestrator.cancel().await;
        return Ok(());
    }

    if let Some(summary) = orchestrator.summary() {
        println!(
            "Best hold {}, average {}",
            format_time(summary.best_hold),
            format_time(summary.average_hold.round() as u32)
        );
    }

    while orchestrator.save_status() == SaveStatus::Error {
        match lines.recv().await {
            Some(line) if line.trim().eq_ignore_ascii_case("r") => {
                orchestrator.retry_save().await;
            }
            _ => break,
        }
    }

    orchestrator.finish().await;
    Ok(())
}
