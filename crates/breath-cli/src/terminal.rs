//! Terminal adapters for the session collaborators.

use std::sync::atomic::{AtomicU32, Ordering};

use breath_application::notification::{Navigator, Notification, NotificationLevel, UserNotifier};
use breath_application::session::UserAction;
use breath_core::cue::{Cue, CueNotifier};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

/// Prints cues as short lines.
#[derive(Default)]
pub struct TerminalCues {
    breaths: AtomicU32,
    minutes: AtomicU32,
}

impl TerminalCues {
    fn describe(&self, cue: Cue) -> Option<String> {
        let line = match cue {
            Cue::BreatheIn => {
                let n = self.breaths.fetch_add(1, Ordering::Relaxed) + 1;
                format!("  {:>3}  in", n)
            }
            Cue::BreatheOut => "       out".to_string(),
            Cue::HoldBreath => {
                self.breaths.store(0, Ordering::Relaxed);
                self.minutes.store(0, Ordering::Relaxed);
                "🫁 Exhale and hold. Press Enter when you breathe in.".to_string()
            }
            Cue::MinuteMarker => {
                let m = self.minutes.fetch_add(1, Ordering::Relaxed) + 1;
                format!("  ⏱  {} min", m)
            }
            Cue::HoldReleased => "Released.".to_string(),
            Cue::RecoveryBreath => "Recovery breath: inhale fully and hold.".to_string(),
            Cue::Release => "Let go.".to_string(),
            Cue::RoundComplete => "🎉 Session complete!".to_string(),
            Cue::SaveFailed => return None,
        };
        Some(line)
    }
}

impl CueNotifier for TerminalCues {
    fn notify(&self, cue: Cue) {
        tracing::trace!("[Cue] {}", cue);
        if let Some(line) = self.describe(cue) {
            println!("{}", line);
        }
    }
}

pub struct TerminalNotifier;

impl UserNotifier for TerminalNotifier {
    fn show(&self, notification: Notification) {
        let icon = match notification.level {
            NotificationLevel::Info => "ℹ️ ",
            NotificationLevel::Success => "✅",
            NotificationLevel::Error => "❌",
        };
        if notification.retry {
            println!("{} {} (type r and Enter to retry)", icon, notification.message);
        } else {
            println!("{} {}", icon, notification.message);
        }
    }
}

pub struct TerminalNavigator;

impl Navigator for TerminalNavigator {
    fn go_back(&self) {
        println!("Session closed.");
    }
}

/// Maps one input line to a driver action.
pub fn parse_action(line: &str) -> Option<UserAction> {
    match line.trim().to_ascii_lowercase().as_str() {
        "" => Some(UserAction::DoneHolding),
        "p" | "pause" => Some(UserAction::TogglePause),
        "q" | "quit" => Some(UserAction::Cancel),
        _ => None,
    }
}

/// Reads stdin lines on a background task. The channel closes at EOF.
pub fn spawn_line_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(16);
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if tx.send(line).await.is_err() {
                        break;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!("[CLI] Failed to read stdin: {}", e);
                    break;
                }
            }
        }
    });
    rx
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_action() {
        assert_eq!(parse_action(""), Some(UserAction::DoneHolding));
        assert_eq!(parse_action("  \r"), Some(UserAction::DoneHolding));
        assert_eq!(parse_action("P"), Some(UserAction::TogglePause));
        assert_eq!(parse_action("quit"), Some(UserAction::Cancel));
        assert_eq!(parse_action("r"), None);
    }

    #[test]
    fn test_breath_and_minute_counters_reset_per_hold() {
        let cues = TerminalCues::default();
        assert_eq!(cues.describe(Cue::BreatheIn).unwrap(), "    1  in");
        assert_eq!(cues.describe(Cue::BreatheIn).unwrap(), "    2  in");
        cues.describe(Cue::HoldBreath);
        assert_eq!(cues.describe(Cue::MinuteMarker).unwrap(), "  ⏱  1 min");
        cues.describe(Cue::HoldBreath);
        assert_eq!(cues.describe(Cue::BreatheIn).unwrap(), "    1  in");
        assert!(cues.describe(Cue::SaveFailed).is_none());
    }
}
