//! History statistics and hold trends.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::session::SessionRecord;

/// Headline numbers for the history screen.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStats {
    pub total_sessions: usize,
    /// Mean of every hold, rounded to two decimals.
    pub average_hold: f64,
    pub best_hold: u32,
    /// Date of the newest session.
    pub last_session_date: Option<String>,
}

/// One bar of the trend chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendPoint {
    pub session_id: String,
    /// `MM/DD` of the session, or `--` when the date is unreadable.
    pub label: String,
    pub max_hold: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendSummary {
    /// Mean hold across the newest `window` sessions.
    pub rolling_average: f64,
    /// `rolling_average` minus the mean hold of all older sessions.
    pub weekly_change: f64,
    /// Consecutive days with a session, counting back from the newest one.
    pub streak: u32,
    /// The newest `window` sessions, oldest first.
    pub series: Vec<TrendPoint>,
}

/// Sessions are expected newest-first, as the repository returns them.
pub fn calculate_stats(sessions: &[SessionRecord]) -> SessionStats {
    let Some(newest) = sessions.first() else {
        return SessionStats::default();
    };

    let holds: Vec<u32> = sessions
        .iter()
        .flat_map(|s| s.hold_times.iter().copied())
        .collect();

    SessionStats {
        total_sessions: sessions.len(),
        average_hold: round2(mean(&holds)),
        best_hold: holds.iter().copied().max().unwrap_or(0),
        last_session_date: Some(newest.date.clone()),
    }
}

/// Summarises the newest `window` sessions against everything older.
pub fn build_trend_summary(sessions: &[SessionRecord], window: usize) -> TrendSummary {
    let with_holds: Vec<&SessionRecord> = sessions
        .iter()
        .filter(|s| !s.hold_times.is_empty())
        .collect();
    if with_holds.is_empty() || window == 0 {
        return TrendSummary::default();
    }

    let split = window.min(with_holds.len());
    let (recent, older) = with_holds.split_at(split);

    let rolling_average = round2(mean(&holds_of(recent)));
    let weekly_change = if older.is_empty() {
        0.0
    } else {
        round2(rolling_average - mean(&holds_of(older)))
    };

    let series = recent
        .iter()
        .rev()
        .map(|s| TrendPoint {
            session_id: s.id.clone(),
            label: s
                .completed_at()
                .map(|dt| dt.format("%m/%d").to_string())
                .unwrap_or_else(|| "--".to_string()),
            max_hold: s.best_hold(),
        })
        .collect();

    TrendSummary {
        rolling_average,
        weekly_change,
        streak: day_streak(&with_holds),
        series,
    }
}

/// Formats seconds as `m:ss`.
pub fn format_time(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

fn day_streak(sessions: &[&SessionRecord]) -> u32 {
    let Some(newest) = sessions.first().and_then(|s| s.completed_at()) else {
        return 0;
    };
    let days: BTreeSet<NaiveDate> = sessions
        .iter()
        .filter_map(|s| s.completed_at())
        .map(|dt| dt.date_naive())
        .collect();

    let mut streak = 0;
    let mut day = newest.date_naive();
    while days.contains(&day) {
        streak += 1;
        match day.pred_opt() {
            Some(prev) => day = prev,
            None => break,
        }
    }
    streak
}

fn holds_of(sessions: &[&SessionRecord]) -> Vec<u32> {
    sessions
        .iter()
        .flat_map(|s| s.hold_times.iter().copied())
        .collect()
}

fn mean(values: &[u32]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().map(|v| f64::from(*v)).sum::<f64>() / values.len() as f64
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
