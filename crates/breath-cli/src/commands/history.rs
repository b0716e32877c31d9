use anyhow::Result;
use breath_core::session::SessionRecord;
use breath_core::stats::{self, TrendSummary};

use super::utils::AppContext;

pub async fn show(ctx: &AppContext, window: usize) -> Result<()> {
    let sessions = ctx.repository.get_sessions().await;
    if sessions.is_empty() {
        println!("No sessions yet. Start one with `breath session`.");
        return Ok(());
    }

    let summary = stats::calculate_stats(&sessions);
    println!("📊 {} sessions", summary.total_sessions);
    println!("   Best hold:    {}", stats::format_time(summary.best_hold));
    println!(
        "   Average hold: {}",
        stats::format_time(summary.average_hold.round() as u32)
    );
    if let Some(date) = summary.last_session_date.as_deref() {
        println!("   Last session: {}", date);
    }

    let trend = stats::build_trend_summary(&sessions, window.max(1));
    println!();
    for line in trend_lines(&trend) {
        println!("{}", line);
    }

    println!();
    for session in &sessions {
        println!("{}", session_line(session));
    }
    Ok(())
}

fn trend_lines(trend: &TrendSummary) -> Vec<String> {
    let mut lines = vec![format!(
        "📈 Rolling average {} ({:+.1}s vs earlier), streak {} day{}",
        stats::format_time(trend.rolling_average.round() as u32),
        trend.weekly_change,
        trend.streak,
        if trend.streak == 1 { "" } else { "s" }
    )];

    let peak = trend.series.iter().map(|p| p.max_hold).max().unwrap_or(0).max(1);
    for point in &trend.series {
        let width = (point.max_hold as usize * 30).div_ceil(peak as usize);
        lines.push(format!(
            "   {:>5} {:<30} {}",
            point.label,
            "█".repeat(width),
            stats::format_time(point.max_hold)
        ));
    }
    lines
}

fn session_line(session: &SessionRecord) -> String {
    let date = session
        .completed_at()
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| session.date.clone());
    let holds: Vec<String> = session
        .hold_times
        .iter()
        .map(|&h| stats::format_time(h))
        .collect();
    format!(
        "{}  {} round{}  best {}  [{}]",
        date,
        session.completed_rounds,
        if session.completed_rounds == 1 { "" } else { "s" },
        stats::format_time(session.best_hold()),
        holds.join(", ")
    )
}
