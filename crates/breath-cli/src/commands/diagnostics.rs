use anyhow::Result;
use breath_core::session::StorageDiagnostics;

use super::utils::AppContext;

pub async fn show(ctx: &AppContext) -> Result<()> {
    let report = ctx.repository.get_diagnostics().await;

    println!("Storage: {}", ctx.location);
    println!("Key prefix: {}", ctx.config.key_prefix);
    println!();
    for line in describe(&report) {
        println!("{}", line);
    }
    Ok(())
}

fn describe(report: &StorageDiagnostics) -> Vec<String> {
    let document = |name: &str, readable: bool, count: usize, bytes: usize| {
        if readable {
            format!("{:<8} {} sessions, {} bytes", name, count, bytes)
        } else if bytes > 0 {
            format!("{:<8} unreadable ({} bytes)", name, bytes)
        } else {
            format!("{:<8} missing", name)
        }
    };

    let mut lines = vec![
        document(
            "primary",
            report.primary_readable,
            report.primary_count,
            report.primary_bytes,
        ),
        document(
            "backup",
            report.backup_readable,
            report.backup_count,
            report.backup_bytes,
        ),
    ];
    lines.push(format!(
        "latest   {}",
        report.latest_session_id.as_deref().unwrap_or("-")
    ));
    if report.primary_readable
        && report.backup_readable
        && report.primary_count != report.backup_count
    {
        lines.push("⚠️  primary and backup entry counts differ".to_string());
    }
    lines
}
