use anyhow::{Context, Result};

use super::utils::AppContext;

pub async fn run(ctx: &AppContext, confirmed: bool) -> Result<()> {
    if !confirmed {
        anyhow::bail!("Refusing to delete session history without --yes");
    }

    ctx.repository
        .clear_sessions()
        .await
        .context("Failed to clear session history")?;

    println!("🗑  Session history cleared.");
    Ok(())
}
