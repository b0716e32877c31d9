use std::path::PathBuf;

use anyhow::{Context, Result};
use breath_core::config::AppConfig;
use breath_infrastructure::ConfigService;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod terminal;

#[derive(Parser)]
#[command(name = "breath")]
#[command(about = "Guided breathing sessions with hold tracking", long_about = None)]
struct Cli {
    /// Store data in this directory instead of the platform data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Keep everything in memory for this run
    #[arg(long, global = true)]
    ephemeral: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a guided session
    Session {
        /// Use a built-in preset instead of the saved preferences
        #[arg(long)]
        preset: Option<String>,
    },
    /// Show past sessions, statistics and trends
    History {
        /// Number of recent sessions in the trend window
        #[arg(long, default_value_t = 7)]
        window: usize,
    },
    /// Show or edit session preferences
    Prefs {
        #[command(subcommand)]
        action: PrefsAction,
    },
    /// Print a storage health report
    Diagnostics,
    /// Delete all session history
    Clear {
        /// Confirm deletion
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum PrefsAction {
    /// Print the saved preferences and the built-in presets
    Show,
    /// Change individual settings
    Set {
        #[arg(long)]
        breaths: Option<u32>,
        #[arg(long)]
        rounds: Option<u32>,
        /// Recovery duration in seconds
        #[arg(long)]
        recovery: Option<u32>,
        /// Seconds per breath cycle
        #[arg(long)]
        speed: Option<f64>,
    },
    /// Replace the preferences with a built-in preset
    Preset { name: String },
}

/// Installs the stderr subscriber.
///
/// Filter precedence: `BREATH_LOG`, then `RUST_LOG`, then the configured level.
fn init_logging(config: &AppConfig) {
    let filter = EnvFilter::try_from_env("BREATH_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

async fn load_config() -> Result<AppConfig> {
    let service = ConfigService::default_location().context("Failed to locate config file")?;
    let config = service
        .load()
        .await
        .with_context(|| format!("Failed to load {}", service.path().display()))?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config().await?;
    init_logging(&config);

    let ctx = commands::utils::open_context(cli.data_dir, cli.ephemeral, config).await?;

    match cli.command {
        Commands::Session { preset } => commands::session::run(&ctx, preset.as_deref()).await?,
        Commands::History { window } => commands::history::show(&ctx, window).await?,
        Commands::Prefs { action } => match action {
            PrefsAction::Show => commands::prefs::show(&ctx).await?,
            PrefsAction::Set {
                breaths,
                rounds,
                recovery,
                speed,
            } => {
                let changes = commands::prefs::PrefsChanges {
                    breaths_per_round: breaths,
                    number_of_rounds: rounds,
                    recovery_duration: recovery,
                    breathing_speed: speed,
                };
                commands::prefs::set(&ctx, changes).await?
            }
            PrefsAction::Preset { name } => commands::prefs::apply_preset(&ctx, &name).await?,
        },
        Commands::Diagnostics => commands::diagnostics::show(&ctx).await?,
        Commands::Clear { yes } => commands::clear::run(&ctx, yes).await?,
    }

    Ok(())
}
