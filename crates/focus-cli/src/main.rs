use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use focus_cli::commands::control::{self, ConfigureSource};
use focus_cli::commands::lock::TimerLock;
use focus_cli::commands::{history, run, stats, status, tags, theme, util};
use focus_cli::{Cli, Commands, Config};

/// Load config and open the database it points to.
fn open_database(config_path: Option<&Path>) -> Result<(focus_db::Database, Config)> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    let db = util::open_database(&config)?;
    Ok((db, config))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    let Some(command) = cli.command else {
        // No subcommand, show help
        use clap::CommandFactory;
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    let (db, config) = open_database(cli.config.as_deref())?;
    let _lock = if command.mutates_timer() {
        Some(TimerLock::acquire(&config.database_path)?)
    } else {
        None
    };
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match command {
        Commands::Run { tag, minutes } => {
            run::run(
                &mut out,
                db,
                tag.as_deref(),
                minutes,
                config.tick_interval(),
            )?;
        }
        Commands::Configure {
            tag,
            minutes,
            from_history,
        } => {
            let source = match (from_history, tag) {
                (Some(from), _) => ConfigureSource::FromHistory(from),
                (None, Some(tag)) => ConfigureSource::Explicit { tag, minutes },
                (None, None) => anyhow::bail!("either --tag or --from-history is required"),
            };
            control::configure(&mut out, db, source)?;
        }
        Commands::Stop => {
            control::stop(&mut out, db, Utc::now())?;
        }
        Commands::Reset => control::reset(&mut out, db)?,
        Commands::Status { json } => status::run(&mut out, db, json)?,
        Commands::History { json, limit } => history::run(&mut out, db, json, limit)?,
        Commands::Tags => tags::run(&mut out, db)?,
        Commands::Stats { json, period } => stats::run(&mut out, db, json, period)?,
        Commands::Theme {
            dark,
            light,
            system,
        } => {
            let update = if dark {
                Some(Some(true))
            } else if light {
                Some(Some(false))
            } else if system {
                Some(None)
            } else {
                None
            };
            theme::run(&mut out, db, update)?;
        }
    }

    Ok(())
}
