//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{ArgGroup, Parser, Subcommand};
use focus_core::Period;

/// Focus timer.
///
/// Name a task, optionally give it a duration, and keep a history of the
/// time you spent on it.
#[derive(Debug, Parser)]
#[command(name = "focus", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Start or resume the timer and run it in the foreground.
    ///
    /// A countdown runs until it completes. Ctrl-C pauses the run; resume it
    /// with `focus run` or record it with `focus stop`.
    Run {
        /// Task tag. Keeps the current tag when omitted.
        #[arg(long)]
        tag: Option<String>,

        /// Planned duration in minutes. Omit for an open-ended run.
        #[arg(long)]
        minutes: Option<f64>,
    },

    /// Set the task and planned duration without starting.
    #[command(group(ArgGroup::new("task").required(true).args(["tag", "from_history"])))]
    Configure {
        /// Task tag.
        #[arg(long)]
        tag: Option<String>,

        /// Planned duration in minutes. Omit for an open-ended run.
        #[arg(long, conflicts_with = "from_history")]
        minutes: Option<f64>,

        /// Reuse the tag and duration of the latest session with this tag.
        #[arg(long, value_name = "TAG", conflicts_with = "tag")]
        from_history: Option<String>,
    },

    /// Record the paused run as a session and return to idle.
    Stop,

    /// Discard the current progress without recording it.
    Reset,

    /// Show the timer.
    Status {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// List recorded sessions, most recent first.
    History {
        /// Output as JSON.
        #[arg(long)]
        json: bool,

        /// Show at most this many sessions.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// List known tags with their suggested durations.
    Tags,

    /// Show time totals for today, this week, this month and all time.
    Stats {
        /// Output as JSON.
        #[arg(long)]
        json: bool,

        /// Limit output to one period (today, week, month or all).
        #[arg(long)]
        period: Option<Period>,
    },

    /// Show or set the theme preference.
    #[command(group(ArgGroup::new("mode").args(["dark", "light", "system"])))]
    Theme {
        /// Prefer the dark theme.
        #[arg(long)]
        dark: bool,

        /// Prefer the light theme.
        #[arg(long)]
        light: bool,

        /// Follow the system theme.
        #[arg(long)]
        system: bool,
    },
}

impl Commands {
    /// Whether the command writes timer state and must hold the timer lock.
    #[must_use]
    pub const fn mutates_timer(&self) -> bool {
        matches!(
            self,
            Self::Run { .. } | Self::Configure { .. } | Self::Stop | Self::Reset
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn configure_requires_a_task() {
        let result = Cli::try_parse_from(["focus", "configure", "--minutes", "25"]);
        assert!(result.is_err());
    }

    #[test]
    fn configure_rejects_minutes_with_history() {
        let result =
            Cli::try_parse_from(["focus", "configure", "--from-history", "Writing", "--minutes", "5"]);
        assert!(result.is_err());
    }

    #[test]
    fn theme_flags_are_exclusive() {
        let result = Cli::try_parse_from(["focus", "theme", "--dark", "--light"]);
        assert!(result.is_err());
    }

    #[test]
    fn run_accepts_fractional_minutes() {
        let cli = Cli::try_parse_from(["focus", "run", "--tag", "Writing", "--minutes", "0.5"]).unwrap();
        match cli.command {
            Some(Commands::Run { tag, minutes }) => {
                assert_eq!(tag.as_deref(), Some("Writing"));
                assert_eq!(minutes, Some(0.5));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn stats_parses_period() {
        let cli = Cli::try_parse_from(["focus", "stats", "--period", "week"]).unwrap();
        match cli.command {
            Some(Commands::Stats { period, .. }) => assert_eq!(period, Some(Period::Week)),
            other => panic!("unexpected command: {other:?}"),
        }

        let result = Cli::try_parse_from(["focus", "stats", "--period", "year"]);
        assert!(result.is_err());
    }

    #[test]
    fn only_timer_commands_take_the_lock() {
        let parse = |args: &[&str]| Cli::try_parse_from(args).unwrap().command.unwrap();

        assert!(parse(&["focus", "stop"]).mutates_timer());
        assert!(parse(&["focus", "reset"]).mutates_timer());
        assert!(parse(&["focus", "run", "--tag", "Writing"]).mutates_timer());
        assert!(!parse(&["focus", "status"]).mutates_timer());
        assert!(!parse(&["focus", "stats"]).mutates_timer());
        assert!(!parse(&["focus", "theme", "--dark"]).mutates_timer());
    }
}
