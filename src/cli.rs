//! CLI definitions for weft.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// weft CLI.
#[derive(Parser)]
#[command(name = "weft")]
#[command(about = "Durable workflow execution core")]
#[command(version)]
pub(crate) struct Cli {
    /// Configuration file path (defaults to ~/.weft/config.toml when present)
    #[arg(short, long, global = true, env = "WEFT_CONFIG")]
    pub config: Option<PathBuf>,

    /// SQLite database path, overriding the configured one
    #[arg(long, global = true, env = "WEFT_DB")]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Run a producer/consumer workflow over a channel, then sum the
    /// received values with the `sum` activity
    Demo {
        /// Channel buffer size (defaults to channel.default_capacity)
        #[arg(long)]
        capacity: Option<usize>,

        /// Number of values the producer sends
        #[arg(long, default_value_t = 5)]
        items: u32,
    },

    /// Schedule an activity in the SQLite store
    Schedule {
        /// Activity name
        name: String,

        /// Positional inputs as JSON; anything that is not valid JSON is
        /// taken as a string
        inputs: Vec<String>,

        /// Workflow instance the activity belongs to
        #[arg(long, default_value = "cli")]
        instance: String,

        /// Make the activity visible only after this many seconds
        #[arg(long)]
        delay_secs: Option<u64>,
    },

    /// Poll the store and execute due activities
    Worker {
        /// Drain what is due now and exit instead of polling forever
        #[arg(long)]
        once: bool,
    },

    /// List scheduled activities
    Pending,

    /// List the built-in activities
    Activities,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_schedule() {
        let cli = Cli::parse_from(["weft", "schedule", "sum", "[1,2]", "--instance", "wf-1"]);
        match cli.command {
            Commands::Schedule {
                name,
                inputs,
                instance,
                delay_secs,
            } => {
                assert_eq!(name, "sum");
                assert_eq!(inputs, vec!["[1,2]"]);
                assert_eq!(instance, "wf-1");
                assert_eq!(delay_secs, None);
            }
            _ => panic!("expected schedule"),
        }
    }

    #[test]
    fn test_parse_demo_defaults() {
        let cli = Cli::parse_from(["weft", "demo"]);
        assert!(matches!(
            cli.command,
            Commands::Demo {
                capacity: None,
                items: 5
            }
        ));
    }
}
