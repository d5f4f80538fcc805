//! weft - durable workflow execution core
//!
//! Main entry point for the weft CLI.

mod activities;
mod cli;
mod cmd_store;
mod cmd_worker;
mod demo;

use std::path::PathBuf;

use anyhow::bail;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use weft_activity::ActivityExecutor;
use weft_config::{Config, ConfigLoader, ConfigValidator, LogFormat, LoggingSection};
use weft_sync::CoroutineConfig;

use crate::cli::{Cli, Commands};

/// Initialize tracing on stderr, so command output on stdout stays clean.
///
/// `RUST_LOG` wins over the configured level.
fn init_tracing(logging: &LoggingSection) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let registry = tracing_subscriber::registry().with(env_filter);
    match logging.format {
        LogFormat::Pretty => registry
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = ConfigLoader::load_or_default(cli.config.as_deref())?;
    if let Some(db) = &cli.db {
        config.backend.sqlite_path = db.display().to_string();
    }

    let validation = ConfigValidator::validate(&config);
    for warning in &validation.warnings {
        eprintln!("config warning: {}: {}", warning.path, warning.message);
    }
    if !validation.is_valid() {
        let errors: Vec<_> = validation
            .errors
            .iter()
            .map(|e| format!("{}: {}", e.path, e.message))
            .collect();
        bail!("invalid configuration:\n  {}", errors.join("\n  "));
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    init_tracing(&config.logging);

    info!("Starting weft v{}", env!("CARGO_PKG_VERSION"));
    let db_path = PathBuf::from(&config.backend.sqlite_path);

    match cli.command {
        Commands::Demo { capacity, items } => {
            let capacity = capacity.unwrap_or(config.channel.default_capacity);
            let coroutine = CoroutineConfig::new(config.coroutine.resume_deadline());
            let report =
                demo::run(activities::builtin_registry()?, coroutine, capacity, items).await?;

            println!("received: {:?}", report.received);
            println!("rounds:   {}", report.rounds);
            match report.total {
                Some(total) => println!("sum:      {}", total),
                None => warn!("sum activity returned no result"),
            }
        }
        Commands::Schedule {
            name,
            inputs,
            instance,
            delay_secs,
        } => {
            let store = cmd_store::open_store(&db_path, config.backend.lease()).await?;
            let delay = delay_secs.map(std::time::Duration::from_secs);
            let event = cmd_store::schedule(&store, &instance, &name, &inputs, delay).await?;
            println!("{}", event.id);
        }
        Commands::Worker { once } => {
            let store = cmd_store::open_store(&db_path, config.backend.lease()).await?;
            let executor = ActivityExecutor::new(activities::builtin_registry()?);
            cmd_worker::run(&store, &executor, config.worker.poll_interval(), once).await?;
        }
        Commands::Pending => {
            let store = cmd_store::open_store(&db_path, config.backend.lease()).await?;
            cmd_store::pending(&store).await?;
        }
        Commands::Activities => {
            for descriptor in activities::builtin_registry()?.list() {
                println!(
                    "{:<8} ({}) -> {:?}{}",
                    descriptor.name,
                    descriptor.params.join(", "),
                    descriptor.shape,
                    if descriptor.accepts_context { " [context]" } else { "" }
                );
            }
        }
    }

    Ok(())
}
