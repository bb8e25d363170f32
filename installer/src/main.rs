//! modmerge - installs a mod's configuration fragments into a DayZ server mission.
//!
//! Copies the mod's `custom/` files into the mission folder, registers them in
//! `cfggameplay.json`, and merges the remaining fragments into their installed
//! counterparts with the modmerge-engine reconciliation logic.

mod cli;
mod config;
mod error;
mod install;
mod pipeline;
mod report;
mod store;

use crate::cli::Cli;
use crate::config::Config;
use crate::store::{LocalStore, MissionStore};
use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "modmerge=info,modmerge_engine=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = Config::resolve(&cli)?;
    config.validate()?;

    let data = Arc::new(LocalStore::new(&config.data_dir));
    let mission = Arc::new(LocalStore::new(&config.mission_path));
    tracing::info!(
        data = %data.describe(),
        mission = %mission.describe(),
        dry_run = config.dry_run,
        "starting install"
    );

    let installation = install::install_custom_files(&*data, &*mission, config.dry_run).await;
    tracing::info!(
        count = installation.installed.len(),
        problems = installation.problems.len(),
        "custom files installed"
    );

    let mut reports = installation.problems;
    reports.extend(
        pipeline::run_all(data, mission, Arc::new(installation.installed), config.options()).await,
    );

    println!("{}", report::render(&reports, cli.format)?);
    if reports.iter().any(|r| r.status.is_failure()) {
        tracing::warn!("some files failed; their previous content was left in place");
    }

    Ok(())
}
