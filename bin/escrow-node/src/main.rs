//! The escrow node takes a security deposit through its lifecycle between a landlord, a tenant
//! and the issuing deposit scheme.

use std::{fs, path::Path};

use anyhow::Context;
use clap::Parser;
use config::Config;
use constants::{DEFAULT_THREAD_COUNT, DEFAULT_THREAD_STACK_SIZE};
use escrow_common::logging::{self, LoggerConfig};
use escrow_params::prelude::EscrowParams;
use serde::de::DeserializeOwned;
use tokio::runtime;
use tracing::{debug, info, trace};

mod args;
mod config;
mod scenario;

mod constants;

fn main() -> anyhow::Result<()> {
    let mut logger_config = LoggerConfig::with_base_name("escrow-node");
    if let Some(url) = logging::get_otlp_url_from_env() {
        logger_config.set_otlp_url(url);
    }
    logging::init(logger_config)?;

    let cli = args::Cli::parse();
    info!(params = %cli.params.display(), config = %cli.config.display(), "starting escrow node");

    let params = parse_toml::<EscrowParams>(&cli.params)?;
    let config = parse_toml::<Config>(&cli.config)?;

    let runtime = runtime::Builder::new_multi_thread()
        .worker_threads(config.num_threads.unwrap_or(DEFAULT_THREAD_COUNT).into())
        .thread_stack_size(
            config
                .thread_stack_size
                .unwrap_or(DEFAULT_THREAD_STACK_SIZE),
        )
        .enable_all()
        .build()
        .context("could not create the runtime")?;

    runtime.block_on(scenario::run(params, config))?;

    info!("escrow node shutdown complete");

    Ok(())
}

/// Reads and parses a TOML file from the given path into the given type `T`.
fn parse_toml<T>(path: &Path) -> anyhow::Result<T>
where
    T: std::fmt::Debug + DeserializeOwned,
{
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read TOML file {}", path.display()))?;
    trace!(?raw, "read file");

    let parsed = toml::from_str::<T>(&raw)
        .with_context(|| format!("failed to parse TOML file {}", path.display()))?;
    debug!(?parsed, "parsed TOML file");

    Ok(parsed)
}
