use std::path::PathBuf;

use annals_config::{ConfigLoad, ConfigLoader, ConfigLoaderOptions, build_factory, init_tracing};
use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(name = "annals-check", about = "Validate Annals configuration and connectivity")]
struct Cli {
    /// Configuration file (defaults to ANNALS_CONFIG or ./annals.toml)
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long, default_value = ".env")]
    env_file: PathBuf,
    /// Create the document table and indexes when using PostgreSQL
    #[arg(long)]
    ensure_schema: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let ConfigLoad { config, warnings } = ConfigLoader::with_options(ConfigLoaderOptions {
        config_path: cli.config,
        env_file: Some(cli.env_file),
    })
    .load()
    .context("failed to load configuration")?;

    init_tracing()?;

    if config.metadata.env_file_loaded {
        info!("loaded .env file");
    }
    if let Some(path) = &config.metadata.config_path {
        info!(path = %path.display(), "configuration file loaded");
    }
    for warning in &warnings.items {
        match &warning.hint {
            Some(hint) => {
                warn!(message = %warning.message, hint = %hint, "configuration warning")
            }
            None => warn!(message = %warning.message, "configuration warning"),
        }
    }

    let bootstrap = build_factory(&config)
        .await
        .context("failed to connect configured backends")?;

    if cli.ensure_schema {
        match &bootstrap.postgres {
            Some(store) => {
                store
                    .ensure_schema()
                    .await
                    .context("failed to create document schema")?;
                info!("document schema is up to date");
            }
            None => warn!("--ensure-schema ignored: no database configured"),
        }
    }

    println!("store:     {:?}", bootstrap.store);
    println!("cache:     {:?}", bootstrap.cache);
    if config.cache.enabled {
        println!("cache ttl: {}", humantime::format_duration(config.cache.ttl));
    }
    println!("warnings:  {}", warnings.items.len());

    Ok(())
}
