// ABOUTME: CLI entry point for postgis-shp-exporter
// ABOUTME: Loads the configuration, asks for the password, and runs the export

use anyhow::Result;
use clap::Parser;
use postgis_shp_exporter::commands;
use postgis_shp_exporter::config::{load_config, ExportConfig, DEFAULT_CONFIG_FILE, KEY_USER};
use postgis_shp_exporter::error::exit_code_for;
use postgis_shp_exporter::export::SystemRunner;
use postgis_shp_exporter::logging::TracingLogger;
use postgis_shp_exporter::postgres::{ConnectionParams, PostgresLayerSource};
use postgis_shp_exporter::prompt::prompt_password;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "postgis-shp-exporter")]
#[command(about = "Export PostGIS tables and views to zipped shapefiles", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to the KEY=VALUE configuration file
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,
    /// Database password; prompted for when not given
    #[arg(long, env = "PGPASSWORD", hide_env_values = true)]
    password: Option<String>,
    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging - default to INFO level if RUST_LOG not set
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(false)
        .init();

    let (config, params) = match prepare(&cli) {
        Ok(prepared) => prepared,
        Err(e) => {
            tracing::error!("{:#}", e);
            return ExitCode::from(exit_code_for(&e));
        }
    };

    let source = PostgresLayerSource::new(params.clone());

    // Failures are already logged by the command
    match commands::export(&config, &params, &source, &SystemRunner, &TracingLogger).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => ExitCode::from(exit_code_for(&e)),
    }
}

fn prepare(cli: &Cli) -> Result<(ExportConfig, ConnectionParams)> {
    let config = load_config(&cli.config)?;

    let password = match &cli.password {
        Some(password) => password.clone(),
        None => prompt_password(config.require(KEY_USER)?)?,
    };

    let params = ConnectionParams::from_config(&config, password)?;
    Ok((config, params))
}
