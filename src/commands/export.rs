// ABOUTME: Export command tying configuration, layer discovery, and the engines together
// ABOUTME: Fails early on an unknown engine and on an empty layer list

use crate::config::{ExportConfig, KEY_DB_SCHEMA, KEY_ENGINE, KEY_EXPORT_FOLDER};
use crate::error::ExporterError;
use crate::export::{export_layers, CommandRunner, Engine, ExportSummary};
use crate::logging::Logger;
use crate::postgres::{build_query, ConnectionParams, LayerSource, QueryType};
use anyhow::Result;
use std::path::Path;

/// Export every layer of the configured schema to zipped shapefiles
///
/// Steps:
/// 1. Resolves the engine and required settings, before any side effect
/// 2. Builds the layer query from DBSCHEMA and QUERYTYPE
/// 3. Lists layers through `source`
/// 4. Checks the engine executable is installed
/// 5. Exports each layer with `runner`
///
/// Every terminal failure is reported through `logger` once and returned.
///
/// # Errors
///
/// This function will return an error if:
/// - A required configuration key is missing or PORT is invalid
/// - ENGINE is neither `ogr2ogr` nor `pgsql2shp`
/// - The layer listing fails
/// - The schema has no matching layers ([`ExporterError::NoLayers`])
/// - The engine executable is not installed
/// - Any layer export fails (remaining layers are skipped)
pub async fn export(
    config: &ExportConfig,
    params: &ConnectionParams,
    source: &dyn LayerSource,
    runner: &dyn CommandRunner,
    logger: &dyn Logger,
) -> Result<ExportSummary> {
    let result = run(config, params, source, runner, logger).await;
    if let Err(e) = &result {
        logger.error(&format!("{:#}", e));
    }
    result
}

async fn run(
    config: &ExportConfig,
    params: &ConnectionParams,
    source: &dyn LayerSource,
    runner: &dyn CommandRunner,
    logger: &dyn Logger,
) -> Result<ExportSummary> {
    let engine: Engine = config.require(KEY_ENGINE)?.parse()?;
    let schema = config.require(KEY_DB_SCHEMA)?;
    let folder = Path::new(config.require(KEY_EXPORT_FOLDER)?);

    let query = build_query(QueryType::from_setting(config.query_type.as_deref()), schema);

    logger.info("Getting data from PostGIS...");
    let layers = source.list_layers(&query).await?;

    if layers.is_empty() {
        return Err(ExporterError::NoLayers {
            schema: schema.to_string(),
        }
        .into());
    }
    logger.info(&format!("Found {} layer(s) in schema '{}'", layers.len(), schema));

    runner.ensure_available(engine)?;

    let summary = export_layers(&layers, folder, engine, params, runner, logger)?;

    logger.info(&format!(
        "Export complete: {} archive(s) written to {}",
        summary.archives.len(),
        folder.display()
    ));
    Ok(summary)
}
