// ABOUTME: Per-layer export loop: run the engine, zip its folder, clean up
// ABOUTME: Stops at the first failure and reports how far it got

use super::archive::{create_folder, remove_folder, zip_directory};
use super::engine::{Engine, ExportJob};
use super::runner::CommandRunner;
use crate::logging::Logger;
use crate::postgres::{ConnectionParams, Layer};
use crate::utils::{ensure_path_safe_name, sanitize_identifier};
use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};

/// Archives produced by a completed export, in layer order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportSummary {
    pub archives: Vec<PathBuf>,
}

/// Export every layer into `<root>/<table>.zip`
///
/// For each layer, in order:
/// 1. Creates `<root>/<table>`
/// 2. Runs the engine against it
/// 3. Zips the folder to `<root>/<table>.zip`
/// 4. Removes the folder
///
/// A non-zero engine exit is logged and the folder is archived anyway,
/// with whatever the tool left in it. Any other failure ends the loop;
/// layers after it are not attempted and the error says how many
/// archives were completed.
///
/// # Examples
///
/// ```no_run
/// # use anyhow::Result;
/// # use std::path::Path;
/// # use postgis_shp_exporter::export::{export_layers, Engine, SystemRunner};
/// # use postgis_shp_exporter::logging::TracingLogger;
/// # use postgis_shp_exporter::postgres::{ConnectionParams, Layer};
/// # fn example(params: &ConnectionParams) -> Result<()> {
/// let layers = vec![Layer::new("public", "roads")];
/// let summary = export_layers(
///     &layers,
///     Path::new("/srv/shp"),
///     Engine::Ogr2ogr,
///     params,
///     &SystemRunner,
///     &TracingLogger,
/// )?;
/// assert_eq!(summary.archives.len(), 1);
/// # Ok(())
/// # }
/// ```
pub fn export_layers(
    layers: &[Layer],
    root: &Path,
    engine: Engine,
    params: &ConnectionParams,
    runner: &dyn CommandRunner,
    logger: &dyn Logger,
) -> Result<ExportSummary> {
    logger.info(&format!(
        "Exporting {} layer(s) from PostGIS to shp with {}...",
        layers.len(),
        engine
    ));

    let progress = ProgressBar::new(layers.len() as u64);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
    {
        progress.set_style(style.progress_chars("##-"));
    }

    let mut summary = ExportSummary::default();

    for layer in layers {
        progress.set_message(format!("Exporting {}", sanitize_identifier(&layer.to_string())));

        let archive = export_layer(layer, root, engine, params, runner, logger).with_context(|| {
            format!(
                "Export stopped at layer {} ({} of {} layers archived)",
                sanitize_identifier(&layer.to_string()),
                summary.archives.len(),
                layers.len()
            )
        });

        let archive = match archive {
            Ok(archive) => archive,
            Err(e) => {
                progress.abandon_with_message("Export failed");
                return Err(e);
            }
        };

        summary.archives.push(archive);
        progress.inc(1);
    }

    progress.finish_with_message("Export complete");
    Ok(summary)
}

fn export_layer(
    layer: &Layer,
    root: &Path,
    engine: Engine,
    params: &ConnectionParams,
    runner: &dyn CommandRunner,
    logger: &dyn Logger,
) -> Result<PathBuf> {
    ensure_path_safe_name(&layer.table)?;

    let job = engine.job(layer, root);
    create_folder(&job.folder)?;

    // The folder must not outlive this call, whatever happens inside it
    match convert_and_zip(&job, engine, params, runner, logger) {
        Ok(archive) => {
            remove_folder(&job.folder)?;
            Ok(archive)
        }
        Err(e) => {
            if job.folder.exists() {
                if let Err(cleanup) = remove_folder(&job.folder) {
                    logger.error(&format!("{:#}", cleanup));
                }
            }
            Err(e)
        }
    }
}

fn convert_and_zip(
    job: &ExportJob,
    engine: Engine,
    params: &ConnectionParams,
    runner: &dyn CommandRunner,
    logger: &dyn Logger,
) -> Result<PathBuf> {
    let status = runner.run(&engine.command(job, params))?;
    if !status.success() {
        let how = match status.code {
            Some(code) => format!("exit status {}", code),
            None => "a signal".to_string(),
        };
        logger.error(&format!(
            "{} ended with {} while exporting {}; archiving whatever it produced",
            engine,
            how,
            sanitize_identifier(&job.layer.to_string())
        ));
    }

    zip_directory(&job.folder, logger)
}
