// ABOUTME: Classified failures that end an export run
// ABOUTME: Maps each failure class to a distinct process exit code

use thiserror::Error;

/// Terminal failures the CLI distinguishes when choosing an exit code.
///
/// Everything else (I/O, database, archive errors) travels as a plain
/// `anyhow::Error` with context attached and exits with code 1.
#[derive(Debug, Error)]
pub enum ExporterError {
    #[error("Missing required configuration key: {0}")]
    MissingConfigKey(&'static str),

    #[error("Invalid PORT value '{0}': expected a number between 1 and 65535")]
    InvalidPort(String),

    #[error("There are no layers to export. Check DB schema '{schema}'")]
    NoLayers { schema: String },

    #[error("There is no engine to export layers ('{0}')... Define 'pgsql2shp' or 'ogr2ogr'")]
    UnknownEngine(String),

    #[error(
        "Export engine '{0}' was not found in PATH.\n\
         Install it first:\n\
         - ogr2ogr: GDAL (Ubuntu/Debian: sudo apt-get install gdal-bin, macOS: brew install gdal)\n\
         - pgsql2shp: PostGIS client tools (Ubuntu/Debian: sudo apt-get install postgis)"
    )]
    EngineUnavailable(String),
}

impl ExporterError {
    pub fn exit_code(&self) -> u8 {
        match self {
            ExporterError::MissingConfigKey(_)
            | ExporterError::InvalidPort(_)
            | ExporterError::UnknownEngine(_) => 2,
            ExporterError::NoLayers { .. } => 3,
            ExporterError::EngineUnavailable(_) => 4,
        }
    }
}

/// Exit code for an error returned by a run
///
/// Looks through the context chain for an [`ExporterError`]; unclassified
/// errors map to 1.
pub fn exit_code_for(err: &anyhow::Error) -> u8 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<ExporterError>())
        .map(ExporterError::exit_code)
        .unwrap_or(1)
}
