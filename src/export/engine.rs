// ABOUTME: External conversion engines that turn a PostGIS layer into a shapefile
// ABOUTME: Builds per-layer jobs and argument lists for ogr2ogr and pgsql2shp

use crate::error::ExporterError;
use crate::postgres::{ConnectionParams, Layer};
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Supported export engines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Engine {
    /// GDAL's `ogr2ogr`, writes the shapefile components into a directory
    Ogr2ogr,
    /// PostGIS' `pgsql2shp`, writes `<name>.shp` and friends next to the given base path
    Pgsql2shp,
}

impl Engine {
    /// Executable looked up in PATH
    pub fn program(self) -> &'static str {
        match self {
            Engine::Ogr2ogr => "ogr2ogr",
            Engine::Pgsql2shp => "pgsql2shp",
        }
    }

    /// Plan the export of `layer` under `root`
    ///
    /// Both engines work inside `root/<table>`, which is later zipped to
    /// `root/<table>.zip`. ogr2ogr is pointed at that directory itself,
    /// pgsql2shp at a `<table>` base name inside it.
    pub fn job(self, layer: &Layer, root: &Path) -> ExportJob {
        let folder = root.join(&layer.table);
        let target = match self {
            Engine::Ogr2ogr => folder.clone(),
            Engine::Pgsql2shp => folder.join(&layer.table),
        };

        ExportJob {
            layer: layer.clone(),
            folder,
            target,
        }
    }

    /// Argument list for one job
    ///
    /// The password is passed through `PGPASSWORD` so it never shows up in
    /// the process list.
    pub fn command(self, job: &ExportJob, params: &ConnectionParams) -> CommandSpec {
        let table = job.layer.qualified_name();
        let args: Vec<OsString> = match self {
            Engine::Ogr2ogr => vec![
                "-f".into(),
                "ESRI Shapefile".into(),
                job.target.clone().into_os_string(),
                ogr_connection_string(params).into(),
                table.into(),
            ],
            Engine::Pgsql2shp => vec![
                "-f".into(),
                job.target.clone().into_os_string(),
                "-h".into(),
                params.host.clone().into(),
                "-p".into(),
                params.port.to_string().into(),
                "-u".into(),
                params.user.clone().into(),
                params.database.clone().into(),
                table.into(),
            ],
        };

        CommandSpec {
            program: self.program().to_string(),
            args,
            env: vec![("PGPASSWORD".to_string(), params.password.clone())],
        }
    }
}

impl FromStr for Engine {
    type Err = ExporterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ogr2ogr" => Ok(Engine::Ogr2ogr),
            "pgsql2shp" => Ok(Engine::Pgsql2shp),
            other => Err(ExporterError::UnknownEngine(other.to_string())),
        }
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.program())
    }
}

/// Work for a single layer: where the tool writes and what gets zipped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportJob {
    pub layer: Layer,
    /// Transient directory, zipped then removed
    pub folder: PathBuf,
    /// Output path handed to the engine
    pub target: PathBuf,
}

/// A process invocation: program, arguments and extra environment
#[derive(Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<OsString>,
    pub env: Vec<(String, String)>,
}

impl fmt::Debug for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let env_keys: Vec<&str> = self.env.iter().map(|(k, _)| k.as_str()).collect();
        f.debug_struct("CommandSpec")
            .field("program", &self.program)
            .field("args", &self.args)
            .field("env", &env_keys)
            .finish()
    }
}

/// `PG:` datasource for ogr2ogr, without the password
fn ogr_connection_string(params: &ConnectionParams) -> String {
    format!(
        "PG:host={} port={} user={} dbname={}",
        conninfo_value(&params.host),
        params.port,
        conninfo_value(&params.user),
        conninfo_value(&params.database)
    )
}

/// Quote a libpq keyword value when it is empty or holds spaces, quotes or backslashes
fn conninfo_value(value: &str) -> String {
    let needs_quotes = value.is_empty()
        || value
            .chars()
            .any(|c| c.is_whitespace() || c == '\'' || c == '\\');
    if !needs_quotes {
        return value.to_string();
    }

    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('\'');
    for c in value.chars() {
        if c == '\'' || c == '\\' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('\'');
    quoted
}
