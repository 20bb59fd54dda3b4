// ABOUTME: End-to-end tests for the export workflow with mocked engines
// ABOUTME: Covers layer discovery, engine invocation, archiving and cleanup

use anyhow::Result;
use async_trait::async_trait;
use postgis_shp_exporter::commands;
use postgis_shp_exporter::config::ExportConfig;
use postgis_shp_exporter::error::{exit_code_for, ExporterError};
use postgis_shp_exporter::export::{export_layers, CommandRunner, CommandSpec, Engine, RunStatus};
use postgis_shp_exporter::logging::{CapturingLogger, LogLevel};
use postgis_shp_exporter::postgres::{ConnectionParams, Layer, LayerQuery, LayerSource};
use std::ffi::OsString;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Stands in for ogr2ogr/pgsql2shp: records the call and writes fake
/// shapefile components where the real tool would
#[derive(Default)]
struct FakeEngine {
    calls: Mutex<Vec<CommandSpec>>,
}

impl FakeEngine {
    fn calls(&self) -> Vec<CommandSpec> {
        self.calls.lock().unwrap().clone()
    }
}

impl CommandRunner for FakeEngine {
    fn ensure_available(&self, _engine: Engine) -> Result<(), ExporterError> {
        Ok(())
    }

    fn run(&self, spec: &CommandSpec) -> Result<RunStatus> {
        self.calls.lock().unwrap().push(spec.clone());

        let table = spec.args.last().unwrap().to_string_lossy().to_string();
        let table = table.rsplit('.').next().unwrap().to_string();

        match spec.program.as_str() {
            // ogr2ogr -f "ESRI Shapefile" <dir> PG:... <schema.table>
            "ogr2ogr" => {
                let dir = PathBuf::from(&spec.args[2]);
                for ext in ["shp", "shx", "dbf", "prj"] {
                    std::fs::write(dir.join(format!("{}.{}", table, ext)), ext)?;
                }
            }
            // pgsql2shp -f <dir>/<base> ...
            "pgsql2shp" => {
                let base = spec.args[1].clone();
                for ext in ["shp", "shx", "dbf"] {
                    let mut path = base.clone();
                    path.push(format!(".{}", ext));
                    std::fs::write(PathBuf::from(path), ext)?;
                }
            }
            other => panic!("unexpected program {}", other),
        }

        Ok(RunStatus { code: Some(0) })
    }
}

struct StaticSource(Vec<Layer>);

#[async_trait]
impl LayerSource for StaticSource {
    async fn list_layers(&self, _query: &LayerQuery) -> Result<Vec<Layer>> {
        Ok(self.0.clone())
    }
}

fn params() -> ConnectionParams {
    ConnectionParams {
        host: "localhost".into(),
        port: 5432,
        user: "alice".into(),
        password: "secret".into(),
        database: "gis".into(),
    }
}

fn two_layers() -> Vec<Layer> {
    vec![
        Layer::from(("public", "roads")),
        Layer::from(("public", "rivers")),
    ]
}

fn zip_entries(path: &Path) -> Vec<String> {
    let mut archive = zip::ZipArchive::new(File::open(path).unwrap()).unwrap();
    let mut names: Vec<String> = (0..archive.len())
        .map(|i| archive.by_index(i).unwrap().name().to_string())
        .collect();
    names.sort();
    names
}

fn remaining_dirs(root: &Path) -> Vec<PathBuf> {
    std::fs::read_dir(root)
        .unwrap()
        .map(|e| e.unwrap().path())
        .filter(|p| p.is_dir())
        .collect()
}

#[test]
fn test_ogr2ogr_exports_two_layers() {
    let root = tempfile::tempdir().unwrap();
    let engine = FakeEngine::default();
    let logger = CapturingLogger::new();

    let summary = export_layers(
        &two_layers(),
        root.path(),
        Engine::Ogr2ogr,
        &params(),
        &engine,
        &logger,
    )
    .unwrap();

    let calls = engine.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].args.last().unwrap(), &OsString::from("public.roads"));
    assert_eq!(calls[1].args.last().unwrap(), &OsString::from("public.rivers"));

    assert_eq!(
        summary.archives,
        vec![root.path().join("roads.zip"), root.path().join("rivers.zip")]
    );
    assert_eq!(
        zip_entries(&root.path().join("roads.zip")),
        vec!["roads.dbf", "roads.prj", "roads.shp", "roads.shx"]
    );
    assert!(remaining_dirs(root.path()).is_empty());
    assert!(logger.errors().is_empty());

    let entries = logger.entries();
    for table in ["roads", "rivers"] {
        let line = (
            LogLevel::Info,
            format!(
                "Zipping shp layers: {}",
                root.path().join(format!("{}.zip", table)).display()
            ),
        );
        assert!(entries.contains(&line), "missing {:?}", line);
    }
}

#[test]
fn test_pgsql2shp_exports_two_layers() {
    let root = tempfile::tempdir().unwrap();
    let engine = FakeEngine::default();

    let summary = export_layers(
        &two_layers(),
        root.path(),
        Engine::Pgsql2shp,
        &params(),
        &engine,
        &CapturingLogger::new(),
    )
    .unwrap();

    let calls = engine.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(
        PathBuf::from(&calls[1].args[1]),
        root.path().join("rivers").join("rivers")
    );
    assert_eq!(calls[1].args.last().unwrap(), &OsString::from("public.rivers"));

    assert_eq!(summary.archives.len(), 2);
    assert_eq!(
        zip_entries(&root.path().join("rivers.zip")),
        vec!["rivers.dbf", "rivers.shp", "rivers.shx"]
    );
    assert!(remaining_dirs(root.path()).is_empty());
}

#[tokio::test]
async fn test_export_command_end_to_end() {
    let root = tempfile::tempdir().unwrap();
    let out = root.path().join("shapes");
    let config = ExportConfig::parse(&format!(
        "DATABASE=gis\nUSER=alice\nHOST=localhost\nPORT=5432\n\
         EXPORTFOLDER={}\nDBSCHEMA=public\nQUERYTYPE=tables\nENGINE=ogr2ogr\n",
        out.display()
    ));
    let engine = FakeEngine::default();
    let logger = CapturingLogger::new();

    let summary = commands::export(
        &config,
        &params(),
        &StaticSource(two_layers()),
        &engine,
        &logger,
    )
    .await
    .unwrap();

    assert_eq!(summary.archives.len(), 2);
    assert!(out.join("roads.zip").exists());
    assert!(out.join("rivers.zip").exists());
    assert!(remaining_dirs(&out).is_empty());
    assert!(engine
        .calls()
        .iter()
        .all(|c| c.env == vec![("PGPASSWORD".to_string(), "secret".to_string())]));
}

#[tokio::test]
async fn test_empty_schema_exits_with_no_layers_code() {
    let root = tempfile::tempdir().unwrap();
    let config = ExportConfig::parse(&format!(
        "DATABASE=gis\nUSER=alice\nHOST=localhost\nPORT=5432\n\
         EXPORTFOLDER={}\nDBSCHEMA=empty\nENGINE=pgsql2shp\n",
        root.path().display()
    ));
    let engine = FakeEngine::default();

    let err = commands::export(
        &config,
        &params(),
        &StaticSource(Vec::new()),
        &engine,
        &CapturingLogger::new(),
    )
    .await
    .unwrap_err();

    assert_eq!(exit_code_for(&err), 3);
    assert!(engine.calls().is_empty());
}

#[test]
fn test_existing_archive_is_replaced() {
    let root = tempfile::tempdir().unwrap();
    std::fs::write(root.path().join("roads.zip"), b"stale").unwrap();

    export_layers(
        &[Layer::new("public", "roads")],
        root.path(),
        Engine::Ogr2ogr,
        &params(),
        &FakeEngine::default(),
        &CapturingLogger::new(),
    )
    .unwrap();

    assert_eq!(zip_entries(&root.path().join("roads.zip")).len(), 4);
}
