// ABOUTME: Shapefile export module
// ABOUTME: Engines, process runner, zip archiving, and the per-layer driver

pub mod archive;
pub mod driver;
pub mod engine;
pub mod runner;

pub use archive::{create_folder, remove_folder, zip_directory};
pub use driver::{export_layers, ExportSummary};
pub use engine::{CommandSpec, Engine, ExportJob};
pub use runner::{check_engine_available, CommandRunner, RunStatus, SystemRunner};
