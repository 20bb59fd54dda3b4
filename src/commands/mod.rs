// ABOUTME: Command implementations
// ABOUTME: Exports the schema-to-shapefile export command

pub mod export;

pub use export::export;
