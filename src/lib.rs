// ABOUTME: Library module for postgis-shp-exporter
// ABOUTME: Exports all core functionality for use in binary and tests

pub mod commands;
pub mod config;
pub mod error;
pub mod export;
pub mod logging;
pub mod postgres;
pub mod prompt;
pub mod utils;
