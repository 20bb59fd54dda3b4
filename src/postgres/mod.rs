// ABOUTME: PostgreSQL utilities module
// ABOUTME: Exports connection management and layer discovery

pub mod connection;
pub mod layers;

pub use connection::{connect, ConnectionParams};
pub use layers::{build_query, Layer, LayerQuery, LayerSource, PostgresLayerSource, QueryType};
