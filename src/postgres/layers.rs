// ABOUTME: Discovers exportable tables and views in a schema
// ABOUTME: Builds the information_schema query and maps rows to layers

use super::connection::{connect, ConnectionParams};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::fmt;

const BASE_QUERY: &str = "SELECT table_schema::text, table_name::text \
     FROM information_schema.tables \
     WHERE table_schema = $1::text";

/// Which relations of the schema are candidate layers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryType {
    Tables,
    Views,
    All,
}

impl QueryType {
    /// Interpret the QUERYTYPE setting; anything other than `tables` or
    /// `views`, including no value at all, selects both
    pub fn from_setting(value: Option<&str>) -> Self {
        match value {
            Some("tables") => QueryType::Tables,
            Some("views") => QueryType::Views,
            _ => QueryType::All,
        }
    }

    fn table_type(self) -> Option<&'static str> {
        match self {
            QueryType::Tables => Some("BASE TABLE"),
            QueryType::Views => Some("VIEW"),
            QueryType::All => None,
        }
    }
}

/// Layer listing query with its schema bound as `$1`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerQuery {
    pub sql: String,
    pub schema: String,
}

/// Build the layer listing query for `schema`
///
/// The schema name is never spliced into the SQL text. The optional
/// `table_type` predicate comes from a closed set of literals.
///
/// # Examples
///
/// ```
/// # use postgis_shp_exporter::postgres::{build_query, QueryType};
/// let query = build_query(QueryType::Views, "public");
/// assert!(query.sql.ends_with("AND table_type='VIEW';"));
/// assert_eq!(query.schema, "public");
/// ```
pub fn build_query(query_type: QueryType, schema: &str) -> LayerQuery {
    let sql = match query_type.table_type() {
        Some(table_type) => format!("{} AND table_type='{}';", BASE_QUERY, table_type),
        None => format!("{};", BASE_QUERY),
    };

    LayerQuery {
        sql,
        schema: schema.to_string(),
    }
}

/// One table or view to export, identified by schema and name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layer {
    pub schema: String,
    pub table: String,
}

impl Layer {
    pub fn new(schema: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            table: table.into(),
        }
    }

    /// `schema.table`, as handed to the export engines
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.schema, self.table)
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.schema, self.table)
    }
}

impl From<(&str, &str)> for Layer {
    fn from((schema, table): (&str, &str)) -> Self {
        Layer::new(schema, table)
    }
}

/// Anything able to answer the layer listing query
#[async_trait]
pub trait LayerSource: Send + Sync {
    /// Rows of the query, in result order
    async fn list_layers(&self, query: &LayerQuery) -> Result<Vec<Layer>>;
}

/// Layer source backed by a live PostgreSQL/PostGIS server
///
/// Opens one connection per listing and closes it when done.
#[derive(Debug, Clone)]
pub struct PostgresLayerSource {
    params: ConnectionParams,
}

impl PostgresLayerSource {
    pub fn new(params: ConnectionParams) -> Self {
        Self { params }
    }
}

#[async_trait]
impl LayerSource for PostgresLayerSource {
    async fn list_layers(&self, query: &LayerQuery) -> Result<Vec<Layer>> {
        let client = connect(&self.params).await.with_context(|| {
            format!(
                "Failed to connect to database '{}' on {}:{}",
                self.params.database, self.params.host, self.params.port
            )
        })?;

        let rows = client
            .query(query.sql.as_str(), &[&query.schema])
            .await
            .with_context(|| format!("Failed to list layers in schema '{}'", query.schema))?;

        let layers = rows
            .iter()
            .map(|row| Layer {
                schema: row.get(0),
                table: row.get(1),
            })
            .collect();

        Ok(layers)
    }
}
