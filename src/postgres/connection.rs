// ABOUTME: PostgreSQL connection setup from discrete connection parameters
// ABOUTME: Handles TLS negotiation, error translation, and the connection task

use crate::config::{ExportConfig, KEY_DATABASE, KEY_HOST, KEY_PORT, KEY_USER};
use crate::error::ExporterError;
use anyhow::{Context, Result};
use native_tls::TlsConnector;
use postgres_native_tls::MakeTlsConnector;
use std::fmt;
use tokio_postgres::Client;

/// Everything needed to reach the source database
///
/// Shared by the layer lister and by the export engines, which receive the
/// same values on their command line.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionParams {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
}

impl ConnectionParams {
    /// Build parameters from the configuration file and an interactively
    /// obtained password
    pub fn from_config(config: &ExportConfig, password: String) -> Result<Self, ExporterError> {
        let port = config.require(KEY_PORT)?;
        let port = port
            .parse::<u16>()
            .ok()
            .filter(|p| *p != 0)
            .ok_or_else(|| ExporterError::InvalidPort(port.to_string()))?;

        Ok(Self {
            host: config.require(KEY_HOST)?.to_string(),
            port,
            user: config.require(KEY_USER)?.to_string(),
            password,
            database: config.require(KEY_DATABASE)?.to_string(),
        })
    }

    fn pg_config(&self) -> tokio_postgres::Config {
        let mut config = tokio_postgres::Config::new();
        config
            .host(&self.host)
            .port(self.port)
            .user(&self.user)
            .dbname(&self.database)
            .application_name("postgis-shp-exporter");
        if !self.password.is_empty() {
            config.password(&self.password);
        }
        config
    }
}

impl fmt::Debug for ConnectionParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionParams")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .finish()
    }
}

/// Connect to PostgreSQL, negotiating TLS when the server offers it
pub async fn connect(params: &ConnectionParams) -> Result<Client> {
    let tls_connector = TlsConnector::builder()
        .build()
        .context("Failed to build TLS connector")?;
    let tls = MakeTlsConnector::new(tls_connector);

    let (client, connection) = params
        .pg_config()
        .connect(tls)
        .await
        .map_err(|e| describe_connect_error(params, &e.to_string()))?;

    tokio::spawn(async move {
        if let Err(e) = connection.await {
            tracing::error!("Connection error: {}", e);
        }
    });

    Ok(client)
}

fn describe_connect_error(params: &ConnectionParams, error_msg: &str) -> anyhow::Error {
    if error_msg.contains("password authentication failed") {
        anyhow::anyhow!(
            "Authentication failed for user '{}': invalid username or password.",
            params.user
        )
    } else if error_msg.contains("database") && error_msg.contains("does not exist") {
        anyhow::anyhow!(
            "Database does not exist: {}\n\
             Check DATABASE in the configuration file.",
            error_msg
        )
    } else if error_msg.contains("Connection refused") || error_msg.contains("could not connect")
    {
        anyhow::anyhow!(
            "Connection refused: unable to reach {}:{}.\n\
             Please check:\n\
             - HOST and PORT are correct\n\
             - The database server is running\n\
             - Firewall rules allow connections\n\
             Error: {}",
            params.host,
            params.port,
            error_msg
        )
    } else if error_msg.contains("no pg_hba.conf entry") {
        anyhow::anyhow!(
            "Access denied: no pg_hba.conf entry for this host and user.\n\
             Error: {}",
            error_msg
        )
    } else {
        anyhow::anyhow!("Failed to connect to database: {}", error_msg)
    }
}
