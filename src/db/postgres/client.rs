use std::time::Duration;

use deadpool_postgres::{Manager, ManagerConfig, Pool, RecyclingMethod};
use log::{info, warn};
use postgres_native_tls::MakeTlsConnector;
use tokio_postgres::NoTls;

use crate::config::{PostgresSettings, SslMode};
use crate::error::GasWatchError;
use crate::utils::expand_env_vars;

const SCHEMA: &str = include_str!("../../../schema/postgres.sql");

const MAX_CONNECT_ATTEMPTS: u32 = 3;

/// Split SQL into statements on `;`, ignoring semicolons inside
/// dollar-quoted bodies and `--` line comments.
fn split_sql_statements(sql: &str) -> Vec<&str> {
    let mut statements = Vec::new();
    let mut start = 0;
    let mut in_dollar_quote = false;
    let mut in_comment = false;
    let mut chars = sql.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if in_comment {
            in_comment = c != '\n';
            continue;
        }
        match c {
            '-' if !in_dollar_quote && matches!(chars.peek(), Some((_, '-'))) => {
                in_comment = true;
            },
            '$' if matches!(chars.peek(), Some((_, '$'))) => {
                chars.next();
                in_dollar_quote = !in_dollar_quote;
            },
            ';' if !in_dollar_quote => {
                let stmt = &sql[start..i];
                if !stmt.trim().is_empty() {
                    statements.push(stmt);
                }
                start = i + 1;
            },
            _ => {},
        }
    }

    let tail = &sql[start..];
    if !tail.trim().is_empty() && !is_only_comments(tail) {
        statements.push(tail);
    }

    statements
}

fn is_only_comments(sql: &str) -> bool {
    sql.lines()
        .map(str::trim)
        .all(|line| line.is_empty() || line.starts_with("--"))
}

fn pg_config(settings: &PostgresSettings) -> Result<tokio_postgres::Config, GasWatchError> {
    let mut pg_config = match &settings.url {
        Some(url) => url
            .parse::<tokio_postgres::Config>()
            .map_err(|e| GasWatchError::Connection(format!("invalid connection url: {e}")))?,
        None => {
            let mut pg_config = tokio_postgres::Config::new();
            pg_config
                .host(&settings.host)
                .port(settings.port)
                .user(&settings.user)
                .dbname(&settings.database);
            if let Some(password) = &settings.password {
                pg_config.password(password);
            }
            pg_config
        },
    };

    if let Some(options) = &settings.options {
        pg_config.options(options);
    }
    if settings.ssl_mode != SslMode::Disable {
        pg_config.ssl_mode(tokio_postgres::config::SslMode::Require);
    }

    Ok(pg_config)
}

fn tls_connector(settings: &PostgresSettings) -> Result<MakeTlsConnector, GasWatchError> {
    let mut builder = native_tls::TlsConnector::builder();

    if let Some(path) = &settings.ssl_root_cert {
        let path = expand_env_vars(path);
        let pem = std::fs::read(&path).map_err(|e| {
            GasWatchError::Connection(format!("cannot read root certificate {path}: {e}"))
        })?;
        let cert = native_tls::Certificate::from_pem(&pem)
            .map_err(|e| GasWatchError::Connection(format!("invalid root certificate: {e}")))?;
        builder.add_root_certificate(cert);
    }

    // libpq `require` encrypts without verifying the server
    if settings.ssl_mode == SslMode::Require {
        builder.danger_accept_invalid_certs(true);
    }

    let connector = builder
        .build()
        .map_err(|e| GasWatchError::Connection(format!("cannot build TLS connector: {e}")))?;
    Ok(MakeTlsConnector::new(connector))
}

fn build_pool(settings: &PostgresSettings) -> Result<Pool, GasWatchError> {
    let pg_config = pg_config(settings)?;
    let mgr_config = ManagerConfig {
        recycling_method: RecyclingMethod::Fast,
    };

    let mgr = match settings.ssl_mode {
        SslMode::Disable => Manager::from_config(pg_config, NoTls, mgr_config),
        SslMode::Require | SslMode::VerifyFull => {
            Manager::from_config(pg_config, tls_connector(settings)?, mgr_config)
        },
    };

    Pool::builder(mgr)
        .max_size(settings.pool_size.max(1))
        .build()
        .map_err(|e| GasWatchError::Connection(format!("cannot create pool: {e}")))
}

/// PostgreSQL / CockroachDB gateway.
///
/// Holds a `deadpool-postgres` pool capped at `pool_size` connections (one by
/// default), so every cycle reuses the same long-lived connection. The handle
/// is injected where it is needed; [`PostgresClient::close`] releases it.
#[derive(Clone)]
pub struct PostgresClient {
    pub pool: Pool,
    pub(crate) max_tx_retries: u32,
}

impl PostgresClient {
    pub async fn new(settings: PostgresSettings) -> Result<Self, GasWatchError> {
        info!("Connecting to PostgreSQL");

        let mut attempts = 0;

        loop {
            let pool = build_pool(&settings)?;

            // Test the connection
            match pool.get().await {
                Ok(_conn) => {
                    info!("Successfully connected to PostgreSQL");
                    return Ok(Self {
                        pool,
                        max_tx_retries: settings.max_tx_retries,
                    });
                },
                Err(e) => {
                    attempts += 1;

                    if attempts >= MAX_CONNECT_ATTEMPTS {
                        return Err(GasWatchError::Connection(format!(
                            "failed after {attempts} attempts: {e}"
                        )));
                    }

                    let delay = Duration::from_millis(100 * 2_u64.pow(attempts));
                    warn!(
                        "Failed to connect to PostgreSQL (attempt {}/{}), retrying in {:?}...",
                        attempts, MAX_CONNECT_ATTEMPTS, delay
                    );
                    tokio::time::sleep(delay).await;
                },
            }
        }
    }

    /// Health check - verify connection is still alive
    pub async fn health_check(&self) -> Result<(), GasWatchError> {
        let client = self
            .pool
            .get()
            .await
            .map_err(|e| GasWatchError::Connection(e.to_string()))?;
        client
            .query_one("SELECT 1", &[])
            .await
            .map_err(|e| GasWatchError::Query(format!("health check failed: {e}")))?;
        Ok(())
    }

    /// Creates `api_key_store` and `ethgasdata` when missing.
    pub async fn migrate(&self) -> Result<(), GasWatchError> {
        info!("Running PostgreSQL migrations");
        let client = self
            .pool
            .get()
            .await
            .map_err(|e| GasWatchError::Connection(e.to_string()))?;

        for stmt in split_sql_statements(SCHEMA) {
            let stmt = stmt.trim();
            client.execute(stmt, &[]).await.map_err(|e| {
                GasWatchError::Query(format!("migration statement failed ({stmt}): {e}"))
            })?;
        }

        info!("PostgreSQL schema applied successfully");
        Ok(())
    }

    /// Closes the pool; checked-out connections are dropped when returned.
    pub fn close(&self) {
        self.pool.close();
        info!("PostgreSQL connection closed");
    }
}
