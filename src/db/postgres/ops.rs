use std::time::Duration;

use log::{debug, error, warn};
use tokio_postgres::error::SqlState;

use crate::db::models::{GasPriceSample, PersistedSample};
use crate::db::postgres::PostgresClient;
use crate::error::GasWatchError;

/// Base delay between transaction retries (exponential backoff)
const TX_RETRY_DELAY_MS: u64 = 50;

/// CockroachDB reports contention as `40001` (serialization failure); the
/// transaction must be rerun from the start.
fn is_retryable(e: &tokio_postgres::Error) -> bool {
    e.code() == Some(&SqlState::T_R_SERIALIZATION_FAILURE)
}

/// NULLs and type mismatches in externally managed tables surface here.
fn column_error(e: tokio_postgres::Error) -> GasWatchError {
    GasWatchError::Query(format!("unreadable column value: {e}"))
}

async fn insert_in_tx(
    client: &mut deadpool_postgres::Client,
    row: &PersistedSample,
) -> Result<(), tokio_postgres::Error> {
    let tx = client.transaction().await?;
    tx.execute(
        "INSERT INTO ethgasdata (ts, fast, fastest, safelow, average) VALUES ($1, $2, $3, $4, $5)",
        &[&row.ts, &row.fast, &row.fastest, &row.safelow, &row.average],
    )
    .await?;
    tx.commit().await
}

impl PostgresClient {
    // ==================== API KEYS ====================

    /// Reads the credential stored under `name`.
    ///
    /// When several rows share the name the last one returned wins.
    pub async fn get_api_key(&self, name: &str) -> Result<String, GasWatchError> {
        let client = self
            .pool
            .get()
            .await
            .map_err(|e| GasWatchError::Connection(e.to_string()))?;

        let rows = client
            .query("SELECT key FROM api_key_store WHERE name = $1", &[&name])
            .await
            .map_err(|e| GasWatchError::Query(format!("api key lookup failed: {e}")))?;

        let key = match rows.last() {
            Some(row) => row.try_get::<_, Option<String>>("key").map_err(column_error)?,
            None => None,
        };

        // A NULL key is as unusable as a missing row
        key.ok_or_else(|| GasWatchError::NotFound(name.to_string()))
    }

    // ==================== GAS SAMPLES ====================

    /// Appends one sample stamped with the current Unix second.
    ///
    /// The insert runs in its own transaction and is rerun on serialization
    /// failures, up to `max_tx_retries` times.
    pub async fn insert_gas_sample(&self, sample: &GasPriceSample) -> Result<(), GasWatchError> {
        let row = PersistedSample::now(sample);
        let mut client = self
            .pool
            .get()
            .await
            .map_err(|e| GasWatchError::Write(e.to_string()))?;

        let mut retries = 0;
        loop {
            match insert_in_tx(&mut client, &row).await {
                Ok(()) => {
                    debug!("Inserted gas sample ts={} fast={}", row.ts, row.fast);
                    return Ok(());
                },
                Err(e) if is_retryable(&e) && retries < self.max_tx_retries => {
                    retries += 1;
                    let delay = Duration::from_millis(TX_RETRY_DELAY_MS * 2_u64.pow(retries));
                    warn!(
                        "Insert transaction conflicted (retry {}/{}), retrying in {:?}",
                        retries, self.max_tx_retries, delay
                    );
                    tokio::time::sleep(delay).await;
                },
                Err(e) => {
                    error!("Failed to insert gas sample ts={}: {:?}", row.ts, e);
                    return Err(GasWatchError::Write(e.to_string()));
                },
            }
        }
    }

    /// All stored `fast` prices, oldest first.
    ///
    /// Rows inserted within the same second have no defined relative order.
    pub async fn get_fast_series(&self) -> Result<Vec<f64>, GasWatchError> {
        let client = self
            .pool
            .get()
            .await
            .map_err(|e| GasWatchError::Connection(e.to_string()))?;

        let rows = client
            .query("SELECT fast FROM ethgasdata ORDER BY ts", &[])
            .await
            .map_err(|e| GasWatchError::Query(format!("fast series read failed: {e}")))?;

        rows.iter()
            .map(|row| row.try_get::<_, f64>("fast").map_err(column_error))
            .collect()
    }

    /// The `limit` newest rows, returned oldest first.
    pub async fn get_recent_samples(
        &self,
        limit: i64,
    ) -> Result<Vec<PersistedSample>, GasWatchError> {
        let client = self
            .pool
            .get()
            .await
            .map_err(|e| GasWatchError::Connection(e.to_string()))?;

        let query = r#"
            SELECT ts, fast, fastest, safelow, average
            FROM ethgasdata
            ORDER BY ts DESC
            LIMIT $1
        "#;

        let rows = client
            .query(query, &[&limit])
            .await
            .map_err(|e| GasWatchError::Query(format!("recent samples read failed: {e}")))?;

        let mut samples = rows
            .iter()
            .map(|row| -> Result<PersistedSample, tokio_postgres::Error> {
                Ok(PersistedSample {
                    ts: row.try_get("ts")?,
                    fast: row.try_get("fast")?,
                    fastest: row.try_get("fastest")?,
                    safelow: row.try_get("safelow")?,
                    average: row.try_get("average")?,
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map_err(column_error)?;
        samples.reverse();

        Ok(samples)
    }
}
