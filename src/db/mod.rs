use async_trait::async_trait;

use crate::error::GasWatchError;

pub mod models;
pub mod postgres;

pub use postgres::PostgresClient;

use models::GasPriceSample;

/// Durable storage used by the polling cycle.
///
/// Implemented by [`PostgresClient`]; the cycle only depends on this trait.
#[async_trait]
pub trait SampleStore: Send + Sync {
    async fn get_api_key(&self, name: &str) -> Result<String, GasWatchError>;

    async fn insert_gas_sample(&self, sample: &GasPriceSample) -> Result<(), GasWatchError>;

    async fn get_fast_series(&self) -> Result<Vec<f64>, GasWatchError>;
}

#[async_trait]
impl SampleStore for PostgresClient {
    async fn get_api_key(&self, name: &str) -> Result<String, GasWatchError> {
        PostgresClient::get_api_key(self, name).await
    }

    async fn insert_gas_sample(&self, sample: &GasPriceSample) -> Result<(), GasWatchError> {
        PostgresClient::insert_gas_sample(self, sample).await
    }

    async fn get_fast_series(&self) -> Result<Vec<f64>, GasWatchError> {
        PostgresClient::get_fast_series(self).await
    }
}
