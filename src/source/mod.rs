//! Gas price data sources.

use async_trait::async_trait;

use crate::db::models::GasPriceSample;
use crate::error::GasWatchError;

mod gas_station;

pub use gas_station::GasStationClient;

/// Something that yields one gas price observation per call.
#[async_trait]
pub trait GasPriceSource: Send + Sync {
    async fn fetch(&self) -> Result<GasPriceSample, GasWatchError>;
}
