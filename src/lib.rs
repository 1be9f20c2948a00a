pub mod chart;
pub mod config;
pub mod cron;
pub mod db;
pub mod error;
pub mod source;
pub mod utils;

#[cfg(test)]
pub(crate) mod testing;

pub use chart::{ChartSettings, Renderer};
pub use config::Settings;
pub use cron::{CronScheduler, PollContext};
pub use db::{PostgresClient, SampleStore};
pub use error::GasWatchError;
pub use source::{GasPriceSource, GasStationClient};
