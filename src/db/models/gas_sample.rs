use chrono::Utc;
use serde::{Deserialize, Serialize};

/// One observation from the gas station API.
///
/// Prices are in Gwei-tenths per gas as published by the API; the chain
/// metadata fields (`block_time`, `block_num`, `speed`) are not persisted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GasPriceSample {
    pub fast: f64,
    pub fastest: f64,
    #[serde(rename = "safeLow")]
    pub safe_low: f64,
    pub average: f64,
    pub block_time: f64,
    #[serde(rename = "blockNum")]
    pub block_num: f64,
    pub speed: f64,
}

/// A row of `ethgasdata` (PostgreSQL).
///
/// `ts` is the Unix second at which the row was inserted. Rows are append-only,
/// so `ts` never decreases in insertion order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PersistedSample {
    pub ts: i64,
    pub fast: f64,
    pub fastest: f64,
    pub safelow: f64,
    pub average: f64,
}

impl PersistedSample {
    pub fn new(ts: i64, sample: &GasPriceSample) -> Self {
        Self {
            ts,
            fast: sample.fast,
            fastest: sample.fastest,
            safelow: sample.safe_low,
            average: sample.average,
        }
    }

    /// Stamps the sample with the current Unix second.
    pub fn now(sample: &GasPriceSample) -> Self {
        Self::new(Utc::now().timestamp(), sample)
    }
}
