//! In-memory stand-ins for the database and the gas price API.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::db::models::{GasPriceSample, PersistedSample};
use crate::db::SampleStore;
use crate::error::GasWatchError;
use crate::source::GasPriceSource;

pub(crate) fn sample(fast: f64) -> GasPriceSample {
    GasPriceSample {
        fast,
        fastest: fast + 2.0,
        safe_low: fast - 2.0,
        average: fast - 0.5,
        block_time: 13.2,
        block_num: 100.0,
        speed: 0.9,
    }
}

#[derive(Default)]
pub(crate) struct MemoryStore {
    pub(crate) api_keys: Vec<(String, String)>,
    pub(crate) rows: Mutex<Vec<PersistedSample>>,
    pub(crate) fail_writes: bool,
}

impl MemoryStore {
    pub(crate) fn with_key(name: &str, key: &str) -> Self {
        Self {
            api_keys: vec![(name.to_string(), key.to_string())],
            ..Self::default()
        }
    }

    /// Seeds rows one second apart, oldest first.
    pub(crate) fn seed(&self, fast_values: &[f64]) {
        let mut rows = self.rows.lock().unwrap();
        for (i, fast) in fast_values.iter().enumerate() {
            rows.push(PersistedSample::new(1_600_000_000 + i as i64, &sample(*fast)));
        }
    }

    pub(crate) fn rows(&self) -> Vec<PersistedSample> {
        self.rows.lock().unwrap().clone()
    }
}

#[async_trait]
impl SampleStore for MemoryStore {
    async fn get_api_key(&self, name: &str) -> Result<String, GasWatchError> {
        self.api_keys
            .iter()
            .rev()
            .find(|(n, _)| n == name)
            .map(|(_, key)| key.clone())
            .ok_or_else(|| GasWatchError::NotFound(name.to_string()))
    }

    async fn insert_gas_sample(&self, sample: &GasPriceSample) -> Result<(), GasWatchError> {
        if self.fail_writes {
            return Err(GasWatchError::Write("constraint violation".to_string()));
        }
        self.rows.lock().unwrap().push(PersistedSample::now(sample));
        Ok(())
    }

    async fn get_fast_series(&self) -> Result<Vec<f64>, GasWatchError> {
        let mut rows = self.rows();
        rows.sort_by_key(|row| row.ts);
        Ok(rows.iter().map(|row| row.fast).collect())
    }
}

/// Returns the same sample every time, optionally after a delay.
pub(crate) struct StaticSource {
    pub(crate) sample: Option<GasPriceSample>,
    pub(crate) delay: Duration,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl StaticSource {
    pub(crate) fn new(sample: GasPriceSample) -> Self {
        Self {
            sample: Some(sample),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub(crate) fn failing() -> Self {
        Self {
            sample: None,
            ..Self::new(sample(0.0))
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GasPriceSource for StaticSource {
    async fn fetch(&self) -> Result<GasPriceSample, GasWatchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.sample
            .ok_or_else(|| GasWatchError::Network("connection refused".to_string()))
    }
}

/// Blows up on every read, like a column conversion panic in a driver.
pub(crate) struct PanickingStore;

#[async_trait]
impl SampleStore for PanickingStore {
    async fn get_api_key(&self, _name: &str) -> Result<String, GasWatchError> {
        panic!("error retrieving column key: unexpected NULL");
    }

    async fn insert_gas_sample(&self, _sample: &GasPriceSample) -> Result<(), GasWatchError> {
        panic!("insert on a panicking store");
    }

    async fn get_fast_series(&self) -> Result<Vec<f64>, GasWatchError> {
        panic!("error retrieving column fast: unexpected NULL");
    }
}
