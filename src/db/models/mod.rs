mod gas_sample;

pub use gas_sample::{GasPriceSample, PersistedSample};
