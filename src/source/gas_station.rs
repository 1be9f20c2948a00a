use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use url::Url;

use crate::config::SourceSettings;
use crate::db::models::GasPriceSample;
use crate::error::GasWatchError;

use super::GasPriceSource;

/// HTTP client for the ethgasstation JSON endpoint.
///
/// One GET per call, no retry. A request timeout is applied when
/// `timeout_secs` is non-zero, otherwise the reqwest default holds.
#[derive(Clone)]
pub struct GasStationClient {
    client: Client,
    url: Url,
    authenticated_url: Url,
}

impl GasStationClient {
    pub fn new(settings: &SourceSettings) -> Result<Self> {
        let url = Url::parse(&settings.url)
            .with_context(|| format!("Invalid gas price URL: {}", settings.url))?;
        let authenticated_url = Url::parse(&settings.authenticated_url).with_context(|| {
            format!(
                "Invalid authenticated gas price URL: {}",
                settings.authenticated_url
            )
        })?;

        let mut builder = Client::builder();
        if settings.timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(settings.timeout_secs));
        }
        let client = builder.build().context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            url,
            authenticated_url,
        })
    }

    /// Fetches from the keyed DefiPulse endpoint (`?api-key=<key>`).
    ///
    /// Not used by the polling cycle.
    pub async fn fetch_with_key(&self, key: &str) -> Result<GasPriceSample, GasWatchError> {
        let mut url = self.authenticated_url.clone();
        url.query_pairs_mut().append_pair("api-key", key);
        self.get(url).await
    }

    async fn get(&self, url: Url) -> Result<GasPriceSample, GasWatchError> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        let body = response.text().await?;

        let sample: GasPriceSample = serde_json::from_str(&body)?;
        debug!(
            "Fetched gas price sample: fast={} average={} safeLow={}",
            sample.fast, sample.average, sample.safe_low
        );
        Ok(sample)
    }
}

#[async_trait]
impl GasPriceSource for GasStationClient {
    async fn fetch(&self) -> Result<GasPriceSample, GasWatchError> {
        self.get(self.url.clone()).await
    }
}
