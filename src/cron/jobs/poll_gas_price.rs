//! One polling cycle: fetch the current gas price, persist it, redraw the chart.
//!
//! The api key is looked up every cycle, as the unkeyed endpoint is the one
//! actually polled; the key is never sent.

use std::sync::Arc;

use log::debug;
use tokio::sync::Mutex;

use crate::chart::{Frame, Renderer};
use crate::db::SampleStore;
use crate::error::GasWatchError;
use crate::source::GasPriceSource;

/// Everything a cycle needs, shared by every scheduler tick.
pub struct PollContext {
    store: Arc<dyn SampleStore>,
    source: Arc<dyn GasPriceSource>,
    renderer: Mutex<Renderer>,
    api_key_name: String,
}

impl PollContext {
    pub fn new(
        store: Arc<dyn SampleStore>,
        source: Arc<dyn GasPriceSource>,
        renderer: Renderer,
        api_key_name: String,
    ) -> Self {
        Self {
            store,
            source,
            renderer: Mutex::new(renderer),
            api_key_name,
        }
    }
}

/// Runs fetch -> persist -> render once.
///
/// Returns the frame printed to stdout, or `None` when the render was
/// throttled. Any failure aborts the rest of the cycle.
pub async fn run(ctx: &PollContext) -> Result<Option<Frame>, GasWatchError> {
    let key = ctx.store.get_api_key(&ctx.api_key_name).await?;
    debug!(
        "Loaded api key {} ({} chars), polling the public endpoint",
        ctx.api_key_name,
        key.len()
    );

    let sample = ctx.source.fetch().await?;
    ctx.store.insert_gas_sample(&sample).await?;

    let series = ctx.store.get_fast_series().await?;
    let frame = ctx.renderer.lock().await.render(&series);

    match &frame {
        Some(frame) => println!("{frame}"),
        None => debug!("Render throttled ({} samples stored)", series.len()),
    }

    Ok(frame)
}
