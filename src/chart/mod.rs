//! Rolling ASCII chart of recent `fast` gas prices.
//!
//! - [`plot`] - the chart layout itself
//! - [`RenderThrottle`] / [`trim_window`] - refresh rate limit and window policy
//! - [`Renderer`] - combines the three and produces printable [`Frame`]s

use std::fmt;
use std::time::Instant;

use serde::Deserialize;

mod plot;
mod throttle;

pub use plot::{interpolate, plot, PlotOptions};
pub use throttle::{trim_window, RenderThrottle};

/// Clears the terminal and homes the cursor.
pub const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

/// Chart layout and refresh configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct ChartSettings {
    #[serde(default = "default_height")]
    pub height: usize,
    #[serde(default = "default_width")]
    pub width: usize,
    #[serde(default = "default_caption")]
    pub caption: String,
    #[serde(default = "default_offset")]
    pub offset: usize,
    #[serde(default = "default_precision")]
    pub precision: usize,
    /// Trailing samples kept for the chart, 0 keeps all
    #[serde(default = "default_window_size")]
    pub window_size: usize,
    /// Maximum frames per second, 0 disables throttling
    #[serde(default = "default_fps")]
    pub fps: f64,
    #[serde(default = "default_clear_screen")]
    pub clear_screen: bool,
}

fn default_height() -> usize {
    15
}

fn default_width() -> usize {
    100
}

fn default_caption() -> String {
    "realtime eth gas price over time (Gwei per gas)".to_string()
}

fn default_offset() -> usize {
    3
}

fn default_precision() -> usize {
    2
}

fn default_window_size() -> usize {
    100
}

fn default_fps() -> f64 {
    24.0
}

fn default_clear_screen() -> bool {
    true
}

impl Default for ChartSettings {
    fn default() -> Self {
        Self {
            height: default_height(),
            width: default_width(),
            caption: default_caption(),
            offset: default_offset(),
            precision: default_precision(),
            window_size: default_window_size(),
            fps: default_fps(),
            clear_screen: default_clear_screen(),
        }
    }
}

impl ChartSettings {
    pub fn plot_options(&self) -> PlotOptions<'_> {
        PlotOptions {
            height: self.height,
            width: self.width,
            offset: self.offset,
            precision: self.precision,
            caption: &self.caption,
        }
    }
}

/// One emitted render: the windowed data and its chart.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub data: Vec<f64>,
    pub chart: String,
    clear_screen: bool,
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.clear_screen {
            f.write_str(CLEAR_SCREEN)?;
        }
        writeln!(f, "{}", self.chart)?;
        write!(f, "\nData = {:?}", self.data)
    }
}

/// Turns the stored series into throttled chart frames.
///
/// The series is rebuilt from storage on every call; nothing is kept between
/// calls except the throttle threshold.
#[derive(Debug)]
pub struct Renderer {
    settings: ChartSettings,
    throttle: RenderThrottle,
}

impl Renderer {
    pub fn new(settings: ChartSettings) -> Self {
        let throttle = RenderThrottle::new(settings.fps);
        Self { settings, throttle }
    }

    pub fn render(&mut self, series: &[f64]) -> Option<Frame> {
        self.render_at(series, Instant::now())
    }

    /// Returns `None` when the previous frame is more recent than `1/fps`.
    pub fn render_at(&mut self, series: &[f64], now: Instant) -> Option<Frame> {
        if !self.throttle.try_acquire(now) {
            return None;
        }

        let data = trim_window(series, self.settings.window_size).to_vec();
        let chart = plot(&data, &self.settings.plot_options());

        Some(Frame {
            data,
            chart,
            clear_screen: self.settings.clear_screen,
        })
    }
}
