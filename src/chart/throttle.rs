use std::time::{Duration, Instant};

/// Caps how often a frame may be emitted.
///
/// A call succeeds when `now >= next_allowed`; the threshold then moves to
/// `now + 1/fps`. A non-positive `fps` never throttles.
#[derive(Debug, Clone)]
pub struct RenderThrottle {
    interval: Option<Duration>,
    next_allowed: Option<Instant>,
}

impl RenderThrottle {
    pub fn new(fps: f64) -> Self {
        let interval = (fps.is_finite() && fps > 0.0).then(|| Duration::from_secs_f64(1.0 / fps));
        Self {
            interval,
            next_allowed: None,
        }
    }

    pub fn interval(&self) -> Option<Duration> {
        self.interval
    }

    pub fn try_acquire(&mut self, now: Instant) -> bool {
        if self.next_allowed.is_some_and(|next| now < next) {
            return false;
        }
        if let Some(interval) = self.interval {
            self.next_allowed = Some(now + interval);
        }
        true
    }
}

/// Keeps the last `window_size` values, in order. 0 keeps everything.
pub fn trim_window(series: &[f64], window_size: usize) -> &[f64] {
    if window_size > 0 && series.len() > window_size {
        &series[series.len() - window_size..]
    } else {
        series
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_render_always_allowed() {
        let mut throttle = RenderThrottle::new(24.0);
        assert!(throttle.try_acquire(Instant::now()));
    }

    #[test]
    fn test_renders_closer_than_interval_emit_once() {
        let mut throttle = RenderThrottle::new(10.0);
        let start = Instant::now();

        assert!(throttle.try_acquire(start));
        assert!(!throttle.try_acquire(start + Duration::from_millis(50)));
        assert!(!throttle.try_acquire(start + Duration::from_millis(99)));
    }

    #[test]
    fn test_renders_at_or_past_interval_both_emit() {
        let mut throttle = RenderThrottle::new(10.0);
        let start = Instant::now();

        assert!(throttle.try_acquire(start));
        assert!(throttle.try_acquire(start + Duration::from_millis(100)));
        assert!(throttle.try_acquire(start + Duration::from_millis(250)));
        // threshold advanced from the last emission, not from the first
        assert!(!throttle.try_acquire(start + Duration::from_millis(300)));
    }

    #[test]
    fn test_zero_fps_disables_throttle() {
        let mut throttle = RenderThrottle::new(0.0);
        let now = Instant::now();

        assert!(throttle.interval().is_none());
        assert!(throttle.try_acquire(now));
        assert!(throttle.try_acquire(now));
    }

    #[test]
    fn test_trim_keeps_last_window() {
        let series = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(trim_window(&series, 2), &[4.0, 5.0]);
        assert_eq!(trim_window(&series, 5), &series);
        assert_eq!(trim_window(&series, 10), &series);
        assert_eq!(trim_window(&series, 0), &series);
        assert!(trim_window(&[], 3).is_empty());
    }
}
