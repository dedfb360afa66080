//! Telemetry Recorder
//!
//! Append-only bean temperature series for the running session, plus the
//! derived rate of rise (RoR). One sample per tick, ticks strictly
//! increasing by one. Out-of-sequence ticks are dropped, never reordered.

use tracing::debug;

use crate::config::TelemetryConfig;
use crate::types::{RorSample, TelemetrySample};

/// Rate of rise over the trailing window, in C per minute.
///
/// `None` while `history.len() <= window_size`. Otherwise
/// `(temp[t] - temp[t - window_size]) * 60 / (window_size * tick_seconds)`,
/// so it depends on exactly two samples of the history.
pub fn compute_ror(
    history: &[TelemetrySample],
    window_size: usize,
    tick_seconds: f64,
) -> Option<f64> {
    if window_size == 0 || history.len() <= window_size {
        return None;
    }
    let last = history.len() - 1;
    let latest = history[last].bean_temp;
    let earlier = history[last - window_size].bean_temp;
    #[allow(clippy::cast_precision_loss)]
    let scale = 60.0 / (window_size as f64 * tick_seconds);
    Some((latest - earlier) * scale)
}

/// Owns the sample history of one session.
#[derive(Debug, Clone)]
pub struct TelemetryRecorder {
    samples: Vec<TelemetrySample>,
    ror: Vec<RorSample>,
    window_size: usize,
    tick_seconds: f64,
}

impl TelemetryRecorder {
    pub fn new(cfg: &TelemetryConfig) -> Self {
        Self {
            samples: Vec::new(),
            ror: Vec::new(),
            window_size: cfg.ror_window_size,
            tick_seconds: cfg.tick_seconds,
        }
    }

    /// Append a sample.
    ///
    /// Returns `false` (and records nothing) when `tick` is not exactly one
    /// past the last recorded tick. The first sample may carry any tick.
    pub fn record(&mut self, tick: u64, bean_temp: f64) -> bool {
        if let Some(last) = self.samples.last() {
            if tick != last.tick + 1 {
                debug!(
                    tick,
                    last_tick = last.tick,
                    "Ignoring out-of-sequence telemetry sample"
                );
                return false;
            }
        }
        self.samples.push(TelemetrySample { tick, bean_temp });

        let ror = compute_ror(&self.samples, self.window_size, self.tick_seconds);
        if let Some(rate_of_rise) = ror {
            self.ror.push(RorSample { tick, rate_of_rise });
        }
        true
    }

    /// RoR at the latest tick, if the window is full.
    pub fn current_ror(&self) -> Option<f64> {
        match (self.ror.last(), self.samples.last()) {
            (Some(r), Some(s)) if r.tick == s.tick => Some(r.rate_of_rise),
            _ => None,
        }
    }

    pub fn samples(&self) -> &[TelemetrySample] {
        &self.samples
    }

    pub fn ror_series(&self) -> &[RorSample] {
        &self.ror
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linear_history(n: usize, slope: f64) -> Vec<TelemetrySample> {
        (0..n)
            .map(|i| TelemetrySample {
                tick: i as u64,
                bean_temp: 25.0 + slope * i as f64,
            })
            .collect()
    }

    #[test]
    fn test_ror_none_until_window_exceeded() {
        assert!(compute_ror(&[], 30, 1.0).is_none());
        assert!(compute_ror(&linear_history(30, 1.0), 30, 1.0).is_none());
        assert!(compute_ror(&linear_history(31, 1.0), 30, 1.0).is_some());
    }

    #[test]
    fn test_ror_scaled_to_per_minute() {
        // 0.5 C per tick over 30 one-second ticks = 15 C over 30 s = 30 C/min
        let ror = compute_ror(&linear_history(40, 0.5), 30, 1.0).expect("window full");
        assert!((ror - 30.0).abs() < 1e-9, "got {ror}");
    }

    #[test]
    fn test_ror_depends_only_on_window_endpoints() {
        let mut history = linear_history(31, 1.0);
        let before = compute_ror(&history, 30, 1.0);
        // Perturb a sample strictly inside the window
        history[15].bean_temp = 999.0;
        assert_eq!(before, compute_ror(&history, 30, 1.0));
    }

    #[test]
    fn test_record_rejects_duplicates_and_gaps() {
        let mut rec = TelemetryRecorder::new(&TelemetryConfig::default());
        assert!(rec.record(0, 25.0));
        assert!(rec.record(1, 26.0));
        assert!(!rec.record(1, 27.0), "duplicate tick must be ignored");
        assert!(!rec.record(3, 28.0), "gap must be ignored");
        assert!(rec.record(2, 27.0));
        let ticks: Vec<u64> = rec.samples().iter().map(|s| s.tick).collect();
        assert_eq!(ticks, vec![0, 1, 2]);
    }

    #[test]
    fn test_recorder_tracks_ror_series() {
        let mut rec = TelemetryRecorder::new(&TelemetryConfig::default());
        for i in 0..=30u64 {
            rec.record(i, 25.0 + i as f64);
            if i < 30 {
                assert!(rec.current_ror().is_none());
            }
        }
        // 31 samples: first RoR at tick 30, 30 C over 30 s -> 60 C/min
        assert_eq!(rec.ror_series().len(), 1);
        assert_eq!(rec.ror_series()[0].tick, 30);
        assert!((rec.current_ror().unwrap_or_default() - 60.0).abs() < 1e-9);
    }
}
