//! Reference-curve classifier
//!
//! Compares the live bean temperature with the reference trajectory at the
//! same tick and picks the first matching band:
//!
//! | band      | condition        | hot (delta > 0)     | cold (delta <= 0)   |
//! |-----------|------------------|---------------------|---------------------|
//! | critical  | abs > critical   | DecreaseGas, 80     | IncreaseGas, 90     |
//! | tendency  | abs > tendency   | DecreaseGas, 10     | IncreaseGas, 15     |
//! | stable    | otherwise        | Stable, 0, synchronized                   |
//!
//! The band table is private to this module. Callers get a
//! [`Recommendation`], never the thresholds that produced it.

use crate::config::AdvisoryConfig;
use crate::types::{ActionCode, AdvisoryRequest, Recommendation};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Band {
    Critical,
    Tendency,
    Stable,
}

#[derive(Debug, Clone)]
struct AdvisoryBands {
    critical_delta: f64,
    tendency_delta: f64,
    critical_hot: u8,
    critical_cold: u8,
    tendency_hot: u8,
    tendency_cold: u8,
}

impl AdvisoryBands {
    fn from_config(cfg: &AdvisoryConfig) -> Self {
        Self {
            critical_delta: cfg.critical_delta_c,
            tendency_delta: cfg.tendency_delta_c,
            critical_hot: cfg.critical_hot_intensity.min(100),
            critical_cold: cfg.critical_cold_intensity.min(100),
            tendency_hot: cfg.tendency_hot_intensity.min(100),
            tendency_cold: cfg.tendency_cold_intensity.min(100),
        }
    }

    fn band(&self, abs_delta: f64) -> Band {
        if abs_delta > self.critical_delta {
            Band::Critical
        } else if abs_delta > self.tendency_delta {
            Band::Tendency
        } else {
            Band::Stable
        }
    }
}

/// Pure, deterministic advisory classifier.
#[derive(Debug, Clone)]
pub(crate) struct AdvisoryEngine {
    bands: AdvisoryBands,
}

impl AdvisoryEngine {
    pub(crate) fn new(cfg: &AdvisoryConfig) -> Self {
        Self {
            bands: AdvisoryBands::from_config(cfg),
        }
    }

    /// Classify one request. `None` when the reference has no point at the
    /// requested tick.
    pub(crate) fn recommend(&self, request: &AdvisoryRequest) -> Option<Recommendation> {
        let reference_point = request.reference.point_at(request.tick)?;
        let delta = request.current_temp - reference_point.temp;
        let hot = delta > 0.0;

        let band = self.bands.band(delta.abs());
        let (action, intensity) = match (band, hot) {
            (Band::Critical, true) => (ActionCode::DecreaseGas, self.bands.critical_hot),
            (Band::Critical, false) => (ActionCode::IncreaseGas, self.bands.critical_cold),
            (Band::Tendency, true) => (ActionCode::DecreaseGas, self.bands.tendency_hot),
            (Band::Tendency, false) => (ActionCode::IncreaseGas, self.bands.tendency_cold),
            (Band::Stable, _) => (ActionCode::Stable, 0),
        };

        Some(Recommendation {
            tick: request.tick,
            temp_delta: delta,
            action,
            intensity,
            message: compose_message(band, delta, request.current_ror),
            is_synchronized: band == Band::Stable,
        })
    }
}

fn compose_message(band: Band, delta: f64, ror: Option<f64>) -> String {
    let magnitude = delta.abs();
    let mut message = match (band, delta > 0.0) {
        (Band::Critical, true) => {
            format!("CRITICAL: {magnitude:.1} C above reference. Cut gas now.")
        }
        (Band::Critical, false) => {
            format!("CRITICAL: {magnitude:.1} C below reference. Raise gas now.")
        }
        (Band::Tendency, true) => {
            format!("Running slightly hot ({magnitude:.1} C over). Ease the gas down.")
        }
        (Band::Tendency, false) => {
            format!("Running slightly cool ({magnitude:.1} C under). Nudge the gas up.")
        }
        (Band::Stable, _) => format!("On profile ({delta:+.1} C). Hold settings."),
    };
    if let Some(ror) = ror {
        message.push_str(&format!(" RoR {ror:.1} C/min."));
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ReferencePoint, ReferenceTrajectory};
    use std::sync::Arc;

    fn reference() -> Arc<ReferenceTrajectory> {
        let points = (0..=30)
            .map(|tick| ReferencePoint {
                tick,
                temp: 100.0,
            })
            .collect();
        Arc::new(ReferenceTrajectory::new("ref", "flat", points, Vec::new()))
    }

    fn classify(delta: f64) -> Recommendation {
        let engine = AdvisoryEngine::new(&AdvisoryConfig::default());
        engine
            .recommend(&AdvisoryRequest {
                tick: 30,
                current_temp: 100.0 + delta,
                current_ror: None,
                reference: reference(),
            })
            .expect("reference has tick 30")
    }

    #[test]
    fn test_critical_hot() {
        let rec = classify(3.0);
        assert_eq!(rec.action, ActionCode::DecreaseGas);
        assert_eq!(rec.intensity, 80);
        assert!(!rec.is_synchronized);
        assert!(rec.message.starts_with("CRITICAL"));
    }

    #[test]
    fn test_critical_cold() {
        let rec = classify(-3.0);
        assert_eq!(rec.action, ActionCode::IncreaseGas);
        assert_eq!(rec.intensity, 90);
    }

    #[test]
    fn test_tendency_hot() {
        let rec = classify(1.0);
        assert_eq!(rec.action, ActionCode::DecreaseGas);
        assert_eq!(rec.intensity, 10);
        assert!((rec.temp_delta - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_tendency_cold() {
        let rec = classify(-1.0);
        assert_eq!(rec.action, ActionCode::IncreaseGas);
        assert_eq!(rec.intensity, 15);
    }

    #[test]
    fn test_stable_is_synchronized() {
        let rec = classify(-0.2);
        assert_eq!(rec.action, ActionCode::Stable);
        assert_eq!(rec.intensity, 0);
        assert!(rec.is_synchronized);
    }

    #[test]
    fn test_band_edges_are_exclusive() {
        // exactly at the threshold falls into the milder band
        assert_eq!(classify(2.0).intensity, 10);
        assert_eq!(classify(0.5).action, ActionCode::Stable);
    }

    #[test]
    fn test_missing_tick_yields_none() {
        let engine = AdvisoryEngine::new(&AdvisoryConfig::default());
        let rec = engine.recommend(&AdvisoryRequest {
            tick: 31,
            current_temp: 100.0,
            current_ror: None,
            reference: reference(),
        });
        assert!(rec.is_none());
    }

    #[test]
    fn test_ror_appended_to_message() {
        let engine = AdvisoryEngine::new(&AdvisoryConfig::default());
        let rec = engine
            .recommend(&AdvisoryRequest {
                tick: 3,
                current_temp: 100.0,
                current_ror: Some(12.34),
                reference: reference(),
            })
            .expect("tick present");
        assert!(rec.message.ends_with("RoR 12.3 C/min."), "{}", rec.message);
    }
}
