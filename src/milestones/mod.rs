//! Milestone Detector
//!
//! Tracks the four roast events:
//! - **Charge**: tick 0, recorded when the session starts
//! - **Dry End**: first tick with bean temp at or above the dry-end threshold;
//!   fires once and is never re-evaluated
//! - **First Crack**: operator-marked; a second mark replaces the first
//! - **Drop**: end of session (operator or tick limit)

use tracing::{info, warn};

use crate::types::{Milestone, MilestoneKind};

/// Development time ratio: share of the roast (in %) elapsed after first crack.
///
/// 0.0 when first crack is unset or no time has elapsed.
pub fn development_ratio(elapsed_ticks: u64, first_crack_tick: Option<u64>) -> f64 {
    match first_crack_tick {
        Some(fc) if elapsed_ticks > 0 => {
            #[allow(clippy::cast_precision_loss)]
            let ratio = (elapsed_ticks as f64 - fc as f64) / elapsed_ticks as f64 * 100.0;
            ratio
        }
        _ => 0.0,
    }
}

/// Milestones of one session.
#[derive(Debug, Clone, Default)]
pub struct MilestoneDetector {
    dry_end_temp: f64,
    charge: Option<Milestone>,
    dry_end: Option<Milestone>,
    first_crack: Option<Milestone>,
    drop: Option<Milestone>,
}

impl MilestoneDetector {
    pub fn new(dry_end_temp: f64) -> Self {
        Self {
            dry_end_temp,
            ..Self::default()
        }
    }

    pub fn record_charge(&mut self, tick: u64, temp: f64) {
        self.charge = Some(Milestone {
            kind: MilestoneKind::Charge,
            tick,
            temp,
        });
    }

    /// Inspect a fresh sample. Returns the Dry End milestone on the one tick it fires.
    pub fn inspect(&mut self, tick: u64, temp: f64) -> Option<Milestone> {
        if self.dry_end.is_some() || temp < self.dry_end_temp {
            return None;
        }
        let milestone = Milestone {
            kind: MilestoneKind::DryEnd,
            tick,
            temp,
        };
        self.dry_end = Some(milestone);
        info!(tick, temp = format!("{temp:.1}"), "Dry End detected");
        Some(milestone)
    }

    /// Operator marks first crack. Every call overwrites the previous mark.
    pub fn mark_first_crack(&mut self, tick: u64, temp: f64) -> Milestone {
        if let Some(previous) = self.first_crack {
            warn!(
                previous_tick = previous.tick,
                new_tick = tick,
                "First Crack re-marked, replacing earlier mark"
            );
        }
        let milestone = Milestone {
            kind: MilestoneKind::FirstCrack,
            tick,
            temp,
        };
        self.first_crack = Some(milestone);
        info!(tick, temp = format!("{temp:.1}"), "First Crack marked");
        milestone
    }

    pub fn record_drop(&mut self, tick: u64, temp: f64) -> Milestone {
        let milestone = Milestone {
            kind: MilestoneKind::Drop,
            tick,
            temp,
        };
        self.drop = Some(milestone);
        milestone
    }

    pub fn get(&self, kind: MilestoneKind) -> Option<&Milestone> {
        match kind {
            MilestoneKind::Charge => self.charge.as_ref(),
            MilestoneKind::DryEnd => self.dry_end.as_ref(),
            MilestoneKind::FirstCrack => self.first_crack.as_ref(),
            MilestoneKind::Drop => self.drop.as_ref(),
        }
    }

    pub fn development_ratio(&self, elapsed_ticks: u64) -> f64 {
        development_ratio(elapsed_ticks, self.first_crack.map(|m| m.tick))
    }

    /// Recorded milestones in process order.
    pub fn to_vec(&self) -> Vec<Milestone> {
        [self.charge, self.dry_end, self.first_crack, self.drop]
            .into_iter()
            .flatten()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dtr_reference_case() {
        assert!((development_ratio(600, Some(540)) - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_dtr_zero_without_first_crack_or_time() {
        assert_eq!(development_ratio(600, None), 0.0);
        assert_eq!(development_ratio(0, Some(0)), 0.0);
    }

    #[test]
    fn test_dry_end_fires_once_at_threshold() {
        let mut detector = MilestoneDetector::new(155.0);
        assert!(detector.inspect(10, 154.99).is_none());
        let fired = detector.inspect(11, 155.0).expect("fires at threshold");
        assert_eq!(fired.tick, 11);
        assert!(detector.inspect(12, 160.0).is_none(), "never fires twice");
        assert!(detector.inspect(13, 150.0).is_none());
        assert_eq!(
            detector.get(MilestoneKind::DryEnd).map(|m| m.tick),
            Some(11)
        );
    }

    #[test]
    fn test_first_crack_last_write_wins() {
        let mut detector = MilestoneDetector::new(155.0);
        detector.mark_first_crack(400, 196.0);
        detector.mark_first_crack(420, 198.0);
        assert_eq!(
            detector.get(MilestoneKind::FirstCrack).map(|m| m.tick),
            Some(420)
        );
        assert!((detector.development_ratio(600) - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_to_vec_is_in_process_order() {
        let mut detector = MilestoneDetector::new(155.0);
        detector.record_charge(0, 25.0);
        detector.mark_first_crack(500, 196.0);
        detector.inspect(300, 156.0);
        detector.record_drop(600, 205.0);
        let kinds: Vec<MilestoneKind> = detector.to_vec().iter().map(|m| m.kind).collect();
        assert_eq!(
            kinds,
            vec![
                MilestoneKind::Charge,
                MilestoneKind::DryEnd,
                MilestoneKind::FirstCrack,
                MilestoneKind::Drop,
            ]
        );
    }
}
