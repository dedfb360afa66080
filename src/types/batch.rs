//! Batch finalization types: BatchMetadata, FinalizationSummary, BatchRecord

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Milestone, RorSample, TelemetrySample};
use crate::config::defaults::DEFAULT_PROCESS_TYPE;

/// Operator-supplied batch details, attached at session start.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BatchMetadata {
    /// Batch label shown on the roast log
    pub label: String,
    /// Green-coffee lot the beans came from
    pub source_lot: String,
    /// Washed, natural, honey, ...
    pub process_type: String,
    pub green_weight_kg: f64,
    /// Owning company in the surrounding system
    pub tenant: String,
}

impl Default for BatchMetadata {
    fn default() -> Self {
        Self {
            label: "Untitled batch".to_string(),
            source_lot: String::new(),
            process_type: DEFAULT_PROCESS_TYPE.to_string(),
            green_weight_kg: 0.0,
            tenant: String::new(),
        }
    }
}

/// Why a session ended.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum EndReason {
    /// Operator dropped the beans
    Drop,
    /// Tick counter reached the session cap
    MaxTicks,
}

impl std::fmt::Display for EndReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EndReason::Drop => write!(f, "operator drop"),
            EndReason::MaxTicks => write!(f, "tick limit"),
        }
    }
}

/// Everything known about a finished session, built once at the end.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalizationSummary {
    pub session_id: Uuid,
    pub reference_id: String,
    pub metadata: BatchMetadata,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub end_reason: EndReason,
    pub total_ticks: u64,
    /// Bean temperature at drop (C)
    pub final_temp: f64,
    /// Estimated fraction of green weight lost (0-1)
    pub mass_loss_estimate: f64,
    /// Development time ratio (%)
    pub development_ratio: f64,
    pub milestones: Vec<Milestone>,
    pub telemetry: Vec<TelemetrySample>,
    pub ror: Vec<RorSample>,
}

impl FinalizationSummary {
    /// Roasted weight implied by the green weight and mass-loss estimate.
    pub fn roasted_weight_kg(&self) -> f64 {
        self.metadata.green_weight_kg * (1.0 - self.mass_loss_estimate)
    }

    /// Project the summary onto the record the persistence sink accepts.
    pub fn batch_record(&self) -> BatchRecord {
        BatchRecord {
            session_id: self.session_id,
            label: self.metadata.label.clone(),
            source_lot: self.metadata.source_lot.clone(),
            roast_date: self.started_at.date_naive(),
            process_type: self.metadata.process_type.clone(),
            green_weight_kg: self.metadata.green_weight_kg,
            roasted_weight_kg: self.roasted_weight_kg(),
            total_ticks: self.total_ticks,
            final_temp: self.final_temp,
            tenant: self.metadata.tenant.clone(),
            milestones: self.milestones.clone(),
            telemetry: self.telemetry.clone(),
        }
    }
}

/// Payload handed to the batch persistence sink.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BatchRecord {
    pub session_id: Uuid,
    pub label: String,
    pub source_lot: String,
    pub roast_date: NaiveDate,
    pub process_type: String,
    pub green_weight_kg: f64,
    pub roasted_weight_kg: f64,
    pub total_ticks: u64,
    pub final_temp: f64,
    pub tenant: String,
    /// Curve data so the batch can later serve as a reference
    #[serde(default)]
    pub milestones: Vec<Milestone>,
    #[serde(default)]
    pub telemetry: Vec<TelemetrySample>,
}

/// Sink acknowledgement for a stored batch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BatchReceipt {
    pub batch_id: String,
    pub stored_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MilestoneKind;

    fn summary() -> FinalizationSummary {
        let now = Utc::now();
        FinalizationSummary {
            session_id: Uuid::new_v4(),
            reference_id: "master-1".to_string(),
            metadata: BatchMetadata {
                label: "Batch 7".to_string(),
                source_lot: "LOT-42".to_string(),
                process_type: "natural".to_string(),
                green_weight_kg: 10.0,
                tenant: "acme".to_string(),
            },
            started_at: now,
            ended_at: now,
            end_reason: EndReason::Drop,
            total_ticks: 600,
            final_temp: 210.0,
            mass_loss_estimate: 0.15,
            development_ratio: 10.0,
            milestones: vec![Milestone {
                kind: MilestoneKind::Charge,
                tick: 0,
                temp: 25.0,
            }],
            telemetry: vec![TelemetrySample {
                tick: 0,
                bean_temp: 25.0,
            }],
            ror: Vec::new(),
        }
    }

    #[test]
    fn test_batch_record_carries_sink_fields() {
        let s = summary();
        let record = s.batch_record();
        assert_eq!(record.label, "Batch 7");
        assert_eq!(record.source_lot, "LOT-42");
        assert_eq!(record.process_type, "natural");
        assert_eq!(record.tenant, "acme");
        assert_eq!(record.total_ticks, 600);
        assert_eq!(record.roast_date, s.started_at.date_naive());
        assert!((record.roasted_weight_kg - 8.5).abs() < 1e-9);
        assert_eq!(record.telemetry.len(), 1);
    }
}
