//! Core session state types: SessionStatus, Actuators, SessionSnapshot

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Milestone, Recommendation};

// ============================================================================
// Session Status
// ============================================================================

/// Lifecycle state of a roast session.
///
/// `Idle --start--> Running --(drop | max ticks)--> Ended`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, Hash)]
pub enum SessionStatus {
    #[default]
    Idle,
    Running,
    Ended,
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionStatus::Idle => write!(f, "Idle"),
            SessionStatus::Running => write!(f, "Running"),
            SessionStatus::Ended => write!(f, "Ended"),
        }
    }
}

// ============================================================================
// Actuators
// ============================================================================

/// Operator-controlled burner and fan settings, each a percentage 0-100.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Actuators {
    pub gas_power: u8,
    pub airflow: u8,
}

impl Actuators {
    /// Build a setting, clamping both values to 100.
    pub fn new(gas_power: u8, airflow: u8) -> Self {
        Self {
            gas_power: gas_power.min(100),
            airflow: airflow.min(100),
        }
    }
}

impl std::fmt::Display for Actuators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "gas {}% / air {}%", self.gas_power, self.airflow)
    }
}

// ============================================================================
// Finalization Status
// ============================================================================

/// Where the finished batch stands with the persistence sink.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum FinalizationStatus {
    /// Session still running, nothing to save yet.
    #[default]
    NotReady,
    /// Sink accepted the batch.
    Saved { batch_id: String },
    /// Sink rejected the batch; the summary is retained for retry.
    Unsaved { error: String },
}

// ============================================================================
// Snapshot
// ============================================================================

/// Read-only view of the latest committed session state.
///
/// Published as a whole after every tick or event, so readers never see a
/// half-applied tick.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SessionSnapshot {
    pub session_id: Option<Uuid>,
    pub status: SessionStatus,
    pub tick: u64,
    pub bean_temp: f64,
    /// Rate of rise (C/min), `None` until the window fills
    pub ror: Option<f64>,
    pub actuators: Actuators,
    pub milestones: Vec<Milestone>,
    /// Development time ratio (%)
    pub development_ratio: f64,
    /// Latest accepted advisory recommendation
    pub recommendation: Option<Recommendation>,
    pub finalization: FinalizationStatus,
}
