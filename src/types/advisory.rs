//! Advisory types: AdvisoryRequest, ActionCode, Recommendation

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::ReferenceTrajectory;

/// Corrective action suggested to the operator.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ActionCode {
    IncreaseGas,
    DecreaseGas,
    Stable,
}

impl std::fmt::Display for ActionCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActionCode::IncreaseGas => write!(f, "INCREASE GAS"),
            ActionCode::DecreaseGas => write!(f, "DECREASE GAS"),
            ActionCode::Stable => write!(f, "STABLE"),
        }
    }
}

/// Inputs to one advisory round trip.
#[derive(Debug, Clone)]
pub struct AdvisoryRequest {
    pub tick: u64,
    pub current_temp: f64,
    /// Rate of rise (C/min), `None` until the RoR window fills
    pub current_ror: Option<f64>,
    pub reference: Arc<ReferenceTrajectory>,
}

/// Classified comparison of the live curve against the reference.
///
/// Superseded by the next accepted recommendation; never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Recommendation {
    /// Tick the request was issued for
    pub tick: u64,
    /// Live temperature minus reference temperature (C)
    pub temp_delta: f64,
    pub action: ActionCode,
    /// 0-100
    pub intensity: u8,
    pub message: String,
    /// True when the live curve tracks the reference within tolerance
    pub is_synchronized: bool,
}
