//! Roast milestone types

use serde::{Deserialize, Serialize};

/// Process events tracked during a roast.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum MilestoneKind {
    /// Beans enter the drum (tick 0)
    Charge,
    /// End of the drying phase, detected from bean temperature
    DryEnd,
    /// First crack, marked by the operator
    FirstCrack,
    /// Beans leave the drum
    Drop,
}

impl std::fmt::Display for MilestoneKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MilestoneKind::Charge => write!(f, "Charge"),
            MilestoneKind::DryEnd => write!(f, "Dry End"),
            MilestoneKind::FirstCrack => write!(f, "First Crack"),
            MilestoneKind::Drop => write!(f, "Drop"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Milestone {
    pub kind: MilestoneKind,
    pub tick: u64,
    /// Bean temperature at the event (C)
    pub temp: f64,
}
