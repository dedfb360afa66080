//! Telemetry types: raw bean temperature samples and derived rate of rise

use serde::{Deserialize, Serialize};

/// One bean temperature reading, one per tick.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TelemetrySample {
    pub tick: u64,
    /// Bean temperature (C)
    pub bean_temp: f64,
}

/// Rate of rise at a tick, in C per minute.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RorSample {
    pub tick: u64,
    pub rate_of_rise: f64,
}
