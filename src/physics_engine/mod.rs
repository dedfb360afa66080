//! Physics Engine Module
//!
//! Deterministic thermal calculations for the roast loop.
//! All math here is plain arithmetic - no I/O, no randomness.
//!
//! - `advance()` - one-tick bean temperature update
//! - `equilibrium_temp()` - steady state for fixed actuator settings
//! - `ThermalModel` - the same functions bound to a `ThermalConfig`

pub mod thermal;

pub use thermal::{advance, equilibrium_temp, ThermalModel};
