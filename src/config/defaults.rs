//! System-wide default constants.
//!
//! Centralises the demo-calibrated numbers used by the roast loop.
//! Grouped by subsystem for easy discovery. Most values here are the default
//! of a `RoastConfig` field and can be overridden from TOML.

// ============================================================================
// Thermal Model
// ============================================================================

/// Heat gained per tick per percent of gas power (C).
pub const K_GAS: f64 = 0.016;

/// Heat removed per tick per percent of airflow (C).
pub const K_AIR: f64 = 0.006;

/// Quadratic loss coefficient: `loss = temp^2 * K_LOSS`.
pub const K_LOSS: f64 = 0.000_02;

/// Bean temperature at charge (tick 0), C.
pub const CHARGE_TEMP_C: f64 = 25.0;

// ============================================================================
// Telemetry
// ============================================================================

/// Samples in the rate-of-rise window.
///
/// 30 samples at 1 Hz = 30 seconds, so RoR is scaled x2 to per-minute.
pub const ROR_WINDOW_SIZE: usize = 30;

/// Simulated seconds represented by one tick.
pub const TICK_SECONDS: f64 = 1.0;

// ============================================================================
// Milestones
// ============================================================================

/// Bean temperature at which Dry End is declared (C).
pub const DRY_END_TEMP_C: f64 = 155.0;

// ============================================================================
// Advisory
// ============================================================================

/// Absolute deviation from the reference above which the critical band applies (C).
pub const CRITICAL_DELTA_C: f64 = 2.0;

/// Absolute deviation from the reference above which the tendency band applies (C).
pub const TENDENCY_DELTA_C: f64 = 0.5;

/// Intensity when running critically hot.
pub const CRITICAL_HOT_INTENSITY: u8 = 80;

/// Intensity when running critically cold.
pub const CRITICAL_COLD_INTENSITY: u8 = 90;

/// Intensity when trending hot.
pub const TENDENCY_HOT_INTENSITY: u8 = 10;

/// Intensity when trending cold.
pub const TENDENCY_COLD_INTENSITY: u8 = 15;

/// Advisory cadence: one request every N ticks.
pub const SYNC_INTERVAL_TICKS: u64 = 3;

/// Upper bound on a single advisory round trip (ms).
pub const ADVISORY_TIMEOUT_MS: u64 = 2_000;

// ============================================================================
// Session
// ============================================================================

/// Hard cap on session length. 720 ticks = 12 minutes at 1 Hz.
pub const MAX_TICKS: u64 = 720;

/// Wall-clock period of one tick in real-time mode (ms).
pub const TICK_PERIOD_MS: u64 = 1_000;

/// Capacity of the operator command and advisory response channels.
pub const CHANNEL_CAPACITY: usize = 64;

/// The scheduler logs a progress line every N ticks (debug level).
pub const PROGRESS_LOG_INTERVAL_TICKS: u64 = 30;

// ============================================================================
// Reference
// ============================================================================

/// Gas power of the simulated master curve.
///
/// Hotter than the console's starting 75% so an untouched run trails the
/// master and draws advisories.
pub const MASTER_GAS_POWER: u8 = 80;

/// Airflow of the simulated master curve.
pub const MASTER_AIRFLOW: u8 = 50;

// ============================================================================
// Batch Finalization
// ============================================================================

/// Baseline fraction of green weight lost during the roast.
pub const MASS_LOSS_BASE: f64 = 0.13;

/// Additional loss fraction per degree above `MASS_LOSS_REFERENCE_TEMP_C`.
pub const MASS_LOSS_PER_DEGREE: f64 = 0.002;

/// Drop temperature at which the baseline loss applies (C).
pub const MASS_LOSS_REFERENCE_TEMP_C: f64 = 205.0;

/// Lower clamp for the loss estimate.
pub const MASS_LOSS_MIN: f64 = 0.10;

/// Upper clamp for the loss estimate.
pub const MASS_LOSS_MAX: f64 = 0.22;

/// Default process type recorded on a batch when the operator sets none.
pub const DEFAULT_PROCESS_TYPE: &str = "washed";

// ============================================================================
// Storage
// ============================================================================

/// Default sled directory for finalized batches and reference curves.
pub const DATA_DIR: &str = "./data/roasts";
