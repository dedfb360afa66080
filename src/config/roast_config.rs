//! Roast Configuration - every demo-calibrated constant as a TOML value
//!
//! Each struct implements `Default` with the values from [`super::defaults`],
//! so a missing config file yields the stock demo curve.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::defaults;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "ROAST_CONFIG";

/// Config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "roast_config.toml";

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration for a roaster deployment.
///
/// Load with `RoastConfig::load()` which searches:
/// 1. `$ROAST_CONFIG` env var
/// 2. `./roast_config.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoastConfig {
    /// Thermal model coefficients
    #[serde(default)]
    pub thermal: ThermalConfig,

    /// Telemetry / RoR window
    #[serde(default)]
    pub telemetry: TelemetryConfig,

    /// Milestone detection
    #[serde(default)]
    pub milestones: MilestoneConfig,

    /// Advisory bands and cadence
    #[serde(default)]
    pub advisory: AdvisoryConfig,

    /// Session scheduling
    #[serde(default)]
    pub session: SessionConfig,

    /// Simulated master curve settings
    #[serde(default)]
    pub reference: ReferenceConfig,

    /// Batch finalization estimates
    #[serde(default)]
    pub batch: BatchConfig,
}

impl RoastConfig {
    /// Load configuration using the standard search order:
    /// 1. `$ROAST_CONFIG` environment variable
    /// 2. `./roast_config.toml` in the current working directory
    /// 3. Built-in defaults
    pub fn load() -> Self {
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), "Loaded roast config from ROAST_CONFIG");
                        return config;
                    }
                    Err(e) => {
                        warn!(
                            path = %p.display(),
                            error = %e,
                            "Failed to load config from ROAST_CONFIG, falling back"
                        );
                    }
                }
            } else {
                warn!(path = %path, "ROAST_CONFIG points to non-existent file, falling back");
            }
        }

        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!("Loaded roast config from ./roast_config.toml");
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./roast_config.toml, using defaults");
                }
            }
        }

        info!("No roast_config.toml found, using built-in defaults");
        Self::default()
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Self::from_toml_str(&contents).map_err(|e| match e {
            ConfigError::Parse(_, inner) => ConfigError::Parse(path.to_path_buf(), inner),
            other => other,
        })
    }

    /// Parse and validate a TOML document. Unknown keys are logged, not rejected.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        for w in super::validation::validate_unknown_keys(contents) {
            warn!("{}", w);
        }

        let config: Self = toml::from_str(contents)
            .map_err(|e| ConfigError::Parse(PathBuf::from("<inline>"), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the full config (defaults included) to TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Validate all values for internal consistency.
    ///
    /// Rules:
    /// - Every float must be finite (TOML accepts `nan` and `inf`)
    /// - Critical advisory band must be wider than the tendency band
    /// - Intensities must be within 0..=100 (enforced by `u8` plus an upper check)
    /// - Window, cadence and tick cap must be > 0
    /// - Master curve settings must be within 0..=100
    /// - Mass-loss clamps must be ordered and inside 0..1
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors: Vec<String> = Vec::new();

        for (name, value) in self.float_fields() {
            if !value.is_finite() {
                errors.push(format!("{name} ({value}) must be a finite number"));
            }
        }

        let t = &self.thermal;
        for (name, value) in [("k_gas", t.k_gas), ("k_air", t.k_air), ("k_loss", t.k_loss)] {
            if value < 0.0 {
                errors.push(format!("thermal.{name} ({value}) must be non-negative"));
            }
        }

        if self.telemetry.ror_window_size == 0 {
            errors.push("telemetry.ror_window_size must be > 0".to_string());
        }
        if self.telemetry.tick_seconds <= 0.0 {
            errors.push(format!(
                "telemetry.tick_seconds ({}) must be > 0",
                self.telemetry.tick_seconds
            ));
        }

        let a = &self.advisory;
        if a.tendency_delta_c < 0.0 {
            errors.push(format!(
                "advisory.tendency_delta_c ({:.2}) must be >= 0",
                a.tendency_delta_c
            ));
        }
        if a.critical_delta_c <= a.tendency_delta_c {
            errors.push(format!(
                "advisory.critical_delta_c ({:.2}) must be greater than tendency_delta_c ({:.2})",
                a.critical_delta_c, a.tendency_delta_c
            ));
        }
        for (name, value) in [
            ("critical_hot_intensity", a.critical_hot_intensity),
            ("critical_cold_intensity", a.critical_cold_intensity),
            ("tendency_hot_intensity", a.tendency_hot_intensity),
            ("tendency_cold_intensity", a.tendency_cold_intensity),
        ] {
            if value > 100 {
                errors.push(format!("advisory.{name} ({value}) must be <= 100"));
            }
        }
        if a.sync_interval_ticks == 0 {
            errors.push("advisory.sync_interval_ticks must be > 0".to_string());
        }

        if self.session.max_ticks == 0 {
            errors.push("session.max_ticks must be > 0".to_string());
        }
        if self.session.tick_period_ms == 0 {
            errors.push("session.tick_period_ms must be > 0".to_string());
        }

        let r = &self.reference;
        for (name, value) in [
            ("master_gas_power", r.master_gas_power),
            ("master_airflow", r.master_airflow),
        ] {
            if value > 100 {
                errors.push(format!("reference.{name} ({value}) must be <= 100"));
            }
        }

        let b = &self.batch;
        if !(0.0..1.0).contains(&b.mass_loss_min) || !(0.0..1.0).contains(&b.mass_loss_max) {
            errors.push("batch.mass_loss_min/max must be within [0, 1)".to_string());
        }
        if b.mass_loss_min > b.mass_loss_max {
            errors.push(format!(
                "batch.mass_loss_min ({:.3}) must not exceed mass_loss_max ({:.3})",
                b.mass_loss_min, b.mass_loss_max
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    /// Every floating-point setting, keyed by its TOML path.
    fn float_fields(&self) -> [(&'static str, f64); 13] {
        let b = &self.batch;
        [
            ("thermal.k_gas", self.thermal.k_gas),
            ("thermal.k_air", self.thermal.k_air),
            ("thermal.k_loss", self.thermal.k_loss),
            ("thermal.charge_temp_c", self.thermal.charge_temp_c),
            ("telemetry.tick_seconds", self.telemetry.tick_seconds),
            ("milestones.dry_end_temp_c", self.milestones.dry_end_temp_c),
            ("advisory.critical_delta_c", self.advisory.critical_delta_c),
            ("advisory.tendency_delta_c", self.advisory.tendency_delta_c),
            ("batch.mass_loss_base", b.mass_loss_base),
            ("batch.mass_loss_per_degree", b.mass_loss_per_degree),
            ("batch.mass_loss_reference_temp_c", b.mass_loss_reference_temp_c),
            ("batch.mass_loss_min", b.mass_loss_min),
            ("batch.mass_loss_max", b.mass_loss_max),
        ]
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config I/O error ({}): {}", .0.display(), .1)]
    Io(PathBuf, #[source] std::io::Error),
    #[error("Config parse error ({}): {}", .0.display(), .1)]
    Parse(PathBuf, #[source] toml::de::Error),
    #[error("Config serialization error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Config validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),
}

// ============================================================================
// Thermal
// ============================================================================

/// Coefficients of the per-tick bean temperature update.
///
/// These are tuned to draw a plausible demo curve, not measured physics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThermalConfig {
    #[serde(default = "default_k_gas")]
    pub k_gas: f64,

    #[serde(default = "default_k_air")]
    pub k_air: f64,

    /// Quadratic loss coefficient.
    #[serde(default = "default_k_loss")]
    pub k_loss: f64,

    /// Bean temperature recorded at tick 0.
    #[serde(default = "default_charge_temp")]
    pub charge_temp_c: f64,
}

fn default_k_gas() -> f64 {
    defaults::K_GAS
}

fn default_k_air() -> f64 {
    defaults::K_AIR
}

fn default_k_loss() -> f64 {
    defaults::K_LOSS
}

fn default_charge_temp() -> f64 {
    defaults::CHARGE_TEMP_C
}

impl Default for ThermalConfig {
    fn default() -> Self {
        Self {
            k_gas: default_k_gas(),
            k_air: default_k_air(),
            k_loss: default_k_loss(),
            charge_temp_c: default_charge_temp(),
        }
    }
}

// ============================================================================
// Telemetry
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Number of samples spanned by the RoR difference.
    #[serde(default = "default_ror_window")]
    pub ror_window_size: usize,

    /// Simulated seconds per tick, used to scale RoR to per-minute.
    #[serde(default = "default_tick_seconds")]
    pub tick_seconds: f64,
}

fn default_ror_window() -> usize {
    defaults::ROR_WINDOW_SIZE
}

fn default_tick_seconds() -> f64 {
    defaults::TICK_SECONDS
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            ror_window_size: default_ror_window(),
            tick_seconds: default_tick_seconds(),
        }
    }
}

// ============================================================================
// Milestones
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MilestoneConfig {
    #[serde(default = "default_dry_end_temp")]
    pub dry_end_temp_c: f64,
}

fn default_dry_end_temp() -> f64 {
    defaults::DRY_END_TEMP_C
}

impl Default for MilestoneConfig {
    fn default() -> Self {
        Self {
            dry_end_temp_c: default_dry_end_temp(),
        }
    }
}

// ============================================================================
// Advisory
// ============================================================================

/// Advisory band thresholds and cadence.
///
/// Only `advisory::connect` reads the band fields; the session only sees
/// `sync_interval_ticks` and `timeout_ms`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvisoryConfig {
    #[serde(default = "default_critical_delta")]
    pub critical_delta_c: f64,

    #[serde(default = "default_tendency_delta")]
    pub tendency_delta_c: f64,

    #[serde(default = "default_critical_hot")]
    pub critical_hot_intensity: u8,

    #[serde(default = "default_critical_cold")]
    pub critical_cold_intensity: u8,

    #[serde(default = "default_tendency_hot")]
    pub tendency_hot_intensity: u8,

    #[serde(default = "default_tendency_cold")]
    pub tendency_cold_intensity: u8,

    /// One advisory request every N ticks.
    #[serde(default = "default_sync_interval")]
    pub sync_interval_ticks: u64,

    /// Round-trip budget for a single request.
    #[serde(default = "default_advisory_timeout")]
    pub timeout_ms: u64,
}

fn default_critical_delta() -> f64 {
    defaults::CRITICAL_DELTA_C
}

fn default_tendency_delta() -> f64 {
    defaults::TENDENCY_DELTA_C
}

fn default_critical_hot() -> u8 {
    defaults::CRITICAL_HOT_INTENSITY
}

fn default_critical_cold() -> u8 {
    defaults::CRITICAL_COLD_INTENSITY
}

fn default_tendency_hot() -> u8 {
    defaults::TENDENCY_HOT_INTENSITY
}

fn default_tendency_cold() -> u8 {
    defaults::TENDENCY_COLD_INTENSITY
}

fn default_sync_interval() -> u64 {
    defaults::SYNC_INTERVAL_TICKS
}

fn default_advisory_timeout() -> u64 {
    defaults::ADVISORY_TIMEOUT_MS
}

impl Default for AdvisoryConfig {
    fn default() -> Self {
        Self {
            critical_delta_c: default_critical_delta(),
            tendency_delta_c: default_tendency_delta(),
            critical_hot_intensity: default_critical_hot(),
            critical_cold_intensity: default_critical_cold(),
            tendency_hot_intensity: default_tendency_hot(),
            tendency_cold_intensity: default_tendency_cold(),
            sync_interval_ticks: default_sync_interval(),
            timeout_ms: default_advisory_timeout(),
        }
    }
}

// ============================================================================
// Session
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Session force-ends when the tick counter reaches this value.
    #[serde(default = "default_max_ticks")]
    pub max_ticks: u64,

    /// Wall-clock period of one tick. Divided by `--speed` in the binary.
    #[serde(default = "default_tick_period")]
    pub tick_period_ms: u64,
}

fn default_max_ticks() -> u64 {
    defaults::MAX_TICKS
}

fn default_tick_period() -> u64 {
    defaults::TICK_PERIOD_MS
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_ticks: default_max_ticks(),
            tick_period_ms: default_tick_period(),
        }
    }
}

// ============================================================================
// Reference
// ============================================================================

/// Fixed actuator settings used to draw the simulated master curve.
///
/// Independent of any session's starting settings, so the seeded master
/// is the same whatever the operator starts with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceConfig {
    #[serde(default = "default_master_gas")]
    pub master_gas_power: u8,

    #[serde(default = "default_master_airflow")]
    pub master_airflow: u8,
}

fn default_master_gas() -> u8 {
    defaults::MASTER_GAS_POWER
}

fn default_master_airflow() -> u8 {
    defaults::MASTER_AIRFLOW
}

impl Default for ReferenceConfig {
    fn default() -> Self {
        Self {
            master_gas_power: default_master_gas(),
            master_airflow: default_master_airflow(),
        }
    }
}

// ============================================================================
// Batch
// ============================================================================

/// Linear mass-loss estimate, clamped.
///
/// `loss = clamp(base + per_degree * (final_temp - reference_temp), min, max)`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    #[serde(default = "default_mass_loss_base")]
    pub mass_loss_base: f64,

    #[serde(default = "default_mass_loss_per_degree")]
    pub mass_loss_per_degree: f64,

    #[serde(default = "default_mass_loss_reference_temp")]
    pub mass_loss_reference_temp_c: f64,

    #[serde(default = "default_mass_loss_min")]
    pub mass_loss_min: f64,

    #[serde(default = "default_mass_loss_max")]
    pub mass_loss_max: f64,
}

fn default_mass_loss_base() -> f64 {
    defaults::MASS_LOSS_BASE
}

fn default_mass_loss_per_degree() -> f64 {
    defaults::MASS_LOSS_PER_DEGREE
}

fn default_mass_loss_reference_temp() -> f64 {
    defaults::MASS_LOSS_REFERENCE_TEMP_C
}

fn default_mass_loss_min() -> f64 {
    defaults::MASS_LOSS_MIN
}

fn default_mass_loss_max() -> f64 {
    defaults::MASS_LOSS_MAX
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            mass_loss_base: default_mass_loss_base(),
            mass_loss_per_degree: default_mass_loss_per_degree(),
            mass_loss_reference_temp_c: default_mass_loss_reference_temp(),
            mass_loss_min: default_mass_loss_min(),
            mass_loss_max: default_mass_loss_max(),
        }
    }
}

impl BatchConfig {
    /// Estimated fraction of green weight lost for a given drop temperature.
    pub fn mass_loss_estimate(&self, final_temp: f64) -> f64 {
        let raw = self.mass_loss_base
            + self.mass_loss_per_degree * (final_temp - self.mass_loss_reference_temp_c);
        raw.clamp(self.mass_loss_min, self.mass_loss_max)
    }
}
