//! Config validation: unknown-key detection with Levenshtein suggestions
//! and plausibility checks.
//!
//! Two-pass parse approach: first deserialize raw TOML into `toml::Value`,
//! walk the key tree, compare against known field names, and emit warnings
//! with "did you mean?" suggestions. Then proceed with normal serde
//! deserialization. Warnings never break existing configs.

use std::collections::HashSet;

/// A non-fatal config warning (typo, suspicious value).
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ref s) = self.suggestion {
            write!(f, "; did you mean '{s}'?")?;
        }
        Ok(())
    }
}

// ============================================================================
// Known Config Keys
// ============================================================================

/// Returns the complete set of valid dotted key paths for `RoastConfig`.
///
/// Maintained by hand to match roast_config.rs.
pub fn known_config_keys() -> HashSet<&'static str> {
    let keys: &[&str] = &[
        // [thermal]
        "thermal",
        "thermal.k_gas",
        "thermal.k_air",
        "thermal.k_loss",
        "thermal.charge_temp_c",
        // [telemetry]
        "telemetry",
        "telemetry.ror_window_size",
        "telemetry.tick_seconds",
        // [milestones]
        "milestones",
        "milestones.dry_end_temp_c",
        // [advisory]
        "advisory",
        "advisory.critical_delta_c",
        "advisory.tendency_delta_c",
        "advisory.critical_hot_intensity",
        "advisory.critical_cold_intensity",
        "advisory.tendency_hot_intensity",
        "advisory.tendency_cold_intensity",
        "advisory.sync_interval_ticks",
        "advisory.timeout_ms",
        // [session]
        "session",
        "session.max_ticks",
        "session.tick_period_ms",
        // [reference]
        "reference",
        "reference.master_gas_power",
        "reference.master_airflow",
        // [batch]
        "batch",
        "batch.mass_loss_base",
        "batch.mass_loss_per_degree",
        "batch.mass_loss_reference_temp_c",
        "batch.mass_loss_min",
        "batch.mass_loss_max",
    ];
    keys.iter().copied().collect()
}

// ============================================================================
// TOML Key Walking
// ============================================================================

/// Recursively walks a `toml::Value` tree and collects all dotted key paths.
///
/// For example, a table `{ a = { b = 1, c = 2 } }` yields:
/// `["a", "a.b", "a.c"]`
pub fn walk_toml_keys(value: &toml::Value, prefix: &str) -> Vec<String> {
    let mut keys = Vec::new();
    if let Some(table) = value.as_table() {
        for (k, v) in table {
            let path = if prefix.is_empty() {
                k.clone()
            } else {
                format!("{prefix}.{k}")
            };
            keys.push(path.clone());
            if v.is_table() {
                keys.extend(walk_toml_keys(v, &path));
            }
        }
    }
    keys
}

// ============================================================================
// Levenshtein Distance
// ============================================================================

fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Closest known key within edit distance 3, if any.
pub fn suggest_correction(unknown: &str, known: &HashSet<&str>) -> Option<String> {
    known
        .iter()
        .map(|&k| (k, levenshtein(unknown, k)))
        .filter(|&(_, dist)| dist <= 3)
        .min_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(b.0)))
        .map(|(k, _)| k.to_string())
}

/// Emit one warning per key in `raw_toml` that `RoastConfig` does not know.
pub fn validate_unknown_keys(raw_toml: &str) -> Vec<ValidationWarning> {
    let value: toml::Value = match raw_toml.parse() {
        Ok(v) => v,
        Err(_) => return Vec::new(), // parse errors are handled by serde later
    };

    let known = known_config_keys();
    walk_toml_keys(&value, "")
        .into_iter()
        .filter(|key| !known.contains(key.as_str()))
        .map(|key| {
            let suggestion = suggest_correction(&key, &known);
            ValidationWarning {
                message: format!("Unknown config key '{key}'"),
                field: key,
                suggestion,
            }
        })
        .collect()
}

// ============================================================================
// Plausibility Checks
// ============================================================================

/// Flag values that parse and validate but would draw a strange curve.
///
/// None of these stop startup.
pub fn plausibility_warnings(config: &super::RoastConfig) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    let charge = config.thermal.charge_temp_c;
    if !(0.0..=60.0).contains(&charge) {
        warnings.push(ValidationWarning {
            field: "thermal.charge_temp_c".to_string(),
            message: format!(
                "thermal.charge_temp_c = {charge:.1} is outside the usual 0-60 C range"
            ),
            suggestion: None,
        });
    }

    let dry_end = config.milestones.dry_end_temp_c;
    if !(100.0..=200.0).contains(&dry_end) {
        warnings.push(ValidationWarning {
            field: "milestones.dry_end_temp_c".to_string(),
            message: format!(
                "milestones.dry_end_temp_c = {dry_end:.1} is outside the usual 100-200 C range"
            ),
            suggestion: None,
        });
    }

    // Full gas, no air: if even this cannot reach dry end the milestone never fires.
    if config.thermal.k_loss > 0.0 {
        let ceiling = (100.0 * config.thermal.k_gas / config.thermal.k_loss).sqrt();
        if ceiling < dry_end {
            warnings.push(ValidationWarning {
                field: "thermal".to_string(),
                message: format!(
                    "thermal model tops out at {ceiling:.1} C, below dry end ({dry_end:.1} C)"
                ),
                suggestion: None,
            });
        }
    }

    if config.advisory.sync_interval_ticks > config.session.max_ticks {
        warnings.push(ValidationWarning {
            field: "advisory.sync_interval_ticks".to_string(),
            message: "sync interval exceeds session.max_ticks; no advisory will ever run"
                .to_string(),
            suggestion: None,
        });
    }

    warnings
}
