//! Config Validation Tests
//!
//! Exercises typo detection, rule validation and file loading for
//! `RoastConfig` independently from the session loop.

use std::io::Write;

use roast_control::config::validation::{
    known_config_keys, plausibility_warnings, suggest_correction, validate_unknown_keys,
};
use roast_control::config::{ConfigError, RoastConfig};

// ============================================================================
// Typo Detection
// ============================================================================

#[test]
fn typo_in_advisory_section_warns_with_suggestion() {
    let toml_str = r#"
[advisory]
critcal_delta_c = 2.5
"#;
    let warnings = validate_unknown_keys(toml_str);
    assert_eq!(warnings.len(), 1, "Expected exactly 1 warning");
    assert_eq!(warnings[0].field, "advisory.critcal_delta_c");
    assert_eq!(
        warnings[0].suggestion.as_deref(),
        Some("advisory.critical_delta_c")
    );
}

#[test]
fn unknown_section_warns_without_close_match() {
    let warnings = validate_unknown_keys("[burner_profile]\nflame = 3\n");
    assert_eq!(warnings.len(), 2);
    for warning in &warnings {
        assert!(warning.field.starts_with("burner_profile"));
        assert!(warning.suggestion.is_none());
    }
}

#[test]
fn suggestion_requires_small_edit_distance() {
    let known = known_config_keys();
    assert_eq!(
        suggest_correction("session.max_tick", &known).as_deref(),
        Some("session.max_ticks")
    );
    assert!(suggest_correction("completely.unrelated", &known).is_none());
}

#[test]
fn unknown_keys_do_not_block_loading() {
    let config = RoastConfig::from_toml_str(
        r#"
[thermal]
k_gass = 0.02

[session]
max_ticks = 600
"#,
    )
    .expect("typos are warnings, not errors");
    assert_eq!(config.session.max_ticks, 600);
    assert!((config.thermal.k_gas - 0.016).abs() < f64::EPSILON);
}

// ============================================================================
// Rule Validation
// ============================================================================

#[test]
fn inverted_advisory_bands_rejected() {
    let result = RoastConfig::from_toml_str(
        r#"
[advisory]
critical_delta_c = 0.4
tendency_delta_c = 0.5
"#,
    );
    match result {
        Err(ConfigError::Validation(errors)) => {
            assert_eq!(errors.len(), 1);
            assert!(errors[0].contains("critical_delta_c"));
        }
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[test]
fn nan_and_inf_values_rejected() {
    let result = RoastConfig::from_toml_str(
        r#"
[telemetry]
tick_seconds = nan

[milestones]
dry_end_temp_c = nan

[advisory]
critical_delta_c = inf

[batch]
mass_loss_base = -inf
"#,
    );
    match result {
        Err(ConfigError::Validation(errors)) => {
            for field in [
                "telemetry.tick_seconds",
                "milestones.dry_end_temp_c",
                "advisory.critical_delta_c",
                "batch.mass_loss_base",
            ] {
                let found = errors
                    .iter()
                    .any(|e| e.starts_with(field) && e.contains("finite"));
                assert!(found, "no finiteness error for {field}: {errors:?}");
            }
        }
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[test]
fn zero_tick_period_rejected() {
    let mut config = RoastConfig::default();
    config.session.tick_period_ms = 0;
    assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
}

#[test]
fn malformed_toml_is_parse_error() {
    let result = RoastConfig::from_toml_str("[session\nmax_ticks = 5");
    assert!(matches!(result, Err(ConfigError::Parse(..))));
}

#[test]
fn unreachable_dry_end_is_flagged() {
    let mut config = RoastConfig::default();
    config.milestones.dry_end_temp_c = 199.0;
    config.thermal.k_gas = 0.004;
    let warnings = plausibility_warnings(&config);
    assert!(warnings.iter().any(|w| w.field == "thermal"));
}

// ============================================================================
// File Loading
// ============================================================================

#[test]
fn load_from_file_reports_path_on_parse_error() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    writeln!(file, "[advisory]\nsync_interval_ticks = \"three\"").expect("write");

    match RoastConfig::load_from_file(file.path()) {
        Err(ConfigError::Parse(path, _)) => assert_eq!(path, file.path()),
        other => panic!("expected parse error, got {other:?}"),
    }
}

#[test]
fn load_from_file_roundtrips_defaults() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    let toml_str = RoastConfig::default().to_toml().expect("serialize");
    file.write_all(toml_str.as_bytes()).expect("write");

    let loaded = RoastConfig::load_from_file(file.path()).expect("load");
    assert_eq!(loaded.session.max_ticks, 720);
    assert_eq!(loaded.advisory.sync_interval_ticks, 3);
    assert_eq!(loaded.telemetry.ror_window_size, 30);
}
