// Unit tests for the config module: defaults, derived limits, parsing,
// `config set` updates and file round trips.

use super::*;

#[test]
fn default_window_config_matches_documented_values() {
    let config = WindowConfig::default();

    assert_eq!(config.page_size, 25);
    assert_eq!(config.trim_threshold, 25);
    assert_eq!(config.guard_band_size, 3);
    assert_eq!(config.debounce_top_ms, 1000);
    assert_eq!(config.debounce_bottom_ms, 3000);
    assert_eq!(config.trim_throttle_ms, 100);
    assert_eq!(config.exhausted_cooldown_ms, 1000);
    assert_eq!(config.scroll_margin_up, 5.0);
    assert!(config.follow_live_edge);
    assert_eq!(config.order, SortOrder::Ascending);
}

#[test]
fn trim_limit_uses_per_edge_factor() {
    let config = WindowConfig {
        trim_threshold: 25,
        trim_factor_top: 2.0,
        trim_factor_bottom: 1.5,
        ..Default::default()
    };

    assert_eq!(config.trim_limit(Edge::Top), 50);
    // 37.5 rounds up.
    assert_eq!(config.trim_limit(Edge::Bottom), 38);
}

#[test]
fn debounce_is_asymmetric() {
    let config = WindowConfig::default();
    assert!(config.debounce(Edge::Top) < config.debounce(Edge::Bottom));
}

#[test]
fn live_edge_follows_sort_order() {
    let mut config = WindowConfig::default();
    assert_eq!(config.live_edge(), Edge::Bottom);

    config.order = SortOrder::Descending;
    assert_eq!(config.live_edge(), Edge::Top);
}

#[test]
fn validate_rejects_zero_page_size() {
    let config = WindowConfig {
        page_size: 0,
        ..Default::default()
    };
    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidValue { field, .. }) if field == "window.page_size"
    ));
}

#[test]
fn validate_rejects_factor_below_one() {
    let config = WindowConfig {
        trim_factor_top: 0.5,
        ..Default::default()
    };
    assert!(config.validate().is_err());
}

#[test]
fn validate_rejects_nan_margin() {
    let config = WindowConfig {
        scroll_margin_down: f64::NAN,
        ..Default::default()
    };
    assert!(config.validate().is_err());
}

#[test]
fn verbosity_defaults_to_normal() {
    let config = AppConfig::default();
    assert_eq!(config.get_verbosity(), VerbosityLevel::Normal);
}

#[test]
fn verbosity_can_be_set() {
    let mut config = AppConfig::default();
    config.set_verbosity(VerbosityLevel::Debug);
    assert_eq!(config.verbosity.as_deref(), Some("debug"));
    assert_eq!(config.get_verbosity(), VerbosityLevel::Debug);
}

#[test]
fn invalid_verbosity_string_falls_back_to_normal() {
    let config = AppConfig {
        verbosity: Some("shouting".to_string()),
        ..Default::default()
    };
    assert_eq!(config.get_verbosity(), VerbosityLevel::Normal);
}

#[test]
fn partial_toml_fills_defaults() {
    let toml_str = r#"
        verbosity = "verbose"

        [window]
        trim_threshold = 40
        order = "descending"
    "#;

    let config: AppConfig = toml::from_str(toml_str).unwrap();

    assert_eq!(config.window.trim_threshold, 40);
    assert_eq!(config.window.order, SortOrder::Descending);
    assert_eq!(config.window.page_size, 25);
    assert_eq!(config.mock.total_messages, 500);
    assert_eq!(config.get_verbosity(), VerbosityLevel::Verbose);
}

#[test]
fn empty_toml_is_default() {
    let config: AppConfig = toml::from_str("").unwrap();
    assert_eq!(config.window, WindowConfig::default());
}

#[test]
fn update_setting_parses_window_values() {
    let mut config = AppConfig::default();

    config.update_setting("window.page_size", "40").unwrap();
    config.update_setting("window.debounce_top_ms", " 250 ").unwrap();
    config.update_setting("window.follow_live_edge", "false").unwrap();
    config.update_setting("window.order", "descending").unwrap();

    assert_eq!(config.window.page_size, 40);
    assert_eq!(config.window.debounce_top_ms, 250);
    assert!(!config.window.follow_live_edge);
    assert_eq!(config.window.order, SortOrder::Descending);
}

#[test]
fn update_setting_parses_mock_values() {
    let mut config = AppConfig::default();

    config.update_setting("mock.latency_ms", "0").unwrap();
    config.update_setting("mock.failure_rate", "0.25").unwrap();
    config.update_setting("mock.seed", "99").unwrap();

    assert_eq!(config.mock.latency_ms, 0);
    assert_eq!(config.mock.failure_rate, 0.25);
    assert_eq!(config.mock.seed, Some(99));
}

#[test]
fn update_setting_rejects_unknown_key() {
    let mut config = AppConfig::default();
    let result = config.update_setting("window.colour", "blue");
    assert!(matches!(result, Err(ConfigError::UnknownConfigKey { key }) if key == "window.colour"));
}

#[test]
fn update_setting_rejects_bad_number() {
    let mut config = AppConfig::default();
    let result = config.update_setting("window.trim_threshold", "lots");
    assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    assert_eq!(config.window.trim_threshold, 25);
}

#[test]
fn update_setting_rejects_failure_rate_out_of_range() {
    let mut config = AppConfig::default();
    assert!(config.update_setting("mock.failure_rate", "1.5").is_err());
}

#[test]
fn update_setting_validates_result() {
    let mut config = AppConfig::default();
    assert!(config.update_setting("window.page_size", "0").is_err());
}

#[test]
fn save_and_load_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("config.toml");

    let mut config = AppConfig::default();
    config.window.trim_threshold = 60;
    config.mock.latency_ms = 5;
    config.set_verbosity(VerbosityLevel::Quiet);
    config.save_to(&path).unwrap();

    let loaded = AppConfig::load_from(&path).unwrap();
    assert_eq!(loaded.window.trim_threshold, 60);
    assert_eq!(loaded.mock.latency_ms, 5);
    assert_eq!(loaded.get_verbosity(), VerbosityLevel::Quiet);
}

#[test]
fn load_from_missing_file_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing.toml");

    assert!(matches!(
        AppConfig::load_from(&path),
        Err(ConfigError::NotFound { .. })
    ));
}

#[test]
fn load_from_invalid_toml_reports_syntax_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "window = [[[").unwrap();

    assert!(matches!(
        AppConfig::load_from(&path),
        Err(ConfigError::InvalidToml(_))
    ));
}

#[test]
fn load_from_rejects_invalid_values() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[window]\npage_size = 0\n").unwrap();

    assert!(matches!(
        AppConfig::load_from(&path),
        Err(ConfigError::InvalidValue { .. })
    ));
}
