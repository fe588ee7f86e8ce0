// tests/config_loading.rs
//! Layered configuration: TOML files, environment overrides and export

use emg_assist::config::{ConfigError, ConfigLoader};
use emg_assist::SystemConfig;
use std::io::Write;
use tempfile::NamedTempFile;

fn toml_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_partial_file_keeps_other_defaults() {
    let file = toml_file(
        r#"
[assist]
notch_freq_hz = 50.0
low_activation_hold_s = 3.0

[actuator]
max_retraction_mm = 15.0
"#,
    );

    let config = ConfigLoader::with_paths(vec![file.path().to_path_buf()])
        .with_env_prefix("EMG_ASSIST_IT_PARTIAL")
        .load()
        .unwrap();

    assert_eq!(config.assist.notch_freq_hz, 50.0);
    assert_eq!(config.assist.low_activation_hold_s, 3.0);
    assert_eq!(config.actuator.max_retraction_mm, 15.0);
    let defaults = SystemConfig::default();
    assert_eq!(config.assist.bandpass_low_hz, defaults.assist.bandpass_low_hz);
    assert_eq!(config.acquisition, defaults.acquisition);
}

#[test]
fn test_later_files_override_earlier_ones() {
    let base = toml_file("[assist]\ntarget_activation = 0.6\nassist_kp = 0.5\n");
    let site = toml_file("[assist]\nassist_kp = 0.9\n");

    let config = ConfigLoader::with_paths(vec![base.path().to_path_buf(), site.path().to_path_buf()])
        .with_env_prefix("EMG_ASSIST_IT_LAYERS")
        .load()
        .unwrap();

    assert_eq!(config.assist.target_activation, 0.6);
    assert_eq!(config.assist.assist_kp, 0.9);
}

#[test]
fn test_environment_overrides_file() {
    let file = toml_file("[assist]\nnotch_freq_hz = 60.0\n");
    std::env::set_var("EMG_ASSIST_IT_ENV__ASSIST__NOTCH_FREQ_HZ", "50");

    let config = ConfigLoader::with_paths(vec![file.path().to_path_buf()])
        .with_env_prefix("EMG_ASSIST_IT_ENV")
        .load()
        .unwrap();
    std::env::remove_var("EMG_ASSIST_IT_ENV__ASSIST__NOTCH_FREQ_HZ");

    assert_eq!(config.assist.notch_freq_hz, 50.0);
}

#[test]
fn test_inconsistent_file_is_rejected() {
    let file = toml_file("[assist]\nbandpass_low_hz = 300.0\nbandpass_high_hz = 200.0\n");

    let err = ConfigLoader::load_file(file.path()).unwrap_err();
    match err {
        ConfigError::Validation(errors) => {
            assert!(errors.iter().any(|e| e.contains("must be above low cutoff")));
        }
        other => panic!("expected validation error, got {other}"),
    }
}

#[test]
fn test_unparseable_file_is_parse_error() {
    let file = toml_file("[assist\nnotch_freq_hz = ");
    assert!(matches!(
        ConfigLoader::load_file(file.path()),
        Err(ConfigError::ParseError(_))
    ));
}

#[test]
fn test_export_then_load() {
    let mut config = SystemConfig::default();
    config.assist.notch_freq_hz = 50.0;
    config.acquisition.analysis_window_s = 2.0;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("assist.toml");
    ConfigLoader::export_config(&config, &path).unwrap();

    let loaded = ConfigLoader::load_file(&path).unwrap();
    assert_eq!(loaded, config);
    assert_eq!(loaded.analysis_window_samples(), 2000);
}
