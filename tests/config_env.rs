// tests/config_env.rs
//
// DetectorConfig::from_env resolution. These tests mutate process env,
// so they run serially.

use std::io::Write as _;

use insult_detector::config::{ENV_LEARNING_RATE, ENV_CONFIG_PATH};
use insult_detector::DetectorConfig;
use serial_test::serial;

fn write_temp(name: &str, body: &str) -> std::path::PathBuf {
    let path = std::env::temp_dir().join(format!("insult_cfg_{}_{name}.toml", std::process::id()));
    let mut f = std::fs::File::create(&path).expect("create temp config");
    f.write_all(body.as_bytes()).expect("write temp config");
    path
}

fn clear_env() {
    std::env::remove_var(ENV_CONFIG_PATH);
    std::env::remove_var(ENV_LEARNING_RATE);
}

#[test]
#[serial]
fn explicit_path_is_loaded() {
    clear_env();
    let path = write_temp("explicit", "[window]\ninsult_span = 5\n");
    std::env::set_var(ENV_CONFIG_PATH, &path);

    let cfg = DetectorConfig::from_env().expect("config loads");
    assert_eq!(cfg.window.insult_span, 5);
    assert_eq!(cfg.window.address_span, 3);

    clear_env();
    let _ = std::fs::remove_file(path);
}

#[test]
#[serial]
fn missing_explicit_path_is_an_error() {
    clear_env();
    std::env::set_var(ENV_CONFIG_PATH, "/definitely/not/here/detector.toml");
    assert!(DetectorConfig::from_env().is_err());
    clear_env();
}

#[test]
#[serial]
fn learning_rate_env_overrides_file() {
    clear_env();
    let path = write_temp("rate", "[classifier]\nlearning_rate = 0.001\n");
    std::env::set_var(ENV_CONFIG_PATH, &path);
    std::env::set_var(ENV_LEARNING_RATE, "0.25");

    let cfg = DetectorConfig::from_env().unwrap();
    assert_eq!(cfg.classifier.learning_rate, 0.25);

    // garbage is ignored, the file value stands
    std::env::set_var(ENV_LEARNING_RATE, "lots");
    let cfg = DetectorConfig::from_env().unwrap();
    assert_eq!(cfg.classifier.learning_rate, 0.001);

    clear_env();
    let _ = std::fs::remove_file(path);
}

#[test]
#[serial]
fn invalid_config_file_is_reported() {
    clear_env();
    let path = write_temp("invalid", "[features]\nngram_min = 3\nngram_max = 1\n");
    std::env::set_var(ENV_CONFIG_PATH, &path);

    let err = DetectorConfig::from_env().unwrap_err();
    assert!(format!("{err:#}").contains("invalid detector config"));

    clear_env();
    let _ = std::fs::remove_file(path);
}
