//! Integration tests for config loading from fixture files.

use std::fs;
use std::path::Path;

use takeout_tools::organize::TakeoutConfig;

/// Read the sample config file content.
fn read_sample_config() -> String {
    let config_path = Path::new("tests/fixtures/sample_config.toml");
    fs::read_to_string(config_path).expect("Failed to read sample config file")
}

#[test]
fn sample_config_file_exists() {
    let config_path = Path::new("tests/fixtures/sample_config.toml");
    assert!(config_path.exists(), "Sample config file should exist");
}

#[test]
fn sample_config_is_valid_toml() {
    let config_content = read_sample_config();
    let result: Result<toml::Value, _> = toml::from_str(&config_content);
    assert!(result.is_ok(), "Sample config should be valid TOML: {:?}", result.err());
}

#[test]
fn takeout_section_has_expected_structure() {
    let config_content = read_sample_config();
    let value: toml::Value = toml::from_str(&config_content).expect("should parse");

    let takeout = value.get("takeout").expect("should have takeout section");
    for key in ["debug", "dryrun", "skip_invalid", "verbose"] {
        assert!(takeout.get(key).is_some(), "takeout section should have '{key}'");
    }
}

#[test]
fn takeout_config_parses_from_sample() {
    let config = TakeoutConfig::from_toml_str(&read_sample_config()).expect("should parse takeout config");
    assert!(config.skip_invalid);
    assert!(config.verbose);
    assert!(!config.dryrun);
    assert!(!config.debug);
}
