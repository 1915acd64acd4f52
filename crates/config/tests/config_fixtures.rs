//! Integration tests for parsing config fixtures.

use lab_finder_config::{
    CURRENT_CONFIG_VERSION, ClientConfig, ClientEnv, LogLevelName, SimilarFallback,
    load_client_config_from_path, parse_client_config_json, parse_client_config_toml,
    to_pretty_json, to_pretty_toml,
};
use lab_finder_shared::{ErrorCode, ErrorKind};
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

fn fixture_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn read_fixture(name: &str) -> Result<String, Box<dyn Error>> {
    Ok(fs::read_to_string(fixture_path(name))?)
}

#[test]
fn json_and_toml_fixtures_agree() -> Result<(), Box<dyn Error>> {
    let json = parse_client_config_json(&read_fixture("client-config.valid.json")?)?;
    let toml = parse_client_config_toml(&read_fixture("client-config.valid.toml")?)?;

    assert_eq!(json, toml);
    assert_eq!(json.version, CURRENT_CONFIG_VERSION);
    assert_eq!(json.api_base_url(), "https://labs.example.com");
    assert_eq!(json.api.timeout_ms, 15_000);
    assert_eq!(json.retry_policy().max_attempts, 2);
    assert_eq!(json.search.default_limit, 30);
    assert_eq!(json.similar_labs.fallback, SimilarFallback::Surface);
    assert_eq!(json.logging.level, LogLevelName::Debug);
    Ok(())
}

#[test]
fn unsupported_version_is_a_validation_error() -> Result<(), Box<dyn Error>> {
    let contents = read_fixture("client-config.invalid-version.json")?;
    let Err(error) = parse_client_config_json(&contents) else {
        return Err("version 2 should be rejected".into());
    };

    assert_eq!(error.kind, ErrorKind::Validation);
    assert_eq!(error.code, ErrorCode::new("config", "unsupported_version"));
    assert_eq!(error.metadata.get("found").map(String::as_str), Some("2"));
    Ok(())
}

#[test]
fn loading_by_path_detects_toml() -> Result<(), Box<dyn Error>> {
    let path = fixture_path("client-config.valid.toml");
    let config = load_client_config_from_path(Some(&path), None, &ClientEnv::default())?;
    assert_eq!(config.search.similar_limit, 8);
    Ok(())
}

#[test]
fn missing_file_has_a_stable_code() {
    let path = fixture_path("does-not-exist.json");
    let code = load_client_config_from_path(Some(&path), None, &ClientEnv::default())
        .err()
        .map(|error| error.code);
    assert_eq!(
        code,
        Some(ErrorCode::new("config", "config_file_not_found"))
    );
}

#[test]
fn pretty_output_parses_back() -> Result<(), Box<dyn Error>> {
    let config = ClientConfig::default();

    let json = to_pretty_json(&config)?;
    let toml = to_pretty_toml(&config)?;

    assert!(json.ends_with('\n'));
    assert_eq!(parse_client_config_json(&json)?.into_inner(), config);
    assert_eq!(parse_client_config_toml(&toml)?.into_inner(), config);
    Ok(())
}
