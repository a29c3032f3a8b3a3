//! Loading configuration from files on disk.

use farmgate_config::{ConfigError, ConfigLoader, LogFormat};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn toml_file_overrides_defaults() {
    let dir = TempDir::new().unwrap();
    let path = write(
        &dir,
        "farmgate.toml",
        r#"
        [versioning]
        supported = ["v1", "v2"]

        [versioning.deprecated]
        v1 = "2027-06-30"

        [discovery]
        shared_cache_dir = "/var/cache/farmgate"

        [logging]
        format = "pretty"
        "#,
    );

    let config = ConfigLoader::new().with_file(&path).unwrap().load().unwrap();

    assert_eq!(config.versioning.supported, ["v1", "v2"]);
    assert_eq!(config.versioning.deprecated["v1"], "2027-06-30");
    assert_eq!(
        config.discovery.shared_cache_dir,
        Some(PathBuf::from("/var/cache/farmgate"))
    );
    assert_eq!(config.logging.format, LogFormat::Pretty);
    assert_eq!(config.logging.level, "info");
    assert_eq!(config.dispatch.max_payload_bytes, 10 * 1024 * 1024);
}

#[test]
fn json_file_is_parsed_by_extension() {
    let dir = TempDir::new().unwrap();
    let path = write(
        &dir,
        "farmgate.JSON",
        r#"{"dispatch": {"max_payload_bytes": 4096}}"#,
    );

    let config = ConfigLoader::new().with_file(&path).unwrap().load().unwrap();
    assert_eq!(config.dispatch.max_payload_bytes, 4096);
}

#[test]
fn unsupported_extension_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "farmgate.yaml", "dispatch: {}");

    let result = ConfigLoader::new().with_file(&path);
    assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));
}

#[test]
fn deprecated_version_outside_supported_fails_load() {
    let dir = TempDir::new().unwrap();
    let path = write(
        &dir,
        "farmgate.toml",
        "[versioning.deprecated]\nv0 = \"2026-01-01\"\n",
    );

    let err = ConfigLoader::new()
        .with_file(&path)
        .unwrap()
        .load()
        .unwrap_err();
    assert!(err.to_string().contains("versioning.deprecated"));
}

#[test]
fn env_overrides_apply_after_file() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "farmgate.toml", "[discovery]\ncache_ttl_secs = 120\n");

    let config = ConfigLoader::new()
        .with_file(&path)
        .unwrap()
        .with_env_prefix("FARMGATE")
        .with_env_source([("FARMGATE__DISCOVERY__CACHE_TTL_SECS", "30")])
        .load()
        .unwrap();
    assert_eq!(config.discovery.cache_ttl_secs, 30);
}

#[test]
fn dotenv_file_feeds_env_overrides() {
    let dir = TempDir::new().unwrap();
    let path = write(
        &dir,
        ".env",
        "FGDOTENV__LOGGING__LEVEL=error\nFGDOTENV__VERSIONING__SUPPORTED=v1,v2\n",
    );

    let config = ConfigLoader::new()
        .with_dotenv_file(&path)
        .unwrap()
        .with_env_prefix("FGDOTENV")
        .load()
        .unwrap();
    assert_eq!(config.logging.level, "error");
    assert_eq!(config.versioning.supported, ["v1", "v2"]);
}

#[test]
fn missing_dotenv_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let result = ConfigLoader::new().with_dotenv_file(dir.path().join("missing.env"));
    assert!(matches!(result, Err(ConfigError::Dotenv(_))));
}
