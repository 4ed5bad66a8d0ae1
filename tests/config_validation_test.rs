//! Configuration validation tests
//!
//! Tests that verify configuration defaults and structure.

use bees_exporter::config::{BeesConfig, Config, LoggingConfig, ServerConfig};
use std::net::{IpAddr, Ipv6Addr};
use std::path::PathBuf;

#[test]
fn test_default_server_config() {
    // Given: ServerConfig with default values
    let config = ServerConfig::default();

    // Then: Listen on every address on port 8080
    assert_eq!(config.addr, IpAddr::V6(Ipv6Addr::UNSPECIFIED));
    assert_eq!(config.port, 8080);
    assert_eq!(config.socket_addr().to_string(), "[::]:8080");
}

#[test]
fn test_default_work_dir() {
    let config = BeesConfig::default();
    assert_eq!(config.work_dir, PathBuf::from("/run/bees"));
}

#[test]
fn test_default_log_level() {
    let config = LoggingConfig::default();
    assert_eq!(config.level, "info");
}

#[test]
fn test_missing_config_file_uses_defaults() {
    // Given: A config path that does not exist
    // When: Loading
    let config = Config::load("config/does-not-exist.toml").expect("Failed to load defaults");

    // Then: Every section falls back to its defaults
    assert_eq!(config.server.port, 8080);
    assert_eq!(config.bees.work_dir, PathBuf::from("/run/bees"));
}

#[test]
fn test_config_file_overrides_defaults() {
    // Given: A config file with custom values
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("custom.toml");
    std::fs::write(
        &path,
        "[bees]\nwork_dir = \"/srv/bees\"\n\n[server]\naddr = \"127.0.0.1\"\nport = 9180\n",
    )
    .unwrap();

    // When: Loading it
    let config = Config::load(path.to_str().unwrap()).expect("Failed to load config");

    // Then: File values win, missing sections keep defaults
    assert_eq!(config.bees.work_dir, PathBuf::from("/srv/bees"));
    assert_eq!(config.server.addr.to_string(), "127.0.0.1");
    assert_eq!(config.server.port, 9180);
    assert_eq!(config.logging.level, "info");
}

#[test]
fn test_invalid_address_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.toml");
    std::fs::write(&path, "[server]\naddr = \"not-an-ip\"\n").unwrap();

    assert!(Config::load(path.to_str().unwrap()).is_err());
}
