//! Integration tests for configuration loading.

use std::path::PathBuf;

use alloy_primitives::Address;
use kinora::{Config, ConfigError};

fn temp_config_path(name: &str) -> PathBuf {
    let id = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("kinora_{name}_{id}.toml"))
}

#[test]
fn test_full_config_file() {
    let path = temp_config_path("full");
    std::fs::write(
        &path,
        r#"
[indexer]
contract_address = "0x3333333333333333333333333333333333333333"
start_block = 1200
channel_buffer = 64
max_read_retries = 5

[metadata]
enabled = false
directory = "/var/lib/kinora/metadata"
channel_buffer = 16

[logging]
level = "kinora_indexer=debug"
json = true
"#,
    )
    .unwrap();

    let config = Config::load(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(config.indexer.contract_address, Address::repeat_byte(0x33));
    assert!(!config.metadata.enabled);
    assert!(config.logging.json);

    let listener = config.listener_config();
    assert_eq!(listener.channel_buffer, 64);
    let pipeline = config.pipeline_config();
    assert_eq!(pipeline.start_block, 1200);
    assert_eq!(pipeline.max_read_retries, 5);
}

#[test]
fn test_bad_addresses_are_rejected() {
    for address in ["0x1234", "not-an-address", "0x33333333333333333333333333333333333333zz"] {
        let source = format!("[indexer]\ncontract_address = \"{address}\"\n");
        assert!(
            matches!(Config::from_toml_str(&source), Err(ConfigError::Parse(_))),
            "{address} should be rejected"
        );
    }

    let zero = "[indexer]\ncontract_address = \"0x0000000000000000000000000000000000000000\"\n";
    assert!(matches!(
        Config::from_toml_str(zero),
        Err(ConfigError::Invalid { field: "indexer.contract_address", .. })
    ));
}

#[test]
fn test_missing_contract_address_is_rejected() {
    assert!(Config::from_toml_str("[indexer]\nstart_block = 1\n").is_err());
    assert!(Config::from_toml_str("").is_err());
}

#[test]
fn test_missing_file_is_reported_with_path() {
    let path = temp_config_path("missing");
    match Config::load(&path) {
        Err(ConfigError::Io { path: reported, .. }) => assert_eq!(reported, path),
        other => panic!("expected io error, got {other:?}"),
    }
}
