//! Config save/load roundtrip integration tests.

use safeexec::{ExecConfig, SafeCommandOptions};
use std::time::Duration;
use tempfile::TempDir;

#[test]
fn test_config_save_and_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json5");

    let config = ExecConfig::default();
    config.save(&path).unwrap();

    let loaded = ExecConfig::load(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_config_modify_and_reload() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json5");

    let config = ExecConfig {
        defaults: SafeCommandOptions::new()
            .with_timeout(Duration::from_millis(2_500))
            .with_cwd(dir.path()),
        scrub_env: true,
        blocked_env: vec!["INTERNAL_TOKEN".to_string()],
    };
    config.save(&path).unwrap();

    let loaded = ExecConfig::load(&path).unwrap();
    assert_eq!(loaded.defaults.timeout_ms, Some(2_500));
    assert_eq!(loaded.defaults.cwd.as_deref(), Some(dir.path()));
    assert_eq!(loaded.blocked_env, vec!["INTERNAL_TOKEN".to_string()]);
}

#[test]
fn test_hand_written_json5_loads() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json5");
    std::fs::write(
        &path,
        "// local overrides\n{ defaults: { max_buffer: 65536, }, scrub_env: false, }\n",
    )
    .unwrap();

    let loaded = ExecConfig::load(&path).unwrap();
    assert_eq!(loaded.defaults.max_buffer, Some(65_536));
}

#[test]
fn test_invalid_config_rejected_on_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json5");
    std::fs::write(&path, "{ defaults: { max_buffer: 0 } }").unwrap();

    assert!(ExecConfig::load(&path).is_err());
}
