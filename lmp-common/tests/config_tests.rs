//! Configuration and root folder resolution tests
//!
//! Tests that manipulate LMP_ROOT_FOLDER or LMP_CONFIG are marked #[serial]
//! so they never run in parallel with each other.

use lmp_common::config::{
    CompiledDefaults, RootFolderInitializer, RootFolderResolver, TomlConfig, CONFIG_FILE_ENV,
    ROOT_FOLDER_ENV,
};
use lmp_common::db::init::init_database;
use serial_test::serial;
use std::env;
use std::path::PathBuf;

#[test]
fn test_compiled_defaults_for_current_platform() {
    let defaults = CompiledDefaults::for_current_platform();

    assert!(!defaults.root_folder.as_os_str().is_empty());
    assert!(defaults.root_folder.to_string_lossy().contains("lmp"));
}

#[test]
fn test_toml_config_full() {
    let config = TomlConfig::from_toml_str(
        r#"
        root_folder = "/srv/lmp"
        database_file = "progress.db"

        [logging]
        level = "debug"
        file = "/var/log/lmp.log"
        "#,
    )
    .unwrap();

    assert_eq!(config.root_folder, Some(PathBuf::from("/srv/lmp")));
    assert_eq!(config.database_file, Some(PathBuf::from("progress.db")));
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.logging.file, Some(PathBuf::from("/var/log/lmp.log")));
}

#[test]
fn test_toml_config_empty_uses_defaults() {
    let config = TomlConfig::from_toml_str("").unwrap();

    assert!(config.root_folder.is_none());
    assert!(config.database_file.is_none());
    assert_eq!(config.logging.level, "info");
}

#[test]
fn test_toml_config_invalid() {
    let result = TomlConfig::from_toml_str("root_folder = [1, 2");
    assert!(matches!(result, Err(lmp_common::Error::Config(_))));
}

#[test]
#[serial]
fn test_resolver_cli_beats_env() {
    env::set_var(ROOT_FOLDER_ENV, "/tmp/lmp-env-root");

    let resolver = RootFolderResolver::new("test-module")
        .with_cli_override(Some(PathBuf::from("/tmp/lmp-cli-root")));
    assert_eq!(resolver.resolve(), PathBuf::from("/tmp/lmp-cli-root"));

    env::remove_var(ROOT_FOLDER_ENV);
}

#[test]
#[serial]
fn test_resolver_env_beats_toml() {
    env::set_var(ROOT_FOLDER_ENV, "/tmp/lmp-env-root");

    let toml = TomlConfig::from_toml_str(r#"root_folder = "/tmp/lmp-toml-root""#).unwrap();
    let resolver = RootFolderResolver::new("test-module").with_toml_config(toml);
    assert_eq!(resolver.resolve(), PathBuf::from("/tmp/lmp-env-root"));

    env::remove_var(ROOT_FOLDER_ENV);
}

#[test]
#[serial]
fn test_resolver_toml_beats_default() {
    env::remove_var(ROOT_FOLDER_ENV);

    let toml = TomlConfig::from_toml_str(r#"root_folder = "/tmp/lmp-toml-root""#).unwrap();
    let resolver = RootFolderResolver::new("test-module").with_toml_config(toml);
    assert_eq!(resolver.resolve(), PathBuf::from("/tmp/lmp-toml-root"));
}

#[test]
#[serial]
fn test_resolver_falls_back_to_default() {
    env::remove_var(ROOT_FOLDER_ENV);

    let resolver = RootFolderResolver::new("test-module").with_toml_config(TomlConfig::default());
    assert_eq!(resolver.resolve(), CompiledDefaults::for_current_platform().root_folder);
}

#[test]
#[serial]
fn test_resolver_reads_config_file_from_env() {
    env::remove_var(ROOT_FOLDER_ENV);

    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("config.toml");
    std::fs::write(&config_path, "root_folder = \"/tmp/lmp-file-root\"\n").unwrap();
    env::set_var(CONFIG_FILE_ENV, &config_path);

    let resolver = RootFolderResolver::new("test-module");
    assert_eq!(resolver.resolve(), PathBuf::from("/tmp/lmp-file-root"));

    env::remove_var(CONFIG_FILE_ENV);
}

#[test]
#[serial]
fn test_resolver_ignores_broken_config_file() {
    env::remove_var(ROOT_FOLDER_ENV);

    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("config.toml");
    std::fs::write(&config_path, "this is not toml = = =").unwrap();
    env::set_var(CONFIG_FILE_ENV, &config_path);

    // Broken file is skipped, resolution continues to the compiled default
    let resolver = RootFolderResolver::new("test-module");
    assert_eq!(resolver.resolve(), CompiledDefaults::for_current_platform().root_folder);

    env::remove_var(CONFIG_FILE_ENV);
}

#[tokio::test]
async fn test_initializer_creates_folder_and_database() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("nested").join("lmp");

    let initializer = RootFolderInitializer::new(root.clone());
    initializer.ensure_directory_exists().unwrap();
    assert!(root.exists());

    let db_path = initializer.database_path();
    let pool = init_database(&db_path).await.unwrap();
    assert!(db_path.exists());

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM learners")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 0);

    // Reopening an existing database succeeds
    drop(pool);
    let reopened = init_database(&db_path).await;
    assert!(reopened.is_ok(), "Failed to reopen database: {:?}", reopened.err());
}
