use planmark_settings::{Config, SettingsError, SettingsPersistence};
use tempfile::TempDir;

fn custom() -> Config {
    let mut config = Config::default();
    config.interaction.save_debounce_ms = 750;
    config.history.max_size = 20;
    config.isolation.fit_padding = 0.8;
    config.zoom.max = 4.0;
    config.project.project_id = 7;
    config
}

#[test]
fn test_toml_save_and_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");

    custom().save_to_file(&path).unwrap();
    let content = std::fs::read_to_string(&path).unwrap();
    assert!(content.contains("[interaction]"));
    assert!(content.contains("save_debounce_ms = 750"));

    let loaded = Config::load_from_file(&path).unwrap();
    assert_eq!(loaded, custom());
}

#[test]
fn test_json_save_and_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");

    custom().save_to_file(&path).unwrap();
    let loaded = Config::load_from_file(&path).unwrap();
    assert_eq!(loaded.project.project_id, 7);
    assert_eq!(loaded.session_config().history.max_size, 20);
}

#[test]
fn test_save_creates_parent_directories() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("planmark").join("nested").join("config.toml");

    Config::default().save_to_file(&path).unwrap();
    assert!(path.exists());
}

#[test]
fn test_invalid_file_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[history]\nmax_size = 0\n").unwrap();

    let err = Config::load_from_file(&path).unwrap_err();
    assert!(matches!(err, SettingsError::Config(_)));

    std::fs::write(&path, "[history\n").unwrap();
    let err = Config::load_from_file(&path).unwrap_err();
    assert!(matches!(err, SettingsError::TomlError(_)));
}

#[test]
fn test_unsupported_extension() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.yaml");
    let err = Config::default().save_to_file(&path).unwrap_err();
    assert_eq!(err.to_string(), "Config error: Unsupported config format: yaml");
    assert!(!path.exists());
}

#[test]
fn test_persistence_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");

    let mut settings = SettingsPersistence::load_or_default(&path).unwrap();
    assert_eq!(settings.config(), &Config::default());
    assert!(!path.exists());

    settings.config_mut().project.project_id = 99;
    settings.save().unwrap();

    let reloaded = SettingsPersistence::load_or_default(&path).unwrap();
    assert_eq!(reloaded.config().project.project_id, 99);
}

#[test]
fn test_missing_file_is_a_load_error() {
    let dir = TempDir::new().unwrap();
    let err = Config::load_from_file(&dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, SettingsError::LoadError(_)));
    assert!(err.to_string().starts_with("Failed to load settings: "));
}

#[test]
fn test_unwritable_target_is_a_save_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::create_dir(&path).unwrap();

    let err = Config::default().save_to_file(&path).unwrap_err();
    assert!(matches!(err, SettingsError::SaveError(_)));
}

#[test]
fn test_blocked_parent_is_a_directory_error() {
    let dir = TempDir::new().unwrap();
    let blocker = dir.path().join("planmark");
    std::fs::write(&blocker, "not a directory").unwrap();

    let err = Config::default()
        .save_to_file(&blocker.join("config.toml"))
        .unwrap_err();
    assert!(matches!(err, SettingsError::ConfigDirectory(_)));
}
