//! Settings round trips through the filesystem

use gradientkit_settings::{ConfigError, SamplingMode, Settings, SettingsError, SlicerSetting};
use tempfile::TempDir;

fn customized() -> Settings {
    let mut settings = Settings::new();
    settings.gradient.thresholds = vec![0.0, 4.0, 8.0];
    settings.gradient.flows = vec![180.0, 120.0, 70.0];
    settings.gradient.speeds = Some(vec![60.0, 90.0, 120.0]);
    settings.gradient.sampling = SamplingMode::Subdivide;
    settings.parse.slicer = SlicerSetting::Bambu;
    settings.z_gradient.enabled = true;
    settings.output.e_precision = 4;
    settings
}

#[test]
fn test_toml_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("settings.toml");

    let settings = customized();
    settings.save_to_file(&path).unwrap();
    let loaded = Settings::load_from_file(&path).unwrap();
    assert_eq!(loaded, settings);

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains("[gradient]"));
    assert!(text.contains("slicer = \"bambu\""));
}

#[test]
fn test_json_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("settings.json");

    let settings = customized();
    settings.save_to_file(&path).unwrap();
    assert_eq!(Settings::load_from_file(&path).unwrap(), settings);
}

#[test]
fn test_unsupported_extension() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("settings.yaml");
    std::fs::write(&path, "gradient: {}").unwrap();

    let err = Settings::load_from_file(&path).unwrap_err();
    assert!(matches!(
        err,
        SettingsError::Config(ConfigError::UnsupportedFormat(ref ext)) if ext == "yaml"
    ));
    assert!(Settings::new().save_to_file(&path).is_err());
}

#[test]
fn test_invalid_file_is_rejected_on_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("settings.toml");
    std::fs::write(
        &path,
        "[gradient]\nthresholds = [0.0, 10.0]\nflows = [100.0, 50.0]\nshort_move_length = -2.0\n",
    )
    .unwrap();

    assert!(matches!(
        Settings::load_from_file(&path),
        Err(SettingsError::Gradient(_))
    ));
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = TempDir::new().unwrap();
    let err = Settings::load_from_file(&dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, SettingsError::IoError(_)));
}

#[test]
fn test_malformed_toml() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("settings.toml");
    std::fs::write(&path, "[gradient\nflows = ").unwrap();
    assert!(matches!(
        Settings::load_from_file(&path),
        Err(SettingsError::TomlError(_))
    ));
}
