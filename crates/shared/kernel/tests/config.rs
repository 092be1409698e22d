use fc_kernel::config::{ConfigError, load_config, load_config_with_env, validate_config};
use fc_kernel::domain::config::{ApiConfig, ApiConfigInner};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn write_config(dir: &TempDir, body: &str) -> PathBuf {
    let path = dir.path().join("faceclaimer.toml");
    fs::write(&path, body).unwrap();
    path
}

fn vars(pairs: &[(&str, &str)]) -> config::Map<String, String> {
    pairs.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())).collect()
}

fn valid_config(images_dir: PathBuf) -> ApiConfig {
    let mut inner = ApiConfigInner::default();
    inner.storage.images_dir = images_dir;
    inner.storage.base_url = "https://img.example.com/faces".into();
    ApiConfig::from(inner)
}

#[test]
fn loads_values_from_toml_file() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
            [server]
            port = 9191

            [storage]
            images_dir = "/srv/images"
            base_url = "https://img.example.com"
            quality = 75

            [logging]
            level = "debug"
            json = true
        "#,
    );

    let cfg: ApiConfig = load_config_with_env(Some(&path), vars(&[])).unwrap();

    assert_eq!(cfg.server.port, 9191);
    assert_eq!(cfg.storage.images_dir, PathBuf::from("/srv/images"));
    assert_eq!(cfg.storage.base_url, "https://img.example.com");
    assert_eq!(cfg.storage.quality, 75);
    assert_eq!(cfg.logging.level, "debug");
    assert!(cfg.logging.json);
}

#[test]
fn environment_overrides_file_values() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
            [server]
            port = 9191

            [storage]
            base_url = "https://file.example.com"
        "#,
    );

    let cfg: ApiConfig = load_config_with_env(
        Some(&path),
        vars(&[
            ("FACECLAIMER__SERVER__PORT", "7000"),
            ("FACECLAIMER__STORAGE__BASE_URL", "https://env.example.com"),
            ("FACECLAIMER__STORAGE__QUALITY", "42"),
        ]),
    )
    .unwrap();

    assert_eq!(cfg.server.port, 7000);
    assert_eq!(cfg.storage.base_url, "https://env.example.com");
    assert_eq!(cfg.storage.quality, 42);
}

#[test]
fn environment_alone_is_enough() {
    let cfg: ApiConfig = load_config_with_env(
        None::<&str>,
        vars(&[("FACECLAIMER__STORAGE__BASE_URL", "http://localhost:8000")]),
    )
    .unwrap();

    assert_eq!(cfg.storage.base_url, "http://localhost:8000");
    assert_eq!(cfg.server.port, 8080);
    assert_eq!(cfg.storage.quality, 90);
}

#[test]
fn missing_explicit_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("absent.toml");

    let err = load_config::<ApiConfig>(Some(&missing)).unwrap_err();
    assert!(matches!(err, ConfigError::Config { .. }), "{err}");
}

#[test]
fn malformed_value_is_an_error() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[storage]\nquality = \"very high\"\n");

    let err = load_config_with_env::<ApiConfig>(Some(&path), vars(&[])).unwrap_err();
    assert!(matches!(err, ConfigError::Config { .. }), "{err}");
}

#[test]
fn validation_accepts_and_absolutizes() {
    let dir = TempDir::new().unwrap();
    let mut cfg = valid_config(dir.path().to_path_buf());

    validate_config(&mut cfg).unwrap();
    assert!(cfg.storage.images_dir.is_absolute());
}

#[test]
fn validation_requires_base_url() {
    let dir = TempDir::new().unwrap();
    let mut cfg = valid_config(dir.path().to_path_buf());
    cfg.storage.base_url = "  ".into();

    let err = validate_config(&mut cfg).unwrap_err();
    assert!(err.to_string().contains("storage.base_url is required"), "{err}");
}

#[test]
fn validation_rejects_non_http_base_url() {
    let dir = TempDir::new().unwrap();
    for bad in ["ftp://img.example.com", "not a url", "file:///srv/images"] {
        let mut cfg = valid_config(dir.path().to_path_buf());
        cfg.storage.base_url = bad.into();

        let err = validate_config(&mut cfg).unwrap_err();
        assert!(matches!(err, ConfigError::Validation { .. }), "{bad}: {err}");
    }
}

#[test]
fn validation_rejects_out_of_range_quality() {
    let dir = TempDir::new().unwrap();
    for quality in [0, 101, 255] {
        let mut cfg = valid_config(dir.path().to_path_buf());
        cfg.storage.quality = quality;

        let err = validate_config(&mut cfg).unwrap_err();
        assert!(err.to_string().contains("storage.quality"), "{err}");
    }
}

#[test]
fn validation_requires_existing_images_dir() {
    let dir = TempDir::new().unwrap();
    let mut cfg = valid_config(dir.path().join("missing"));

    let err = validate_config(&mut cfg).unwrap_err();
    assert!(err.to_string().contains("is not a directory"), "{err}");

    let file = dir.path().join("plain.txt");
    fs::write(&file, b"x").unwrap();
    let mut cfg = valid_config(file);
    assert!(validate_config(&mut cfg).is_err());
}
