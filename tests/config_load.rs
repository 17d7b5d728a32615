/// Loading configuration files from disk.
use meshmail::config::{BackendKind, Config, PASSWORD_ENV};
use tempfile::tempdir;

#[tokio::test]
async fn create_default_then_load() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    let path = path.to_str().unwrap();

    Config::create_default(path).await.unwrap();
    let config = Config::load(path).await.unwrap();
    assert_eq!(config.gateway.max_frame_len, 500);
    assert_eq!(config.gateway.startup_delay_ms, 2000);
    assert_eq!(config.meshtastic.baud_rate, 115200);
    assert_eq!(config.email.backend, BackendKind::ImapSmtp);
    assert_eq!(config.email.smtp_port, 587);
}

#[tokio::test]
async fn invalid_frame_len_is_rejected_on_load() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.toml");
    std::fs::write(
        &path,
        "[gateway]\nname = \"gw\"\nmax_frame_len = 0\nstartup_delay_ms = 0\n",
    )
    .unwrap();

    let err = Config::load(path.to_str().unwrap()).await.unwrap_err();
    assert!(err.to_string().contains("max_frame_len"));
}

#[tokio::test]
async fn missing_file_is_an_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nope.toml");
    assert!(Config::load(path.to_str().unwrap()).await.is_err());
}

#[test]
fn password_comes_from_environment() {
    let mut config = Config::default();
    std::env::set_var(PASSWORD_ENV, "app-password");
    config.apply_env_overrides();
    std::env::remove_var(PASSWORD_ENV);
    assert_eq!(config.email.password, "app-password");
}
