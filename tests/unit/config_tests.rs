use pulsevo::{config::GlobalConfig, AppError};

fn sample_toml(data_dir: &str) -> String {
    format!(
        r#"
data_dir = '{data_dir}'
http_host = "0.0.0.0"
http_port = 9100
max_upload_bytes = 2048

[ai]
enabled = true
model = "gemini-1.5-pro"
endpoint = "http://localhost:8787"
timeout_seconds = 15
"#
    )
}

fn minimal_toml(data_dir: &str) -> String {
    format!("data_dir = '{data_dir}'\n")
}

#[test]
fn parses_full_config() {
    let temp = tempfile::tempdir().expect("tempdir");
    let toml = sample_toml(temp.path().to_str().expect("utf8 path"));

    let config = GlobalConfig::from_toml_str(&toml).expect("config parses");

    assert_eq!(config.http_host, "0.0.0.0");
    assert_eq!(config.http_port, 9100);
    assert_eq!(config.max_upload_bytes, 2048);
    assert_eq!(config.ai.model, "gemini-1.5-pro");
    assert_eq!(config.ai.endpoint, "http://localhost:8787");
    assert_eq!(config.ai.timeout_seconds, Some(15));
    assert!(config.ai.api_key.is_none(), "key never comes from TOML");
}

#[test]
fn minimal_config_uses_defaults() {
    let temp = tempfile::tempdir().expect("tempdir");
    let toml = minimal_toml(temp.path().to_str().expect("utf8 path"));

    let config = GlobalConfig::from_toml_str(&toml).expect("config parses");

    assert_eq!(config.http_host, "127.0.0.1");
    assert_eq!(config.http_port, 8000);
    assert_eq!(config.max_upload_bytes, 10 * 1024 * 1024);
    assert!(config.ai.enabled);
    assert_eq!(config.ai.model, "gemini-1.5-flash");
    assert_eq!(config.ai.timeout_seconds, None);
}

#[test]
fn data_dir_is_created_and_canonicalized() {
    let temp = tempfile::tempdir().expect("tempdir");
    let nested = temp.path().join("state").join("pulsevo");
    let toml = minimal_toml(nested.to_str().expect("utf8 path"));

    let config = GlobalConfig::from_toml_str(&toml).expect("config parses");

    assert!(config.data_dir.is_dir());
    assert!(config.data_dir.is_absolute());
    assert_eq!(config.db_path(), config.data_dir.join("pulsevo.db"));
    assert_eq!(config.uploads_dir(), config.data_dir.join("uploads"));
}

#[test]
fn rejects_zero_upload_limit() {
    let temp = tempfile::tempdir().expect("tempdir");
    let toml = format!(
        "data_dir = '{}'\nmax_upload_bytes = 0\n",
        temp.path().to_str().expect("utf8 path")
    );

    let result = GlobalConfig::from_toml_str(&toml);
    assert!(matches!(result, Err(AppError::Config(msg)) if msg.contains("max_upload_bytes")));
}

#[test]
fn rejects_blank_model_and_zero_timeout() {
    let temp = tempfile::tempdir().expect("tempdir");
    let dir = temp.path().to_str().expect("utf8 path");

    let blank_model = format!("data_dir = '{dir}'\n[ai]\nmodel = \"  \"\n");
    assert!(matches!(
        GlobalConfig::from_toml_str(&blank_model),
        Err(AppError::Config(msg)) if msg.contains("ai.model")
    ));

    let zero_timeout = format!("data_dir = '{dir}'\n[ai]\ntimeout_seconds = 0\n");
    assert!(matches!(
        GlobalConfig::from_toml_str(&zero_timeout),
        Err(AppError::Config(msg)) if msg.contains("timeout_seconds")
    ));
}

#[test]
fn malformed_toml_is_a_config_error() {
    let result = GlobalConfig::from_toml_str("data_dir = [");
    assert!(matches!(result, Err(AppError::Config(_))));
}

#[test]
fn missing_data_dir_is_a_config_error() {
    let result = GlobalConfig::from_toml_str("http_port = 8000\n");
    assert!(matches!(result, Err(AppError::Config(_))));
}

#[test]
fn load_from_path_reads_file() {
    let temp = tempfile::tempdir().expect("tempdir");
    let path = temp.path().join("pulsevo.toml");
    std::fs::write(&path, sample_toml(temp.path().to_str().expect("utf8 path")))
        .expect("write config");

    let config = GlobalConfig::load_from_path(&path).expect("config loads");
    assert_eq!(config.http_port, 9100);
}

#[test]
fn load_from_missing_path_fails() {
    let result = GlobalConfig::load_from_path("/definitely/not/here/pulsevo.toml");
    assert!(matches!(result, Err(AppError::Config(msg)) if msg.contains("failed to read config")));
}
