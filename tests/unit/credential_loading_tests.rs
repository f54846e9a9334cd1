//! AI key loading: keychain first, then `PULSEVO_AI_API_KEY`, then
//! `GEMINI_API_KEY`.
//!
//! These tests mutate process-global env vars and run serially. The test
//! environment is assumed to have no keychain entry for service `pulsevo`.

use pulsevo::config::{credential_from_env, GlobalConfig, AI_KEY_ENV_VARS};

fn make_config(extra: &str) -> (tempfile::TempDir, GlobalConfig) {
    let temp = tempfile::tempdir().expect("tempdir");
    let toml = format!(
        "data_dir = '{}'\n{extra}",
        temp.path().to_str().expect("utf8 path")
    );
    let config = GlobalConfig::from_toml_str(&toml).expect("config parses");
    (temp, config)
}

fn clear_env() {
    for key in AI_KEY_ENV_VARS {
        std::env::remove_var(key);
    }
}

#[tokio::test]
#[serial_test::serial]
async fn env_var_key_is_loaded() {
    clear_env();
    std::env::set_var("PULSEVO_AI_API_KEY", "primary-key");

    let (_temp, mut config) = make_config("");
    config.load_credentials().await.expect("credentials load");

    assert_eq!(config.ai.api_key.as_deref(), Some("primary-key"));
    clear_env();
}

#[tokio::test]
#[serial_test::serial]
async fn gemini_env_var_is_the_fallback() {
    clear_env();
    std::env::set_var("GEMINI_API_KEY", "  fallback-key  ");

    let (_temp, mut config) = make_config("");
    config.load_credentials().await.expect("credentials load");

    assert_eq!(config.ai.api_key.as_deref(), Some("fallback-key"));
    clear_env();
}

#[test]
#[serial_test::serial]
fn primary_env_var_wins_over_fallback() {
    clear_env();
    std::env::set_var("PULSEVO_AI_API_KEY", "primary");
    std::env::set_var("GEMINI_API_KEY", "fallback");

    assert_eq!(credential_from_env().as_deref(), Some("primary"));
    clear_env();
}

#[test]
#[serial_test::serial]
fn empty_env_var_is_ignored() {
    clear_env();
    std::env::set_var("PULSEVO_AI_API_KEY", "   ");
    std::env::set_var("GEMINI_API_KEY", "fallback");

    assert_eq!(credential_from_env().as_deref(), Some("fallback"));
    clear_env();
}

#[tokio::test]
#[serial_test::serial]
async fn missing_key_is_not_fatal() {
    clear_env();

    let (_temp, mut config) = make_config("");
    config
        .load_credentials()
        .await
        .expect("missing key is tolerated");

    assert!(config.ai.api_key.is_none());
}

#[tokio::test]
#[serial_test::serial]
async fn disabled_ai_skips_lookup() {
    clear_env();
    std::env::set_var("PULSEVO_AI_API_KEY", "unused");

    let (_temp, mut config) = make_config("[ai]\nenabled = false\n");
    config.load_credentials().await.expect("credentials load");

    assert!(config.ai.api_key.is_none());
    clear_env();
}
