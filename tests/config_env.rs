// tests/config_env.rs
//
// Env-driven settings. Serialized because the process environment is global.

use serial_test::serial;

use ticker_sentiment_pipeline::config::{
    ClassifierBackend, Settings, ENV_API_PORT, ENV_CLASSIFIER_BACKEND, ENV_CLASSIFIER_URL,
    ENV_CORS_ALLOWED_ORIGINS, ENV_DEFAULT_WINDOW_HOURS, ENV_MAX_TEXT_LENGTH, ENV_MAX_UPLOAD_ROWS,
};
use ticker_sentiment_pipeline::ConfigurationError;

fn clear_env() {
    for var in [
        ENV_API_PORT,
        ENV_DEFAULT_WINDOW_HOURS,
        ENV_MAX_TEXT_LENGTH,
        ENV_MAX_UPLOAD_ROWS,
        ENV_CLASSIFIER_BACKEND,
        ENV_CLASSIFIER_URL,
        ENV_CORS_ALLOWED_ORIGINS,
    ] {
        std::env::remove_var(var);
    }
}

#[test]
#[serial]
fn defaults_apply_when_nothing_is_set() {
    clear_env();
    let s = Settings::from_env().expect("defaults are valid");
    assert_eq!(s.api_port, 8000);
    assert_eq!(s.default_window_hours, 24);
    assert_eq!(s.max_text_length, 5000);
    assert_eq!(s.max_upload_rows, 10_000);
    assert_eq!(s.classifier_backend, ClassifierBackend::Mock);
    assert_eq!(s.classifier_url, None);
}

#[test]
#[serial]
fn env_values_override_defaults() {
    clear_env();
    std::env::set_var(ENV_API_PORT, "9100");
    std::env::set_var(ENV_DEFAULT_WINDOW_HOURS, "6");
    std::env::set_var(ENV_MAX_TEXT_LENGTH, "280");
    std::env::set_var(ENV_CORS_ALLOWED_ORIGINS, "http://a.test, http://b.test");

    let s = Settings::from_env().expect("valid overrides");
    assert_eq!(s.api_port, 9100);
    assert_eq!(s.default_window_hours, 6);
    assert_eq!(s.max_text_length, 280);
    assert_eq!(
        s.cors_allowed_origins,
        vec!["http://a.test".to_string(), "http://b.test".into()]
    );
    clear_env();
}

#[test]
#[serial]
fn unparseable_port_is_a_configuration_error() {
    clear_env();
    std::env::set_var(ENV_API_PORT, "not-a-port");
    let err = Settings::from_env().unwrap_err();
    assert!(matches!(
        err,
        ConfigurationError::InvalidEnv { var, .. } if var == ENV_API_PORT
    ));
    clear_env();
}

#[test]
#[serial]
fn zero_window_is_rejected() {
    clear_env();
    std::env::set_var(ENV_DEFAULT_WINDOW_HOURS, "0");
    let err = Settings::from_env().unwrap_err();
    assert!(matches!(
        err,
        ConfigurationError::InvalidEnv { var, .. } if var == ENV_DEFAULT_WINDOW_HOURS
    ));
    clear_env();
}

#[test]
#[serial]
fn remote_backend_requires_a_url() {
    clear_env();
    std::env::set_var(ENV_CLASSIFIER_BACKEND, "remote");
    let err = Settings::from_env().unwrap_err();
    assert!(matches!(
        err,
        ConfigurationError::InvalidEnv { var, .. } if var == ENV_CLASSIFIER_URL
    ));

    std::env::set_var(ENV_CLASSIFIER_URL, "http://localhost:9000");
    let s = Settings::from_env().expect("remote + url is valid");
    assert_eq!(s.classifier_backend, ClassifierBackend::Remote);
    assert_eq!(s.classifier_url.as_deref(), Some("http://localhost:9000"));
    clear_env();
}

#[test]
#[serial]
fn unknown_backend_is_rejected() {
    clear_env();
    std::env::set_var(ENV_CLASSIFIER_BACKEND, "quantum");
    let err = Settings::from_env().unwrap_err();
    assert!(matches!(
        err,
        ConfigurationError::InvalidEnv { var, .. } if var == ENV_CLASSIFIER_BACKEND
    ));
    clear_env();
}
