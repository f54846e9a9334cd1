use axum::http::StatusCode;
use pulsevo::AppError;

#[test]
fn display_prefixes_name_the_failing_layer() {
    assert_eq!(AppError::Config("bad".into()).to_string(), "config: bad");
    assert_eq!(AppError::Db("locked".into()).to_string(), "db: locked");
    assert_eq!(AppError::Format("x".into()).to_string(), "format: x");
    assert_eq!(AppError::Service("down".into()).to_string(), "service: down");
    assert_eq!(AppError::NotFound("task 7".into()).to_string(), "not found: task 7");
    assert_eq!(AppError::Io("disk".into()).to_string(), "io: disk");
}

#[test]
fn schema_error_lists_every_missing_column() {
    let err = AppError::Schema(vec!["assignee".into(), "status".into()]);
    assert_eq!(
        err.to_string(),
        "schema: missing required columns: assignee, status"
    );
    assert_eq!(err.client_message(), "Missing required columns: assignee, status");
}

#[test]
fn client_errors_map_to_400() {
    for err in [
        AppError::Format("Please upload CSV or Excel file.".into()),
        AppError::Schema(vec!["status".into()]),
        AppError::EmptyQuery,
    ] {
        assert!(err.is_client_error(), "{err} is a client error");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }
}

#[test]
fn oversized_upload_is_a_413_naming_the_limit() {
    let err = AppError::PayloadTooLarge(1024);
    assert!(err.is_client_error());
    assert_eq!(err.status_code(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(
        err.client_message(),
        "File is too large. The upload limit is 1024 bytes."
    );
    assert_eq!(
        err.to_string(),
        "payload too large: upload exceeds the 1024-byte limit"
    );
}

#[test]
fn infrastructure_errors_map_to_500() {
    for err in [
        AppError::Config("x".into()),
        AppError::Db("x".into()),
        AppError::Io("x".into()),
    ] {
        assert!(!err.is_client_error());
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}

#[test]
fn other_errors_have_dedicated_codes() {
    assert_eq!(AppError::NotFound("x".into()).status_code(), StatusCode::NOT_FOUND);
    assert_eq!(AppError::Service("x".into()).status_code(), StatusCode::BAD_GATEWAY);
}

#[test]
fn format_message_is_shown_bare() {
    let err = AppError::Format("Please upload CSV or Excel file.".into());
    assert_eq!(err.client_message(), "Please upload CSV or Excel file.");
    assert_eq!(AppError::EmptyQuery.client_message(), "Please provide a question.");
}

#[test]
fn toml_errors_convert_to_config() {
    let parse: Result<toml::Value, _> = toml::from_str("= nope");
    let err: AppError = parse.expect_err("invalid toml").into();
    assert!(matches!(err, AppError::Config(_)));
}
