use axum::http::header::{CONTENT_TYPE, WWW_AUTHENTICATE};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use geofeed_core::error_builder::{
    internal_server_error, not_found, service_unavailable, unauthorized, ErrorBuilder,
};
use http_body_util::BodyExt;

#[test]
fn test_error_builder_basic() {
    let error = ErrorBuilder::new(StatusCode::BAD_REQUEST)
        .type_("https://example.com/probs/validation-error")
        .title("Validation Error")
        .detail("The request contains invalid data")
        .instance("/Depots")
        .build();

    assert_eq!(error.status_code, StatusCode::BAD_REQUEST);
    assert_eq!(error.body_str("type"), Some("https://example.com/probs/validation-error"));
    assert_eq!(error.body_str("title"), Some("Validation Error"));
    assert_eq!(error.body_str("detail"), Some("The request contains invalid data"));
    assert_eq!(error.body_str("instance"), Some("/Depots"));
    assert!(error.body.contains_key("timestamp"));
}

#[test]
fn test_instance_is_optional() {
    let error = not_found().detail("gone").build();

    assert_eq!(error.status_code, StatusCode::NOT_FOUND);
    assert!(!error.body.contains_key("instance"));
    assert_eq!(error.body_str("error_code"), Some("NOT_FOUND"));
}

#[test]
fn test_value_overrides_default_error_code() {
    let error = not_found().value("error_code", "TABLE_NOT_FOUND").build();
    assert_eq!(error.body_str("error_code"), Some("TABLE_NOT_FOUND"));
}

#[test]
fn test_server_side_builders() {
    let error = internal_server_error().build();
    assert_eq!(error.status_code, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(error.body_str("error_code"), Some("INTERNAL_SERVER_ERROR"));

    let error = service_unavailable().build();
    assert_eq!(error.status_code, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(error.body_str("error_code"), Some("STORE_UNAVAILABLE"));
}

#[test]
fn test_unauthorized_carries_challenge() {
    let error = unauthorized("OData Experiments").build();

    assert_eq!(error.status_code, StatusCode::UNAUTHORIZED);
    assert_eq!(
        error.headers.get(WWW_AUTHENTICATE).unwrap(),
        "Basic realm=\"OData Experiments\""
    );
}

#[tokio::test]
async fn test_problem_response_shape() {
    let response = unauthorized("Geo").build().into_response();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.headers().get(CONTENT_TYPE).unwrap(),
        "application/problem+json"
    );
    assert_eq!(
        response.headers().get(WWW_AUTHENTICATE).unwrap(),
        "Basic realm=\"Geo\""
    );

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["title"], "Unauthorized");
    assert_eq!(json["error_code"], "UNAUTHORIZED");
}
