/// Request pipeline built from configuration
///
use content_store::config::SecurityConfig;
use content_store::middleware::{BodySchema, FieldKind, ParamCheck, SecurityCheck};
use content_store::{Pipeline, Rejection, Request};
use serde_json::json;

fn item_pipeline() -> Pipeline {
    let security = SecurityConfig {
        enabled: true,
        token: Some("secret".to_string()),
        exempt_paths: vec!["/ping".to_string()],
    };

    Pipeline::new()
        .with(SecurityCheck::from_config(&security).expect("security enabled"))
        .with(ParamCheck::alphanumeric("itemId"))
        .with(BodySchema::new().require("content", FieldKind::Object))
}

#[test]
fn test_valid_request_passes_every_stage() {
    let request = Request::new("PUT", "/items/DM-1")
        .with_header("Authorization", "secret")
        .with_param("itemId", "DM-1")
        .with_body(json!({"content": {"title": "t"}}));

    assert!(item_pipeline().run(&request).is_ok());
}

#[test]
fn test_security_runs_first() {
    let request = Request::new("PUT", "/items/bad id").with_param("itemId", "bad id");
    assert_eq!(
        item_pipeline().run(&request).unwrap_err(),
        Rejection::unauthorized("invalid Token")
    );
}

#[test]
fn test_param_check_before_body() {
    let request = Request::new("PUT", "/items/bad id")
        .with_header("authorization", "secret")
        .with_param("itemId", "bad id");

    let rejection = item_pipeline().run(&request).unwrap_err();
    assert_eq!(rejection.status, 406);
    assert_eq!(rejection.message, "The itemId must be alphanumeric");
}

#[test]
fn test_body_schema_last() {
    let request = Request::new("PUT", "/items/DM-1")
        .with_header("authorization", "secret")
        .with_param("itemId", "DM-1")
        .with_body(json!({"content": "flat"}));

    let rejection = item_pipeline().run(&request).unwrap_err();
    assert_eq!(rejection.status, 422);
    assert_eq!(rejection.message, "\"content\" must be an object");
}

#[test]
fn test_disabled_security_adds_no_stage() {
    let pipeline = match SecurityCheck::from_config(&SecurityConfig::default()) {
        Some(check) => Pipeline::new().with(check),
        None => Pipeline::new(),
    };
    assert!(pipeline.is_empty());
    assert!(pipeline.run(&Request::new("DELETE", "/items/DM-1")).is_ok());
}
