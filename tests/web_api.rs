//! HTTP surface through axum-test

mod common;

use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::Value;

use common::{Harness, SDUT_SVG};
use logo_api::web::WebServer;

async fn server() -> (Harness, TestServer) {
    let harness = Harness::new().await;
    let server = TestServer::new(WebServer::router(harness.app_state())).unwrap();
    (harness, server)
}

#[tokio::test]
async fn test_health() {
    let (_harness, server) = server().await;

    let response = server.get("/health").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_png_generated_then_hit() {
    let (harness, server) = server().await;

    let first = server
        .get("/api/v1/logos/sdut")
        .add_query_param("type", "png")
        .add_query_param("size", 64)
        .add_query_param("bg", "#ffffff")
        .await;
    first.assert_status_ok();
    assert_eq!(first.header("content-type"), "image/png");
    assert_eq!(first.header("x-logo-cache"), "generated");
    let disposition = first.header("content-disposition");
    assert!(disposition.to_str().unwrap().starts_with("inline"));

    let second = server
        .get("/api/v1/logos/sdut")
        .add_query_param("type", "png")
        .add_query_param("size", 64)
        .add_query_param("bg", "white")
        .await;
    second.assert_status_ok();
    assert_eq!(second.header("x-logo-cache"), "hit");
    assert_eq!(second.as_bytes(), first.as_bytes());
    assert_eq!(harness.rasterizer.calls(), 1);
}

#[tokio::test]
async fn test_svg_served_direct() {
    let (_harness, server) = server().await;

    let response = server
        .get("/api/v1/logos/sdut")
        .add_query_param("type", "svg")
        .await;

    response.assert_status_ok();
    assert_eq!(response.header("content-type"), "image/svg+xml");
    assert_eq!(response.header("x-logo-cache"), "direct");
    assert_eq!(response.as_bytes().as_ref(), SDUT_SVG);
}

#[tokio::test]
async fn test_unknown_logo_is_404_envelope() {
    let (_harness, server) = server().await;

    let response = server
        .get("/api/v1/logos/nowhere")
        .add_query_param("size", 64)
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("nowhere"));
}

#[tokio::test]
async fn test_bad_parameters_are_400() {
    let (_harness, server) = server().await;

    for query in [
        "type=gif&size=64",
        "type=png&size=abc",
        "type=png",
        "type=png&size=99999",
    ] {
        let response = server.get(&format!("/api/v1/logos/sdut?{query}")).await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["success"], false, "query {query}");
    }
}

#[tokio::test]
async fn test_cleanup_endpoint_reports_result() {
    let (_harness, server) = server().await;

    let response = server.post("/api/v1/logos/cleanup").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["total"], 0);
    assert_eq!(body["data"]["failed_paths"], Value::Array(Vec::new()));
}
