use super::*;
use crate::collab::mock::{AllowAllAuthorizer, InMemoryPersistence, RecordingAlerter, StaticDiscovery};
use crate::collab::{Alerter, Collaborators, ContainerRef, ContainerRuntime, Persistence};
use crate::config::Config;
use axum::http::StatusCode;
use clap::Parser;
use tokio_util::sync::CancellationToken;

struct NeverCalledRuntime;

#[async_trait::async_trait]
impl ContainerRuntime for NeverCalledRuntime {
    async fn create_exec(&self, _c: &ContainerRef, _t: &str) -> Result<String, crate::error::GatewayError> {
        unreachable!()
    }
    async fn start_exec(&self, _e: &str) -> Result<crate::collab::ExecStreams, crate::error::GatewayError> {
        unreachable!()
    }
    async fn resize_exec_tty(&self, _e: &str, _c: i32, _r: i32) -> Result<(), crate::error::GatewayError> {
        unreachable!()
    }
    async fn attach(&self, _c: &ContainerRef) -> Result<crate::collab::AttachStreams, crate::error::GatewayError> {
        unreachable!()
    }
}

fn test_collab() -> Collaborators {
    Collaborators {
        authorizer: Arc::new(AllowAllAuthorizer),
        discovery: Arc::new(StaticDiscovery),
        runtime: Arc::new(NeverCalledRuntime),
        alerter: Arc::new(RecordingAlerter::new()) as Arc<dyn Alerter>,
        persistence: Arc::new(InMemoryPersistence::new()) as Arc<dyn Persistence>,
    }
}

fn test_store(auth_token: Option<&str>) -> Arc<Store> {
    let mut config = Config::parse_from(["shellgate"]);
    config.auth_token = auth_token.map(str::to_owned);
    Store::new(test_collab(), Arc::new(config), CancellationToken::new())
}

#[tokio::test]
async fn health_reports_zero_clients_and_ok_status() {
    let store = test_store(None);
    let app = build_router(store);
    let server = axum_test::TestServer::new(app).unwrap();

    let resp = server.get("/healthz").await;
    resp.assert_status(StatusCode::OK);
    let body = resp.text();
    assert!(body.contains("\"status\":\"ok\""));
    assert!(body.contains("\"ws_clients\":0"));
}

#[tokio::test]
async fn health_is_exempt_from_the_bearer_check() {
    let store = test_store(Some("secret"));
    let app = build_router(store);
    let server = axum_test::TestServer::new(app).unwrap();

    let resp = server.get("/healthz").await;
    resp.assert_status(StatusCode::OK);
}

#[tokio::test]
async fn no_configured_token_allows_any_request() {
    let store = test_store(None);
    let app = build_router(store);
    let server = axum_test::TestServer::new(app).unwrap();

    let resp = server.get("/healthz").await;
    resp.assert_status(StatusCode::OK);
}

#[test]
fn ws_and_health_routes_are_exempt_from_the_bearer_layer() {
    assert!(path_exempt("/healthz"));
    assert!(path_exempt("/enter"));
    assert!(path_exempt("/attach"));
    assert!(!path_exempt("/anything-else"));
}

#[test]
fn constant_time_eq_matches_string_equality() {
    assert!(constant_time_eq("secret", "secret"));
    assert!(!constant_time_eq("secret", "wrong"));
    assert!(!constant_time_eq("secret", "secrets"));
}
