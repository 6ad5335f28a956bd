//! RestClient against a wiremock server.

use buildlens_client::{AuthConfig, ClientConfig, LogFormat, RestClient};
use buildlens_core::{FetchError, RetryPolicy, Scope};
use buildlens_stream::{BuildSource, EngineConfig, EngineDriver, ListEngine, PageRequest};
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const BUILDS_PATH: &str = "/api/v1/organizations/acme/repositories/rocket/builds";

// =============================================================================
// HELPERS
// =============================================================================

fn config(base: &str) -> ClientConfig {
    ClientConfig {
        api_base_url: base.to_string(),
        organization: "acme".to_string(),
        repository: "rocket".to_string(),
        auth: AuthConfig {
            token: Some("t0ken".to_string()),
        },
        request_timeout_ms: 2_000,
        retry: RetryPolicy::disabled(),
        log_format: LogFormat::Text,
    }
}

fn request(page: u32) -> PageRequest {
    PageRequest::new(
        Scope::new("acme", "rocket"),
        vec![("branch".to_string(), "main".to_string())],
        page,
    )
}

fn build_json(id: &str, number: u64) -> serde_json::Value {
    json!({
        "id": id,
        "number": number,
        "status": "failure",
        "branch": "main",
        "commit_sha": "0123456789abcdef",
        "author": "sam",
        "is_ci": true,
        "created_at": "2024-06-01T12:00:00Z",
        "duration_secs": 95
    })
}

fn page_json(page: u32, total: u32, max: u32) -> serde_json::Value {
    json!({
        "results": [build_json(&format!("b-{page}"), page as u64)],
        "total_pages": total,
        "max_pages": max,
        "page": page
    })
}

// =============================================================================
// LIST ENDPOINT
// =============================================================================

#[tokio::test]
async fn test_list_builds_sends_params_and_auth() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(BUILDS_PATH))
        .and(query_param("branch", "main"))
        .and(query_param("page", "2"))
        .and(header("authorization", "Bearer t0ken"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_json(2, 3, 3)))
        .expect(1)
        .mount(&server)
        .await;

    let client = RestClient::new(&config(&server.uri())).unwrap();
    let page = client.list_builds(&request(2)).await.unwrap();
    assert_eq!(page.page, 2);
    assert_eq!(page.results[0].id, "b-2");
    assert_eq!(page.results[0].duration_secs, Some(95));
}

#[tokio::test]
async fn test_unknown_status_still_decodes() {
    let server = MockServer::start().await;
    let mut body = page_json(1, 1, 1);
    body["results"][0]["status"] = json!("skipped");
    Mock::given(method("GET"))
        .and(path(BUILDS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&server)
        .await;

    let client = RestClient::new(&config(&server.uri())).unwrap();
    let page = client.list_builds(&request(1)).await.unwrap();
    assert_eq!(page.results[0].status, buildlens_core::BuildStatus::Unknown);
}

#[tokio::test]
async fn test_gateway_error_is_transient_with_server_detail() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(BUILDS_PATH))
        .respond_with(
            ResponseTemplate::new(503).set_body_json(json!({"detail": "builds service warming up"})),
        )
        .mount(&server)
        .await;

    let client = RestClient::new(&config(&server.uri())).unwrap();
    let err = client.list_builds(&request(1)).await.unwrap_err();
    assert_eq!(err, FetchError::http(503, "builds service warming up"));
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_not_found_is_not_transient() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(BUILDS_PATH))
        .respond_with(ResponseTemplate::new(404).set_body_string("no such repository"))
        .mount(&server)
        .await;

    let client = RestClient::new(&config(&server.uri())).unwrap();
    let err = client.list_builds(&request(1)).await.unwrap_err();
    assert_eq!(err, FetchError::http(404, "no such repository"));
    assert!(!err.is_transient());
}

#[tokio::test]
async fn test_malformed_json_is_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(BUILDS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("{\"results\": oops"))
        .mount(&server)
        .await;

    let client = RestClient::new(&config(&server.uri())).unwrap();
    let err = client.list_builds(&request(1)).await.unwrap_err();
    assert!(matches!(err, FetchError::Decode { .. }));
}

#[tokio::test]
async fn test_unreachable_server_is_transient() {
    let uri = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        format!("http://{}", listener.local_addr().unwrap())
    };
    let client = RestClient::new(&config(&uri)).unwrap();
    let err = client.list_builds(&request(1)).await.unwrap_err();
    assert!(err.is_transient(), "unexpected error {err:?}");
}

#[tokio::test]
async fn test_slow_server_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(BUILDS_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(page_json(1, 1, 1))
                .set_delay(std::time::Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let mut config = config(&server.uri());
    config.request_timeout_ms = 50;
    let client = RestClient::new(&config).unwrap();
    let err = client.list_builds(&request(1)).await.unwrap_err();
    assert!(matches!(err, FetchError::Timeout { .. }), "unexpected error {err:?}");
}

// =============================================================================
// INDICATORS ENDPOINT
// =============================================================================

#[tokio::test]
async fn test_indicators_unwraps_envelope() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{BUILDS_PATH}/indicators")))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "indicators": {"failure_rate": 0.5, "cache_hit_rate": 0.9}
        })))
        .mount(&server)
        .await;

    let client = RestClient::new(&config(&server.uri())).unwrap();
    let snapshot = client.indicators(&request(1)).await.unwrap();
    assert_eq!(snapshot.get_f64("failure_rate"), Some(0.5));
    assert_eq!(snapshot.len(), 2);
}

#[tokio::test]
async fn test_empty_indicators_object_is_no_data() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{BUILDS_PATH}/indicators")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"indicators": {}})))
        .mount(&server)
        .await;

    let client = RestClient::new(&config(&server.uri())).unwrap();
    assert!(client.indicators(&request(1)).await.unwrap().is_empty());
}

// =============================================================================
// END TO END
// =============================================================================

#[tokio::test]
async fn test_engine_over_rest_loads_until_ceiling() {
    let server = MockServer::start().await;
    for page in 1..=2u32 {
        Mock::given(method("GET"))
            .and(path(BUILDS_PATH))
            .and(query_param("page", page.to_string()))
            .respond_with(ResponseTemplate::new(200).set_body_json(page_json(page, 5, 2)))
            .expect(1)
            .mount(&server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path(format!("{BUILDS_PATH}/indicators")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"indicators": {"builds": 1}})))
        .mount(&server)
        .await;

    let config = config(&server.uri());
    let source = Arc::new(RestClient::new(&config).unwrap());
    let engine = ListEngine::new(EngineConfig::builds(config.retry.clone()), config.scope(), "");
    let mut driver = EngineDriver::new(source, engine);

    driver.update(ListEngine::mount);
    driver.settle().await;
    driver.update(ListEngine::load_more);
    driver.settle().await;
    driver.update(ListEngine::load_more);
    assert_eq!(driver.pending(), 0);

    let view = driver.engine().view();
    assert_eq!(view.records.len(), 2);
    assert_eq!(view.last_page, Some(buildlens_stream::LastPage::MaximumReached));
}
