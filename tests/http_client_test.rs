use nps_scraper::app::ports::HttpClientPort;
use nps_scraper::config::HttpConfig;
use nps_scraper::error::ScraperError;
use nps_scraper::infra::http_client::ReqwestHttp;
use std::time::{Duration, Instant};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(backoff_factor: f64) -> ReqwestHttp {
    ReqwestHttp::new(&HttpConfig {
        backoff_factor,
        ..HttpConfig::default()
    })
    .unwrap()
}

#[tokio::test]
async fn test_retryable_status_gives_up_after_four_attempts() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/report"))
        .respond_with(ResponseTemplate::new(503))
        .expect(4)
        .mount(&server)
        .await;

    let url = format!("{}/report", server.uri());
    let err = client(0.0).get_text(&url, None).await.unwrap_err();

    match err {
        ScraperError::Transport { attempts, message, .. } => {
            assert_eq!(attempts, 4);
            assert!(message.contains("503"), "{message}");
        }
        other => panic!("expected Transport, got {other:?}"),
    }
}

#[tokio::test]
async fn test_other_status_fails_without_retrying() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let url = format!("{}/missing", server.uri());
    let err = client(0.0).get_text(&url, None).await.unwrap_err();
    assert!(matches!(err, ScraperError::Status { status: 404, .. }));
}

#[tokio::test]
async fn test_success_after_a_retry_returns_the_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&server)
        .await;

    let body = client(0.0).get_text(&server.uri(), None).await.unwrap();
    assert_eq!(body, "ok");
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_retry_after_replaces_the_backoff_delay() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "1"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&server)
        .await;

    // The first retry has no backoff of its own, so any wait comes from the header
    let started = Instant::now();
    let body = client(0.0).get_text(&server.uri(), None).await.unwrap();
    assert_eq!(body, "ok");
    assert!(started.elapsed() >= Duration::from_secs(1));
}

#[tokio::test]
async fn test_retry_after_overrides_a_long_backoff() {
    let server = MockServer::start().await;
    for _ in 0..2 {
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503).insert_header("Retry-After", "0"))
            .up_to_n_times(1)
            .mount(&server)
            .await;
    }
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&server)
        .await;

    // Without the header the second retry would sleep 100 * 2 seconds
    let body = tokio::time::timeout(Duration::from_secs(10), client(100.0).get_text(&server.uri(), None))
        .await
        .expect("Retry-After: 0 should skip the backoff")
        .unwrap();
    assert_eq!(body, "ok");
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}
