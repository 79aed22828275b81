use anyhow::Result;
use ferenda_search_client::FetchFailure;
use ferenda_search_client::HttpGateway;
use ferenda_search_client::ServiceGateway;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::time::Duration;
use wiremock::Mock;
use wiremock::MockServer;
use wiremock::ResponseTemplate;
use wiremock::matchers::method;
use wiremock::matchers::path;
use wiremock::matchers::query_param;

#[tokio::test]
async fn fetches_json_relative_to_base_url() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/-/publ"))
        .and(query_param("q", "skatt"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "startIndex": 0,
            "itemsPerPage": 10,
            "totalResults": 0,
            "items": [],
        })))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = HttpGateway::new(format!("{}/", server.uri()), None)?;
    let body = gateway
        .fetch_json("/-/publ?q=skatt")
        .await
        .map_err(|failure| anyhow::anyhow!("{failure}"))?;
    assert_eq!(body["itemsPerPage"], json!(10));
    Ok(())
}

#[tokio::test]
async fn statistics_path_keeps_its_parameter() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/-/publ;stats"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"slices": []})))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = HttpGateway::new(server.uri(), None)?;
    let body = gateway
        .fetch_json("/-/publ;stats")
        .await
        .map_err(|failure| anyhow::anyhow!("{failure}"))?;
    assert_eq!(body, json!({"slices": []}));
    Ok(())
}

#[tokio::test]
async fn server_error_carries_status_and_body() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/-/publ"))
        .respond_with(ResponseTemplate::new(500).set_body_string("index offline"))
        .mount(&server)
        .await;

    let gateway = HttpGateway::new(server.uri(), None)?;
    let failure = gateway
        .fetch_json("/-/publ?q=x")
        .await
        .expect_err("500 must fail");
    assert_eq!(
        failure,
        FetchFailure::http(500, "Internal Server Error", Some("index offline".to_string()))
    );
    Ok(())
}

#[tokio::test]
async fn non_json_body_is_a_failure() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/publ/1/data.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
        .mount(&server)
        .await;

    let gateway = HttpGateway::new(server.uri(), None)?;
    let failure = gateway
        .fetch_json("/publ/1/data.json")
        .await
        .expect_err("html is not json");
    assert_eq!(failure.status, Some(200));
    assert!(failure.status_text.starts_with("parsererror"));
    Ok(())
}

#[tokio::test]
async fn configured_timeout_fails_slow_requests() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({}))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let gateway = HttpGateway::new(server.uri(), Some(Duration::from_millis(100)))?;
    let failure = gateway
        .fetch_json("/var/terms")
        .await
        .expect_err("request should time out");
    assert_eq!(failure.status, None);
    Ok(())
}
