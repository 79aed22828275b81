//! End-to-end navigation against a mocked search service.

use anyhow::Result;
use ferenda_search_client::ClientConfig;
use ferenda_search_client::HttpGateway;
use ferenda_search_client::Location;
use ferenda_search_client::NavEvent;
use ferenda_search_client::NavOutcome;
use ferenda_search_client::NavState;
use ferenda_search_client::NavigationController;
use ferenda_search_client::QueryForm;
use ferenda_search_client::QueryReference;
use ferenda_search_client::TextTemplates;
use ferenda_search_client::config::StaticFacet;
use ferenda_search_client::config::StaticOption;
use ferenda_search_client::facets::FacetControlState;
use ferenda_search_client::vocab::LoadState;
use pretty_assertions::assert_eq;
use serde_json::Value;
use serde_json::json;
use std::sync::Arc;
use wiremock::Mock;
use wiremock::MockServer;
use wiremock::ResponseTemplate;
use wiremock::matchers::method;
use wiremock::matchers::path;
use wiremock::matchers::query_param;

fn hits(start: u64, total: u64, count: u64) -> Value {
    let items: Vec<Value> = (start..start + count)
        .map(|n| {
            json!({
                "iri": format!("http://lagen.example/sfs/2024:{n}"),
                "identifier": format!("SFS 2024:{n}"),
            })
        })
        .collect();
    json!({
        "startIndex": start,
        "itemsPerPage": 10,
        "totalResults": total,
        "items": items,
    })
}

async fn mount_json(server: &MockServer, endpoint: &str, body: Value) {
    Mock::given(method("GET"))
        .and(path(endpoint))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn mount_vocabulary(server: &MockServer) {
    mount_json(
        server,
        "/var/terms",
        json!({"topic": [
            {"iri": "dcterms_publisher", "label": "Utgivare"},
            {"iri": "rpubl_forfattningssamling", "label": "Författningssamling"},
        ]}),
    )
    .await;
    mount_json(
        server,
        "/var/common",
        json!({"topic": [
            {"iri": "http://lagen.example/org/regeringskansliet", "name": "Regeringskansliet"},
        ]}),
    )
    .await;
}

fn config_for(server: &MockServer) -> ClientConfig {
    ClientConfig {
        base_url: server.uri(),
        static_facets: vec![StaticFacet {
            id: "rpubl_forfattningssamling".to_string(),
            name: Some("rpubl_forfattningssamling.iri".to_string()),
            label: Some("Samling".to_string()),
            options: vec![StaticOption {
                value: "*/sfs".to_string(),
                label: "SFS".to_string(),
            }],
        }],
        ..Default::default()
    }
}

async fn controller_for(server: &MockServer, hash: &str) -> Result<NavigationController> {
    let config = config_for(server);
    let gateway = Arc::new(HttpGateway::new(config.base_url.clone(), config.request_timeout())?);
    let mut controller = NavigationController::bootstrap(
        &config,
        gateway,
        Arc::new(TextTemplates::default()),
        Location::new(hash),
    )
    .await;
    controller.settle().await;
    Ok(controller)
}

#[tokio::test]
async fn initial_hash_shows_first_page() -> Result<()> {
    let server = MockServer::start().await;
    mount_vocabulary(&server).await;
    mount_json(&server, "/-/publ;stats", json!({"slices": []})).await;
    Mock::given(method("GET"))
        .and(path("/-/publ"))
        .and(query_param("q", "skatt"))
        .respond_with(ResponseTemplate::new(200).set_body_json(hits(0, 23, 10)))
        .mount(&server)
        .await;

    let controller = controller_for(&server, "#/-/publ?q=skatt").await?;

    assert_eq!(controller.vocabulary().state(), LoadState::Complete);
    assert_eq!(controller.state(), NavState::Idle);
    let results = controller.page().results.content().unwrap_or_default();
    assert!(results.starts_with("1–10 of 23\n"), "{results}");
    assert!(results.contains("SFS 2024:0  #/sfs/2024:0/data.json"), "{results}");
    Ok(())
}

#[tokio::test]
async fn last_page_is_clamped_to_total() -> Result<()> {
    let server = MockServer::start().await;
    mount_vocabulary(&server).await;
    mount_json(&server, "/-/publ;stats", json!({"slices": []})).await;
    Mock::given(method("GET"))
        .and(path("/-/publ"))
        .and(query_param("_page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(hits(20, 23, 3)))
        .mount(&server)
        .await;

    let mut controller = controller_for(&server, "").await?;
    assert!(controller.page().results.is_empty());

    controller.dispatch(NavEvent::LinkClicked("#/-/publ?q=skatt&_page=2".to_string()));
    controller.settle().await;

    assert_eq!(controller.location().hash(), "#/-/publ?q=skatt&_page=2");
    let results = controller.page().results.content().unwrap_or_default();
    assert!(results.starts_with("21–23 of 23\n"), "{results}");
    Ok(())
}

#[tokio::test]
async fn failed_query_shows_error_and_recovers() -> Result<()> {
    let server = MockServer::start().await;
    mount_vocabulary(&server).await;
    mount_json(&server, "/-/publ;stats", json!({"slices": []})).await;
    Mock::given(method("GET"))
        .and(path("/-/publ"))
        .and(query_param("q", "trasig"))
        .respond_with(ResponseTemplate::new(500).set_body_string("index offline"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/-/publ"))
        .and(query_param("q", "hel"))
        .respond_with(ResponseTemplate::new(200).set_body_json(hits(0, 1, 1)))
        .mount(&server)
        .await;

    let mut controller = controller_for(&server, "#/-/publ?q=hel").await?;
    assert!(!controller.page().results.is_empty());

    controller.dispatch(NavEvent::Submit(
        QueryForm::new("/-/publ").with_field("q", "trasig"),
    ));
    controller.settle().await;

    assert_eq!(controller.state(), NavState::Idle);
    assert!(controller.page().results.is_empty());
    assert!(controller.page().document.is_empty());
    assert_eq!(
        controller.page().error.content(),
        Some("Request failed: /-/publ?q=trasig\n500 Internal Server Error\nindex offline\n")
    );

    controller.dispatch(NavEvent::HashChanged("#/-/publ?q=hel".to_string()));
    controller.settle().await;
    assert!(controller.page().error.is_empty());
    assert_eq!(
        controller.last_outcome(),
        Some(&NavOutcome::Results(QueryReference::new("/-/publ?q=hel")))
    );
    Ok(())
}

#[tokio::test]
async fn embedded_statistics_build_labelled_controls() -> Result<()> {
    let server = MockServer::start().await;
    mount_vocabulary(&server).await;
    let mut body = hits(0, 4, 4);
    body["statistics"] = json!({"slices": [
        {"dimension": "dcterms_publisher", "observations": [
            {"ref": "http://lagen.example/org/regeringskansliet", "count": 3},
            {"ref": "http://lagen.example/org/okand", "count": 1},
        ]},
        {"dimension": "rpubl_forfattningssamling", "observations": [
            {"ref": "http://lagen.example/dataset/sfs", "count": 4},
        ]},
        {"dimension": "dcterms_issued", "observations": []},
    ]});
    Mock::given(method("GET"))
        .and(path("/-/publ"))
        .and(query_param("q", "lag"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/-/publ;stats"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"slices": []})))
        .expect(1)
        .mount(&server)
        .await;

    let controller = controller_for(&server, "#/-/publ?q=lag").await?;
    let facets = &controller.page().facets;

    let publisher = facets
        .control("dcterms_publisher")
        .ok_or_else(|| anyhow::anyhow!("publisher control missing"))?;
    assert_eq!(publisher.name, "dcterms_publisher.iri");
    assert_eq!(publisher.label, "Utgivare");
    let options: Vec<(&str, &str)> = publisher
        .options
        .iter()
        .map(|option| (option.value.as_str(), option.label.as_str()))
        .collect();
    assert_eq!(
        options,
        vec![
            ("*/regeringskansliet", "Regeringskansliet (3)"),
            ("*/okand", "okand (1)"),
        ]
    );

    assert_eq!(
        facets.state("rpubl_forfattningssamling"),
        FacetControlState::DynamicManaged { narrowed: true }
    );
    assert_eq!(facets.state("dcterms_issued"), FacetControlState::Absent);
    Ok(())
}

#[tokio::test]
async fn vocabulary_outage_degrades_labels() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/var/terms"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    mount_json(&server, "/-/publ;stats", json!({"slices": []})).await;
    let mut body = hits(0, 1, 1);
    body["statistics"] = json!({"slices": [
        {"dimension": "dcterms_publisher", "observations": [
            {"ref": "http://lagen.example/org/regeringskansliet", "count": 1},
        ]},
    ]});
    mount_json(&server, "/-/publ", body).await;

    let controller = controller_for(&server, "#/-/publ?q=x").await?;

    assert_eq!(controller.vocabulary().state(), LoadState::Empty);
    let publisher = controller
        .page()
        .facets
        .control("dcterms_publisher")
        .ok_or_else(|| anyhow::anyhow!("publisher control missing"))?;
    assert_eq!(publisher.label, "dcterms_publisher");
    assert_eq!(publisher.options[0].label, "regeringskansliet (1)");
    Ok(())
}

#[tokio::test]
async fn document_link_folds_results() -> Result<()> {
    let server = MockServer::start().await;
    mount_vocabulary(&server).await;
    mount_json(&server, "/-/publ;stats", json!({"slices": []})).await;
    mount_json(&server, "/-/publ", hits(0, 1, 1)).await;
    mount_json(
        &server,
        "/sfs/2024:0/data.json",
        json!({
            "@context": {},
            "iri": "http://lagen.example/sfs/2024:0",
            "identifier": "SFS 2024:0",
            "dcterms_publisher": {"iri": "http://lagen.example/org/regeringskansliet"},
            "rev": {"rpubl_andrar": [{"iri": "http://lagen.example/sfs/2024:9"}]},
        }),
    )
    .await;

    let mut controller = controller_for(&server, "#/-/publ?q=x").await?;
    controller.dispatch(NavEvent::LinkClicked("#/sfs/2024:0/data.json".to_string()));
    controller.settle().await;

    assert!(controller.page().results.is_folded());
    let document = controller.page().document.content().unwrap_or_default();
    assert!(document.starts_with("SFS 2024:0\n==========\n"), "{document}");
    assert!(
        document.contains("\nRelations:\n  dcterms_publisher: #/org/regeringskansliet/data.json\n"),
        "{document}"
    );
    assert!(
        document.contains("\nIncoming:\n  rev.rpubl_andrar: #/sfs/2024:9/data.json\n"),
        "{document}"
    );
    assert_eq!(
        controller.last_outcome(),
        Some(&NavOutcome::Document(QueryReference::new("/sfs/2024:0/data.json")))
    );
    Ok(())
}
