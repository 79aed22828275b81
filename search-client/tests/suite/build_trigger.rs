use ferenda_search_client::BuildTrigger;
use ferenda_search_client::SaveEvent;
use wiremock::Mock;
use wiremock::MockServer;
use wiremock::ResponseTemplate;
use wiremock::matchers::method;
use wiremock::matchers::path;
use wiremock::matchers::query_param;

fn trigger_for(server: &MockServer) -> BuildTrigger {
    BuildTrigger::new(format!(
        "{}/devel/build?repo=mediawiki&action=update&stream=true&basefile=",
        server.uri()
    ))
}

#[tokio::test]
async fn save_requests_a_rebuild_of_the_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/devel/build"))
        .and(query_param("repo", "mediawiki"))
        .and(query_param("action", "update"))
        .and(query_param("basefile", "Lagrum/Förvaltningslag"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&server)
        .await;

    let delivered = trigger_for(&server)
        .on_save(&SaveEvent::new("Lagrum/Förvaltningslag"))
        .await;
    assert!(delivered);
}

#[tokio::test]
async fn minor_edit_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let delivered = trigger_for(&server)
        .on_save(&SaveEvent::new("Huvudsida").minor())
        .await;
    assert!(!delivered);
}

#[tokio::test]
async fn rejected_build_is_reported_but_not_raised() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/devel/build"))
        .respond_with(ResponseTemplate::new(503).set_body_string("busy"))
        .expect(1)
        .mount(&server)
        .await;

    assert!(!trigger_for(&server).notify("Huvudsida").await);
}
