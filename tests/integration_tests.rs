//! Integration tests for the artifact catalog client.
//!
//! These exercise the full gateway pipeline against a local mock server:
//! request shaping, response normalization, display formatting, and error
//! classification, plus the search controller end to end.

use std::sync::Arc;
use std::time::Duration;

use mockito::Matcher;
use tokio_util::sync::CancellationToken;

use artifact_search::client::ApiClient;
use artifact_search::display::{format_item_response, format_list_response};
use artifact_search::errors::{ErrorKind, FormattedError};
use artifact_search::query::QueryBuilder;
use artifact_search::search::{SearchController, SearchOptions};
use artifact_search::{ClientError, RequestOptions};

fn client_for(server: &mockito::ServerGuard) -> ApiClient {
    ApiClient::new(&server.url()).expect("client for mock server")
}

#[tokio::test]
async fn search_normalizes_list_envelope() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/api/artifacts/search")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("page".into(), "1".into()),
            Matcher::UrlEncoded("per_page".into(), "20".into()),
            Matcher::UrlEncoded("q".into(), "amphora".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{
                "items": [
                    {"id": 1, "name": "Amphora", "creators": ["A", "B"], "images": ["x.png"]},
                    {"id": 2, "name": "Krater"}
                ],
                "total_count": 2
            }"#,
        )
        .create_async()
        .await;

    let client = client_for(&server);
    let response = client
        .quick_search("amphora", 1, 20, None)
        .await
        .expect("search succeeds");

    let formatted = format_list_response(&response);
    assert_eq!(formatted.items.len(), 2);
    assert_eq!(formatted.items[0].creators, "A, B");
    assert_eq!(
        formatted.items[0].thumbnail_url.as_deref(),
        Some("x.png?size=thumb")
    );
    // Meta synthesized from envelope fields, with explicit nulls.
    assert_eq!(formatted.meta["total"], 2);
    assert!(formatted.meta["page"].is_null());

    mock.assert_async().await;
}

#[tokio::test]
async fn list_artifacts_handles_bare_array() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/api/artifacts")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("page".into(), "2".into()),
            Matcher::UrlEncoded("per_page".into(), "50".into()),
        ]))
        .with_status(200)
        .with_body(r#"[{"id": 1}, {"id": 2}]"#)
        .create_async()
        .await;

    let client = client_for(&server);
    let response = client
        .list_artifacts(2, 50, None)
        .await
        .expect("list succeeds");

    assert_eq!(response.items().map(<[_]>::len), Some(2));
    assert_eq!(response.meta(), &serde_json::json!({}));

    mock.assert_async().await;
}

#[tokio::test]
async fn get_by_id_yields_single_item() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/api/artifacts/7")
        .with_status(200)
        .with_body(r#"{"id": 7, "name": "Vase", "materials": ["clay"]}"#)
        .create_async()
        .await;

    let client = client_for(&server);
    let response = client
        .get_artifact_by_id("7", None)
        .await
        .expect("get succeeds");

    let formatted = format_item_response(&response);
    let item = formatted.item.expect("single item");
    assert_eq!(item.id, Some(7));
    assert_eq!(item.name, "Vase");
    assert_eq!(item.materials, "clay");

    mock.assert_async().await;
}

#[tokio::test]
async fn empty_params_are_pruned_from_the_request() {
    let mut server = mockito::Server::new_async().await;
    // Exact query match: anything extra appended would miss this mock.
    let mock = server
        .mock("GET", "/api/artifacts/search")
        .match_query(Matcher::Exact("page=1&per_page=20&name=Vase".into()))
        .with_status(200)
        .with_body("[]")
        .expect(1)
        .create_async()
        .await;

    let client = client_for(&server);
    let options = RequestOptions::new()
        .param("page", "1")
        .param("per_page", "20")
        .param("name", "Vase")
        .param("creator", "")
        .param("material", "   ");
    client
        .request("/api/artifacts/search", options)
        .await
        .expect("request succeeds");

    mock.assert_async().await;
}

#[tokio::test]
async fn builder_params_round_trip_to_the_wire() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/api/artifacts/search")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("page".into(), "3".into()),
            Matcher::UrlEncoded("per_page".into(), "10".into()),
            Matcher::UrlEncoded("location".into(), "Rome".into()),
            Matcher::UrlEncoded("tag".into(), "ancient,roman".into()),
        ]))
        .with_status(200)
        .with_body("[]")
        .create_async()
        .await;

    let mut builder = QueryBuilder::new();
    builder.set_location(Some("Rome")).expect("valid location");
    builder.set_tag(Some("ancient,roman")).expect("valid tag");
    builder.set_pagination(3, Some(10)).expect("valid bounds");

    let client = client_for(&server);
    client
        .search_artifacts(&builder.build(), None)
        .await
        .expect("search succeeds");

    mock.assert_async().await;
}

#[tokio::test]
async fn http_404_classifies_not_found() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/api/artifacts/99")
        .with_status(404)
        .with_body("no such artifact")
        .create_async()
        .await;

    let client = client_for(&server);
    let error = client
        .get_artifact_by_id("99", None)
        .await
        .expect_err("404 fails loud");

    assert_eq!(error.status_code(), Some(404));
    let formatted = FormattedError::from_error(&error);
    assert_eq!(formatted.kind, ErrorKind::NotFound);
    assert!(!formatted.is_retryable);
    assert_eq!(formatted.message, "l'elemento richiesto non è stato trovato.");
    assert!(formatted
        .details
        .as_deref()
        .unwrap_or("")
        .contains("no such artifact"));
}

#[tokio::test]
async fn http_503_classifies_retryable_server_error() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/api/artifacts/search")
        .match_query(Matcher::Any)
        .with_status(503)
        .create_async()
        .await;

    let client = client_for(&server);
    let error = client
        .quick_search("vase", 1, 20, None)
        .await
        .expect_err("503 fails loud");

    let formatted = FormattedError::from_error(&error);
    assert_eq!(formatted.kind, ErrorKind::ServerError);
    assert!(formatted.is_retryable);
    assert_eq!(formatted.status_code, Some(503));
}

#[tokio::test]
async fn no_content_and_malformed_bodies_fail_soft() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/api/artifacts")
        .match_query(Matcher::Any)
        .with_status(204)
        .create_async()
        .await;

    let client = client_for(&server);
    let response = client
        .list_artifacts(1, 20, None)
        .await
        .expect("204 is an empty success");
    assert_eq!(response.items(), Some(&[][..]));

    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/api/artifacts")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body("definitely {not json")
        .create_async()
        .await;

    let client = client_for(&server);
    let response = client
        .list_artifacts(1, 20, None)
        .await
        .expect("decode failures degrade to empty");
    assert_eq!(response.items(), Some(&[][..]));
}

#[tokio::test]
async fn unresponsive_server_times_out_retryably() {
    // A bound listener that never accepts: the connection parks in the
    // backlog and no response ever arrives.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind local listener");
    let port = listener.local_addr().expect("local addr").port();

    let client = ApiClient::with_timeout(
        &format!("http://127.0.0.1:{port}"),
        Duration::from_millis(100),
    )
    .expect("client");

    let error = client
        .quick_search("vase", 1, 20, None)
        .await
        .expect_err("timeout fails");
    assert!(matches!(error, ClientError::Timeout(_)));

    let formatted = FormattedError::from_error(&error);
    assert_eq!(formatted.kind, ErrorKind::TimeoutError);
    assert!(formatted.is_retryable);

    drop(listener);
}

#[tokio::test]
async fn external_cancellation_wins_over_timeout() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind local listener");
    let port = listener.local_addr().expect("local addr").port();

    let client = ApiClient::with_timeout(
        &format!("http://127.0.0.1:{port}"),
        Duration::from_secs(30),
    )
    .expect("client");

    let token = CancellationToken::new();
    let cancel = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        cancel.cancel();
    });

    let error = client
        .quick_search("vase", 1, 20, Some(&token))
        .await
        .expect_err("cancellation aborts");
    assert!(error.is_aborted());

    drop(listener);
}

#[tokio::test]
async fn already_cancelled_token_aborts_before_dispatch() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/api/artifacts/search")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body("[]")
        .expect(0)
        .create_async()
        .await;

    let token = CancellationToken::new();
    token.cancel();

    let client = client_for(&server);
    let error = client
        .quick_search("vase", 1, 20, Some(&token))
        .await
        .expect_err("pre-cancelled token aborts");
    assert!(error.is_aborted());

    mock.assert_async().await;
}

#[tokio::test]
async fn controller_drives_the_full_pipeline() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/api/artifacts/search")
        .match_query(Matcher::UrlEncoded("q".into(), "etruscan urn".into()))
        .with_status(200)
        .with_body(r#"{"results": [{"id": 5, "name": "Urn", "tags": ["etruscan"]}], "total": 1}"#)
        .create_async()
        .await;

    let client = client_for(&server);
    let controller = SearchController::new(
        Arc::new(client),
        SearchOptions {
            debounce: Duration::from_millis(10),
            ..SearchOptions::default()
        },
    );
    let mut state = controller.subscribe();

    controller.set_search_term("etruscan urn");

    let snapshot = loop {
        state.changed().await.expect("controller alive");
        let snapshot = state.borrow().clone();
        if snapshot.data.is_some() || snapshot.error.is_some() {
            break snapshot;
        }
    };

    assert!(snapshot.error.is_none(), "no error expected");
    let data = snapshot.data.expect("results published");
    assert_eq!(data.len(), 1);
    assert_eq!(data[0].name, "Urn");
    assert_eq!(data[0].tags, vec!["etruscan"]);
    assert!(!snapshot.is_loading);
}
