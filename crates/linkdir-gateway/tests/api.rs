use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::header::{CONTENT_TYPE, ETAG, IF_MATCH};
use axum::http::{Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use linkdir_core::{DocumentStore, Resource};
use linkdir_directory::{DirectoryConfig, DirectoryService};
use linkdir_gateway::{App, AppState, Mode};
use linkdir_storage::{InMemoryStore, ReadPolicy, Seed, Store};
use serde_json::{json, Value};
use tower::ServiceExt;

fn app_with(mode: Mode, seed: Seed) -> Router {
    let backend = Arc::new(InMemoryStore::new()) as Arc<dyn DocumentStore>;
    let directory = DirectoryService::new(
        Store::new(backend, ReadPolicy::Degrade),
        DirectoryConfig::default(),
    );
    App::router(AppState::new(Arc::new(directory), seed, mode))
}

fn app() -> Router {
    app_with(Mode::Development, Seed::empty())
}

async fn send(app: &Router, request: Request<Body>) -> Response {
    app.clone().oneshot(request).await.unwrap()
}

fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn empty_request(method: Method, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn body_json(response: Response) -> Value {
    serde_json::from_str(&text(response).await).unwrap()
}

fn link(name: &str, url: &str, category: &str) -> Value {
    json!({
        "name": name,
        "environments": { "production": url },
        "category": category,
    })
}

async fn create(app: &Router, uri: &str, body: Value) {
    let response = send(app, json_request(Method::POST, uri, body)).await;
    assert_eq!(response.status(), StatusCode::CREATED, "POST {uri}");
}

#[tokio::test]
async fn health_is_always_available() {
    let app = app_with(Mode::Production, Seed::empty());
    let response = send(&app, empty_request(Method::GET, "/health")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({ "status": "ok" }));
}

#[tokio::test]
async fn created_link_is_listed_with_an_etag() {
    let app = app();
    create(&app, "/api/categories", json!({ "name": "Monitoring" })).await;

    let response = send(
        &app,
        json_request(
            Method::POST,
            "/api/links",
            link("Grafana", "https://grafana.test", "monitoring"),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await;
    assert_eq!(created["category"], "Monitoring");
    assert!(created["createdAt"].is_string());

    let response = send(&app, empty_request(Method::GET, "/api/links")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let etag = response.headers()[ETAG].to_str().unwrap().to_string();
    assert!(etag.starts_with('"') && etag.ends_with('"'));
    let links = body_json(response).await;
    assert_eq!(links[0]["name"], "Grafana");

    let response = send(&app, empty_request(Method::GET, "/api/categories")).await;
    assert_eq!(body_json(response).await[0]["linkCount"], 1);
}

#[tokio::test]
async fn invalid_link_reports_field_issues() {
    let app = app();
    let response = send(
        &app,
        json_request(Method::POST, "/api/links", link("", "ftp://files.test", "Docs")),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    let fields: Vec<_> = body["issues"]
        .as_array()
        .unwrap()
        .iter()
        .map(|issue| issue["field"].as_str().unwrap().to_string())
        .collect();
    assert!(fields.contains(&"name".to_string()));
    assert!(fields.contains(&"environments.production".to_string()));
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let app = app();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/tags")
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from("{\"name\":"))
        .unwrap();
    let response = send(&app, request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(response).await["error"].is_string());
}

#[tokio::test]
async fn duplicate_names_conflict_ignoring_case() {
    let app = app();
    create(&app, "/api/tags", json!({ "name": "infra" })).await;

    let response = send(&app, json_request(Method::POST, "/api/tags", json!({ "name": "INFRA" }))).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn unknown_link_is_not_found() {
    let app = app();
    let response = send(
        &app,
        json_request(Method::PUT, "/api/links/Nope", json!({ "description": "x" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = send(&app, empty_request(Method::DELETE, "/api/links/Nope")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn category_with_links_needs_explicit_cascade() {
    let app = app();
    create(&app, "/api/categories", json!({ "name": "Docs" })).await;
    create(&app, "/api/links", link("Wiki", "https://wiki.test", "Docs")).await;
    create(&app, "/api/links", link("Handbook", "https://handbook.test", "Docs")).await;

    let response = send(&app, empty_request(Method::DELETE, "/api/categories/Docs")).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["count"], 2);

    let response = send(
        &app,
        empty_request(Method::DELETE, "/api/categories/Docs?deleteLinks=true"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({ "success": true, "affectedLinks": 2 })
    );

    let response = send(&app, empty_request(Method::GET, "/api/links")).await;
    assert_eq!(body_json(response).await, json!([]));
}

#[tokio::test]
async fn renaming_a_tag_updates_links() {
    let app = app();
    create(&app, "/api/tags", json!({ "name": "infra" })).await;
    let mut wiki = link("Wiki", "https://wiki.test", "Docs");
    wiki["tags"] = json!(["infra"]);
    create(&app, "/api/links", wiki).await;

    let response = send(
        &app,
        json_request(Method::PUT, "/api/tags/infra", json!({ "name": "platform" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(&app, empty_request(Method::GET, "/api/links")).await;
    assert_eq!(body_json(response).await[0]["tags"], json!(["platform"]));
}

#[tokio::test]
async fn stale_if_match_is_rejected() {
    let app = app();
    create(&app, "/api/links", link("Wiki", "https://wiki.test", "Docs")).await;

    let response = send(&app, empty_request(Method::GET, "/api/links")).await;
    let etag = response.headers()[ETAG].to_str().unwrap().to_string();

    let fresh = Request::builder()
        .method(Method::PUT)
        .uri("/api/links/Wiki")
        .header(CONTENT_TYPE, "application/json")
        .header(IF_MATCH, &etag)
        .body(Body::from(json!({ "description": "first" }).to_string()))
        .unwrap();
    assert_eq!(send(&app, fresh).await.status(), StatusCode::OK);

    let stale = Request::builder()
        .method(Method::PUT)
        .uri("/api/links/Wiki")
        .header(CONTENT_TYPE, "application/json")
        .header(IF_MATCH, &etag)
        .body(Body::from(json!({ "description": "second" }).to_string()))
        .unwrap();
    assert_eq!(send(&app, stale).await.status(), StatusCode::PRECONDITION_FAILED);

    let garbage = Request::builder()
        .method(Method::DELETE)
        .uri("/api/links/Wiki")
        .header(IF_MATCH, "not-a-revision")
        .body(Body::empty())
        .unwrap();
    assert_eq!(send(&app, garbage).await.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn production_mode_is_read_only() {
    let app = app_with(Mode::Production, Seed::empty());

    let response = send(
        &app,
        json_request(Method::POST, "/api/links", link("Wiki", "https://wiki.test", "Docs")),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await["error"], "not allowed");

    let response = send(&app, empty_request(Method::DELETE, "/api/settings")).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = send(&app, empty_request(Method::GET, "/api/links")).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn csv_import_reports_each_row() {
    let app = app();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/import/csv")
        .header(CONTENT_TYPE, "text/csv")
        .body(Body::from(
            "name,production_url,category\nFoo,https://foo.test,Tools\n,https://bar.test,Tools\n,,\n",
        ))
        .unwrap();
    let response = send(&app, request).await;
    assert_eq!(response.status(), StatusCode::OK);

    let result = body_json(response).await;
    assert_eq!(result["success"]["added"], json!(["Foo"]));
    assert_eq!(result["failed"][0]["reason"], "invalid");
    assert_eq!(result["failed"][0]["url"], "https://bar.test");
    assert_eq!(result["categories"]["new"], json!(["Tools"]));
    assert_eq!(result["dropped"], 1);
}

#[tokio::test]
async fn csv_import_overwrites_on_request() {
    let app = app();
    create(&app, "/api/links", link("Foo", "https://old.test", "Docs")).await;
    let csv = "name,production_url\nFoo,https://new.test\n";

    let skipped = Request::builder()
        .method(Method::POST)
        .uri("/api/import/csv")
        .body(Body::from(csv))
        .unwrap();
    let result = body_json(send(&app, skipped).await).await;
    assert_eq!(result["failed"][0]["reason"], "duplicate");

    let overwritten = Request::builder()
        .method(Method::POST)
        .uri("/api/import/csv?overwrite=true")
        .body(Body::from(csv))
        .unwrap();
    let result = body_json(send(&app, overwritten).await).await;
    assert_eq!(result["success"]["updated"], json!(["Foo"]));

    let links = body_json(send(&app, empty_request(Method::GET, "/api/links")).await).await;
    assert_eq!(links[0]["environments"]["production"], "https://new.test");
}

#[tokio::test]
async fn empty_import_is_a_bad_request() {
    let app = app();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/import/bookmarks")
        .body(Body::from("   "))
        .unwrap();
    assert_eq!(send(&app, request).await.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn bookmarks_round_trip_through_export() {
    let app = app();
    let html = r#"<DL><p>
        <DT><A HREF="https://wiki.test">Wiki</A>
        <DT><A HREF="https://jira.test">Jira</A>
    </DL><p>"#;
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/import/bookmarks")
        .body(Body::from(html))
        .unwrap();
    let result = body_json(send(&app, request).await).await;
    assert_eq!(result["success"]["added"], json!(["Wiki", "Jira"]));

    let response = send(&app, empty_request(Method::GET, "/api/export/bookmarks")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers()[CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("text/html"));
    let exported = text(response).await;
    assert!(exported.starts_with("<!DOCTYPE NETSCAPE-Bookmark-file-1>"));
    assert!(exported.contains(r#"<A HREF="https://wiki.test""#));

    let response = send(&app, empty_request(Method::GET, "/api/export/csv")).await;
    let csv = text(response).await;
    let mut lines = csv.lines();
    assert!(lines.next().unwrap().starts_with("name,"));
    assert_eq!(lines.count(), 2);
}

#[tokio::test]
async fn settings_can_be_replaced_and_reset() {
    let app = app();
    let response = send(&app, empty_request(Method::GET, "/api/settings")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key(ETAG));
    let mut settings = body_json(response).await;
    assert_eq!(settings["general"]["appName"], "Link Directory");

    settings["general"]["appName"] = json!("Team Links");
    let response = send(&app, json_request(Method::PUT, "/api/settings", settings)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["general"]["appName"], "Team Links");

    create(&app, "/api/tags", json!({ "name": "infra" })).await;
    let response = send(&app, empty_request(Method::DELETE, "/api/settings")).await;
    assert_eq!(body_json(response).await, json!({ "success": true }));

    let settings = body_json(send(&app, empty_request(Method::GET, "/api/settings")).await).await;
    assert_eq!(settings["general"]["appName"], "Link Directory");
    let tags = body_json(send(&app, empty_request(Method::GET, "/api/tags")).await).await;
    assert_eq!(tags, json!([]));
}

#[tokio::test]
async fn bootstrap_reports_created_documents_once() {
    let seed = Seed::empty().with_document(Resource::Tags, r#"[{"name":"infra"}]"#);
    let app = app_with(Mode::Production, seed);

    let response = send(&app, empty_request(Method::GET, "/api/bootstrap")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await["created"],
        json!(["links", "categories", "tags", "settings"])
    );

    let tags = body_json(send(&app, empty_request(Method::GET, "/api/tags")).await).await;
    assert_eq!(tags, json!([{ "name": "infra" }]));

    let response = send(&app, empty_request(Method::GET, "/api/bootstrap")).await;
    assert_eq!(body_json(response).await["created"], json!([]));
}
