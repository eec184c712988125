//! End-to-end tests for the template API over real HTTP.
//!
//! Covers the save / edit / save-as / export / retrieve lifecycle and the
//! render and import endpoints using the shared TestServer harness.

mod common;

use common::TestServer;
use mailcanvas_core::{
    parser, CanvasSize, Element, ElementKind, ElementType, LayoutMode, Position, Template,
    TemplateBody, TemplateRecord,
};
use serde_json::{json, Value};

fn canvas(elements: Vec<Element>) -> Value {
    let template = Template::with_elements(CanvasSize::new(600, 400), elements);
    serde_json::to_value(TemplateBody::Canvas(template)).expect("json")
}

#[tokio::test]
async fn test_template_lifecycle() {
    let server = TestServer::start().await;
    let client = reqwest::Client::new();

    // Save
    let created: TemplateRecord = client
        .post(server.url("/api/templates"))
        .json(&json!({
            "name": "Spring Sale",
            "api_shortcode": "spring-sale",
            "json_template": canvas(vec![Element::default_of(ElementType::Button, 0)]),
        }))
        .send()
        .await
        .expect("create")
        .error_for_status()
        .expect("201")
        .json()
        .await
        .expect("record");
    assert!(created.html.contains("Click me"));

    // Edit
    let resp = client
        .put(server.url(&format!("/api/templates/{}", created.id)))
        .json(&json!({
            "name": "Spring Sale",
            "api_shortcode": "spring-sale",
            "html": "<p>edited</p>",
        }))
        .send()
        .await
        .expect("update");
    assert_eq!(resp.status(), 200);
    let updated: TemplateRecord = resp.json().await.expect("record");
    assert_eq!(updated.created_at, created.created_at);
    assert!(updated.updated_at > created.updated_at);

    // Retrieve by shortcode returns the stored HTML verbatim
    let resp = client
        .get(server.url("/get-template?shortcode=spring-sale"))
        .send()
        .await
        .expect("get-template");
    assert_eq!(resp.status(), 200);
    assert_eq!(
        resp.headers()["content-type"],
        "text/html; charset=utf-8"
    );
    assert_eq!(resp.text().await.expect("body"), "<p>edited</p>");

    // Save-as leaves the source alone
    let resp = client
        .post(server.url(&format!("/api/templates/{}/save-as", created.id)))
        .json(&json!({ "name": "Spring Sale copy", "api_shortcode": "spring-sale-copy" }))
        .send()
        .await
        .expect("save-as");
    assert_eq!(resp.status(), 201);

    let list: Vec<TemplateRecord> = client
        .get(server.url("/api/templates"))
        .send()
        .await
        .expect("list")
        .json()
        .await
        .expect("records");
    assert_eq!(list.len(), 2);
    assert_eq!(list[0].name, "Spring Sale copy", "most recent first");

    // Delete
    let resp = client
        .delete(server.url(&format!("/api/templates/{}", created.id)))
        .send()
        .await
        .expect("delete");
    assert_eq!(resp.status(), 204);
    let resp = client
        .get(server.url("/get-template?shortcode=spring-sale"))
        .send()
        .await
        .expect("get-template");
    assert_eq!(resp.status(), 404);
    let body: Value = resp.json().await.expect("json");
    assert_eq!(body["error"], "Template not found");

    server.shutdown().await;
}

#[tokio::test]
async fn test_export_both_modes() {
    let server = TestServer::start().await;
    let client = reqwest::Client::new();

    let mut text = Element::default_of(ElementType::Text, 1);
    if let ElementKind::Text { content, .. } = &mut text.kind {
        *content = "Hello {{first_name}}".to_string();
    }
    let created: TemplateRecord = client
        .post(server.url("/api/templates"))
        .json(&json!({ "name": "Weekly  Digest", "json_template": canvas(vec![text]) }))
        .send()
        .await
        .expect("create")
        .json()
        .await
        .expect("record");

    for (mode, marker) in [("absolute", "position: relative"), ("table", "<!--[if mso]>")] {
        let resp = client
            .get(server.url(&format!(
                "/api/templates/{}/export?mode={mode}",
                created.id
            )))
            .send()
            .await
            .expect("export");
        assert_eq!(resp.status(), 200);
        assert_eq!(
            resp.headers()["content-disposition"],
            "attachment; filename=\"weekly-digest.html\""
        );
        let html = resp.text().await.expect("body");
        assert!(html.contains(marker), "{mode}");
        assert_eq!(html.matches("Hello {{first_name}}").count(), 1, "{mode}");
    }

    server.shutdown().await;
}

#[tokio::test]
async fn test_render_then_import_round_trip() {
    let server = TestServer::start().await;
    let client = reqwest::Client::new();

    let button = Element::default_of(ElementType::Button, 2).with_position(Position::new(40, 300));
    let resp: Value = client
        .post(server.url("/api/render"))
        .json(&json!({ "template": canvas(vec![button]), "mode": "absolute" }))
        .send()
        .await
        .expect("render")
        .json()
        .await
        .expect("json");
    let html = resp["html"].as_str().expect("html").to_string();
    assert_eq!(parser::parse(&html).len(), 1);

    let imported: Value = client
        .post(server.url("/api/import"))
        .json(&json!({ "html": html }))
        .send()
        .await
        .expect("import")
        .json()
        .await
        .expect("json");
    assert_eq!(imported["count"], 1);
    assert_eq!(imported["elements"][0]["type"], "button");
    assert_eq!(imported["elements"][0]["position"]["x"], 40);
    assert_eq!(imported["elements"][0]["position"]["y"], 300);

    let resp = client
        .post(server.url("/api/import"))
        .json(&json!({ "html": "   " }))
        .send()
        .await
        .expect("import");
    assert_eq!(resp.status(), 400);

    server.shutdown().await;
}

#[tokio::test]
async fn test_request_id_is_propagated() {
    let server = TestServer::start().await;
    let resp = reqwest::Client::new()
        .get(server.url("/health/live"))
        .header("x-request-id", "abc-123")
        .send()
        .await
        .expect("health");
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.headers()["x-request-id"], "abc-123");

    let resp = reqwest::get(server.url("/health")).await.expect("health");
    assert!(resp.headers().contains_key("x-request-id"));
    let body: Value = resp.json().await.expect("json");
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["checks"]["ai_design"], false);

    server.shutdown().await;
}

#[tokio::test]
async fn test_render_rejects_unknown_mode_value() {
    let server = TestServer::start().await;
    let resp = reqwest::Client::new()
        .post(server.url("/api/render"))
        .json(&json!({ "template": canvas(vec![]), "mode": LayoutMode::Table }))
        .send()
        .await
        .expect("render");
    assert_eq!(resp.status(), 200);

    let resp = reqwest::Client::new()
        .post(server.url("/api/render"))
        .json(&json!({ "template": canvas(vec![]), "mode": "grid" }))
        .send()
        .await
        .expect("render");
    assert!(resp.status().is_client_error());

    server.shutdown().await;
}
