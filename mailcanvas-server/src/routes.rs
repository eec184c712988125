//! API route handlers.

use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use mailcanvas_core::{
    export_file_name, generate, generate_structured, parser, DesignRequest, DesignResponse,
    Element, LayoutMode, TemplateBody, TemplateDraft, TemplateRecord,
};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::metrics;
use crate::validation::{
    require_shortcode, validate_canvas_size, validate_element_count, validate_html,
    validate_html_len, validate_name, validate_prompt, validate_shortcode, validate_template_id,
};
use crate::AppState;

/// Query for the template list.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    /// Case-insensitive name filter.
    #[serde(default)]
    pub q: Option<String>,
}

/// Body for creating or replacing a template.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SaveTemplateRequest {
    /// Display name.
    pub name: String,
    /// Retrieval shortcode.
    #[serde(default)]
    pub api_shortcode: Option<String>,
    /// Pre-rendered HTML. Generated from `json_template` when absent.
    #[serde(default)]
    pub html: Option<String>,
    /// Editable source document.
    #[serde(default)]
    pub json_template: Option<TemplateBody>,
    /// Layout mode used when generating HTML from a canvas document.
    #[serde(default)]
    pub mode: Option<LayoutMode>,
}

/// Body for save-as.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SaveAsRequest {
    /// Name of the copy.
    pub name: String,
    /// Shortcode of the copy.
    pub api_shortcode: String,
}

/// Query for export and render mode selection.
#[derive(Debug, Default, Deserialize)]
pub struct ModeParams {
    /// `absolute` (default) or `table`.
    #[serde(default)]
    pub mode: Option<String>,
}

/// Body for `/api/render`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderRequest {
    /// Document to render.
    pub template: TemplateBody,
    /// Layout mode for canvas documents.
    #[serde(default)]
    pub mode: LayoutMode,
    /// Placeholder values for structured documents.
    #[serde(default)]
    pub test_data: Option<HashMap<String, String>>,
}

/// Rendered document.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RenderResponse {
    /// Complete HTML document.
    pub html: String,
}

/// Body for `/api/import`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ImportRequest {
    /// Markup to import.
    pub html: String,
}

/// Imported elements.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ImportResponse {
    /// Number of elements recognized.
    pub count: usize,
    /// Elements in creation order.
    pub elements: Vec<Element>,
}

/// Query for shortcode retrieval.
#[derive(Debug, Default, Deserialize)]
pub struct ShortcodeParams {
    /// Shortcode to look up.
    #[serde(default)]
    pub shortcode: Option<String>,
}

fn parse_mode(params: &ModeParams) -> Result<LayoutMode, ApiError> {
    match params.mode.as_deref().map(str::trim).filter(|m| !m.is_empty()) {
        None => Ok(LayoutMode::default()),
        Some(raw) => LayoutMode::parse(raw)
            .ok_or_else(|| ApiError::BadRequest(format!("Unknown layout mode: {raw}"))),
    }
}

/// Render a stored or submitted document.
fn render_body(
    body: &TemplateBody,
    mode: LayoutMode,
    test_data: Option<&HashMap<String, String>>,
) -> String {
    match body {
        TemplateBody::Canvas(template) => generate(template, mode),
        TemplateBody::Structured(template) => generate_structured(template, test_data),
    }
}

fn validate_body(body: &TemplateBody) -> Result<(), ApiError> {
    match body {
        TemplateBody::Canvas(template) => {
            validate_element_count(template.element_count())?;
            validate_canvas_size(template.canvas_size)?;
        }
        TemplateBody::Structured(template) => template.validate()?,
    }
    Ok(())
}

/// Validate a save request and turn it into a store draft.
fn draft_from(request: SaveTemplateRequest) -> Result<TemplateDraft, ApiError> {
    validate_name(&request.name)?;
    validate_shortcode(request.api_shortcode.as_deref())?;
    if let Some(body) = &request.json_template {
        validate_body(body)?;
    }

    let html = match (request.html, &request.json_template) {
        (Some(html), _) if !html.trim().is_empty() => html,
        (_, Some(body)) => render_body(body, request.mode.unwrap_or_default(), None),
        (html, None) => html.unwrap_or_default(),
    };
    validate_html(&html)?;

    Ok(TemplateDraft {
        name: request.name,
        api_shortcode: request.api_shortcode,
        html,
        json_template: request.json_template,
    })
}

/// List templates, most recently updated first.
#[tracing::instrument(name = "list_templates", skip(state))]
pub async fn list_templates(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Json<Vec<TemplateRecord>> {
    let records = match params.q.as_deref() {
        Some(query) => state.store.search(query),
        None => state.store.list(),
    };
    Json(records)
}

/// Save a new template.
#[tracing::instrument(name = "create_template", skip(state, request), fields(name = %request.name))]
pub async fn create_template(
    State(state): State<AppState>,
    Json(request): Json<SaveTemplateRequest>,
) -> Result<(StatusCode, Json<TemplateRecord>), ApiError> {
    let record = state.store.insert(draft_from(request)?)?;
    tracing::info!(id = %record.id, "Template created");
    metrics::record_template_saved("insert");
    metrics::set_templates_stored(state.store.len());
    Ok((StatusCode::CREATED, Json(record)))
}

/// Fetch one template.
#[tracing::instrument(name = "get_template", skip(state))]
pub async fn get_template(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<TemplateRecord>, ApiError> {
    validate_template_id(&id)?;
    state
        .store
        .get(&id)
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Template not found: {id}")))
}

/// Replace a template's contents.
#[tracing::instrument(name = "update_template", skip(state, request))]
pub async fn update_template(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<SaveTemplateRequest>,
) -> Result<Json<TemplateRecord>, ApiError> {
    validate_template_id(&id)?;
    let record = state.store.update(&id, draft_from(request)?)?;
    tracing::info!(id = %record.id, "Template updated");
    metrics::record_template_saved("update");
    Ok(Json(record))
}

/// Delete a template.
#[tracing::instrument(name = "delete_template", skip(state))]
pub async fn delete_template(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    validate_template_id(&id)?;
    state.store.delete(&id)?;
    tracing::info!(id = %id, "Template deleted");
    metrics::record_template_deleted();
    metrics::set_templates_stored(state.store.len());
    Ok(StatusCode::NO_CONTENT)
}

/// Copy a template under a new name and shortcode. The source is untouched.
#[tracing::instrument(name = "save_template_as", skip(state, request))]
pub async fn save_template_as(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<SaveAsRequest>,
) -> Result<(StatusCode, Json<TemplateRecord>), ApiError> {
    validate_template_id(&id)?;
    validate_name(&request.name)?;
    require_shortcode(Some(&request.api_shortcode))?;

    let source = state
        .store
        .get(&id)
        .ok_or_else(|| ApiError::NotFound(format!("Template not found: {id}")))?;
    let mut json_template = source.json_template;
    if let Some(TemplateBody::Structured(structured)) = &mut json_template {
        structured.name = request.name.trim().to_string();
        structured.api_shortcode = Some(request.api_shortcode.trim().to_string());
    }

    let record = state.store.insert(TemplateDraft {
        name: request.name,
        api_shortcode: Some(request.api_shortcode),
        html: source.html,
        json_template,
    })?;
    tracing::info!(source = %id, id = %record.id, "Template saved as copy");
    metrics::record_template_saved("save_as");
    metrics::set_templates_stored(state.store.len());
    Ok((StatusCode::CREATED, Json(record)))
}

/// Download a template as an `.html` file.
///
/// Canvas documents are regenerated in the requested mode; everything else
/// is served as stored.
#[tracing::instrument(name = "export_template", skip(state, params))]
pub async fn export_template(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<ModeParams>,
) -> Result<Response, ApiError> {
    validate_template_id(&id)?;
    let mode = parse_mode(&params)?;
    let record = state
        .store
        .get(&id)
        .ok_or_else(|| ApiError::NotFound(format!("Template not found: {id}")))?;

    let html = match &record.json_template {
        Some(body @ TemplateBody::Canvas(_)) => render_body(body, mode, None),
        _ => record.html,
    };
    metrics::record_render(mode.as_str());

    let disposition = format!(
        "attachment; filename=\"{}\"",
        export_file_name(&record.name)
    );
    Ok((
        [
            (header::CONTENT_TYPE, "text/html; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        html,
    )
        .into_response())
}

/// Render a submitted document without saving it.
#[tracing::instrument(name = "render", skip(request), fields(mode = %request.mode))]
pub async fn render(Json(request): Json<RenderRequest>) -> Result<Json<RenderResponse>, ApiError> {
    validate_body(&request.template)?;
    let html = render_body(&request.template, request.mode, request.test_data.as_ref());
    metrics::record_render(request.mode.as_str());
    Ok(Json(RenderResponse { html }))
}

/// Import arbitrary HTML as canvas elements.
#[tracing::instrument(name = "import_html", skip(request))]
pub async fn import_html(
    Json(request): Json<ImportRequest>,
) -> Result<Json<ImportResponse>, ApiError> {
    validate_html_len(&request.html)?;
    let elements = parser::import(&request.html).inspect_err(|_| {
        metrics::record_import("empty");
    })?;
    tracing::info!(count = elements.len(), "Imported HTML");
    metrics::record_import("found");
    Ok(Json(ImportResponse {
        count: elements.len(),
        elements,
    }))
}

/// Generate a layout from a prompt via the AI gateway.
///
/// Only one generation runs at a time; a concurrent request gets `409`.
#[tracing::instrument(name = "design", skip(state, request))]
pub async fn design(
    State(state): State<AppState>,
    Json(request): Json<DesignRequest>,
) -> Result<Json<DesignResponse>, ApiError> {
    validate_prompt(&request.prompt)?;
    validate_canvas_size(request.canvas_size)?;
    let Some(client) = state.design.as_ref() else {
        metrics::record_design_generation("unavailable");
        return Err(ApiError::DesignUnavailable);
    };
    let Some(_permit) = state.try_begin_design() else {
        metrics::record_design_generation("busy");
        return Err(ApiError::DesignBusy);
    };

    match client.design(&request).await {
        Ok(response) => {
            tracing::info!(count = response.elements.len(), "Design generated");
            metrics::record_design_generation("success");
            Ok(Json(response))
        }
        Err(err) => {
            metrics::record_design_generation("error");
            Err(err.into())
        }
    }
}

/// Serve a template's stored HTML by shortcode.
#[tracing::instrument(name = "get_template_by_shortcode", skip(state))]
pub async fn get_template_by_shortcode(
    State(state): State<AppState>,
    Query(params): Query<ShortcodeParams>,
) -> Result<Response, ApiError> {
    let shortcode = params
        .shortcode
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(ApiError::MissingParameter("shortcode"))?;

    let record = state.store.find_by_shortcode(shortcode);
    metrics::record_shortcode_lookup(record.is_some());
    let record = record.ok_or_else(|| ApiError::NotFound("Template not found".into()))?;

    tracing::debug!(shortcode, id = %record.id, "Serving template HTML");
    Ok((
        [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
        record.html,
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use mailcanvas_core::{CanvasSize, ElementType, StructuredTemplate, Template, TemplateStore};
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app() -> (axum::Router, AppState) {
        let state = AppState::new(TemplateStore::new(), None);
        (crate::build_router(state.clone()), state)
    }

    async fn send(app: &axum::Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = app.clone().oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        (status, bytes.to_vec())
    }

    fn json_request(method: &str, uri: &str, body: &Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request")
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).expect("request")
    }

    fn canvas_body() -> Value {
        let mut template = Template::new(CanvasSize::new(600, 400));
        template.add_element(Element::default_of(ElementType::Button, 0));
        serde_json::to_value(TemplateBody::Canvas(template)).expect("json")
    }

    #[tokio::test]
    async fn create_generates_html_from_canvas() {
        let (app, state) = app();
        let (status, body) = send(
            &app,
            json_request(
                "POST",
                "/api/templates",
                &json!({ "name": "Promo", "api_shortcode": "promo", "json_template": canvas_body() }),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        let record: TemplateRecord = serde_json::from_slice(&body).expect("record");
        assert!(record.html.contains("Click me"));
        assert_eq!(state.store.len(), 1);
    }

    #[tokio::test]
    async fn create_rejects_blank_name_and_empty_html() {
        let (app, state) = app();
        let (status, body) = send(
            &app,
            json_request("POST", "/api/templates", &json!({ "name": " ", "html": "<p/>" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let error: Value = serde_json::from_slice(&body).expect("json");
        assert_eq!(error["error"], "Please enter a template name");

        let (status, _) = send(
            &app,
            json_request("POST", "/api/templates", &json!({ "name": "Empty" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(state.store.is_empty());
    }

    #[tokio::test]
    async fn duplicate_shortcode_conflicts() {
        let (app, _) = app();
        let body = json!({ "name": "A", "api_shortcode": "same", "html": "<p>a</p>" });
        let (first, _) = send(&app, json_request("POST", "/api/templates", &body)).await;
        let (second, _) = send(&app, json_request("POST", "/api/templates", &body)).await;
        assert_eq!(first, StatusCode::CREATED);
        assert_eq!(second, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn unknown_template_is_404_and_bad_id_is_400() {
        let (app, _) = app();
        let (status, _) = send(&app, get("/api/templates/does-not-exist")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(&app, get("/api/templates/bad%20id")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn save_as_copies_structured_body() {
        let (app, state) = app();
        let structured = StructuredTemplate::default();
        let source = state
            .store
            .insert(
                TemplateDraft::new("Original", "<p>x</p>")
                    .with_shortcode("orig")
                    .with_body(TemplateBody::Structured(structured)),
            )
            .expect("insert");

        let (status, body) = send(
            &app,
            json_request(
                "POST",
                &format!("/api/templates/{}/save-as", source.id),
                &json!({ "name": "Copy", "api_shortcode": "orig-copy" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let copy: TemplateRecord = serde_json::from_slice(&body).expect("record");
        assert_ne!(copy.id, source.id);
        assert_eq!(copy.html, source.html);
        match copy.json_template {
            Some(TemplateBody::Structured(t)) => {
                assert_eq!(t.name, "Copy");
                assert_eq!(t.api_shortcode.as_deref(), Some("orig-copy"));
            }
            other => panic!("unexpected body: {other:?}"),
        }
        assert_eq!(state.store.len(), 2);
    }

    #[tokio::test]
    async fn save_as_requires_shortcode() {
        let (app, state) = app();
        let source = state
            .store
            .insert(TemplateDraft::new("Original", "<p>x</p>"))
            .expect("insert");
        let (status, _) = send(
            &app,
            json_request(
                "POST",
                &format!("/api/templates/{}/save-as", source.id),
                &json!({ "name": "Copy", "api_shortcode": "  " }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn export_sets_file_name_and_mode() {
        let (app, _) = app();
        let (_, body) = send(
            &app,
            json_request(
                "POST",
                "/api/templates",
                &json!({ "name": "Spring Sale", "json_template": canvas_body() }),
            ),
        )
        .await;
        let record: TemplateRecord = serde_json::from_slice(&body).expect("record");

        let response = app
            .clone()
            .oneshot(get(&format!("/api/templates/{}/export?mode=table", record.id)))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"spring-sale.html\""
        );
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        assert!(String::from_utf8_lossy(&bytes).contains("<!--[if mso]>"));

        let (status, _) = send(
            &app,
            get(&format!("/api/templates/{}/export?mode=grid", record.id)),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn render_structured_with_test_data() {
        let (app, _) = app();
        let mut structured = StructuredTemplate::default();
        structured.hero.headline = "Hi {{first_name}}".to_string();
        let (status, body) = send(
            &app,
            json_request(
                "POST",
                "/api/render",
                &json!({
                    "template": structured,
                    "testData": { "first_name": "Ada" }
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let rendered: RenderResponse = serde_json::from_slice(&body).expect("json");
        assert!(rendered.html.contains("Hi Ada"));
    }

    #[tokio::test]
    async fn import_reports_nothing_found() {
        let (app, _) = app();
        let (status, body) = send(
            &app,
            json_request("POST", "/api/import", &json!({ "html": "<script>x()</script>" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        let error: Value = serde_json::from_slice(&body).expect("json");
        assert_eq!(error["error"], "No elements found in the provided HTML");

        let (status, body) = send(
            &app,
            json_request("POST", "/api/import", &json!({ "html": "<p>Hello</p>" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let imported: ImportResponse = serde_json::from_slice(&body).expect("json");
        assert_eq!(imported.count, 1);
    }

    #[tokio::test]
    async fn design_without_key_is_unavailable() {
        let (app, _) = app();
        let (status, _) = send(
            &app,
            json_request(
                "POST",
                "/api/design",
                &json!({ "prompt": "A newsletter", "canvasSize": { "width": 600, "height": 800 } }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn shortcode_retrieval() {
        let (app, state) = app();
        state
            .store
            .insert(TemplateDraft::new("Promo", "<p>promo</p>").with_shortcode("promo"))
            .expect("insert");

        let response = app
            .clone()
            .oneshot(get("/get-template?shortcode=promo"))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/html; charset=utf-8"
        );
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        assert_eq!(&bytes[..], b"<p>promo</p>");

        let (status, body) = send(&app, get("/get-template")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let error: Value = serde_json::from_slice(&body).expect("json");
        assert_eq!(error["error"], "Missing shortcode parameter");

        let (status, body) = send(&app, get("/get-template?shortcode=nope")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let error: Value = serde_json::from_slice(&body).expect("json");
        assert_eq!(error["error"], "Template not found");
    }

    #[tokio::test]
    async fn list_filters_by_query() {
        let (app, state) = app();
        state
            .store
            .insert(TemplateDraft::new("Spring Sale", "<p/>"))
            .expect("insert");
        state
            .store
            .insert(TemplateDraft::new("Welcome", "<p/>"))
            .expect("insert");

        let (_, body) = send(&app, get("/api/templates?q=sale")).await;
        let records: Vec<TemplateRecord> = serde_json::from_slice(&body).expect("json");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "Spring Sale");

        let (_, body) = send(&app, get("/api/templates")).await;
        let records: Vec<TemplateRecord> = serde_json::from_slice(&body).expect("json");
        assert_eq!(records.len(), 2);
    }
}
