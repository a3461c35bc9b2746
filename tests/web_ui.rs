mod common;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use common::{nda_knowledge, NoWebResults, ScriptedProvider, ScriptedStore, SearchMode, DIMENSIONS, NDA_PDF};
use rust_legal_agent::api::{create_api, AppState, ProviderFactory};
use rust_legal_agent::config::AppConfig;
use rust_legal_agent::database::{ContentsDb, InMemoryStore, VectorStore};
use rust_legal_agent::providers::CompletionProvider;
use std::sync::Arc;
use tower::ServiceExt;

fn test_config() -> AppConfig {
    AppConfig {
        embedding_dimensions: DIMENSIONS,
        ..AppConfig::default()
    }
}

async fn app_state_with(
    provider: Arc<ScriptedProvider>,
    store: Arc<dyn VectorStore>,
    config: AppConfig,
) -> AppState {
    let contents = ContentsDb::in_memory().await.unwrap();
    let factory: ProviderFactory =
        Arc::new(move |_key: &str| anyhow::Ok(provider.clone() as Arc<dyn CompletionProvider>));
    AppState::new(config, store, contents, Arc::new(NoWebResults)).with_provider_factory(factory)
}

async fn app_state(provider: Arc<ScriptedProvider>) -> AppState {
    app_state_with(provider, Arc::new(InMemoryStore::new()), test_config()).await
}

/// Session that already holds an indexed NDA; returns its cookie header.
async fn session_with_document(state: &AppState, provider: Arc<ScriptedProvider>) -> String {
    let (id, session) = state.sessions().get_or_create(None);
    let mut session = session.lock().await;
    session.api_key = Some("test-key".to_string());
    session.knowledge = Some(nda_knowledge(provider).await);
    session.mark_processed("nda.pdf");
    format!("legal_session={}", id)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Option<String>, String) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.split(';').next().unwrap_or_default().to_string());
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, cookie, String::from_utf8(body.to_vec()).unwrap())
}

const BOUNDARY: &str = "XBOUNDARY";

fn upload_request(cookie: Option<&str>, file_name: &str, content_type: &str, bytes: &[u8]) -> Request<Body> {
    let mut body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"chunk_size\"\r\n\r\n500\r\n\
         --{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{name}\"\r\n\
         Content-Type: {ct}\r\n\r\n",
        b = BOUNDARY,
        name = file_name,
        ct = content_type
    )
    .into_bytes();
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());

    let mut request = Request::builder()
        .method("POST")
        .uri("/upload")
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={}", BOUNDARY));
    if let Some(cookie) = cookie {
        request = request.header(header::COOKIE, cookie);
    }
    request.body(Body::from(body)).unwrap()
}

async fn new_session(app: &Router) -> String {
    let (_, cookie, _) = send(app, Request::get("/").body(Body::empty()).unwrap()).await;
    cookie.unwrap()
}

fn form(uri: &str, cookie: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::COOKIE, cookie)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_health_reports_vector_store() {
    let state = app_state(Arc::new(ScriptedProvider::new())).await;
    let app = create_api(state);

    let (status, _, body) = send(&app, Request::get("/health").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["vector_store"], "in-memory");
}

#[tokio::test]
async fn test_api_key_flow() {
    let state = app_state(Arc::new(ScriptedProvider::new())).await;
    let app = create_api(state);

    let (status, cookie, body) = send(&app, Request::get("/").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Please enter your API key to proceed."));
    assert!(!body.contains("Select Analysis Type"));
    let cookie = cookie.unwrap();
    assert!(cookie.starts_with("legal_session="));

    let (_, _, body) = send(&app, form("/config", &cookie, "api_key=secret")).await;
    assert!(body.contains("API key entered successfully!"));

    let (_, _, body) = send(&app, form("/config", &cookie, "api_key=")).await;
    assert!(body.contains("Please enter your API key to proceed."));
}

#[tokio::test]
async fn test_upload_rejects_non_pdf() {
    let state = app_state(Arc::new(ScriptedProvider::new())).await;
    let app = create_api(state);

    let request = upload_request(None, "notes.txt", "text/plain", b"not a pdf");
    let (status, _, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Error processing document: notes.txt is not a PDF document"));
    assert!(body.contains("value=\"500\""));
    assert!(!body.contains("Select Analysis Type"));
}

#[tokio::test]
async fn test_upload_indexes_file_once_per_session() {
    let store = Arc::new(ScriptedStore::new(SearchMode::Normal));
    let state = app_state_with(Arc::new(ScriptedProvider::new()), store.clone(), test_config()).await;
    let app = create_api(state);
    let cookie = new_session(&app).await;

    let (_, _, body) = send(&app, upload_request(Some(&cookie), "nda.pdf", "application/pdf", NDA_PDF)).await;
    assert!(body.contains("✅ Document processed and stored in knowledge base! Found 1 chunks."));
    assert!(body.contains("Select Analysis Type"));
    assert!(body.contains("nda.pdf"));
    assert_eq!(store.count("law").await.unwrap(), 1);

    let (_, _, body) = send(&app, upload_request(Some(&cookie), "nda.pdf", "application/pdf", NDA_PDF)).await;
    assert!(!body.contains("✅ Document processed"));
    assert!(body.contains("Select Analysis Type"));
    assert_eq!(store.count("law").await.unwrap(), 1);
}

#[tokio::test]
async fn test_upload_warns_when_search_finds_nothing() {
    let store = Arc::new(ScriptedStore::new(SearchMode::Empty));
    let state = app_state_with(Arc::new(ScriptedProvider::new()), store.clone(), test_config()).await;
    let app = create_api(state);

    let (_, _, body) = send(&app, upload_request(None, "nda.pdf", "application/pdf", NDA_PDF)).await;
    assert!(body.contains("⚠️ Document uploaded but no content found in search. Check if PDF is readable."));
    assert!(!body.contains("✅ Document processed"));
    assert_eq!(store.count("law").await.unwrap(), 1);
}

#[tokio::test]
async fn test_upload_notes_failed_verification() {
    let store = Arc::new(ScriptedStore::new(SearchMode::Failing));
    let state = app_state_with(Arc::new(ScriptedProvider::new()), store, test_config()).await;
    let app = create_api(state);

    let (_, _, body) = send(&app, upload_request(None, "nda.pdf", "application/pdf", NDA_PDF)).await;
    assert!(body.contains("✅ Document processed and stored in knowledge base!"));
    assert!(!body.contains("Found 1 chunks"));
    assert!(body.contains("Note: Could not verify content (Operation failed: search timed out)"));
    // the document is still usable for analysis
    assert!(body.contains("Select Analysis Type"));
}

#[tokio::test]
async fn test_sessions_are_bounded() {
    let config = AppConfig {
        max_sessions: 4,
        ..test_config()
    };
    let state = app_state_with(Arc::new(ScriptedProvider::new()), Arc::new(InMemoryStore::new()), config).await;
    let app = create_api(state.clone());

    for _ in 0..10 {
        send(&app, Request::get("/").body(Body::empty()).unwrap()).await;
    }
    assert_eq!(state.sessions().len(), 4);
}

#[tokio::test]
async fn test_analyze_requires_document() {
    let state = app_state(Arc::new(ScriptedProvider::new())).await;
    let app = create_api(state);

    let (_, cookie, _) = send(&app, Request::get("/").body(Body::empty()).unwrap()).await;
    let (_, _, body) = send(&app, form("/analyze", &cookie.unwrap(), "analysis_type=Contract+Review")).await;
    assert!(body.contains("Please upload a legal document first."));
}

#[tokio::test]
async fn test_analyze_renders_report() {
    let provider = Arc::new(ScriptedProvider::new());
    let state = app_state(provider.clone()).await;
    let cookie = session_with_document(&state, provider.clone()).await;
    let app = create_api(state);

    let (status, _, body) = send(&app, form("/analyze", &cookie, "analysis_type=Contract+Review")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Knowledge base search found"));
    assert!(body.contains("teamlead analysis of the agreement"));
    assert!(body.contains("Client should negotiate the cap."));
    assert!(body.contains("background:#fee2e2"));
    assert!(body.contains("background:#dcfce7"));
    assert!(body.contains("✅ Clear payment terms"));
    assert!(body.contains("💡 Cap liability at fees paid"));
    assert!(body.contains("<option value=\"Contract Review\" selected>"));

    // the report is not kept between renders
    let (_, _, body) = send(&app, Request::get("/").header(header::COOKIE, &cookie).body(Body::empty()).unwrap()).await;
    assert!(!body.contains("Client should negotiate the cap."));
    assert!(body.contains("Select Analysis Type"));
}

#[tokio::test]
async fn test_custom_query_chat() {
    let provider = Arc::new(ScriptedProvider::new());
    let state = app_state(provider.clone()).await;
    let cookie = session_with_document(&state, provider.clone()).await;
    let app = create_api(state);

    let (_, _, body) = send(&app, form("/analyze", &cookie, "analysis_type=Custom+Query")).await;
    assert!(body.contains("Custom Query Chat"));
    assert!(provider.calls().is_empty());

    let (_, _, body) = send(&app, form("/chat", &cookie, "message=Who+bears+liability%3F")).await;
    assert!(body.contains("Who bears liability?"));
    assert!(body.contains("LegalAdvisor analysis of the agreement"));

    let (_, _, body) = send(&app, form("/chat", &cookie, "message=")).await;
    assert!(body.contains("Please enter a question"));

    let (_, _, body) = send(&app, form("/chat/clear", &cookie, "")).await;
    assert!(body.contains("Custom Query Chat"));
    assert!(!body.contains("Who bears liability?"));
}
