use axum::{
    extract::{Multipart, State},
    response::{Html, IntoResponse},
    Form, Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use validator::Validate;

use super::views::render_page;
use super::{ApiError, AppState};
use crate::agents::LegalTeam;
use crate::analysis::{build_report, AnalysisReport, AnalysisType, NO_RESPONSE};
use crate::config::ChunkingParams;
use crate::document::DocumentChunking;
use crate::knowledge::KnowledgeBase;
use crate::session::{Notice, Role, Session, SESSION_COOKIE};

type PageResult = Result<(CookieJar, Html<String>), ApiError>;

#[derive(Deserialize)]
pub struct ApiKeyForm {
    #[serde(default)]
    api_key: String,
}

#[derive(Deserialize)]
pub struct AnalyzeForm {
    analysis_type: String,
}

#[derive(Deserialize, Validate)]
pub struct ChatForm {
    #[validate(length(min = 1, max = 4000))]
    message: String,
}

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    vector_store: &'static str,
    sessions: usize,
}

fn session_for(state: &AppState, jar: CookieJar) -> (CookieJar, Arc<Mutex<Session>>) {
    let (id, session) = state
        .sessions
        .get_or_create(jar.get(SESSION_COOKIE).map(|c| c.value()));
    let cookie = Cookie::build((SESSION_COOKIE, id.to_string()))
        .path("/")
        .http_only(true)
        .build();
    (jar.add(cookie), session)
}

async fn page(
    state: &AppState,
    jar: CookieJar,
    session: &mut Session,
    report: Option<AnalysisReport>,
) -> PageResult {
    let html = render_page(state, session, report).await?;
    Ok((jar, Html(html)))
}

fn build_team(state: &AppState, session: &Session) -> anyhow::Result<Option<LegalTeam>> {
    let Some(knowledge) = session.knowledge.clone() else {
        return Ok(None);
    };
    let api_key = session.api_key.as_deref().unwrap_or_default();
    let provider = (state.providers)(api_key)?;
    Ok(Some(LegalTeam::new(
        provider.as_ref(),
        knowledge,
        state.web_search.clone(),
        &state.config,
    )))
}

pub async fn index(State(state): State<AppState>, jar: CookieJar) -> PageResult {
    let (jar, session) = session_for(&state, jar);
    let mut session = session.lock().await;
    page(&state, jar, &mut session, None).await
}

pub async fn set_api_key(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<ApiKeyForm>,
) -> PageResult {
    let (jar, session) = session_for(&state, jar);
    let mut session = session.lock().await;
    let key = form.api_key.trim();
    session.api_key = if key.is_empty() { None } else { Some(key.to_string()) };
    info!("Session {} API key {}", session.id, if key.is_empty() { "cleared" } else { "set" });
    page(&state, jar, &mut session, None).await
}

pub async fn upload(
    State(state): State<AppState>,
    jar: CookieJar,
    mut multipart: Multipart,
) -> PageResult {
    let (jar, session) = session_for(&state, jar);
    let mut session = session.lock().await;

    let mut file: Option<(String, Vec<u8>)> = None;
    let mut chunk_size = None;
    let mut overlap = None;
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await?;
                if !file_name.is_empty() {
                    file = Some((file_name, bytes.to_vec()));
                }
            }
            Some("chunk_size") => chunk_size = Some(field.text().await?),
            Some("overlap") => overlap = Some(field.text().await?),
            _ => {}
        }
    }

    session.chunking = ChunkingParams::from_form(chunk_size.as_deref(), overlap.as_deref());

    match file {
        Some((file_name, bytes)) if !session.is_processed(&file_name) => {
            process_document(&state, &mut session, &file_name, bytes).await;
        }
        Some((file_name, _)) => info!("{} already processed for session {}", file_name, session.id),
        None => session.notify(Notice::warning("Please choose a PDF document to upload.")),
    }

    page(&state, jar, &mut session, None).await
}

async fn process_document(state: &AppState, session: &mut Session, file_name: &str, bytes: Vec<u8>) {
    let result = async {
        let api_key = session.api_key.as_deref().unwrap_or_default();
        let embedder = (state.providers)(api_key)?;
        state
            .store
            .ensure_collection(&state.config.collection, state.config.embedding_dimensions)
            .await?;

        let knowledge = Arc::new(KnowledgeBase::new(
            &state.config.collection,
            state.store.clone(),
            embedder,
            state.contents.clone(),
        ));
        let report = knowledge
            .add_content(file_name, bytes, DocumentChunking::new(session.chunking))
            .await?;
        anyhow::Ok((knowledge, report))
    }
    .await;

    let (knowledge, report) = match result {
        Ok(done) => done,
        Err(e) => {
            error!("Failed to process {}: {}", file_name, e);
            session.notify(Notice::error(format!("Error processing document: {}", e)));
            return;
        }
    };
    info!("Stored {} chunks from {}", report.chunk_count, report.file_name);

    match knowledge.verify(state.config.knowledge_results).await {
        Ok(hits) if !hits.is_empty() => session.notify(Notice::success(format!(
            "✅ Document processed and stored in knowledge base! Found {} chunks.",
            hits.len()
        ))),
        Ok(_) => session.notify(Notice::warning(
            "⚠️ Document uploaded but no content found in search. Check if PDF is readable.",
        )),
        Err(e) => {
            warn!("Could not verify {}: {}", file_name, e);
            session.notify(Notice::success("✅ Document processed and stored in knowledge base!"));
            session.notify(Notice::info(format!("Note: Could not verify content ({})", e)));
        }
    }

    session.knowledge = Some(knowledge);
    session.mark_processed(file_name);
}

pub async fn analyze(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<AnalyzeForm>,
) -> PageResult {
    let (jar, session) = session_for(&state, jar);
    let mut session = session.lock().await;

    let analysis_type = match form.analysis_type.parse::<AnalysisType>() {
        Ok(t) => t,
        Err(e) => {
            session.notify(Notice::error(e));
            return page(&state, jar, &mut session, None).await;
        }
    };
    session.selected_analysis = analysis_type;

    let Some(query) = analysis_type.predefined_query() else {
        return page(&state, jar, &mut session, None).await;
    };

    let team = match build_team(&state, &session) {
        Ok(Some(team)) => team,
        Ok(None) => {
            session.notify(Notice::warning("Please upload a legal document first."));
            return page(&state, jar, &mut session, None).await;
        }
        Err(e) => {
            session.notify(Notice::error(format!("Error during analysis: {}", e)));
            return page(&state, jar, &mut session, None).await;
        }
    };

    info!("Session {} running {}", session.id, analysis_type);
    let report = match build_report(&team, analysis_type, query).await {
        Ok(report) => {
            if let Some(note) = &report.precheck_note {
                session.notify(Notice::info(note.clone()));
            }
            Some(report)
        }
        Err(e) => {
            error!("Analysis failed: {}", e);
            session.notify(Notice::error(format!("Error during analysis: {}", e)));
            None
        }
    };

    page(&state, jar, &mut session, report).await
}

pub async fn chat(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<ChatForm>,
) -> PageResult {
    let (jar, session) = session_for(&state, jar);
    let mut session = session.lock().await;
    session.selected_analysis = AnalysisType::CustomQuery;

    if form.validate().is_err() {
        session.notify(Notice::warning("Please enter a question of at most 4000 characters."));
        return page(&state, jar, &mut session, None).await;
    }

    let team = match build_team(&state, &session) {
        Ok(Some(team)) => team,
        Ok(None) => {
            session.notify(Notice::warning("Please upload a legal document first."));
            return page(&state, jar, &mut session, None).await;
        }
        Err(e) => {
            session.notify(Notice::error(format!("Error answering question: {}", e)));
            return page(&state, jar, &mut session, None).await;
        }
    };

    session.push_message(Role::User, form.message.clone());
    match team.chat(&form.message).await {
        Ok(response) => {
            let content = response.content_or(NO_RESPONSE).to_string();
            session.push_message(Role::Assistant, content);
        }
        Err(e) => {
            error!("Chat failed: {}", e);
            session.notify(Notice::error(format!("Error answering question: {}", e)));
        }
    }

    page(&state, jar, &mut session, None).await
}

pub async fn clear_chat(State(state): State<AppState>, jar: CookieJar) -> PageResult {
    let (jar, session) = session_for(&state, jar);
    let mut session = session.lock().await;
    session.clear_chat();
    session.selected_analysis = AnalysisType::CustomQuery;
    page(&state, jar, &mut session, None).await
}

pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        vector_store: state.store.backend(),
        sessions: state.sessions.len(),
    })
}
