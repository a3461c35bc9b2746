use askama::Template;
use log::warn;
use pulldown_cmark::{html, Options, Parser};

use super::{ApiError, AppState};
use crate::analysis::{
    AnalysisReport, AnalysisType, NO_CLAUSES, NO_CLIENT_VIEW, NO_ISSUING_VIEW, NO_RECOMMENDATIONS,
    NO_RESPONSE, NO_STRENGTHS, NO_WEAKNESSES,
};
use crate::config::{CHUNK_SIZE_RANGE, OVERLAP_RANGE};
use crate::session::{NoticeLevel, Role, Session};

/// Agent output is untrusted: rendered from markdown, then sanitized.
pub fn markdown_to_html(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let mut rendered = String::new();
    html::push_html(&mut rendered, Parser::new_ext(markdown, options));
    ammonia::clean(&rendered)
}

fn markdown_or(markdown: &str, placeholder: &str) -> String {
    if markdown.trim().is_empty() {
        markdown_to_html(placeholder)
    } else {
        markdown_to_html(markdown)
    }
}

struct NoticeView {
    class: &'static str,
    text: String,
}

struct ContentView {
    name: String,
    chunk_count: usize,
    created_at: String,
}

struct OptionView {
    label: &'static str,
    selected: bool,
}

struct ChatView {
    role: &'static str,
    html: String,
}

struct ClauseView {
    html: String,
    boxed: bool,
    icon: &'static str,
    background: &'static str,
    border: &'static str,
}

struct ListView {
    items: Vec<String>,
    placeholder: &'static str,
}

impl ListView {
    fn new(icon: &'static str, lines: &[String], placeholder: &'static str) -> Self {
        Self {
            items: lines
                .iter()
                .map(|line| markdown_to_html(&format!("{} {}", icon, line)))
                .collect(),
            placeholder,
        }
    }
}

struct ReportView {
    label: &'static str,
    summary_html: String,
    client_html: String,
    issuing_html: String,
    clauses: Vec<ClauseView>,
    clauses_placeholder: &'static str,
    strengths: ListView,
    weaknesses: ListView,
    recommendations: ListView,
}

impl From<AnalysisReport> for ReportView {
    fn from(report: AnalysisReport) -> Self {
        let clauses = report
            .clauses
            .iter()
            .map(|clause| match clause.level {
                Some(level) => ClauseView {
                    html: markdown_to_html(&clause.text),
                    boxed: true,
                    icon: level.icon(),
                    background: level.background(),
                    border: level.border(),
                },
                None => ClauseView {
                    html: markdown_to_html(&clause.text),
                    boxed: false,
                    icon: "",
                    background: "",
                    border: "",
                },
            })
            .collect();

        Self {
            label: report.analysis_type.map(|t| t.label()).unwrap_or_default(),
            summary_html: markdown_or(&report.executive_summary, NO_RESPONSE),
            client_html: markdown_or(&report.client_view, NO_CLIENT_VIEW),
            issuing_html: markdown_or(&report.issuing_view, NO_ISSUING_VIEW),
            clauses,
            clauses_placeholder: NO_CLAUSES,
            strengths: ListView::new("✅", &report.strengths, NO_STRENGTHS),
            weaknesses: ListView::new("⚠️", &report.weaknesses, NO_WEAKNESSES),
            recommendations: ListView::new("💡", &report.recommendations, NO_RECOMMENDATIONS),
        }
    }
}

#[derive(Template)]
#[template(path = "index.html")]
struct IndexTemplate {
    notices: Vec<NoticeView>,
    has_api_key: bool,
    chunk_size: usize,
    overlap: usize,
    chunk_min: usize,
    chunk_max: usize,
    overlap_min: usize,
    overlap_max: usize,
    processed_files: Vec<String>,
    contents: Vec<ContentView>,
    has_knowledge: bool,
    options: Vec<OptionView>,
    custom_query: bool,
    chat: Vec<ChatView>,
    report: Option<ReportView>,
    vector_store: &'static str,
}

pub(super) async fn render_page(
    state: &AppState,
    session: &mut Session,
    report: Option<AnalysisReport>,
) -> Result<String, ApiError> {
    let contents = match state.contents.list_contents().await {
        Ok(records) => records
            .into_iter()
            .map(|r| ContentView {
                name: r.name,
                chunk_count: r.chunk_count,
                created_at: r.created_at.format("%Y-%m-%d %H:%M UTC").to_string(),
            })
            .collect(),
        Err(e) => {
            warn!("Could not list knowledge base contents: {}", e);
            Vec::new()
        }
    };

    let notices = session
        .drain_notices()
        .into_iter()
        .map(|n| NoticeView {
            class: match n.level {
                NoticeLevel::Success => "success",
                NoticeLevel::Info => "info",
                NoticeLevel::Warning => "warning",
                NoticeLevel::Error => "error",
            },
            text: n.text,
        })
        .collect();

    let mut processed_files: Vec<String> = session.processed_files.iter().cloned().collect();
    processed_files.sort();

    let template = IndexTemplate {
        notices,
        has_api_key: session.api_key.is_some(),
        chunk_size: session.chunking.chunk_size,
        overlap: session.chunking.overlap,
        chunk_min: CHUNK_SIZE_RANGE.0,
        chunk_max: CHUNK_SIZE_RANGE.1,
        overlap_min: OVERLAP_RANGE.0,
        overlap_max: OVERLAP_RANGE.1,
        processed_files,
        contents,
        has_knowledge: session.knowledge.is_some(),
        options: AnalysisType::ALL
            .iter()
            .map(|t| OptionView {
                label: t.label(),
                selected: *t == session.selected_analysis,
            })
            .collect(),
        custom_query: session.selected_analysis == AnalysisType::CustomQuery,
        chat: session
            .chat_messages
            .iter()
            .map(|m| ChatView {
                role: match m.role {
                    Role::User => "user",
                    Role::Assistant => "assistant",
                },
                html: markdown_to_html(&m.content),
            })
            .collect(),
        report: report.map(ReportView::from),
        vector_store: state.store.backend(),
    };

    Ok(template.render()?)
}
