use crate::analysis::AnalysisType;
use crate::config::ChunkingParams;
use crate::knowledge::KnowledgeBase;
use log::debug;
use lru::LruCache;
use serde::Serialize;
use std::collections::HashSet;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "legal_session";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NoticeLevel {
    Success,
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

impl Notice {
    pub fn success(text: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Success, text: text.into() }
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Info, text: text.into() }
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Warning, text: text.into() }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Error, text: text.into() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

/// Per-visitor state that survives between page renders.
pub struct Session {
    pub id: Uuid,
    pub api_key: Option<String>,
    pub knowledge: Option<Arc<KnowledgeBase>>,
    pub processed_files: HashSet<String>,
    pub chat_messages: Vec<ChatMessage>,
    pub selected_analysis: AnalysisType,
    pub chunking: ChunkingParams,
    notices: Vec<Notice>,
}

impl Session {
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            api_key: None,
            knowledge: None,
            processed_files: HashSet::new(),
            chat_messages: Vec::new(),
            selected_analysis: AnalysisType::ContractReview,
            chunking: ChunkingParams::default(),
            notices: Vec::new(),
        }
    }

    /// Returns false when the file was already processed in this session.
    pub fn mark_processed(&mut self, file_name: &str) -> bool {
        self.processed_files.insert(file_name.to_string())
    }

    pub fn is_processed(&self, file_name: &str) -> bool {
        self.processed_files.contains(file_name)
    }

    pub fn push_message(&mut self, role: Role, content: impl Into<String>) {
        self.chat_messages.push(ChatMessage { role, content: content.into() });
    }

    pub fn clear_chat(&mut self) {
        self.chat_messages.clear();
    }

    pub fn notify(&mut self, notice: Notice) {
        self.notices.push(notice);
    }

    pub fn drain_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }
}

pub const DEFAULT_MAX_SESSIONS: usize = 256;
pub const DEFAULT_SESSION_IDLE: Duration = Duration::from_secs(3600);

struct SessionEntry {
    session: Arc<Mutex<Session>>,
    last_seen: Instant,
}

/// Sessions in least-recently-used order. Every lookup refreshes `last_seen`,
/// so the LRU end is also the longest idle.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<parking_lot::Mutex<LruCache<Uuid, SessionEntry>>>,
    idle_timeout: Duration,
    default_api_key: Option<String>,
}

impl SessionStore {
    /// New sessions start with `default_api_key`, typically the key given on
    /// the command line or in the environment.
    pub fn new(default_api_key: Option<String>) -> Self {
        Self {
            sessions: Arc::new(parking_lot::Mutex::new(LruCache::new(capacity(DEFAULT_MAX_SESSIONS)))),
            idle_timeout: DEFAULT_SESSION_IDLE,
            default_api_key,
        }
    }

    pub fn with_limits(mut self, max_sessions: usize, idle_timeout: Duration) -> Self {
        self.sessions = Arc::new(parking_lot::Mutex::new(LruCache::new(capacity(max_sessions))));
        self.idle_timeout = idle_timeout;
        self
    }

    /// Looks up the cookie value; a missing, malformed, unknown or expired id
    /// gets a fresh session.
    pub fn get_or_create(&self, cookie: Option<&str>) -> (Uuid, Arc<Mutex<Session>>) {
        let now = Instant::now();
        let mut sessions = self.sessions.lock();
        prune_idle(&mut sessions, now, self.idle_timeout);

        if let Some(id) = cookie.and_then(|raw| Uuid::parse_str(raw).ok()) {
            if let Some(entry) = sessions.get_mut(&id) {
                entry.last_seen = now;
                return (id, entry.session.clone());
            }
        }

        let id = Uuid::new_v4();
        let mut session = Session::new(id);
        session.api_key = self.default_api_key.clone();
        let session = Arc::new(Mutex::new(session));
        if let Some((evicted, _)) = sessions.push(id, SessionEntry { session: session.clone(), last_seen: now }) {
            debug!("Session store full, ended session {}", evicted);
        }
        (id, session)
    }

    /// Ends every session idle for longer than the timeout as of `now`.
    pub fn prune_idle(&self, now: Instant) -> usize {
        prune_idle(&mut self.sessions.lock(), now, self.idle_timeout)
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.lock().is_empty()
    }
}

fn capacity(max_sessions: usize) -> NonZeroUsize {
    NonZeroUsize::new(max_sessions).unwrap_or(NonZeroUsize::MIN)
}

fn prune_idle(sessions: &mut LruCache<Uuid, SessionEntry>, now: Instant, idle_timeout: Duration) -> usize {
    let mut ended = 0;
    while let Some((_, entry)) = sessions.peek_lru() {
        if now.saturating_duration_since(entry.last_seen) <= idle_timeout {
            break;
        }
        if let Some((id, _)) = sessions.pop_lru() {
            debug!("Ended idle session {}", id);
            ended += 1;
        }
    }
    ended
}
