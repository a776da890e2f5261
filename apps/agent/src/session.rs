//! Per-subject session state: job context and chat history.
//!
//! Sessions are keyed by subject id and owned by the service. The store is
//! a plain mutex over a map; the lock is only ever held for the duration of
//! a clone or an insert, never across an await. Interleaved requests for
//! the same subject are not serialized against each other, so concurrent
//! updates to one subject have unspecified ordering.

use std::collections::HashMap;
use std::sync::Mutex;

use uuid::Uuid;

/// Everything the generators need to know about one applicant's session.
#[derive(Debug, Clone)]
pub struct SubjectContext {
    pub id: String,
    pub applicant_name: String,
    pub company_name: Option<String>,
    pub job_title: Option<String>,
    pub job_desc: Option<String>,
}

impl SubjectContext {
    pub fn new(id: Option<String>, applicant_name: &str) -> Self {
        Self {
            id: id.unwrap_or_else(|| Uuid::new_v4().to_string()),
            applicant_name: applicant_name.to_string(),
            company_name: None,
            job_title: None,
            job_desc: None,
        }
    }

    pub fn has_job_context(&self) -> bool {
        self.company_name.is_some() && self.job_title.is_some() && self.job_desc.is_some()
    }
}

/// One question/answer exchange in a subject's chat history.
#[derive(Debug, Clone)]
pub struct ChatTurn {
    pub question: String,
    pub answer: String,
}

#[derive(Debug)]
struct Session {
    context: SubjectContext,
    history: Vec<ChatTurn>,
}

#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<String, Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch the subject's context, creating a fresh session on first use.
    pub fn get_or_create(&self, subject_id: &str, applicant_name: &str) -> SubjectContext {
        let mut sessions = self.lock();
        sessions
            .entry(subject_id.to_string())
            .or_insert_with(|| Session {
                context: SubjectContext::new(Some(subject_id.to_string()), applicant_name),
                history: Vec::new(),
            })
            .context
            .clone()
    }

    /// Store an updated context, preserving any existing chat history.
    pub fn save(&self, context: SubjectContext) {
        let mut sessions = self.lock();
        match sessions.get_mut(&context.id) {
            Some(session) => session.context = context,
            None => {
                sessions.insert(
                    context.id.clone(),
                    Session {
                        context,
                        history: Vec::new(),
                    },
                );
            }
        }
    }

    pub fn push_turn(&self, subject_id: &str, question: String, answer: String) {
        let mut sessions = self.lock();
        if let Some(session) = sessions.get_mut(subject_id) {
            session.history.push(ChatTurn { question, answer });
        }
    }

    pub fn history(&self, subject_id: &str) -> Vec<ChatTurn> {
        self.lock()
            .get(subject_id)
            .map(|session| session.history.clone())
            .unwrap_or_default()
    }

    pub fn clear_history(&self, subject_id: &str) {
        if let Some(session) = self.lock().get_mut(subject_id) {
            session.history.clear();
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Session>> {
        self.sessions.lock().expect("session store lock poisoned")
    }
}
