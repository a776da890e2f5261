//! Core career-agent service.
//!
//! Owns the document index, the LLM client and per-subject sessions, and
//! exposes the operations the CLI and HTTP front ends share: conversational
//! question answering, job-context management and document generation.

pub mod cover_letter;
pub mod prompts;
pub mod resume;

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::info;

use crate::errors::AppError;
use crate::index::{DocumentIndex, RetrievedChunk};
use crate::llm_client::{ChatMessage, ChatModel};
use crate::session::{ChatTurn, SessionStore, SubjectContext};

/// Chunks retrieved for question answering and resume generation.
const CHAT_TOP_K: usize = 10;

pub struct CareerAgentService {
    model: Arc<dyn ChatModel>,
    index: RwLock<DocumentIndex>,
    sessions: SessionStore,
    output_dir: PathBuf,
    default_applicant: String,
}

impl CareerAgentService {
    pub fn new(
        model: Arc<dyn ChatModel>,
        index: DocumentIndex,
        output_dir: PathBuf,
        default_applicant: String,
    ) -> Self {
        Self {
            model,
            index: RwLock::new(index),
            sessions: SessionStore::new(),
            output_dir,
            default_applicant,
        }
    }

    pub fn get_subject_context(&self, subject_id: &str) -> SubjectContext {
        self.sessions.get_or_create(subject_id, &self.default_applicant)
    }

    pub fn save_subject_context(&self, context: SubjectContext) {
        self.sessions.save(context);
    }

    /// Record the job the subject is applying for. This is the only place
    /// job fields are written.
    pub fn set_job_details(&self, subject_id: &str, company: &str, title: &str, description: &str) {
        let mut context = self.get_subject_context(subject_id);
        context.company_name = Some(company.to_string());
        context.job_title = Some(title.to_string());
        context.job_desc = Some(description.to_string());
        self.save_subject_context(context);
        info!("Job details set for subject {subject_id}: {title} at {company}");
    }

    pub fn chat_history(&self, subject_id: &str) -> Vec<ChatTurn> {
        self.sessions.history(subject_id)
    }

    pub fn clear_history(&self, subject_id: &str) {
        self.sessions.clear_history(subject_id);
    }

    /// Ensure a session exists for the subject; optionally force a rebuild
    /// of the document index first.
    pub async fn initialize_subject(
        &self,
        subject_id: &str,
        rebuild: bool,
    ) -> Result<SubjectContext, AppError> {
        let context = self.get_subject_context(subject_id);
        if rebuild {
            self.index.write().await.rebuild().await?;
            info!("Document index rebuilt for subject {subject_id}");
        }
        Ok(context)
    }

    /// Answer a question against the indexed documents, threading the
    /// subject's chat history into the prompt and recording the exchange.
    pub async fn ask_conversational_question(
        &self,
        subject_id: &str,
        question: &str,
    ) -> Result<String, AppError> {
        let context = self.get_subject_context(subject_id);
        let history = self.sessions.history(&context.id);
        let answer = self.answer(question, &history).await?;
        self.sessions
            .push_turn(&context.id, question.to_string(), answer.clone());
        Ok(answer)
    }

    /// One-shot question answering: same retrieval, but the subject's chat
    /// history is neither read nor written.
    pub async fn ask_simple_with_context(
        &self,
        subject_id: &str,
        question: &str,
    ) -> Result<String, AppError> {
        self.get_subject_context(subject_id);
        self.answer(question, &[]).await
    }

    async fn answer(&self, question: &str, history: &[ChatTurn]) -> Result<String, AppError> {
        let chunks = self
            .index
            .read()
            .await
            .retrieve(question, CHAT_TOP_K)
            .await?;

        let prompt = prompts::ANSWER_PROMPT_TEMPLATE
            .replace("{context}", &Self::render_context(&chunks))
            .replace("{history}", &Self::render_history_block(history))
            .replace("{question}", question);

        let reply = self
            .model
            .complete(&[
                ChatMessage::system(prompts::ANSWER_SYSTEM),
                ChatMessage::user(&prompt),
            ])
            .await?;
        Ok(reply.trim().to_string())
    }

    fn ensure_output_dir(&self) -> Result<(), AppError> {
        std::fs::create_dir_all(&self.output_dir)?;
        Ok(())
    }

    fn render_context(chunks: &[RetrievedChunk]) -> String {
        if chunks.is_empty() {
            return "(no matching documents)".to_string();
        }
        chunks
            .iter()
            .map(|chunk| format!("[{}]\n{}", chunk.source, chunk.text))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    fn render_history_block(history: &[ChatTurn]) -> String {
        if history.is_empty() {
            return String::new();
        }
        let mut block = String::from("CONVERSATION SO FAR:\n");
        for turn in history {
            block.push_str(&format!("Q: {}\nA: {}\n", turn.question, turn.answer));
        }
        block.push('\n');
        block
    }

    /// Generation requires company, title and description to all be present.
    /// Fails before any model call when they are not.
    fn require_job_context(
        context: &SubjectContext,
    ) -> Result<(String, String, String), AppError> {
        match (&context.company_name, &context.job_title, &context.job_desc) {
            (Some(company), Some(title), Some(desc)) => {
                Ok((company.clone(), title.clone(), desc.clone()))
            }
            _ => Err(AppError::MissingJobContext),
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::fs::File;
    use std::io::Write as _;
    use std::sync::Arc;

    use tempfile::TempDir;

    use crate::index::embedding::EmbeddingProvider;
    use crate::index::DocumentIndex;
    use crate::llm_client::testing::ScriptedModel;

    use super::CareerAgentService;

    pub(crate) const FIXTURE_RESUME: &str = "Jane Doe has 12 years of experience building \
distributed systems in Rust and Go. She led the platform team at Initech, where she designed \
a job scheduler handling two million tasks a day. Jane holds a BSc in Computer Science from \
the University of Utrecht.";

    /// Service over a one-document index, a scripted model and a temp
    /// output directory. Keep the TempDir alive for the test's duration.
    pub(crate) async fn test_service(
        responses: &[&str],
    ) -> (CareerAgentService, Arc<ScriptedModel>, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let docs_dir = dir.path().join("docs");
        std::fs::create_dir_all(&docs_dir).unwrap();
        write!(
            File::create(docs_dir.join("resume.txt")).unwrap(),
            "{FIXTURE_RESUME}"
        )
        .unwrap();

        let index = DocumentIndex::open_or_build(
            &docs_dir,
            &dir.path().join("storage"),
            EmbeddingProvider::new_hashed(64),
            false,
        )
        .await
        .unwrap();

        let model = Arc::new(ScriptedModel::new(responses));
        let service = CareerAgentService::new(
            model.clone(),
            index,
            dir.path().join("output"),
            "Jane Doe".to_string(),
        );
        (service, model, dir)
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::test_service;
    use super::*;

    #[tokio::test]
    async fn test_ask_conversational_question_records_history_in_order() {
        let (service, model, _dir) = test_service(&[
            "Jane has 12 years of experience.",
            "She worked at Initech.",
        ])
        .await;

        let first = service
            .ask_conversational_question("s1", "How many years of experience?")
            .await
            .unwrap();
        assert_eq!(first, "Jane has 12 years of experience.");

        service
            .ask_conversational_question("s1", "Where did she work?")
            .await
            .unwrap();

        let history = service.chat_history("s1");
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].question, "How many years of experience?");
        assert_eq!(history[0].answer, "Jane has 12 years of experience.");
        assert_eq!(history[1].answer, "She worked at Initech.");

        // The second prompt carries the first exchange.
        assert!(model.prompt(1).contains("CONVERSATION SO FAR:"));
        assert!(model.prompt(1).contains("Jane has 12 years of experience."));

        service.clear_history("s1");
        assert!(service.chat_history("s1").is_empty());
    }

    #[tokio::test]
    async fn test_ask_simple_leaves_history_untouched() {
        let (service, model, _dir) = test_service(&["An answer."]).await;

        let answer = service
            .ask_simple_with_context("s1", "What does Jane do?")
            .await
            .unwrap();
        assert_eq!(answer, "An answer.");
        assert!(service.chat_history("s1").is_empty());

        assert!(model.prompt(0).contains("DOCUMENT EXCERPTS:"));
        assert!(model.prompt(0).contains("resume.txt"));
        assert!(!model.prompt(0).contains("CONVERSATION SO FAR:"));
    }

    #[tokio::test]
    async fn test_set_job_details_round_trips() {
        let (service, _model, _dir) = test_service(&[]).await;
        service.set_job_details("s1", "Acme", "Engineer", "Build widgets.");

        let context = service.get_subject_context("s1");
        assert!(context.has_job_context());
        assert_eq!(context.company_name.as_deref(), Some("Acme"));
        assert_eq!(context.job_title.as_deref(), Some("Engineer"));
        assert_eq!(context.job_desc.as_deref(), Some("Build widgets."));
    }

    #[tokio::test]
    async fn test_initialize_subject_creates_context_with_default_applicant() {
        let (service, _model, _dir) = test_service(&[]).await;
        let context = service.initialize_subject("s1", false).await.unwrap();
        assert_eq!(context.id, "s1");
        assert_eq!(context.applicant_name, "Jane Doe");
        assert!(!context.has_job_context());
    }

    #[test]
    fn test_render_context_formats_sources() {
        let chunks = vec![RetrievedChunk {
            source: "resume.txt".to_string(),
            text: "Jane writes Rust.".to_string(),
            score: 0.9,
        }];
        assert_eq!(
            CareerAgentService::render_context(&chunks),
            "[resume.txt]\nJane writes Rust."
        );
        assert_eq!(
            CareerAgentService::render_context(&[]),
            "(no matching documents)"
        );
    }

    #[test]
    fn test_render_history_block_is_empty_without_history() {
        assert_eq!(CareerAgentService::render_history_block(&[]), "");

        let history = vec![ChatTurn {
            question: "Who?".to_string(),
            answer: "Jane.".to_string(),
        }];
        assert_eq!(
            CareerAgentService::render_history_block(&history),
            "CONVERSATION SO FAR:\nQ: Who?\nA: Jane.\n\n"
        );
    }
}
