//! Resume generation.
//!
//! A single model call over the chunks most relevant to the job
//! description, rendered to PDF next to the cover letter.

use tracing::info;

use crate::errors::AppError;
use crate::llm_client::ChatMessage;
use crate::pdf;

use super::{prompts, CareerAgentService};

/// Chunks retrieved for resume grounding.
const RESUME_TOP_K: usize = 10;

impl CareerAgentService {
    /// Generate a resume tailored to the subject's stored job details,
    /// write it as a PDF and return the resume text. Fails with
    /// [`AppError::MissingJobContext`] before any model call when job
    /// details have not been set.
    pub async fn generate_resume(&self, subject_id: &str) -> Result<String, AppError> {
        let context = self.get_subject_context(subject_id);
        let (company, title, job_desc) = Self::require_job_context(&context)?;

        let chunks = self
            .index
            .read()
            .await
            .retrieve(&job_desc, RESUME_TOP_K)
            .await?;

        let prompt = prompts::RESUME_PROMPT_TEMPLATE
            .replace("{applicant_name}", &context.applicant_name)
            .replace("{job_title}", &title)
            .replace("{company_name}", &company)
            .replace("{job_desc}", &job_desc)
            .replace("{context}", &Self::render_context(&chunks));

        let resume = self
            .model
            .complete(&[
                ChatMessage::system(prompts::RESUME_SYSTEM),
                ChatMessage::user(&prompt),
            ])
            .await?
            .trim()
            .to_string();

        self.ensure_output_dir()?;
        let path = pdf::output_path(&self.output_dir, &company, &title, "resume");
        pdf::write_document(&resume, &path)?;
        info!("Resume written to {}", path.display());

        Ok(resume)
    }
}
