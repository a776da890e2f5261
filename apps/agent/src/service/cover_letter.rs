//! Cover letter generation.
//!
//! The letter is built in stages: extract qualifications from the job
//! description, write one grounded statement per qualification, condense
//! the statements, add a company-specific closing, then render to PDF.
//! Model replies that must be JSON lists get exactly one reformat retry
//! before the generation fails.

use tracing::{info, warn};

use crate::errors::AppError;
use crate::llm_client::prompts::{JSON_ONLY_SYSTEM, REFORMAT_PROMPT_TEMPLATE};
use crate::llm_client::{strip_json_fences, ChatMessage};
use crate::pdf;

use super::{prompts, CareerAgentService};

/// Qualifications kept from the job description.
const MAX_QUALIFICATIONS: usize = 8;
/// Skill statements kept after condensing.
const MAX_SKILLS: usize = 6;
/// Chunks retrieved per skill statement.
const SKILL_TOP_K: usize = 1;

/// Outcome of parsing a model reply that should be a JSON list of strings.
#[derive(Debug)]
pub enum ListParse {
    Ok(Vec<String>),
    /// The reply, verbatim, so it can be sent back for reformatting.
    ParseError(String),
}

pub fn parse_string_list(raw: &str) -> ListParse {
    let cleaned = strip_json_fences(raw);
    match serde_json::from_str::<Vec<String>>(cleaned) {
        Ok(items) => ListParse::Ok(items),
        Err(_) => ListParse::ParseError(raw.to_string()),
    }
}

impl CareerAgentService {
    /// Generate a cover letter for the subject's stored job details, write
    /// it as a PDF and return the letter text. Fails with
    /// [`AppError::MissingJobContext`] before any model call when job
    /// details have not been set.
    pub async fn generate_cover_letter(&self, subject_id: &str) -> Result<String, AppError> {
        let context = self.get_subject_context(subject_id);
        let (company, title, job_desc) = Self::require_job_context(&context)?;

        // Pull the qualifications out of the posting.
        let qualifications_prompt =
            prompts::QUALIFICATIONS_PROMPT_TEMPLATE.replace("{job_desc}", &job_desc);
        let mut qualifications = self.json_list_with_retry(&qualifications_prompt).await?;
        qualifications.truncate(MAX_QUALIFICATIONS);
        info!(
            "Extracted {} qualifications from the job description",
            qualifications.len()
        );

        // One grounded statement per qualification, in posting order.
        let mut statements = Vec::with_capacity(qualifications.len());
        for qualification in &qualifications {
            statements.push(self.skill_statement(qualification).await?);
        }

        let skills = self.condense_statements(&statements).await?;
        let closing = self.company_interest(&job_desc, &company).await?;
        let letter = assemble_letter(&context.applicant_name, &company, &title, &skills, &closing);

        self.ensure_output_dir()?;
        let path = pdf::output_path(&self.output_dir, &company, &title, "cover_letter");
        pdf::write_document(&letter, &path)?;
        info!("Cover letter written to {}", path.display());

        Ok(letter)
    }

    /// Ask for a JSON list of strings. An unparseable reply is sent back
    /// once with a reformat prompt; a second failure is an error carrying
    /// the raw reply.
    async fn json_list_with_retry(&self, prompt: &str) -> Result<Vec<String>, AppError> {
        let first = self
            .model
            .complete(&[
                ChatMessage::system(JSON_ONLY_SYSTEM),
                ChatMessage::user(prompt),
            ])
            .await?;

        let raw = match parse_string_list(&first) {
            ListParse::Ok(items) => return Ok(items),
            ListParse::ParseError(raw) => raw,
        };

        warn!("Model reply was not a JSON list of strings; asking for a reformat");
        let reformat = REFORMAT_PROMPT_TEMPLATE.replace("{raw}", &raw);
        let second = self
            .model
            .complete(&[
                ChatMessage::system(JSON_ONLY_SYSTEM),
                ChatMessage::user(&reformat),
            ])
            .await?;

        match parse_string_list(&second) {
            ListParse::Ok(items) => Ok(items),
            ListParse::ParseError(raw) => Err(AppError::MalformedOutput { raw }),
        }
    }

    async fn skill_statement(&self, qualification: &str) -> Result<String, AppError> {
        let chunks = self
            .index
            .read()
            .await
            .retrieve(qualification, SKILL_TOP_K)
            .await?;

        let prompt = prompts::SKILL_STATEMENT_PROMPT_TEMPLATE
            .replace("{context}", &Self::render_context(&chunks))
            .replace("{qualification}", qualification);

        let reply = self
            .model
            .complete(&[
                ChatMessage::system(prompts::SKILL_STATEMENT_SYSTEM),
                ChatMessage::user(&prompt),
            ])
            .await?;
        Ok(reply.trim().to_string())
    }

    async fn condense_statements(&self, statements: &[String]) -> Result<Vec<String>, AppError> {
        let listed = statements
            .iter()
            .map(|s| format!("- {s}"))
            .collect::<Vec<_>>()
            .join("\n");
        let prompt = prompts::CONDENSE_PROMPT_TEMPLATE.replace("{statements}", &listed);

        let mut condensed = self.json_list_with_retry(&prompt).await?;
        condensed.truncate(MAX_SKILLS);
        Ok(condensed)
    }

    async fn company_interest(&self, job_desc: &str, company: &str) -> Result<String, AppError> {
        let prompt = prompts::COMPANY_INTEREST_PROMPT_TEMPLATE
            .replace("{job_desc}", job_desc)
            .replace("{company}", company);

        let reply = self
            .model
            .complete(&[
                ChatMessage::system(prompts::COMPANY_INTEREST_SYSTEM),
                ChatMessage::user(&prompt),
            ])
            .await?;
        Ok(reply.trim().to_string())
    }
}

fn assemble_letter(
    applicant: &str,
    company: &str,
    title: &str,
    skills: &[String],
    closing: &str,
) -> String {
    let mut letter = String::from("Dear Hiring Manager,\n\n");
    letter.push_str(&format!(
        "I'm excited to apply for the role of {title} at {company}. \
         I believe my skills and experience are a good fit for the role:\n\n"
    ));
    for skill in skills {
        letter.push_str(&format!("- {skill}\n"));
    }
    letter.push('\n');
    letter.push_str(closing);
    letter.push_str(
        "\n\nThank you for considering my application. I look forward to hearing from you.\
         \n\nSincerely,\n",
    );
    letter.push_str(applicant);
    letter
}
