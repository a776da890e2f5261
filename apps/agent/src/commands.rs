//! Command grammar shared by the local REPL and the HTTP chat endpoint.
//!
//! A message is either a command token (`R`, `CL`, `Refresh`, ...) or a
//! free-text question about the indexed documents. Over HTTP, job details
//! arrive inline as `JD|company|title|description`.

use crate::errors::AppError;
use crate::service::CareerAgentService;
use crate::session::ChatTurn;

pub const HELP_TEXT: &str = "Commands:
  JD            Provide the job details for a role
  R             Generate a tailored resume PDF
  CL            Generate a tailored cover letter PDF
  Refresh       Rebuild the document index and clear chat history
  Chat History  Show the questions and answers so far
  Help          Show this message
  Q / Quit      Exit
Anything else is answered as a question about the indexed documents.";

/// Route one message to the matching service operation and return the reply
/// text. Command tokens are case-sensitive.
pub async fn dispatch_message(
    service: &CareerAgentService,
    subject_id: &str,
    message: &str,
) -> Result<String, AppError> {
    let message = message.trim();
    match message {
        "Help" => Ok(HELP_TEXT.to_string()),
        "Chat History" => Ok(render_history(&service.chat_history(subject_id))),
        "Refresh" => {
            service.initialize_subject(subject_id, true).await?;
            service.clear_history(subject_id);
            Ok("Document index rebuilt and chat history cleared.".to_string())
        }
        "R" => service.generate_resume(subject_id).await,
        "CL" => service.generate_cover_letter(subject_id).await,
        "JD" => {
            let hint = if service.get_subject_context(subject_id).has_job_context() {
                "Job details are already set. Send JD|company|title|description to replace them."
            } else {
                "Send job details as one message: JD|company|title|description"
            };
            Ok(hint.to_string())
        }
        _ => {
            if message.starts_with("JD|") {
                match parse_inline_jd(message) {
                    Some((company, title, description)) => {
                        service.set_job_details(subject_id, &company, &title, &description);
                        Ok(format!("Job details saved: {title} at {company}."))
                    }
                    None => Err(AppError::Validation(
                        "Expected JD|company|title|description".to_string(),
                    )),
                }
            } else {
                service.ask_conversational_question(subject_id, message).await
            }
        }
    }
}

/// Split `JD|company|title|description`. The description may itself
/// contain pipes; only the first two are delimiters.
fn parse_inline_jd(message: &str) -> Option<(String, String, String)> {
    let rest = message.strip_prefix("JD|")?;
    let mut parts = rest.splitn(3, '|');
    let company = parts.next()?.trim();
    let title = parts.next()?.trim();
    let description = parts.next()?.trim();
    if company.is_empty() || title.is_empty() || description.is_empty() {
        return None;
    }
    Some((
        company.to_string(),
        title.to_string(),
        description.to_string(),
    ))
}

fn render_history(history: &[ChatTurn]) -> String {
    if history.is_empty() {
        return "No chat history yet.".to_string();
    }
    history
        .iter()
        .map(|turn| format!("Q: {}\nA: {}", turn.question, turn.answer))
        .collect::<Vec<_>>()
        .join("\n\n")
}
