//! Local interactive REPL over the service.
//!
//! Reads commands from any `BufRead` and writes replies to any `Write`, so
//! sessions can be driven from stdin or from test fixtures. The `JD`
//! command runs a small interactive flow here; everything else goes
//! through the shared command dispatcher.

pub mod remote;

use std::io::{BufRead, Write};

use crate::commands::{self, HELP_TEXT};
use crate::errors::AppError;
use crate::service::CareerAgentService;

pub async fn run<R: BufRead, W: Write>(
    service: &CareerAgentService,
    subject_id: &str,
    input: &mut R,
    output: &mut W,
) -> Result<(), AppError> {
    writeln!(output, "{HELP_TEXT}")?;

    loop {
        write!(output, "\n> ")?;
        output.flush()?;

        let Some(line) = read_line(input)? else { break };
        let message = line.trim();

        match message {
            "" => continue,
            "Q" | "q" | "Quit" => break,
            "JD" => {
                if !collect_job_details(service, subject_id, input, output)? {
                    break;
                }
            }
            _ => match commands::dispatch_message(service, subject_id, message).await {
                Ok(reply) => writeln!(output, "{reply}")?,
                Err(e) => writeln!(output, "Error: {e}")?,
            },
        }
    }

    writeln!(output, "Goodbye.")?;
    Ok(())
}

/// Interactive job-details flow: description lines until `END`, then the
/// company name, then the job title. Returns false when input ends mid-flow.
fn collect_job_details<R: BufRead, W: Write>(
    service: &CareerAgentService,
    subject_id: &str,
    input: &mut R,
    output: &mut W,
) -> Result<bool, AppError> {
    writeln!(
        output,
        "Paste the job description. Finish with a line containing only END."
    )?;

    let mut description_lines = Vec::new();
    loop {
        let Some(line) = read_line(input)? else {
            return Ok(false);
        };
        if line.trim() == "END" {
            break;
        }
        description_lines.push(line);
    }
    let description = description_lines.join("\n").trim().to_string();

    write!(output, "Company name: ")?;
    output.flush()?;
    let Some(company) = read_line(input)? else {
        return Ok(false);
    };
    let company = company.trim().to_string();

    write!(output, "Job title: ")?;
    output.flush()?;
    let Some(title) = read_line(input)? else {
        return Ok(false);
    };
    let title = title.trim().to_string();

    if description.is_empty() || company.is_empty() || title.is_empty() {
        writeln!(output, "Job details incomplete; nothing saved.")?;
        return Ok(true);
    }

    service.set_job_details(subject_id, &company, &title, &description);
    writeln!(output, "Job details saved for {title} at {company}.")?;
    Ok(true)
}

/// One line without its trailing newline, or `None` at end of input.
fn read_line<R: BufRead>(input: &mut R) -> Result<Option<String>, AppError> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use crate::service::test_support::test_service;
    use crate::service::CareerAgentService;

    use super::run;

    async fn run_session(service: &CareerAgentService, input: &str) -> String {
        let mut reader = Cursor::new(input.to_string());
        let mut output = Vec::new();
        run(service, "local", &mut reader, &mut output)
            .await
            .unwrap();
        String::from_utf8(output).unwrap()
    }

    #[tokio::test]
    async fn test_jd_flow_then_cover_letter() {
        let (service, model, dir) = test_service(&[
            r#"["Rust experience"]"#,
            "I have twelve years of Rust experience.",
            r#"["I bring 12 years of relevant experience."]"#,
            "I admire Widget Corp's engineering culture.",
        ])
        .await;

        let input =
            "JD\nWe need an engineer.\nWith Rust experience.\nEND\nWidget Corp\nEngineer\nCL\nQ\n";
        let output = run_session(&service, input).await;

        let context = service.get_subject_context("local");
        assert_eq!(context.company_name.as_deref(), Some("Widget Corp"));
        assert_eq!(context.job_title.as_deref(), Some("Engineer"));
        assert_eq!(
            context.job_desc.as_deref(),
            Some("We need an engineer.\nWith Rust experience.")
        );

        assert!(output.contains("Job details saved for Engineer at Widget Corp."));
        assert!(output.contains("Dear Hiring Manager,"));
        assert_eq!(model.call_count(), 4);

        let pdf_path = dir
            .path()
            .join("output")
            .join("Widget Corp_Engineer_cover_letter.pdf");
        assert!(pdf_path.exists(), "missing PDF at {}", pdf_path.display());
    }

    #[tokio::test]
    async fn test_question_then_chat_history() {
        let (service, _model, _dir) = test_service(&["Jane worked at Initech."]).await;

        let output = run_session(&service, "Where did Jane work?\nChat History\nQ\n").await;
        assert!(output.contains("Jane worked at Initech."));
        assert!(output.contains("Q: Where did Jane work?"));
    }

    #[tokio::test]
    async fn test_generation_error_is_printed_and_the_loop_continues() {
        let (service, model, _dir) = test_service(&["Still here."]).await;

        let output = run_session(&service, "R\nAre you still there?\nQ\n").await;
        assert!(output.contains("No job details set."));
        assert!(output.contains("Still here."));
        assert_eq!(model.call_count(), 1);
    }

    #[tokio::test]
    async fn test_unparseable_generation_prints_the_model_reply() {
        let (service, model, _dir) = test_service(&["garbage", "more garbage"]).await;
        service.set_job_details("local", "Acme", "Engineer", "Rust role.");

        let output = run_session(&service, "CL\nQ\n").await;
        assert!(output.contains("could not be parsed"));
        assert!(output.contains("more garbage"));
        assert_eq!(model.call_count(), 2);
    }

    #[tokio::test]
    async fn test_refresh_clears_history() {
        let (service, _model, _dir) = test_service(&["An answer."]).await;

        let output =
            run_session(&service, "What does Jane do?\nRefresh\nChat History\nQ\n").await;
        assert!(output.contains("Document index rebuilt and chat history cleared."));
        assert!(output.contains("No chat history yet."));
    }

    #[tokio::test]
    async fn test_end_of_input_ends_the_session() {
        let (service, _model, _dir) = test_service(&[]).await;

        let output = run_session(&service, "").await;
        assert!(output.contains("Commands:"));
        assert!(output.contains("Goodbye."));
    }
}
