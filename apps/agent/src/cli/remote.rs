//! Remote CLI: the same REPL loop, backed by a running server's chat
//! endpoint instead of a local service. Needs no API key and no local
//! documents.

use std::io::{BufRead, Write};

use reqwest::Client;
use thiserror::Error;

use crate::commands::HELP_TEXT;

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Server error (status {status}): {body}")]
    Server { status: u16, body: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub struct RemoteClient {
    http: Client,
    base_url: String,
    subject_id: String,
}

impl RemoteClient {
    pub fn new(base_url: &str, subject_id: &str) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            subject_id: subject_id.to_string(),
        }
    }

    /// Post one message to the server and return its plain-text reply.
    pub async fn send(&self, message: &str) -> Result<String, RemoteError> {
        let response = self
            .http
            .post(format!("{}/chat", self.base_url))
            .form(&[
                ("subject_id", self.subject_id.as_str()),
                ("message_text", message),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(RemoteError::Server {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }
}

pub async fn run<R: BufRead, W: Write>(
    client: &RemoteClient,
    input: &mut R,
    output: &mut W,
) -> Result<(), RemoteError> {
    writeln!(output, "Connected to {}.", client.base_url)?;
    writeln!(output, "{HELP_TEXT}")?;
    writeln!(
        output,
        "Over HTTP, send job details as: JD|company|title|description"
    )?;

    loop {
        write!(output, "\n> ")?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            break;
        }
        let message = line.trim();

        match message {
            "" => continue,
            "Q" | "q" | "Quit" => break,
            _ => match client.send(message).await {
                Ok(reply) => writeln!(output, "{reply}")?,
                Err(e) => writeln!(output, "Error: {e}")?,
            },
        }
    }

    writeln!(output, "Goodbye.")?;
    Ok(())
}
