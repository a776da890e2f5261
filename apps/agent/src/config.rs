use std::path::PathBuf;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Only the OpenAI key is required; everything else has a default.
#[derive(Debug, Clone)]
pub struct Config {
    pub openai_api_key: String,
    /// Folder of personal documents to index.
    pub docs_dir: PathBuf,
    /// Folder holding the persisted index.
    pub index_dir: PathBuf,
    /// Folder generated PDFs are written to.
    pub output_dir: PathBuf,
    pub chat_model: String,
    pub embedding_model: String,
    /// Name attached to newly created sessions.
    pub applicant_name: String,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            openai_api_key: require_env("OPENAI_API_KEY")?,
            docs_dir: env_or("DOCS_DIR", "docs").into(),
            index_dir: env_or("INDEX_DIR", "storage").into(),
            output_dir: env_or("OUTPUT_DIR", "output").into(),
            chat_model: env_or("CHAT_MODEL", crate::llm_client::DEFAULT_MODEL),
            embedding_model: env_or(
                "EMBEDDING_MODEL",
                crate::index::embedding::DEFAULT_EMBEDDING_MODEL,
            ),
            applicant_name: env_or("APPLICANT_NAME", "Applicant"),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
