mod cli;
mod commands;
mod config;
mod errors;
mod index;
mod llm_client;
mod pdf;
mod routes;
mod service;
mod session;
mod state;

use std::io::{stdin, stdout};
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

use crate::cli::remote::RemoteClient;
use crate::config::Config;
use crate::index::embedding::EmbeddingProvider;
use crate::index::DocumentIndex;
use crate::llm_client::OpenAiClient;
use crate::routes::build_router;
use crate::service::CareerAgentService;
use crate::state::AppState;

/// Personal career assistant: ask questions about your own documents and
/// generate tailored resume and cover letter PDFs.
#[derive(Debug, Parser)]
#[command(name = "agent", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Chat with the agent in the terminal (default)
    Chat {
        /// Applicant name used in generated documents
        #[arg(long)]
        name: Option<String>,

        /// Session id; a fresh one is generated when omitted
        #[arg(long)]
        subject: Option<String>,

        /// Rebuild the document index before starting
        #[arg(long)]
        refresh: bool,
    },
    /// Run the HTTP API server
    Serve,
    /// Chat with a running server over HTTP
    Remote {
        /// Base URL of the server
        #[arg(long, default_value = "http://localhost:8080")]
        url: String,

        /// Session id; a fresh one is generated when omitted
        #[arg(long)]
        subject: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Command::Chat {
        name: None,
        subject: None,
        refresh: false,
    }) {
        Command::Chat {
            name,
            subject,
            refresh,
        } => {
            let mut config = Config::from_env()?;
            init_tracing(&config.rust_log);
            if let Some(name) = name {
                config.applicant_name = name;
            }
            run_chat(config, subject, refresh).await
        }
        Command::Serve => {
            let config = Config::from_env()?;
            init_tracing(&config.rust_log);
            run_serve(config).await
        }
        // Remote mode talks to a running server and needs no local config.
        Command::Remote { url, subject } => {
            init_tracing("info");
            run_remote(&url, subject).await
        }
    }
}

fn init_tracing(level: &str) {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), level))),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn build_service(config: &Config, refresh: bool) -> Result<CareerAgentService> {
    let model = Arc::new(OpenAiClient::new(
        config.openai_api_key.clone(),
        config.chat_model.clone(),
    ));
    info!("LLM client initialized (model: {})", config.chat_model);

    let provider = EmbeddingProvider::new_openai(
        config.openai_api_key.clone(),
        config.embedding_model.clone(),
    );
    let index =
        DocumentIndex::open_or_build(&config.docs_dir, &config.index_dir, provider, refresh)
            .await?;
    info!("Document index ready ({} chunks)", index.chunk_count());

    Ok(CareerAgentService::new(
        model,
        index,
        config.output_dir.clone(),
        config.applicant_name.clone(),
    ))
}

async fn run_chat(config: Config, subject: Option<String>, refresh: bool) -> Result<()> {
    info!("Starting career agent v{}", env!("CARGO_PKG_VERSION"));

    let service = build_service(&config, refresh).await?;
    let subject_id = subject.unwrap_or_else(|| Uuid::new_v4().to_string());
    service.initialize_subject(&subject_id, false).await?;

    let stdin = stdin();
    let stdout = stdout();
    let mut input = stdin.lock();
    let mut output = stdout.lock();
    cli::run(&service, &subject_id, &mut input, &mut output).await?;

    Ok(())
}

async fn run_serve(config: Config) -> Result<()> {
    info!("Starting career agent API v{}", env!("CARGO_PKG_VERSION"));

    let service = Arc::new(build_service(&config, false).await?);
    let state = AppState::new(service);

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn run_remote(url: &str, subject: Option<String>) -> Result<()> {
    let subject_id = subject.unwrap_or_else(|| Uuid::new_v4().to_string());
    let client = RemoteClient::new(url, &subject_id);

    let stdin = stdin();
    let stdout = stdout();
    let mut input = stdin.lock();
    let mut output = stdout.lock();
    cli::remote::run(&client, &mut input, &mut output).await?;

    Ok(())
}
