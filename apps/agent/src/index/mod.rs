//! Retrieval index over the applicant's documents.
//!
//! Documents are chunked, embedded once, and persisted as JSON alongside a
//! small manifest (backend, model, dimension). On startup the persisted
//! index is reused when the manifest matches the configured embedding
//! provider; otherwise it is rebuilt from the documents directory.

pub mod embedding;
pub mod loader;

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::errors::AppError;
use embedding::{cosine_similarity, EmbeddingProvider};

/// Maximum characters per indexed chunk.
pub const CHUNK_SIZE: usize = 1000;
/// File name of the persisted index inside the index directory.
const INDEX_FILE: &str = "index.json";
/// Chunks embedded per API call when building the index.
const EMBED_BATCH_SIZE: usize = 128;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct IndexedChunk {
    source: String,
    text: String,
    embedding: Vec<f32>,
}

/// A chunk returned from retrieval, scored against the query.
#[derive(Debug, Clone)]
pub struct RetrievedChunk {
    pub source: String,
    pub text: String,
    pub score: f32,
}

#[derive(Debug, Serialize, Deserialize)]
struct PersistedIndex {
    embedding_backend: String,
    embedding_model: Option<String>,
    dimension: usize,
    chunk_count: usize,
    built_at: DateTime<Utc>,
    chunks: Vec<IndexedChunk>,
}

pub struct DocumentIndex {
    docs_dir: PathBuf,
    index_dir: PathBuf,
    provider: EmbeddingProvider,
    chunks: Vec<IndexedChunk>,
}

impl DocumentIndex {
    /// Open the persisted index if it matches the provider, otherwise build
    /// a fresh one from the documents directory. `refresh` forces a rebuild.
    pub async fn open_or_build(
        docs_dir: &Path,
        index_dir: &Path,
        provider: EmbeddingProvider,
        refresh: bool,
    ) -> Result<Self, AppError> {
        let mut index = Self {
            docs_dir: docs_dir.to_path_buf(),
            index_dir: index_dir.to_path_buf(),
            provider,
            chunks: Vec::new(),
        };

        if refresh {
            index.rebuild().await?;
            return Ok(index);
        }

        let index_file = index.index_dir.join(INDEX_FILE);
        if index_file.exists() {
            match index.load(&index_file) {
                Ok(()) => {
                    info!(
                        "Loaded persisted index with {} chunks from {}",
                        index.chunks.len(),
                        index_file.display()
                    );
                    return Ok(index);
                }
                Err(reason) => {
                    warn!("Rebuilding index: {reason}");
                }
            }
        }

        index.build().await?;
        Ok(index)
    }

    /// Discard any persisted state and re-index the documents directory.
    pub async fn rebuild(&mut self) -> Result<(), AppError> {
        if self.index_dir.exists() {
            fs::remove_dir_all(&self.index_dir)?;
        }
        self.build().await
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Return the `k` chunks most similar to the query, best first.
    pub async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<RetrievedChunk>, AppError> {
        let query_embedding = self.provider.embed(query).await?;

        let mut scored: Vec<RetrievedChunk> = self
            .chunks
            .iter()
            .map(|chunk| RetrievedChunk {
                source: chunk.source.clone(),
                text: chunk.text.clone(),
                score: cosine_similarity(&query_embedding, &chunk.embedding),
            })
            .collect();

        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(k);

        if let Some(best) = scored.first() {
            debug!(
                "Retrieved {} chunks, best score {:.3} from {}",
                scored.len(),
                best.score,
                best.source
            );
        }

        Ok(scored)
    }

    async fn build(&mut self) -> Result<(), AppError> {
        let documents = loader::load_documents(&self.docs_dir)?;

        let mut sources = Vec::new();
        let mut texts = Vec::new();
        for doc in &documents {
            for chunk in loader::chunk_text(&doc.text, CHUNK_SIZE) {
                sources.push(doc.source.clone());
                texts.push(chunk);
            }
        }

        if texts.is_empty() {
            return Err(AppError::Index(format!(
                "Documents in {} produced no indexable text",
                self.docs_dir.display()
            )));
        }

        info!(
            "Indexing {} chunks from {} documents with the {} backend",
            texts.len(),
            documents.len(),
            self.provider.backend_label()
        );

        let mut embeddings = Vec::with_capacity(texts.len());
        for start in (0..texts.len()).step_by(EMBED_BATCH_SIZE) {
            let end = (start + EMBED_BATCH_SIZE).min(texts.len());
            embeddings.extend(self.provider.embed_batch(&texts[start..end]).await?);
        }

        self.chunks = sources
            .into_iter()
            .zip(texts)
            .zip(embeddings)
            .map(|((source, text), embedding)| IndexedChunk {
                source,
                text,
                embedding,
            })
            .collect();

        self.persist()?;
        Ok(())
    }

    fn persist(&self) -> Result<(), AppError> {
        fs::create_dir_all(&self.index_dir)?;

        let persisted = PersistedIndex {
            embedding_backend: self.provider.backend_label().to_string(),
            embedding_model: self.provider.model_code().map(str::to_string),
            dimension: self.provider.dimension(),
            chunk_count: self.chunks.len(),
            built_at: Utc::now(),
            chunks: self.chunks.clone(),
        };

        let json = serde_json::to_string(&persisted)
            .map_err(|e| AppError::Index(format!("Cannot serialize index: {e}")))?;
        fs::write(self.index_dir.join(INDEX_FILE), json)?;

        info!(
            "Persisted {} chunks to {}",
            self.chunks.len(),
            self.index_dir.join(INDEX_FILE).display()
        );
        Ok(())
    }

    /// Load a persisted index, validating it against the current provider.
    /// Returns a human-readable reason when the file cannot be reused.
    fn load(&mut self, index_file: &Path) -> Result<(), String> {
        let json = fs::read_to_string(index_file)
            .map_err(|e| format!("cannot read {}: {e}", index_file.display()))?;
        let persisted: PersistedIndex = serde_json::from_str(&json)
            .map_err(|e| format!("persisted index is corrupt: {e}"))?;

        if persisted.embedding_backend != self.provider.backend_label() {
            return Err(format!(
                "persisted index was built with the '{}' backend, configured backend is '{}'",
                persisted.embedding_backend,
                self.provider.backend_label()
            ));
        }
        if persisted.dimension != self.provider.dimension() {
            return Err(format!(
                "persisted index has dimension {}, configured dimension is {}",
                persisted.dimension,
                self.provider.dimension()
            ));
        }
        if persisted.embedding_model.as_deref() != self.provider.model_code() {
            return Err(format!(
                "persisted index was built with model {:?}, configured model is {:?}",
                persisted.embedding_model,
                self.provider.model_code()
            ));
        }

        self.chunks = persisted.chunks;
        Ok(())
    }
}
