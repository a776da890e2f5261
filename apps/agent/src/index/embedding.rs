//! Embedding backends for the document index.
//!
//! Production uses the OpenAI embeddings API. The hashed backend produces
//! deterministic token-bucket vectors with no network and backs the tests.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default embedding model. Override with the EMBEDDING_MODEL environment variable.
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";
/// Output dimension of text-embedding-3-small.
const OPENAI_EMBEDDING_DIMENSION: usize = 1536;
const OPENAI_EMBEDDINGS_URL: &str = "https://api.openai.com/v1/embeddings";

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Embedding API returned no data")]
    Empty,
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

#[derive(Clone)]
pub enum EmbeddingProvider {
    OpenAi {
        client: Client,
        api_key: String,
        model: String,
    },
    Hashed {
        dimension: usize,
    },
}

impl EmbeddingProvider {
    pub fn new_openai(api_key: String, model: String) -> Self {
        Self::OpenAi {
            client: Client::new(),
            api_key,
            model,
        }
    }

    pub fn new_hashed(dimension: usize) -> Self {
        Self::Hashed {
            dimension: dimension.max(1),
        }
    }

    pub fn backend_label(&self) -> &'static str {
        match self {
            Self::OpenAi { .. } => "openai",
            Self::Hashed { .. } => "hashed",
        }
    }

    pub fn dimension(&self) -> usize {
        match self {
            Self::OpenAi { .. } => OPENAI_EMBEDDING_DIMENSION,
            Self::Hashed { dimension } => *dimension,
        }
    }

    pub fn model_code(&self) -> Option<&str> {
        match self {
            Self::OpenAi { model, .. } => Some(model),
            Self::Hashed { .. } => None,
        }
    }

    pub async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        match self {
            Self::Hashed { dimension } => Ok(hashed_embedding(text, *dimension)),
            Self::OpenAi { .. } => {
                let input = [text.to_string()];
                let mut batch = self.embed_batch(&input).await?;
                batch.pop().ok_or(EmbeddingError::Empty)
            }
        }
    }

    pub async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        match self {
            Self::Hashed { dimension } => Ok(texts
                .iter()
                .map(|text| hashed_embedding(text, *dimension))
                .collect()),
            Self::OpenAi {
                client,
                api_key,
                model,
            } => {
                if texts.is_empty() {
                    return Ok(Vec::new());
                }

                let response = client
                    .post(OPENAI_EMBEDDINGS_URL)
                    .bearer_auth(api_key)
                    .json(&EmbeddingRequest {
                        model,
                        input: texts,
                    })
                    .send()
                    .await?;

                let status = response.status();
                if !status.is_success() {
                    let message = response.text().await.unwrap_or_default();
                    return Err(EmbeddingError::Api {
                        status: status.as_u16(),
                        message,
                    });
                }

                let body: EmbeddingResponse = response.json().await?;
                let mut data = body.data;
                data.sort_by_key(|d| d.index);
                Ok(data.into_iter().map(|d| d.embedding).collect())
            }
        }
    }
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Deterministic token-bucket vector, L2-normalized.
fn hashed_embedding(text: &str, dimension: usize) -> Vec<f32> {
    let dim = dimension.max(1);
    let mut vector = vec![0.0f32; dim];
    if text.is_empty() {
        return vector;
    }

    for token in tokens(text) {
        vector[bucket(&token, dim)] += 1.0;
    }

    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        for value in &mut vector {
            *value /= norm;
        }
    }

    vector
}

fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(|token| token.to_ascii_lowercase())
}

fn bucket(token: &str, dimension: usize) -> usize {
    let mut hasher = DefaultHasher::new();
    token.hash(&mut hasher);
    (hasher.finish() as usize) % dimension
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hashed_embedding_is_deterministic() {
        let a = hashed_embedding("ten years of Rust experience", 64);
        let b = hashed_embedding("ten years of Rust experience", 64);
        assert_eq!(a, b);
    }

    #[test]
    fn test_hashed_embedding_is_normalized() {
        let v = hashed_embedding("distributed systems and storage engines", 64);
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5, "norm should be 1.0, got {norm}");
    }

    #[test]
    fn test_hashed_embedding_empty_text_is_zero_vector() {
        let v = hashed_embedding("", 16);
        assert_eq!(v.len(), 16);
        assert!(v.iter().all(|x| *x == 0.0));
    }

    #[test]
    fn test_token_overlap_ranks_above_unrelated_text() {
        let query = hashed_embedding("rust scheduler platform", 128);
        let related = hashed_embedding("designed a scheduler platform in rust", 128);
        let unrelated = hashed_embedding("baking sourdough bread on weekends", 128);
        assert!(
            cosine_similarity(&query, &related) > cosine_similarity(&query, &unrelated),
            "overlapping tokens must score higher"
        );
    }

    #[test]
    fn test_cosine_similarity_identical_vectors() {
        let v = hashed_embedding("some text", 32);
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_cosine_similarity_mismatched_lengths_is_zero() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[1.0]), 0.0);
    }

    #[test]
    fn test_provider_accessors() {
        let hashed = EmbeddingProvider::new_hashed(64);
        assert_eq!(hashed.backend_label(), "hashed");
        assert_eq!(hashed.dimension(), 64);
        assert!(hashed.model_code().is_none());

        let openai =
            EmbeddingProvider::new_openai("key".to_string(), DEFAULT_EMBEDDING_MODEL.to_string());
        assert_eq!(openai.backend_label(), "openai");
        assert_eq!(openai.dimension(), 1536);
        assert_eq!(openai.model_code(), Some(DEFAULT_EMBEDDING_MODEL));
    }

    #[tokio::test]
    async fn test_hashed_embed_batch_matches_single_embeds() {
        let provider = EmbeddingProvider::new_hashed(32);
        let texts = vec!["first chunk".to_string(), "second chunk".to_string()];
        let batch = provider.embed_batch(&texts).await.unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0], provider.embed("first chunk").await.unwrap());
        assert_eq!(batch[1], provider.embed("second chunk").await.unwrap());
    }
}
