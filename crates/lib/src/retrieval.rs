//! Vector store client for retrieval-augmented answers.
//!
//! Queries one index by embedding vector and returns the matched passages'
//! text, taken from each match's `metadata.text` field.

use serde::Deserialize;

/// Client for the vector index query API.
#[derive(Clone)]
pub struct VectorStoreClient {
    index_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

#[derive(Debug, thiserror::Error)]
pub enum RetrievalError {
    #[error("vector store request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("vector store api error: {0}")]
    Api(String),
}

/// One retrieved passage with its similarity score.
#[derive(Debug, Clone)]
pub struct ScoredPassage {
    pub score: f32,
    pub text: String,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<QueryMatch>,
}

#[derive(Debug, Deserialize)]
struct QueryMatch {
    #[serde(default)]
    score: f32,
    #[serde(default)]
    metadata: Option<serde_json::Value>,
}

/// Matches without a `metadata.text` string are skipped.
fn passages_from(matches: Vec<QueryMatch>) -> Vec<ScoredPassage> {
    matches
        .into_iter()
        .filter_map(|m| {
            let text = m
                .metadata
                .as_ref()
                .and_then(|meta| meta.get("text"))
                .and_then(|t| t.as_str())?
                .to_string();
            Some(ScoredPassage {
                score: m.score,
                text,
            })
        })
        .collect()
}

impl VectorStoreClient {
    pub fn new(index_url: impl Into<String>, api_key: Option<String>) -> Self {
        let index_url = index_url.into().trim_end_matches('/').to_string();
        Self {
            index_url,
            api_key,
            client: reqwest::Client::new(),
        }
    }

    /// POST {index}/query — top-k similarity search over the document
    /// collection.
    pub async fn query(
        &self,
        vector: &[f32],
        top_k: u32,
    ) -> Result<Vec<ScoredPassage>, RetrievalError> {
        let url = format!("{}/query", self.index_url);
        let body = serde_json::json!({
            "vector": vector,
            "topK": top_k,
            "includeMetadata": true,
        });
        let mut req = self.client.post(&url).json(&body);
        if let Some(ref key) = self.api_key {
            req = req.header("Api-Key", key);
        }
        let res = req.send().await?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(RetrievalError::Api(format!("{} {}", status, body)));
        }
        let data: QueryResponse = res.json().await?;
        Ok(passages_from(data.matches))
    }
}
