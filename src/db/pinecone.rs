//! Pinecone vector database integration.
//!
//! Talks to a Pinecone index's REST data plane directly over `reqwest`:
//!
//! | Operation | Endpoint |
//! |-----------|----------|
//! | upsert | `POST {host}/vectors/upsert` |
//! | query | `POST {host}/query` |
//! | delete | `POST {host}/vectors/delete` |
//! | count | `POST {host}/describe_index_stats` |
//!
//! Requests authenticate with the `Api-Key` header. Metadata filters are
//! translated to Pinecone's operator syntax (`$eq`, `$in`, `$gte`, `$lte`).
//!
//! # Example
//!
//! ```rust,ignore
//! use recall::db::PineconeIndex;
//!
//! let index = PineconeIndex::new("https://notes-abc123.svc.pinecone.io", api_key);
//! index.upsert(entries).await?;
//! let results = index.query(&query_embedding, 5, None).await?;
//! ```

use async_trait::async_trait;
use recall_vector::{FilterCondition, Metadata, MetadataFilter, VectorEntry};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{debug, instrument, warn};

use super::vectorstore::VectorIndex;
use crate::types::{AppError, Result, SearchResult, UpsertAck};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpsertResponse {
    #[serde(default)]
    upserted_count: usize,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<QueryMatch>,
}

#[derive(Debug, Deserialize)]
struct QueryMatch {
    id: String,
    #[serde(default)]
    score: Option<f32>,
    #[serde(default)]
    metadata: Option<Map<String, Value>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IndexStats {
    #[serde(default)]
    total_vector_count: usize,
}

/// Pinecone-backed vector index.
pub struct PineconeIndex {
    http_client: reqwest::Client,
    host: String,
    api_key: String,
}

impl PineconeIndex {
    /// Create a client for the index served at `host`.
    pub fn new(host: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            host: host.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    /// Translate a metadata filter to Pinecone's filter object. Conditions on
    /// the same key share one operator object.
    pub fn filter_to_json(filter: &MetadataFilter) -> Value {
        let mut object = Map::new();
        for (key, condition) in filter.conditions() {
            let (op, value) = match condition {
                FilterCondition::Eq(v) => ("$eq", v.to_json()),
                FilterCondition::In(values) => (
                    "$in",
                    Value::Array(values.iter().map(|v| v.to_json()).collect()),
                ),
                FilterCondition::Gte(v) => ("$gte", v.to_json()),
                FilterCondition::Lte(v) => ("$lte", v.to_json()),
            };
            let slot = object
                .entry(key.clone())
                .or_insert_with(|| Value::Object(Map::new()));
            if let Value::Object(ops) = slot {
                ops.insert(op.to_string(), value);
            }
        }
        Value::Object(object)
    }

    async fn post<T: DeserializeOwned>(&self, path: &str, body: Value) -> Result<T> {
        let url = format!("{}{}", self.host, path);
        let response = self
            .http_client
            .post(&url)
            .header("Api-Key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, path, "Pinecone request failed");
                AppError::Index(format!("HTTP request failed: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            warn!(%status, path, "Pinecone returned an error");
            return Err(AppError::Index(format!(
                "Pinecone request to {} failed ({}): {}",
                path, status, text
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::Index(format!("Failed to parse Pinecone response: {}", e)))
    }
}

#[async_trait]
impl VectorIndex for PineconeIndex {
    fn provider_name(&self) -> &'static str {
        "pinecone"
    }

    #[instrument(skip(self, entries), fields(count = entries.len()))]
    async fn upsert(&self, entries: Vec<VectorEntry>) -> Result<UpsertAck> {
        let vectors: Vec<Value> = entries
            .iter()
            .map(|e| {
                json!({
                    "id": e.id,
                    "values": e.vector,
                    "metadata": e.metadata.to_json(),
                })
            })
            .collect();

        let response: UpsertResponse = self
            .post("/vectors/upsert", json!({ "vectors": vectors }))
            .await?;
        debug!(upserted = response.upserted_count, "Pinecone upsert complete");

        Ok(UpsertAck {
            upserted_count: response.upserted_count,
        })
    }

    #[instrument(skip(self, vector, filter))]
    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<SearchResult>> {
        let mut body = json!({
            "vector": vector,
            "topK": top_k,
            "includeMetadata": true,
        });
        if let Some(filter) = filter {
            body["filter"] = Self::filter_to_json(filter);
        }

        let response: QueryResponse = self.post("/query", body).await?;

        Ok(response
            .matches
            .into_iter()
            .map(|m| {
                let metadata = m
                    .metadata
                    .as_ref()
                    .map(Metadata::from_json_object)
                    .unwrap_or_default();
                SearchResult::from_parts(m.id, m.score.unwrap_or(0.0), metadata)
            })
            .collect())
    }

    /// Pinecone does not report how many ids existed, so this returns the
    /// number of ids submitted.
    async fn delete(&self, ids: &[String]) -> Result<usize> {
        let _: Value = self.post("/vectors/delete", json!({ "ids": ids })).await?;
        Ok(ids.len())
    }

    /// Uses Pinecone's delete-by-metadata. The count removed is not reported,
    /// so this returns 0.
    async fn delete_where(&self, filter: &MetadataFilter) -> Result<usize> {
        let _: Value = self
            .post(
                "/vectors/delete",
                json!({ "filter": Self::filter_to_json(filter) }),
            )
            .await?;
        Ok(0)
    }

    async fn count(&self) -> Result<usize> {
        let stats: IndexStats = self.post("/describe_index_stats", json!({})).await?;
        Ok(stats.total_vector_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recall_vector::MetadataValue;

    #[test]
    fn test_filter_to_json_equality() {
        let filter = MetadataFilter::from_pairs([("category", "notes")]);
        assert_eq!(
            PineconeIndex::filter_to_json(&filter),
            json!({"category": {"$eq": "notes"}})
        );
    }

    #[test]
    fn test_filter_to_json_merges_range_on_same_key() {
        let filter = MetadataFilter::new()
            .with("date", FilterCondition::Gte("2024-01-01".into()))
            .with("date", FilterCondition::Lte("2024-01-31".into()))
            .with(
                "category",
                FilterCondition::In(vec![MetadataValue::from("a"), MetadataValue::from("b")]),
            );

        assert_eq!(
            PineconeIndex::filter_to_json(&filter),
            json!({
                "date": {"$gte": "2024-01-01", "$lte": "2024-01-31"},
                "category": {"$in": ["a", "b"]}
            })
        );
    }

    #[test]
    fn test_host_trailing_slash_is_trimmed() {
        let index = PineconeIndex::new("https://example.pinecone.io/", "key");
        assert_eq!(index.host, "https://example.pinecone.io");
    }
}
