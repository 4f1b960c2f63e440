// src/ingest/types.rs
use anyhow::Result;

/// Provider-neutral shape of one raw feed/search item, before normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawItem {
    pub title: Option<String>,
    pub link: Option<String>,
    pub enclosure_url: Option<String>,
    pub media_thumbnail_url: Option<String>,
    pub media_content_url: Option<String>,
    /// Full HTML body (`content:encoded` in RSS).
    pub content: Option<String>,
    pub content_snippet: Option<String>,
    pub description: Option<String>,
}

/// Common record produced by the aggregator for every provider item.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct NormalizedArticle {
    pub title: String,
    pub link: String,
    pub image: Option<String>,
    /// Plain-text excerpt; classification/location input only.
    #[serde(skip_serializing, default)]
    pub content: Option<String>,
    pub source: String, // e.g., "The Guardian", "Grist"
}

#[async_trait::async_trait]
pub trait SourceProvider: Send + Sync {
    /// Fetch at most `limit` raw items (per feed, or per query for search providers).
    async fn fetch_items(&self, limit: usize) -> Result<Vec<RawItem>>;
    /// Display name attached to every article as `source`.
    fn name(&self) -> &str;
    /// Total items the aggregator keeps from one `fetch_items(limit)` call.
    fn max_items(&self, limit: usize) -> usize {
        limit
    }
}
