// src/ingest/providers/guardian.rs
//! Guardian content API search provider: one provider, several topic queries.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use futures::future::try_join_all;
use serde::Deserialize;

use crate::config::SearchQuery;
use crate::ingest::types::{RawItem, SourceProvider};

pub const DEFAULT_GUARDIAN_BASE_URL: &str = "https://content.guardianapis.com";

#[derive(Debug, Deserialize)]
struct SearchEnvelope {
    response: SearchResponse,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchResult {
    web_title: Option<String>,
    web_url: Option<String>,
    #[serde(default)]
    fields: Option<Fields>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Fields {
    thumbnail: Option<String>,
    trail_text: Option<String>,
}

pub struct GuardianProvider {
    name: String,
    base_url: String,
    api_key: String,
    queries: Vec<SearchQuery>,
    client: reqwest::Client,
}

impl GuardianProvider {
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        queries: Vec<SearchQuery>,
        client: reqwest::Client,
    ) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into(),
            api_key: api_key.into(),
            queries,
            client,
        }
    }

    pub fn parse_results(body: &str) -> Result<Vec<RawItem>> {
        let env: SearchEnvelope = serde_json::from_str(body).context("parsing guardian search json")?;
        Ok(env
            .response
            .results
            .into_iter()
            .map(|r| {
                let fields = r.fields.unwrap_or(Fields {
                    thumbnail: None,
                    trail_text: None,
                });
                RawItem {
                    title: r.web_title,
                    link: r.web_url,
                    media_thumbnail_url: fields.thumbnail,
                    description: fields.trail_text,
                    ..Default::default()
                }
            })
            .collect())
    }

    async fn search(&self, query: &SearchQuery, limit: usize) -> Result<Vec<RawItem>> {
        let url = format!("{}/search", self.base_url.trim_end_matches('/'));
        let page_size = limit.to_string();
        let resp = self
            .client
            .get(&url)
            .query(&[
                ("api-key", self.api_key.as_str()),
                ("q", query.query.as_str()),
                ("show-fields", "thumbnail,headline,trailText"),
                ("page-size", page_size.as_str()),
            ])
            .send()
            .await
            .with_context(|| format!("guardian search '{}'", query.query))?;
        if !resp.status().is_success() {
            bail!("guardian search '{}' returned {}", query.query, resp.status());
        }
        let body = resp.text().await.context("guardian .text()")?;
        let mut items = Self::parse_results(&body)?;
        items.truncate(limit);
        Ok(items)
    }
}

#[async_trait]
impl SourceProvider for GuardianProvider {
    /// `limit` applies per query; results keep query order.
    async fn fetch_items(&self, limit: usize) -> Result<Vec<RawItem>> {
        let per_query = try_join_all(self.queries.iter().map(|q| self.search(q, limit))).await?;
        Ok(per_query.into_iter().flatten().collect())
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn max_items(&self, limit: usize) -> usize {
        limit * self.queries.len()
    }
}
