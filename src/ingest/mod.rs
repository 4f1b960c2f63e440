// src/ingest/mod.rs
pub mod image;
pub mod providers;
pub mod types;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use futures::future::join_all;
use metrics::{counter, describe_counter};
use once_cell::sync::OnceCell;

use crate::config::FeedConfig;
use crate::ingest::image::extract_image;
use crate::ingest::providers::{GuardianProvider, RssProvider};
use crate::ingest::types::{NormalizedArticle, RawItem, SourceProvider};

/// Excerpts longer than this are cut; they only feed the classifier/extractor.
pub const EXCERPT_MAX_CHARS: usize = 1000;

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "feed_items_fetched_total",
            "Raw items returned by providers."
        );
        describe_counter!(
            "feed_provider_errors_total",
            "Provider fetch/parse errors (provider contributed zero items)."
        );
        describe_counter!(
            "feed_provider_http_errors_total",
            "Transport-level errors while fetching RSS feeds."
        );
        describe_counter!(
            "feed_missing_credential_total",
            "Aggregations skipped because the search credential is absent."
        );
    });
}

/// Normalize text: decode entities, strip tags, collapse whitespace, cap length.
pub fn normalize_text(s: &str) -> String {
    // 1) HTML entity decode
    let mut out = html_escape::decode_html_entities(s).to_string();

    // 2) Strip HTML tags
    static RE_TAGS: OnceCell<regex::Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, " ").to_string();

    // 3) Normalize curly quotes to ASCII
    out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    // 4) Collapse whitespace
    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").trim().to_string();

    // 5) Length cap
    if out.chars().count() > EXCERPT_MAX_CHARS {
        out = out.chars().take(EXCERPT_MAX_CHARS).collect();
    }

    out
}

/// Map one raw item into the common record.
pub fn normalize_item(item: RawItem, source: &str) -> NormalizedArticle {
    let image = extract_image(&item);
    let content = [
        item.content_snippet.as_deref(),
        item.description.as_deref(),
        item.content.as_deref(),
    ]
    .into_iter()
    .flatten()
    .map(normalize_text)
    .find(|s| !s.is_empty());

    NormalizedArticle {
        title: item.title.unwrap_or_default(),
        link: item.link.unwrap_or_default(),
        image,
        content,
        source: source.to_string(),
    }
}

/// Anything that can produce the normalized article list for one feed request.
#[async_trait::async_trait]
pub trait Aggregates: Send + Sync {
    async fn aggregate(&self) -> Result<Vec<NormalizedArticle>>;
}

/// Fans out to every provider and keeps whatever succeeded.
pub struct Aggregator {
    providers: Vec<Arc<dyn SourceProvider>>,
    per_provider_limit: usize,
    /// The search credential is structurally required; without it nothing runs.
    credential_present: bool,
}

impl Aggregator {
    pub fn new(
        providers: Vec<Arc<dyn SourceProvider>>,
        per_provider_limit: usize,
        credential_present: bool,
    ) -> Self {
        Self {
            providers,
            per_provider_limit,
            credential_present,
        }
    }

    /// Default provider set: the search provider first, then the RSS feeds in config order.
    pub fn from_config(cfg: &FeedConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("rage2sage-feed/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(cfg.http_timeout_secs))
            .build()
            .context("building feed http client")?;

        let mut providers: Vec<Arc<dyn SourceProvider>> = Vec::with_capacity(cfg.feeds.len() + 1);
        if let Some(key) = cfg.guardian_api_key.as_deref() {
            providers.push(Arc::new(GuardianProvider::new(
                cfg.search.name.clone(),
                cfg.search.base_url.clone(),
                key,
                cfg.search.queries.clone(),
                client.clone(),
            )));
        }
        for f in &cfg.feeds {
            providers.push(Arc::new(RssProvider::from_url(
                f.name.clone(),
                f.url.clone(),
                client.clone(),
            )));
        }

        Ok(Self::new(
            providers,
            cfg.per_provider_limit,
            cfg.guardian_api_key.is_some(),
        ))
    }

    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    async fn fetch_one(&self, p: &dyn SourceProvider) -> Vec<NormalizedArticle> {
        match p.fetch_items(self.per_provider_limit).await {
            Ok(mut items) => {
                let cap = p.max_items(self.per_provider_limit);
                if items.len() > cap {
                    tracing::debug!(target: "feed", provider = p.name(), returned = items.len(), cap, "provider ignored limit");
                    items.truncate(cap);
                }
                counter!("feed_items_fetched_total").increment(items.len() as u64);
                tracing::debug!(target: "feed", provider = p.name(), count = items.len(), "provider ok");
                items
                    .into_iter()
                    .map(|it| normalize_item(it, p.name()))
                    .collect()
            }
            Err(e) => {
                tracing::warn!(target: "feed", error = ?e, provider = p.name(), "provider error");
                counter!("feed_provider_errors_total").increment(1);
                Vec::new()
            }
        }
    }
}

#[async_trait::async_trait]
impl Aggregates for Aggregator {
    async fn aggregate(&self) -> Result<Vec<NormalizedArticle>> {
        ensure_metrics_described();

        if !self.credential_present {
            tracing::error!(target: "feed", "GUARDIAN_API_KEY is not set; returning empty feed");
            counter!("feed_missing_credential_total").increment(1);
            return Ok(Vec::new());
        }

        // join_all keeps declaration order regardless of completion order.
        let per_provider = join_all(self.providers.iter().map(|p| self.fetch_one(p.as_ref()))).await;
        Ok(per_provider.into_iter().flatten().collect())
    }
}
