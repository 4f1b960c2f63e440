// src/config/feed.rs
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::ingest::providers::guardian::DEFAULT_GUARDIAN_BASE_URL;

pub const ENV_FEED_CONFIG_PATH: &str = "FEED_CONFIG_PATH";
pub const DEFAULT_FEED_CONFIG_PATH: &str = "config/feed.toml";
pub const ENV_GUARDIAN_API_KEY: &str = "GUARDIAN_API_KEY";

/// Items kept per RSS feed, and per query for the search provider.
pub const DEFAULT_PER_PROVIDER_LIMIT: usize = 2;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

fn default_limit() -> usize {
    DEFAULT_PER_PROVIDER_LIMIT
}
fn default_timeout() -> u64 {
    DEFAULT_HTTP_TIMEOUT_SECS
}
fn default_curated_path() -> PathBuf {
    PathBuf::from("config/curated_articles.json")
}
fn default_issues_path() -> PathBuf {
    PathBuf::from("config/issues.json")
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct SearchQuery {
    pub query: String,
    /// Historical topic hint; the classifier decides the final issue.
    #[serde(default)]
    pub issue_hint: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct SearchConfig {
    pub name: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    pub queries: Vec<SearchQuery>,
}

fn default_base_url() -> String {
    DEFAULT_GUARDIAN_BASE_URL.to_string()
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct FeedSpec {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub issue_hint: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct FeedConfig {
    #[serde(default = "default_limit")]
    pub per_provider_limit: usize,
    #[serde(default = "default_timeout")]
    pub http_timeout_secs: u64,
    pub search: SearchConfig,
    #[serde(default)]
    pub feeds: Vec<FeedSpec>,
    #[serde(default = "default_curated_path")]
    pub curated_path: PathBuf,
    #[serde(default = "default_issues_path")]
    pub issues_path: PathBuf,
    /// Resolved from `GUARDIAN_API_KEY`, never from the file.
    #[serde(skip)]
    pub guardian_api_key: Option<String>,
}

impl Default for FeedConfig {
    fn default() -> Self {
        let feed = |name: &str, url: &str, hint: &str| FeedSpec {
            name: name.to_string(),
            url: url.to_string(),
            issue_hint: Some(hint.to_string()),
        };
        Self {
            per_provider_limit: DEFAULT_PER_PROVIDER_LIMIT,
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            search: SearchConfig {
                name: "The Guardian".to_string(),
                base_url: default_base_url(),
                queries: vec![
                    SearchQuery {
                        query: "immigration ICE raids".to_string(),
                        issue_hint: Some("ICE RAIDS".to_string()),
                    },
                    SearchQuery {
                        query: "climate crisis environment".to_string(),
                        issue_hint: Some("CLIMATE".to_string()),
                    },
                ],
            },
            feeds: vec![
                feed("Common Dreams", "https://www.commondreams.org/rss.xml", "ICE RAIDS"),
                feed(
                    "Democracy Now",
                    "https://www.democracynow.org/democracynow.rss",
                    "ICE RAIDS",
                ),
                feed("Grist", "https://grist.org/feed/", "CLIMATE"),
                feed(
                    "Inside Climate News",
                    "https://insideclimatenews.org/feed/",
                    "CLIMATE",
                ),
            ],
            curated_path: default_curated_path(),
            issues_path: default_issues_path(),
            guardian_api_key: None,
        }
    }
}

impl FeedConfig {
    /// Attach credentials from the environment (empty values count as absent).
    pub fn with_env_credentials(mut self) -> Self {
        self.guardian_api_key = std::env::var(ENV_GUARDIAN_API_KEY)
            .ok()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());
        self
    }
}

/// Load feed config from an explicit path. Supports TOML or JSON formats.
pub fn load_feed_config_from(path: &Path) -> Result<FeedConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading feed config from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    let cfg = parse_feed_config(&content, ext.as_str())?;
    Ok(sanitize(cfg))
}

/// Load feed config using env var + fallbacks:
/// 1) $FEED_CONFIG_PATH
/// 2) config/feed.toml
/// 3) built-in defaults
pub fn load_feed_config_default() -> Result<FeedConfig> {
    let cfg = if let Ok(p) = std::env::var(ENV_FEED_CONFIG_PATH) {
        let pb = PathBuf::from(p);
        if !pb.exists() {
            return Err(anyhow!("FEED_CONFIG_PATH points to non-existent path"));
        }
        load_feed_config_from(&pb)?
    } else {
        let toml_p = PathBuf::from(DEFAULT_FEED_CONFIG_PATH);
        if toml_p.exists() {
            load_feed_config_from(&toml_p)?
        } else {
            FeedConfig::default()
        }
    };
    Ok(cfg.with_env_credentials())
}

fn parse_feed_config(s: &str, hint_ext: &str) -> Result<FeedConfig> {
    if hint_ext == "json" {
        return serde_json::from_str(s).context("parsing feed config json");
    }
    toml::from_str(s).context("parsing feed config toml")
}

fn sanitize(mut cfg: FeedConfig) -> FeedConfig {
    if cfg.per_provider_limit == 0 {
        cfg.per_provider_limit = DEFAULT_PER_PROVIDER_LIMIT;
    }
    if cfg.http_timeout_secs == 0 {
        cfg.http_timeout_secs = DEFAULT_HTTP_TIMEOUT_SECS;
    }
    cfg.feeds.retain(|f| !f.name.trim().is_empty() && !f.url.trim().is_empty());
    cfg
}
