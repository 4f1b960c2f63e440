// src/curated.rs
//! Read side of the curated-article store and the presentation-time merge with
//! pipeline output.

use std::collections::HashSet;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::analyze::location::Location;
use crate::feed::ClassifiedArticle;

/// One row of the external curation store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CuratedArticle {
    pub id: i64,
    pub title: String,
    pub link: String,
    #[serde(default)]
    pub image_url: Option<String>,
    pub issue: String,
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub source: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Shape the presentation layer renders, for curated and generated items alike.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedItem {
    pub issue: String,
    pub title: String,
    pub link: String,
    pub image: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub location: Option<Location>,
    pub curated: bool,
    pub priority: i32,
}

impl From<CuratedArticle> for FeedItem {
    fn from(a: CuratedArticle) -> Self {
        Self {
            issue: a.issue,
            title: a.title,
            link: a.link,
            image: a.image_url,
            source: a.source,
            location: None,
            curated: true,
            priority: a.priority,
        }
    }
}

impl From<ClassifiedArticle> for FeedItem {
    fn from(a: ClassifiedArticle) -> Self {
        Self {
            issue: a.issue.label().to_string(),
            title: a.title,
            link: a.link,
            image: a.image,
            source: Some(a.source),
            location: a.location,
            curated: a.curated,
            priority: a.priority,
        }
    }
}

#[async_trait::async_trait]
pub trait CuratedStore: Send + Sync {
    async fn list(&self) -> Result<Vec<CuratedArticle>>;
}

/// JSON array on disk, re-read on every call. A missing file is an empty store.
pub struct JsonFileCuratedStore {
    path: PathBuf,
}

impl JsonFileCuratedStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait::async_trait]
impl CuratedStore for JsonFileCuratedStore {
    async fn list(&self) -> Result<Vec<CuratedArticle>> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(s) => s,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(e).with_context(|| format!("reading {}", self.path.display()));
            }
        };
        serde_json::from_str(&raw).with_context(|| format!("parsing {}", self.path.display()))
    }
}

/// Highest priority first, newest first within a priority.
pub fn curated_feed_items(mut articles: Vec<CuratedArticle>) -> Vec<FeedItem> {
    articles.sort_by(|a, b| {
        b.priority
            .cmp(&a.priority)
            .then_with(|| b.created_at.cmp(&a.created_at))
    });
    articles.into_iter().map(FeedItem::from).collect()
}

/// Curated items first; generated items whose link is already curated are dropped.
pub fn merge_feeds(curated: Vec<FeedItem>, generated: Vec<ClassifiedArticle>) -> Vec<FeedItem> {
    let curated_links: HashSet<String> = curated.iter().map(|c| c.link.clone()).collect();
    let mut out = curated;
    out.extend(
        generated
            .into_iter()
            .filter(|g| !curated_links.contains(&g.link))
            .map(FeedItem::from),
    );
    out
}

/// Store errors read as "nothing curated".
pub async fn load_curated_items(store: &dyn CuratedStore) -> Vec<FeedItem> {
    match store.list().await {
        Ok(v) => curated_feed_items(v),
        Err(e) => {
            tracing::error!(target: "curated", error = ?e, "curated store unavailable");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze::classify::Issue;
    use chrono::TimeZone;

    fn curated(id: i64, priority: i32, day: u32, link: &str) -> CuratedArticle {
        CuratedArticle {
            id,
            title: format!("c{id}"),
            link: link.to_string(),
            image_url: None,
            issue: "CLIMATE".into(),
            priority,
            source: None,
            created_at: Utc.with_ymd_and_hms(2025, 6, day, 0, 0, 0).unwrap(),
        }
    }

    fn generated(link: &str) -> ClassifiedArticle {
        ClassifiedArticle {
            issue: Issue::IceRaids,
            title: "g".into(),
            link: link.into(),
            image: None,
            source: "Grist".into(),
            location: None,
            curated: false,
            priority: 0,
        }
    }

    #[test]
    fn curated_sorted_by_priority_then_recency() {
        let items = curated_feed_items(vec![
            curated(1, 0, 3, "a"),
            curated(2, 5, 1, "b"),
            curated(3, 5, 2, "c"),
        ]);
        let ids: Vec<_> = items.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(ids, vec!["c3", "c2", "c1"]);
        assert!(items.iter().all(|i| i.curated));
    }

    #[test]
    fn merge_puts_curated_first_and_drops_duplicate_links() {
        let c = curated_feed_items(vec![curated(1, 1, 1, "https://dup")]);
        let out = merge_feeds(c, vec![generated("https://dup"), generated("https://new")]);
        assert_eq!(out.len(), 2);
        assert!(out[0].curated);
        assert_eq!(out[1].link, "https://new");
        assert_eq!(out[1].issue, "ICE RAIDS");
    }

    #[tokio::test]
    async fn file_store_missing_is_empty_and_bad_json_errors() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileCuratedStore::new(dir.path().join("none.json"));
        assert!(store.list().await.unwrap().is_empty());

        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, "{not json").unwrap();
        let store = JsonFileCuratedStore::new(&bad);
        assert!(store.list().await.is_err());
        assert!(load_curated_items(&store).await.is_empty());
    }
}
