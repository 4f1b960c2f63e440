// src/feed.rs
//! Feed assembly: aggregate → classify + locate per article → keep the two issues.

use std::sync::Arc;
use std::time::Instant;

use futures::future::join_all;
use metrics::{counter, describe_counter, describe_histogram, histogram};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

use crate::analyze::classify::{Classifies, Issue};
use crate::analyze::location::{extract_location, Location};
use crate::ingest::types::NormalizedArticle;
use crate::ingest::Aggregates;

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("feed_articles_total", "Articles returned by the feed pipeline.");
        describe_counter!(
            "feed_dropped_total",
            "Articles dropped because their label was not a supported issue."
        );
        describe_counter!(
            "feed_pipeline_failures_total",
            "Feed builds that failed and returned an empty list."
        );
        describe_histogram!("feed_build_ms", "Feed build time in milliseconds.");
    });
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedArticle {
    pub issue: Issue,
    pub title: String,
    pub link: String,
    pub image: Option<String>,
    pub source: String,
    pub location: Option<Location>,
    pub curated: bool,
    pub priority: i32,
}

pub struct FeedAssembler {
    aggregator: Arc<dyn Aggregates>,
    classifier: Arc<dyn Classifies>,
}

impl FeedAssembler {
    pub fn new(aggregator: Arc<dyn Aggregates>, classifier: Arc<dyn Classifies>) -> Self {
        Self {
            aggregator,
            classifier,
        }
    }

    /// Never fails: any unrecoverable error yields an empty feed.
    pub async fn build_feed(&self) -> Vec<ClassifiedArticle> {
        ensure_metrics_described();
        let t0 = Instant::now();

        let articles = match self.aggregator.aggregate().await {
            Ok(v) => v,
            Err(e) => {
                tracing::error!(target: "feed", error = ?e, "feed aggregation failed");
                counter!("feed_pipeline_failures_total").increment(1);
                return Vec::new();
            }
        };
        let fetched = articles.len();

        let enriched = join_all(articles.into_iter().map(|a| self.enrich(a))).await;
        let out: Vec<ClassifiedArticle> = enriched.into_iter().flatten().collect();

        let dropped = fetched - out.len();
        if dropped > 0 {
            counter!("feed_dropped_total").increment(dropped as u64);
        }
        counter!("feed_articles_total").increment(out.len() as u64);
        histogram!("feed_build_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
        tracing::info!(target: "feed", fetched, kept = out.len(), dropped, "feed built");
        out
    }

    /// `None` when the classifier's label is not one of the supported issues.
    async fn enrich(&self, a: NormalizedArticle) -> Option<ClassifiedArticle> {
        let content = a.content.as_deref();
        let label = self.classifier.classify_label(&a.title, content).await;
        let location = extract_location(&a.title, content);
        let Some(issue) = Issue::from_label(&label) else {
            tracing::warn!(target: "feed", %label, source = %a.source, "dropping article with unsupported issue");
            return None;
        };
        Some(ClassifiedArticle {
            issue,
            title: a.title,
            link: a.link,
            image: a.image,
            source: a.source,
            location,
            curated: false,
            priority: 0,
        })
    }
}
