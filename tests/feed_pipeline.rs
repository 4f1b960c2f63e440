// tests/feed_pipeline.rs
use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use rage2sage_feed::ingest::providers::RssProvider;
use rage2sage_feed::{
    Aggregates, Aggregator, Classifies, FeedAssembler, Issue, NormalizedArticle, SourceProvider,
    TopicClassifier,
};

const COMMON_DREAMS: &str = include_str!("fixtures/common_dreams.xml");
const GRIST: &str = include_str!("fixtures/grist.xml");

fn fixture_aggregator() -> Arc<Aggregator> {
    let providers: Vec<Arc<dyn SourceProvider>> = vec![
        Arc::new(RssProvider::from_fixture("Common Dreams", COMMON_DREAMS)),
        Arc::new(RssProvider::from_fixture("Grist", GRIST)),
    ];
    Arc::new(Aggregator::new(providers, 2, true))
}

/// Misbehaving classifier: a third label for every other article.
struct ThirdLabel;

#[async_trait]
impl Classifies for ThirdLabel {
    async fn classify_label(&self, title: &str, _content: Option<&str>) -> String {
        if title.starts_with("Glaciers") || title.starts_with("ICE") {
            "SPORTS".to_string()
        } else {
            "CLIMATE".to_string()
        }
    }
}

struct Unreachable;

#[async_trait]
impl Aggregates for Unreachable {
    async fn aggregate(&self) -> Result<Vec<NormalizedArticle>> {
        Err(anyhow!("aggregator crashed"))
    }
}

#[tokio::test]
async fn keyword_mode_feed_is_classified_and_deterministic() {
    let feed = FeedAssembler::new(
        fixture_aggregator(),
        Arc::new(TopicClassifier::keyword_only()),
    );

    let first = feed.build_feed().await;
    let second = feed.build_feed().await;
    assert_eq!(first, second);
    assert_eq!(first.len(), 4);

    let issues: Vec<_> = first.iter().map(|a| a.issue).collect();
    assert_eq!(
        issues,
        vec![Issue::IceRaids, Issue::IceRaids, Issue::Climate, Issue::Climate]
    );
    assert!(first.iter().all(|a| !a.curated && a.priority == 0));
    assert_eq!(first[3].location.as_ref().and_then(|l| l.city.as_deref()), Some("Phoenix"));
}

#[tokio::test]
async fn third_label_is_filtered_out() {
    let feed = FeedAssembler::new(fixture_aggregator(), Arc::new(ThirdLabel));
    let out = feed.build_feed().await;
    assert_eq!(out.len(), 2);
    assert!(out.iter().all(|a| a.issue == Issue::Climate));
    let titles: Vec<_> = out.iter().map(|a| a.title.as_str()).collect();
    assert_eq!(
        titles,
        vec![
            "Asylum Seekers Face New Border Rules",
            "Drought and extreme weather strain Phoenix water supply"
        ]
    );
}

#[tokio::test]
async fn aggregator_failure_yields_empty_feed() {
    let feed = FeedAssembler::new(Arc::new(Unreachable), Arc::new(TopicClassifier::keyword_only()));
    assert!(feed.build_feed().await.is_empty());
}

#[tokio::test]
async fn feed_json_shape() {
    let feed = FeedAssembler::new(
        fixture_aggregator(),
        Arc::new(TopicClassifier::keyword_only()),
    );
    let v = serde_json::to_value(feed.build_feed().await).unwrap();
    let first = &v[0];
    assert_eq!(first["issue"], "ICE RAIDS");
    assert_eq!(first["source"], "Common Dreams");
    assert!(first.get("content").is_none(), "content is input-only");
    assert!(first.get("location").is_some());
}
