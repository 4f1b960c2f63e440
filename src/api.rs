use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;

use crate::actions::{local_actions, ActionLink, IssueCatalog};
use crate::analyze::classify::{Issue, TopicClassifier};
use crate::analyze::location::{extract_location, Location};
use crate::config::{load_feed_config_default, ClassifierConfig, FeedConfig};
use crate::curated::{load_curated_items, merge_feeds, CuratedStore, FeedItem, JsonFileCuratedStore};
use crate::feed::{ClassifiedArticle, FeedAssembler};
use crate::ingest::Aggregator;

#[derive(Clone)]
pub struct AppState {
    pub feed: Arc<FeedAssembler>,
    pub classifier: Arc<TopicClassifier>,
    pub curated: Arc<dyn CuratedStore>,
    pub catalog: Arc<IssueCatalog>,
}

impl AppState {
    /// Wire the default pipeline from configuration.
    pub fn from_config(feed_cfg: &FeedConfig, classifier_cfg: &ClassifierConfig) -> anyhow::Result<Self> {
        let classifier = Arc::new(TopicClassifier::from_config(classifier_cfg)?);
        let aggregator = Arc::new(Aggregator::from_config(feed_cfg)?);
        let catalog = match IssueCatalog::load_from(&feed_cfg.issues_path) {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!(error = ?e, "issue catalog unreadable, national actions disabled");
                IssueCatalog::default()
            }
        };

        tracing::info!(
            classifier = classifier_cfg.provider_name(),
            search_credential = feed_cfg.guardian_api_key.is_some(),
            providers = ?aggregator.provider_names(),
            "feed pipeline configured"
        );

        Ok(Self {
            feed: Arc::new(FeedAssembler::new(aggregator, classifier.clone())),
            classifier,
            curated: Arc::new(JsonFileCuratedStore::new(feed_cfg.curated_path.clone())),
            catalog: Arc::new(catalog),
        })
    }

    /// Configuration from `$FEED_CONFIG_PATH` / `config/feed.toml` and credentials from env.
    pub fn from_env() -> anyhow::Result<Self> {
        let feed_cfg = load_feed_config_default()?;
        let classifier_cfg = ClassifierConfig::from_env(feed_cfg.http_timeout_secs);
        Self::from_config(&feed_cfg, &classifier_cfg)
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/feed", get(feed))
        .route("/curated-feed", get(curated_feed))
        .route("/merged-feed", get(merged_feed))
        .route("/categorize-article", post(categorize_article))
        .route("/extract-location", post(extract_location_handler))
        .route("/get-location-actions", post(get_location_actions))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

type ApiError = (StatusCode, Json<Value>);

fn bad_request(msg: &str) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": msg })))
}

async fn feed(State(state): State<AppState>) -> Json<Vec<ClassifiedArticle>> {
    Json(state.feed.build_feed().await)
}

async fn curated_feed(State(state): State<AppState>) -> Json<Vec<FeedItem>> {
    Json(load_curated_items(state.curated.as_ref()).await)
}

async fn merged_feed(State(state): State<AppState>) -> Json<Vec<FeedItem>> {
    let (curated, generated) = tokio::join!(
        load_curated_items(state.curated.as_ref()),
        state.feed.build_feed()
    );
    Json(merge_feeds(curated, generated))
}

#[derive(serde::Deserialize)]
struct ArticleReq {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    content: Option<String>,
}

impl ArticleReq {
    /// Title is required and must not be blank.
    fn title(&self) -> Result<&str, ApiError> {
        self.title
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| bad_request("Title is required"))
    }
}

#[derive(serde::Serialize)]
struct CategoryResp {
    category: Issue,
}

async fn categorize_article(
    State(state): State<AppState>,
    Json(body): Json<ArticleReq>,
) -> Result<Json<CategoryResp>, ApiError> {
    let title = body.title()?;
    let category = state.classifier.classify(title, body.content.as_deref()).await;
    Ok(Json(CategoryResp { category }))
}

#[derive(serde::Serialize)]
struct LocationResp {
    location: Option<Location>,
}

async fn extract_location_handler(Json(body): Json<ArticleReq>) -> Result<Json<LocationResp>, ApiError> {
    let title = body.title()?;
    Ok(Json(LocationResp {
        location: extract_location(title, body.content.as_deref()),
    }))
}

#[derive(serde::Deserialize)]
struct ActionsReq {
    #[serde(default)]
    issue: Option<String>,
    #[serde(default)]
    location: Option<Location>,
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct ActionsResp {
    local_actions: Vec<ActionLink>,
    national_actions: Vec<ActionLink>,
}

async fn get_location_actions(
    State(state): State<AppState>,
    Json(body): Json<ActionsReq>,
) -> Result<Json<ActionsResp>, ApiError> {
    let issue = body
        .issue
        .as_deref()
        .filter(|i| !i.is_empty())
        .ok_or_else(|| bad_request("Issue is required"))?;
    let local = body
        .location
        .as_ref()
        .map(|l| local_actions(issue, l))
        .unwrap_or_default();
    Ok(Json(ActionsResp {
        local_actions: local,
        national_actions: state.catalog.national_actions(issue),
    }))
}
