// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod actions;
pub mod analyze;
pub mod api;
pub mod config;
pub mod curated;
pub mod feed;
pub mod ingest;
pub mod metrics;

// ---- Re-exports for stable public API ----
pub use crate::analyze::ai_adapter;
pub use crate::analyze::classify::{Classifies, Issue, TopicClassifier};
pub use crate::analyze::location::{extract_location, Location};
pub use crate::api::{router, AppState};
pub use crate::feed::{ClassifiedArticle, FeedAssembler};
pub use crate::ingest::image::extract_image;
pub use crate::ingest::types::{NormalizedArticle, RawItem, SourceProvider};
pub use crate::ingest::{Aggregates, Aggregator};
