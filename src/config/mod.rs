// src/config/mod.rs
pub mod classifier;
pub mod feed;

pub use classifier::{ClassifierBackendConfig, ClassifierConfig};
pub use feed::{
    load_feed_config_default, load_feed_config_from, FeedConfig, FeedSpec, SearchConfig,
    SearchQuery,
};
