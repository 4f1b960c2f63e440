// src/ingest/providers/mod.rs
pub mod guardian;
pub mod rss;

pub use guardian::GuardianProvider;
pub use rss::RssProvider;
