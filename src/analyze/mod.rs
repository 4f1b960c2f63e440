// src/analyze/mod.rs
//! Per-article analysis: issue classification and location extraction.

pub mod ai_adapter;
pub mod classify;
pub mod location;

pub use crate::analyze::classify::{Classifies, Issue, TopicClassifier};
pub use crate::analyze::location::{extract_location, Location};
