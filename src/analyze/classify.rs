// src/analyze/classify.rs
//! Two-issue topic classifier.
//!
//! Decision order over `lowercase(title + " " + content)`:
//! 1. strong phrases → `ICE RAIDS`
//! 2. confident keyword score (`|ice - climate| > 1 || ice >= 2`)
//! 3. keyword-only strategy → score majority
//! 4. live strategy → backend answer, majority if the answer names neither issue
//! 5. backend error → majority over the reduced keyword set
//!
//! `classify` never fails; every path ends in one of the two issues.

use std::fmt;

use metrics::counter;
use serde::{Deserialize, Serialize};

use crate::analyze::ai_adapter::DynBackend;
use crate::config::ClassifierConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Issue {
    #[serde(rename = "ICE RAIDS")]
    IceRaids,
    #[serde(rename = "CLIMATE")]
    Climate,
}

impl Issue {
    pub const ALL: [Issue; 2] = [Issue::IceRaids, Issue::Climate];

    pub const fn label(self) -> &'static str {
        match self {
            Issue::IceRaids => "ICE RAIDS",
            Issue::Climate => "CLIMATE",
        }
    }

    /// Exact label match only; anything else is not an issue.
    pub fn from_label(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|i| i.label() == s)
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

pub const STRONG_ICE_PHRASES: &[&str] = &[
    "ice raid",
    "ice agent",
    "ice enforcement",
    "customs enforcement",
    "immigration raid",
];

pub const ICE_KEYWORDS: &[&str] = &[
    "ice",
    "immigration",
    "raids",
    "deportation",
    "border",
    "immigrant",
    "detention",
    "asylum",
    "refugee",
    "undocumented",
    "immigration enforcement",
];

pub const CLIMATE_KEYWORDS: &[&str] = &[
    "climate",
    "global warming",
    "carbon",
    "emissions",
    "renewable energy",
    "fossil fuel",
    "extreme weather",
    "drought",
    "flooding",
    "environment",
    "pollution",
    "sea ice",
    "glaciers",
    "greenhouse",
];

// Used only when the backend call itself failed.
pub const FALLBACK_ICE_KEYWORDS: &[&str] = &["ice", "immigration", "raid", "deportation"];
pub const FALLBACK_CLIMATE_KEYWORDS: &[&str] = &["climate", "warming", "emission", "environment"];

/// Lowercased classification input.
pub fn classification_text(title: &str, content: Option<&str>) -> String {
    format!("{} {}", title, content.unwrap_or_default()).to_lowercase()
}

/// Presence counts (each keyword contributes at most 1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeywordCounts {
    pub ice: usize,
    pub climate: usize,
}

impl KeywordCounts {
    pub fn count(text: &str, ice_keywords: &[&str], climate_keywords: &[&str]) -> Self {
        Self {
            ice: ice_keywords.iter().filter(|k| text.contains(*k)).count(),
            climate: climate_keywords.iter().filter(|k| text.contains(*k)).count(),
        }
    }

    /// Ties go to `ICE RAIDS`.
    pub fn majority(self) -> Issue {
        if self.ice >= self.climate {
            Issue::IceRaids
        } else {
            Issue::Climate
        }
    }

    /// Decisive only when the scores are clearly apart or ICE has two hits.
    pub fn confident(self) -> Option<Issue> {
        (self.ice.abs_diff(self.climate) > 1 || self.ice >= 2).then(|| self.majority())
    }
}

pub fn strong_signal(text: &str) -> Option<Issue> {
    STRONG_ICE_PHRASES
        .iter()
        .any(|p| text.contains(p))
        .then_some(Issue::IceRaids)
}

/// Map a free-form backend answer onto an issue; `None` if it names neither.
pub fn interpret_answer(answer: &str) -> Option<Issue> {
    let upper = answer.trim().to_uppercase();
    if upper.contains("ICE") {
        Some(Issue::IceRaids)
    } else if upper.contains("CLIMATE") {
        Some(Issue::Climate)
    } else {
        None
    }
}

/// Keyword-only decision (tiers 1–3). Pure and deterministic.
pub fn classify_by_keywords(title: &str, content: Option<&str>) -> Issue {
    let text = classification_text(title, content);
    let counts = KeywordCounts::count(&text, ICE_KEYWORDS, CLIMATE_KEYWORDS);
    strong_signal(&text)
        .or_else(|| counts.confident())
        .unwrap_or_else(|| counts.majority())
}

/// Chosen once at construction.
#[derive(Clone)]
pub enum Strategy {
    KeywordOnly,
    Live(DynBackend),
}

#[derive(Clone)]
pub struct TopicClassifier {
    strategy: Strategy,
}

impl TopicClassifier {
    pub fn keyword_only() -> Self {
        Self {
            strategy: Strategy::KeywordOnly,
        }
    }

    pub fn live(backend: DynBackend) -> Self {
        Self {
            strategy: Strategy::Live(backend),
        }
    }

    pub fn from_backend(backend: Option<DynBackend>) -> Self {
        backend.map_or_else(Self::keyword_only, Self::live)
    }

    pub fn from_config(cfg: &ClassifierConfig) -> anyhow::Result<Self> {
        let backend = crate::analyze::ai_adapter::build_backend(cfg)?;
        if backend.is_none() {
            tracing::warn!(target: "classify", "no classifier credential set, using keyword fallback");
        }
        let classifier = Self::from_backend(backend);
        tracing::debug!(target: "classify", mode = classifier.mode(), "classifier ready");
        Ok(classifier)
    }

    pub fn mode(&self) -> &'static str {
        match &self.strategy {
            Strategy::KeywordOnly => "keywords",
            Strategy::Live(b) => b.name(),
        }
    }

    pub async fn classify(&self, title: &str, content: Option<&str>) -> Issue {
        let text = classification_text(title, content);
        let id = anon_hash(title);

        if let Some(issue) = strong_signal(&text) {
            tracing::debug!(target: "classify", %id, %issue, "strong signal");
            return issue;
        }

        let counts = KeywordCounts::count(&text, ICE_KEYWORDS, CLIMATE_KEYWORDS);
        if let Some(issue) = counts.confident() {
            tracing::debug!(
                target: "classify",
                %id, %issue, ice = counts.ice, climate = counts.climate,
                "keyword match"
            );
            return issue;
        }

        let backend = match &self.strategy {
            Strategy::KeywordOnly => return counts.majority(),
            Strategy::Live(b) => b,
        };

        counter!("classifier_backend_calls_total").increment(1);
        match backend.complete(title, content).await {
            Ok(answer) => {
                let issue = interpret_answer(&answer).unwrap_or_else(|| {
                    counter!("classifier_fallback_total", "reason" => "unrecognized").increment(1);
                    counts.majority()
                });
                tracing::info!(target: "classify", %id, %issue, backend = backend.name(), "backend result");
                issue
            }
            Err(e) => {
                tracing::warn!(target: "classify", %id, error = ?e, "classifier backend failed");
                counter!("classifier_fallback_total", "reason" => "error").increment(1);
                KeywordCounts::count(&text, FALLBACK_ICE_KEYWORDS, FALLBACK_CLIMATE_KEYWORDS)
                    .majority()
            }
        }
    }
}

/// What the feed assembler needs from a classifier. Labels are plain strings so
/// the assembler's issue filter stays the real guarantee.
#[async_trait::async_trait]
pub trait Classifies: Send + Sync {
    async fn classify_label(&self, title: &str, content: Option<&str>) -> String;
}

#[async_trait::async_trait]
impl Classifies for TopicClassifier {
    async fn classify_label(&self, title: &str, content: Option<&str>) -> String {
        self.classify(title, content).await.label().to_string()
    }
}

/// Short anonymized id for log lines; raw titles are never logged.
pub(crate) fn anon_hash(text: &str) -> String {
    use sha2::{Digest, Sha256};
    let digest = Sha256::digest(text.as_bytes());
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze::ai_adapter::{FailingBackend, StaticBackend};
    use std::sync::Arc;

    #[test]
    fn issue_labels_round_trip_only_for_known_values() {
        assert_eq!(Issue::from_label("ICE RAIDS"), Some(Issue::IceRaids));
        assert_eq!(Issue::from_label("CLIMATE"), Some(Issue::Climate));
        assert_eq!(Issue::from_label("climate"), None);
        assert_eq!(Issue::from_label("SPORTS"), None);
        assert_eq!(
            serde_json::to_string(&Issue::IceRaids).unwrap(),
            r#""ICE RAIDS""#
        );
    }

    #[test]
    fn counts_are_presence_not_frequency() {
        let c = KeywordCounts::count("climate climate climate", ICE_KEYWORDS, CLIMATE_KEYWORDS);
        assert_eq!(c, KeywordCounts { ice: 0, climate: 1 });
    }

    #[test]
    fn confident_rule_edges() {
        assert_eq!(KeywordCounts { ice: 0, climate: 1 }.confident(), None);
        assert_eq!(KeywordCounts { ice: 1, climate: 1 }.confident(), None);
        assert_eq!(
            KeywordCounts { ice: 0, climate: 2 }.confident(),
            Some(Issue::Climate)
        );
        // ice >= 2 is decisive even when climate is ahead by one
        assert_eq!(
            KeywordCounts { ice: 2, climate: 3 }.confident(),
            Some(Issue::Climate)
        );
        assert_eq!(
            KeywordCounts { ice: 2, climate: 2 }.confident(),
            Some(Issue::IceRaids)
        );
    }

    #[test]
    fn interpret_answer_normalizes() {
        assert_eq!(interpret_answer(" ice raids\n"), Some(Issue::IceRaids));
        assert_eq!(interpret_answer("ICE"), Some(Issue::IceRaids));
        assert_eq!(interpret_answer("Climate."), Some(Issue::Climate));
        assert_eq!(interpret_answer("Sports"), None);
    }

    #[tokio::test]
    async fn strong_signal_overrides_climate_words() {
        let c = TopicClassifier::live(Arc::new(StaticBackend::new("CLIMATE")));
        let issue = c
            .classify("ICE raid in Chicago", Some("climate emissions drought glaciers"))
            .await;
        assert_eq!(issue, Issue::IceRaids);
    }

    #[tokio::test]
    async fn glaciers_and_emissions_are_climate() {
        let c = TopicClassifier::keyword_only();
        assert_eq!(
            c.classify("Glaciers melting amid record emissions", None).await,
            Issue::Climate
        );
    }

    #[tokio::test]
    async fn ambiguous_text_uses_backend_answer() {
        let c = TopicClassifier::live(Arc::new(StaticBackend::new("climate")));
        assert_eq!(c.classify("City council meets", None).await, Issue::Climate);
        assert_eq!(c.mode(), "static");
    }

    #[tokio::test]
    async fn unrecognized_backend_answer_uses_majority() {
        let c = TopicClassifier::live(Arc::new(StaticBackend::new("no idea")));
        // one climate keyword, no ice keyword → CLIMATE
        assert_eq!(c.classify("Heat and drought", None).await, Issue::Climate);
        // nothing at all → tie → ICE RAIDS
        assert_eq!(c.classify("City council meets", None).await, Issue::IceRaids);
    }

    #[tokio::test]
    async fn backend_failure_uses_reduced_keywords() {
        let c = TopicClassifier::live(Arc::new(FailingBackend));
        // "warming" is only in the reduced set
        assert_eq!(c.classify("Ocean warming worries", None).await, Issue::Climate);
        assert_eq!(c.classify("", None).await, Issue::IceRaids);
    }

    #[tokio::test]
    async fn keyword_only_never_calls_out() {
        let c = TopicClassifier::from_backend(None);
        assert_eq!(c.mode(), "keywords");
        assert_eq!(c.classify("Heat and drought", None).await, Issue::Climate);
    }

    #[test]
    fn anon_hash_is_short_hex() {
        let h = anon_hash("title");
        assert_eq!(h.len(), 12);
        assert!(h.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
