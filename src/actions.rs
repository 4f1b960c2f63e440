// src/actions.rs
//! Action links shown next to an article: local search links built from the
//! extracted location, plus national actions from the issue catalog.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::analyze::classify::Issue;
use crate::analyze::location::Location;

pub const FIND_REPRESENTATIVE_URL: &str =
    "https://www.house.gov/representatives/find-your-representative";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionLink {
    pub label: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueEntry {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub actions: Vec<ActionLink>,
}

/// Issue catalog (`config/issues.json`).
#[derive(Debug, Clone, Default)]
pub struct IssueCatalog {
    entries: Vec<IssueEntry>,
}

impl IssueCatalog {
    pub fn new(entries: Vec<IssueEntry>) -> Self {
        Self { entries }
    }

    /// A missing file is an empty catalog; a malformed one is an error.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading issue catalog {}", path.display()))?;
        let entries: Vec<IssueEntry> = serde_json::from_str(&raw)
            .with_context(|| format!("parsing issue catalog {}", path.display()))?;
        Ok(Self::new(entries))
    }

    pub fn national_actions(&self, issue: &str) -> Vec<ActionLink> {
        self.entries
            .iter()
            .find(|e| e.id == issue)
            .map(|e| e.actions.clone())
            .unwrap_or_default()
    }
}

fn search(prefix: &str, q: &str) -> String {
    format!(
        "https://www.google.com/search?q={prefix}+{}",
        urlencoding::encode(q)
    )
}

fn link(label: String, url: String) -> ActionLink {
    ActionLink { label, url }
}

/// Empty when the location has neither city nor state, or the issue is unknown.
pub fn local_actions(issue: &str, location: &Location) -> Vec<ActionLink> {
    let q = location.query();
    if q.is_empty() {
        return Vec::new();
    }
    let representatives = || link("Contact Local Representatives".into(), FIND_REPRESENTATIVE_URL.into());

    match Issue::from_label(issue) {
        Some(Issue::IceRaids) => {
            let protest_scope = location
                .state
                .as_deref()
                .filter(|s| !s.is_empty())
                .unwrap_or(q.as_str());
            vec![
                link(
                    format!("Find Immigration Services in {q}"),
                    search("immigration+help", &q),
                ),
                representatives(),
                link(
                    format!("Find Local Protests in {protest_scope}"),
                    search("immigration+protests", protest_scope),
                ),
            ]
        }
        Some(Issue::Climate) => vec![
            link(
                format!("Find Climate Organizations in {q}"),
                search("climate+organizations", &q),
            ),
            link(
                "Join Local Climate Action".into(),
                search("climate+action+groups", &q),
            ),
            representatives(),
        ],
        None => Vec::new(),
    }
}
