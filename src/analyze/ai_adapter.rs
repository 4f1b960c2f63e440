//! External classifier backends: the OpenAI chat API, a remote `/categorize-article`
//! endpoint, and fixed/failing stand-ins for tests and local runs.
//!
//! Backends only return the raw label text; mapping it onto an [`Issue`] and every
//! fallback lives in `analyze::classify`.
//!
//! [`Issue`]: crate::analyze::classify::Issue

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::config::{ClassifierBackendConfig, ClassifierConfig};

pub const OPENAI_CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Content preview sent to the model is cut to this many chars.
pub const PROMPT_PREVIEW_CHARS: usize = 500;

pub type BackendFuture<'a> = Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>>;

/// One request/response call to an external classifier.
pub trait ClassifierBackend: Send + Sync {
    /// Returns the backend's raw answer (expected to mention "ICE RAIDS" or "CLIMATE").
    fn complete<'a>(&'a self, title: &'a str, content: Option<&'a str>) -> BackendFuture<'a>;
    /// Provider name for diagnostics.
    fn name(&self) -> &'static str;
}

pub type DynBackend = Arc<dyn ClassifierBackend>;

/// Factory: build the backend the configuration has credentials for.
/// `Ok(None)` means keyword-only mode.
pub fn build_backend(cfg: &ClassifierConfig) -> Result<Option<DynBackend>> {
    let timeout = Duration::from_secs(cfg.http_timeout_secs);
    match &cfg.backend {
        ClassifierBackendConfig::None => Ok(None),
        ClassifierBackendConfig::OpenAi { api_key, model } => Ok(Some(Arc::new(
            OpenAiBackend::new(api_key.clone(), model.clone(), timeout)?,
        ))),
        ClassifierBackendConfig::Remote { endpoint } => Ok(Some(Arc::new(
            RemoteCategorizeBackend::new(endpoint.clone(), timeout)?,
        ))),
    }
}

/// Prompt asking for exactly one of the two labels.
pub fn build_prompt(title: &str, content: Option<&str>) -> String {
    let preview = content
        .filter(|c| !c.is_empty())
        .map(|c| {
            let cut: String = c.chars().take(PROMPT_PREVIEW_CHARS).collect();
            format!("Preview: {cut}")
        })
        .unwrap_or_default();

    format!(
        r#"Categorize this article as either "ICE RAIDS" or "CLIMATE":

"ICE RAIDS" = Immigration and Customs Enforcement (ICE) agency, immigration enforcement, raids, deportations, border issues, asylum seekers, detention centers
"CLIMATE" = Climate change, environmental issues, global warming, emissions, renewable energy, extreme weather, carbon

Note: "ICE" means the federal immigration agency, NOT frozen water.

Title: {title}
{preview}

Category:"#
    )
}

fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent("rage2sage-feed/0.1")
        .connect_timeout(Duration::from_secs(4))
        .timeout(timeout)
        .build()
        .context("building classifier http client")
}

// ------------------------------------------------------------
// OpenAI
// ------------------------------------------------------------

/// Chat Completions backend. Requires `OPENAI_API_KEY`.
pub struct OpenAiBackend {
    http: reqwest::Client,
    api_key: String,
    model: String,
    url: String,
}

impl OpenAiBackend {
    pub fn new(api_key: String, model: String, timeout: Duration) -> Result<Self> {
        Ok(Self {
            http: http_client(timeout)?,
            api_key,
            model,
            url: OPENAI_CHAT_URL.to_string(),
        })
    }

    /// Point at a compatible server (tests, proxies).
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }
}

#[derive(Serialize)]
struct ChatMsg<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatReq<'a> {
    model: &'a str,
    messages: Vec<ChatMsg<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct ChatResp {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMsg,
}

#[derive(Deserialize)]
struct ChoiceMsg {
    #[serde(default)]
    content: Option<String>,
}

impl ClassifierBackend for OpenAiBackend {
    fn complete<'a>(&'a self, title: &'a str, content: Option<&'a str>) -> BackendFuture<'a> {
        Box::pin(async move {
            let prompt = build_prompt(title, content);
            let req = ChatReq {
                model: &self.model,
                messages: vec![ChatMsg {
                    role: "user",
                    content: &prompt,
                }],
                temperature: 0.0,
                max_tokens: 5,
            };

            let resp = self
                .http
                .post(&self.url)
                .bearer_auth(&self.api_key)
                .json(&req)
                .send()
                .await
                .context("openai request")?;

            if !resp.status().is_success() {
                bail!("openai returned {}", resp.status());
            }
            let body: ChatResp = resp.json().await.context("openai response json")?;
            body.choices
                .into_iter()
                .next()
                .and_then(|c| c.message.content)
                .map(|c| c.trim().to_string())
                .ok_or_else(|| anyhow!("openai response without choices"))
        })
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}

// ------------------------------------------------------------
// Remote /categorize-article endpoint
// ------------------------------------------------------------

#[derive(Serialize)]
struct CategorizeReq<'a> {
    title: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<&'a str>,
}

#[derive(Deserialize)]
struct CategorizeResp {
    category: String,
}

/// Classifier served by another process; the response content type is checked
/// before the body is parsed as JSON.
pub struct RemoteCategorizeBackend {
    http: reqwest::Client,
    endpoint: String,
}

impl RemoteCategorizeBackend {
    pub fn new(endpoint: String, timeout: Duration) -> Result<Self> {
        Ok(Self {
            http: http_client(timeout)?,
            endpoint,
        })
    }
}

impl ClassifierBackend for RemoteCategorizeBackend {
    fn complete<'a>(&'a self, title: &'a str, content: Option<&'a str>) -> BackendFuture<'a> {
        Box::pin(async move {
            let resp = self
                .http
                .post(&self.endpoint)
                .json(&CategorizeReq { title, content })
                .send()
                .await
                .with_context(|| format!("POST {}", self.endpoint))?;

            let content_type = resp
                .headers()
                .get(reqwest::header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("")
                .to_ascii_lowercase();
            if !content_type.starts_with("application/json") {
                bail!("categorize endpoint returned non-JSON content type '{content_type}'");
            }
            if !resp.status().is_success() {
                bail!("categorize endpoint returned {}", resp.status());
            }
            let body: CategorizeResp = resp.json().await.context("categorize response json")?;
            Ok(body.category)
        })
    }

    fn name(&self) -> &'static str {
        "remote"
    }
}

// ------------------------------------------------------------
// Stand-ins
// ------------------------------------------------------------

/// Always answers with the same text.
#[derive(Clone)]
pub struct StaticBackend {
    pub answer: String,
}

impl StaticBackend {
    pub fn new(answer: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
        }
    }
}

impl ClassifierBackend for StaticBackend {
    fn complete<'a>(&'a self, _title: &'a str, _content: Option<&'a str>) -> BackendFuture<'a> {
        let out = self.answer.clone();
        Box::pin(async move { Ok(out) })
    }
    fn name(&self) -> &'static str {
        "static"
    }
}

/// Always fails, as an unreachable backend would.
pub struct FailingBackend;

impl ClassifierBackend for FailingBackend {
    fn complete<'a>(&'a self, _title: &'a str, _content: Option<&'a str>) -> BackendFuture<'a> {
        Box::pin(async { Err(anyhow!("classifier backend unavailable")) })
    }
    fn name(&self) -> &'static str {
        "failing"
    }
}
