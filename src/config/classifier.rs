// src/config/classifier.rs
use std::env;

pub const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const ENV_OPENAI_MODEL: &str = "OPENAI_MODEL";
pub const ENV_CATEGORIZE_ENDPOINT: &str = "CATEGORIZE_ENDPOINT";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o";

/// Which external classifier (if any) the deployment has credentials for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassifierBackendConfig {
    /// No credential: pure keyword mode.
    None,
    OpenAi { api_key: String, model: String },
    /// Another process serving the `/categorize-article` contract.
    Remote { endpoint: String },
}

#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    pub backend: ClassifierBackendConfig,
    pub http_timeout_secs: u64,
}

impl ClassifierConfig {
    /// OpenAI key wins over a remote endpoint; blank values count as absent.
    pub fn from_env(http_timeout_secs: u64) -> Self {
        let read = |k: &str| {
            env::var(k)
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let backend = if let Some(api_key) = read(ENV_OPENAI_API_KEY) {
            let model = read(ENV_OPENAI_MODEL).unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string());
            ClassifierBackendConfig::OpenAi { api_key, model }
        } else if let Some(endpoint) = read(ENV_CATEGORIZE_ENDPOINT) {
            ClassifierBackendConfig::Remote { endpoint }
        } else {
            ClassifierBackendConfig::None
        };

        Self {
            backend,
            http_timeout_secs,
        }
    }

    pub fn provider_name(&self) -> &'static str {
        match self.backend {
            ClassifierBackendConfig::None => "keywords",
            ClassifierBackendConfig::OpenAi { .. } => "openai",
            ClassifierBackendConfig::Remote { .. } => "remote",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[serial_test::serial]
    #[test]
    fn openai_key_takes_precedence_over_endpoint() {
        env::set_var(ENV_OPENAI_API_KEY, "sk-test");
        env::remove_var(ENV_OPENAI_MODEL);
        env::set_var(ENV_CATEGORIZE_ENDPOINT, "http://localhost:1/categorize-article");
        let cfg = ClassifierConfig::from_env(5);
        assert_eq!(
            cfg.backend,
            ClassifierBackendConfig::OpenAi {
                api_key: "sk-test".into(),
                model: DEFAULT_OPENAI_MODEL.into()
            }
        );

        env::set_var(ENV_OPENAI_API_KEY, "");
        let cfg = ClassifierConfig::from_env(5);
        assert_eq!(cfg.provider_name(), "remote");

        env::remove_var(ENV_OPENAI_API_KEY);
        env::remove_var(ENV_CATEGORIZE_ENDPOINT);
        let cfg = ClassifierConfig::from_env(5);
        assert_eq!(cfg.backend, ClassifierBackendConfig::None);
    }
}
