/// Which hosted model answers completions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LlmProvider {
    #[default]
    DeepSeek,
    Gemini,
}

impl LlmProvider {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "deepseek" => Some(Self::DeepSeek),
            "gemini" | "google" => Some(Self::Gemini),
            _ => None,
        }
    }
}

pub const DEFAULT_DEEPSEEK_MODEL: &str = "deepseek-chat";
pub const DEFAULT_DEEPSEEK_BASE_URL: &str = "https://api.deepseek.com";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";
pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Provider connection settings.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    /// Total attempts per completion, including the first.
    pub max_attempts: u32,
    /// Delay before the first retry; doubles on each further retry.
    pub backoff_base_ms: u64,
    pub timeout_secs: u64,
}

impl LlmConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var               | Default                     |
    /// |-----------------------|-----------------------------|
    /// | `LLM_PROVIDER`        | `deepseek`                  |
    /// | `DEEPSEEK_API_KEY`    | none                        |
    /// | `DEEPSEEK_MODEL`      | `deepseek-chat`             |
    /// | `DEEPSEEK_BASE_URL`   | `https://api.deepseek.com`  |
    /// | `GEMINI_API_KEY`      | none                        |
    /// | `GEMINI_MODEL`        | `gemini-1.5-flash`          |
    /// | `LLM_MAX_ATTEMPTS`    | `3`                         |
    /// | `LLM_BACKOFF_BASE_MS` | `1000`                      |
    /// | `LLM_TIMEOUT_SECS`    | `120`                       |
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let provider = match lookup("LLM_PROVIDER") {
            Some(raw) => LlmProvider::parse(&raw).unwrap_or_else(|| {
                tracing::warn!(value = %raw, "Unknown LLM_PROVIDER, using deepseek");
                LlmProvider::DeepSeek
            }),
            None => LlmProvider::default(),
        };

        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let (api_key, model, base_url) = match provider {
            LlmProvider::DeepSeek => (
                non_empty("DEEPSEEK_API_KEY"),
                non_empty("DEEPSEEK_MODEL").unwrap_or_else(|| DEFAULT_DEEPSEEK_MODEL.into()),
                non_empty("DEEPSEEK_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_DEEPSEEK_BASE_URL.into())
                    .trim_end_matches('/')
                    .to_string(),
            ),
            LlmProvider::Gemini => (
                non_empty("GEMINI_API_KEY"),
                non_empty("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.into()),
                GEMINI_BASE_URL.to_string(),
            ),
        };

        let max_attempts: u32 = non_empty("LLM_MAX_ATTEMPTS")
            .unwrap_or_else(|| "3".into())
            .parse()
            .expect("LLM_MAX_ATTEMPTS must be a valid u32");

        let backoff_base_ms: u64 = non_empty("LLM_BACKOFF_BASE_MS")
            .unwrap_or_else(|| "1000".into())
            .parse()
            .expect("LLM_BACKOFF_BASE_MS must be a valid u64");

        let timeout_secs: u64 = non_empty("LLM_TIMEOUT_SECS")
            .unwrap_or_else(|| "120".into())
            .parse()
            .expect("LLM_TIMEOUT_SECS must be a valid u64");

        Self {
            provider,
            api_key,
            model,
            base_url,
            max_attempts: max_attempts.max(1),
            backoff_base_ms,
            timeout_secs,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> LlmConfig {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        LlmConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_to_deepseek() {
        let cfg = config(&[]);
        assert_eq!(cfg.provider, LlmProvider::DeepSeek);
        assert_eq!(cfg.model, "deepseek-chat");
        assert_eq!(cfg.base_url, "https://api.deepseek.com");
        assert!(cfg.api_key.is_none());
        assert_eq!(cfg.max_attempts, 3);
        assert_eq!(cfg.backoff_base_ms, 1000);
        assert_eq!(cfg.timeout_secs, 120);
    }

    #[test]
    fn gemini_reads_its_own_key() {
        let cfg = config(&[
            ("LLM_PROVIDER", "Gemini"),
            ("GEMINI_API_KEY", "g-key"),
            ("DEEPSEEK_API_KEY", "d-key"),
        ]);
        assert_eq!(cfg.provider, LlmProvider::Gemini);
        assert_eq!(cfg.api_key.as_deref(), Some("g-key"));
        assert_eq!(cfg.model, "gemini-1.5-flash");
    }

    #[test]
    fn blank_key_counts_as_missing() {
        let cfg = config(&[("DEEPSEEK_API_KEY", "  ")]);
        assert!(cfg.api_key.is_none());
    }

    #[test]
    fn base_url_trailing_slash_trimmed() {
        let cfg = config(&[("DEEPSEEK_BASE_URL", "http://localhost:8080/")]);
        assert_eq!(cfg.base_url, "http://localhost:8080");
    }

    #[test]
    fn unknown_provider_falls_back() {
        let cfg = config(&[("LLM_PROVIDER", "llama")]);
        assert_eq!(cfg.provider, LlmProvider::DeepSeek);
    }

    #[test]
    fn zero_attempts_means_one() {
        let cfg = config(&[("LLM_MAX_ATTEMPTS", "0")]);
        assert_eq!(cfg.max_attempts, 1);
    }
}
