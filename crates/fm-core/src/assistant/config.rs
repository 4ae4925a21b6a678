const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1";

/// Runtime configuration for the conversational assistant, read once
/// at startup. The assistant is entirely optional; without an API key
/// the conversation surface falls back to canned replies and raw
/// keyword extraction.
#[derive(Debug, Clone)]
pub struct AssistantConfig {
    pub enabled: bool,
    pub api_key: String,
    pub endpoint: String,
    pub timeout_secs: u64,
    /// Optional fixed model list. When empty the model catalog is
    /// discovered from the provider at call time.
    pub models: Vec<String>,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_key: String::new(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout_secs: 30,
            models: Vec::new(),
        }
    }
}

impl AssistantConfig {
    pub fn from_env() -> Self {
        fn parse_bool(key: &str, default: bool) -> bool {
            match std::env::var(key) {
                Ok(val) => matches!(val.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"),
                Err(_) => default,
            }
        }

        fn parse_u64(key: &str, default: u64) -> u64 {
            std::env::var(key)
                .ok()
                .and_then(|raw| raw.parse::<u64>().ok())
                .unwrap_or(default)
        }

        let api_key = std::env::var("FM_ASSISTANT_API_KEY")
            .ok()
            .or_else(|| std::env::var("GEMINI_API_KEY").ok())
            .unwrap_or_default();

        let models = std::env::var("FM_ASSISTANT_MODELS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|m| !m.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Self {
            enabled: parse_bool("FM_ASSISTANT_ENABLED", true),
            api_key,
            endpoint: std::env::var("FM_ASSISTANT_ENDPOINT")
                .unwrap_or_else(|_| DEFAULT_ENDPOINT.into()),
            timeout_secs: parse_u64("FM_ASSISTANT_TIMEOUT_SECONDS", 30),
            models,
        }
    }

    /// Whether outbound assistant calls should be attempted at all.
    pub fn is_usable(&self) -> bool {
        self.enabled && !self.api_key.is_empty()
    }
}
