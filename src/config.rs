// ⚙️ Configuration - Environment-driven settings for both binaries

use std::env;
use std::path::PathBuf;

use crate::suggest::SuggestionMode;

/// Trim whitespace and stray quotes copied in from .env files.
/// Empty collapses to unset.
fn clean(value: Option<String>) -> Option<String> {
    let cleaned = value?.trim().trim_matches(|c| c == '\'' || c == '"').trim().to_string();
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

fn env_var(key: &str) -> Option<String> {
    clean(env::var(key).ok())
}

#[derive(Debug, Clone)]
pub struct ProxyConfig {
    /// Directory holding the per-month ledger sheets
    pub ledger_dir: PathBuf,

    /// Reasoning engine query endpoint; chat degrades to the fallback
    /// reply when unset
    pub engine_url: Option<String>,

    /// Optional bearer token for the engine
    pub engine_key: Option<String>,

    pub suggestion_mode: SuggestionMode,

    pub bind_addr: String,
    pub port: u16,
}

impl ProxyConfig {
    pub fn from_env() -> Self {
        ProxyConfig {
            ledger_dir: env_var("LEDGER_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("ledger")),
            engine_url: env_var("REASONING_ENGINE_URL"),
            engine_key: env_var("REASONING_ENGINE_KEY"),
            suggestion_mode: env_var("CATEGORY_SUGGESTION_MODE")
                .map(|v| SuggestionMode::from_config(&v))
                .unwrap_or_default(),
            bind_addr: env_var("BIND_ADDR").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: env_var("PORT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(8080),
        }
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_strips_quotes_and_whitespace() {
        assert_eq!(clean(Some("  'value'  ".to_string())).as_deref(), Some("value"));
        assert_eq!(clean(Some("\"value\"".to_string())).as_deref(), Some("value"));
        assert_eq!(clean(Some("plain".to_string())).as_deref(), Some("plain"));
    }

    #[test]
    fn test_clean_empty_is_none() {
        assert_eq!(clean(Some("   ".to_string())), None);
        assert_eq!(clean(Some("''".to_string())), None);
        assert_eq!(clean(None), None);
    }
}
