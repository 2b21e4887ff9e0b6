//! Typed errors for bespoken
//!
//! Most of the crate works with `anyhow::Result`. These variants exist for
//! failures callers may want to match on.

use thiserror::Error;

/// Errors raised by the chat runtime
#[derive(Debug, Error)]
pub enum BespokenError {
    /// The model name could not be mapped to a provider
    #[error("unknown model '{0}'. Use a name like 'anthropic/<model>' or 'openai/<model>'")]
    UnknownModel(String),

    /// The provider needs an API key that is not configured
    #[error("{var} is not set. Add it to your environment or to a .env file")]
    MissingApiKey { var: &'static str },

    /// A tool was used whose cargo feature is not compiled in
    #[error("{tool} requires the optional '{feature}' feature. Install it with: cargo install bespoken --features {feature}{}", extra_suffix(.extra))]
    NotInstalled {
        tool: String,
        feature: String,
        extra: Option<String>,
    },

    /// The provider API returned a non-success status
    #[error("{provider} API error ({status}): {body}")]
    Api {
        provider: &'static str,
        status: u16,
        body: String,
    },

    /// The provider reported an error inside a response stream
    #[error("stream error: {0}")]
    Stream(String),
}

fn extra_suffix(extra: &Option<String>) -> String {
    match extra {
        Some(extra) => format!(". {}", extra),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_installed_message() {
        let err = BespokenError::NotInstalled {
            tool: "BrowserTool".to_string(),
            feature: "browser".to_string(),
            extra: None,
        };
        let msg = err.to_string();
        assert!(msg.contains("BrowserTool"));
        assert!(msg.contains("cargo install bespoken --features browser"));
        assert!(!msg.ends_with(". "));
    }

    #[test]
    fn test_missing_api_key_message() {
        let err = BespokenError::MissingApiKey {
            var: "ANTHROPIC_API_KEY",
        };
        assert!(err.to_string().starts_with("ANTHROPIC_API_KEY is not set"));
    }
}
