//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process startup and then
//! passed into core services. The intent is to avoid reading process-wide environment variables
//! during request handling, which can lead to inconsistent behaviour in multi-threaded runtimes
//! and test harnesses.

use crate::error::{WorkstationError, WsResult};
use std::path::{Path, PathBuf};

/// Core configuration resolved at startup.
///
/// Holds the endpoints and identity strings for the two external
/// collaborators: the relational store and the AI assistant function.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    store_url: String,
    store_api_key: String,
    ai_url: String,
    ai_provider: String,
    ai_model: String,
    scratchpad_dir: Option<PathBuf>,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// Both `store_url` and `ai_url` must be absolute http(s) URLs; trailing
    /// slashes are stripped so path joining stays predictable.
    ///
    /// # Errors
    ///
    /// Returns `WorkstationError::InvalidInput` if a URL fails to parse, uses
    /// a scheme other than http/https, or if the provider/model strings are
    /// blank.
    pub fn new(
        store_url: String,
        store_api_key: String,
        ai_url: String,
        ai_provider: String,
        ai_model: String,
        scratchpad_dir: Option<PathBuf>,
    ) -> WsResult<Self> {
        let store_url = validate_http_url("store_url", &store_url)?;
        let ai_url = validate_http_url("ai_url", &ai_url)?;

        if ai_provider.trim().is_empty() {
            return Err(WorkstationError::InvalidInput(
                "ai_provider cannot be empty".into(),
            ));
        }
        if ai_model.trim().is_empty() {
            return Err(WorkstationError::InvalidInput(
                "ai_model cannot be empty".into(),
            ));
        }

        Ok(Self {
            store_url,
            store_api_key,
            ai_url,
            ai_provider,
            ai_model,
            scratchpad_dir,
        })
    }

    pub fn store_url(&self) -> &str {
        &self.store_url
    }

    pub fn store_api_key(&self) -> &str {
        &self.store_api_key
    }

    pub fn ai_url(&self) -> &str {
        &self.ai_url
    }

    pub fn ai_provider(&self) -> &str {
        &self.ai_provider
    }

    pub fn ai_model(&self) -> &str {
        &self.ai_model
    }

    /// Directory for the standalone prototype scratchpad, if enabled.
    pub fn scratchpad_dir(&self) -> Option<&Path> {
        self.scratchpad_dir.as_deref()
    }
}

fn validate_http_url(field: &str, value: &str) -> WsResult<String> {
    let trimmed = value.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(WorkstationError::InvalidInput(format!(
            "{field} cannot be empty"
        )));
    }

    let parsed = reqwest::Url::parse(trimmed)
        .map_err(|e| WorkstationError::InvalidInput(format!("{field} is not a valid URL: {e}")))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(WorkstationError::InvalidInput(format!(
            "{field} must use http or https, got: {}",
            parsed.scheme()
        )));
    }

    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg_with_store_url(url: &str) -> WsResult<CoreConfig> {
        CoreConfig::new(
            url.to_string(),
            "key".to_string(),
            "http://localhost:9000/assess".to_string(),
            "hosted-ai".to_string(),
            "triage-1".to_string(),
            None,
        )
    }

    #[test]
    fn accepts_http_urls_and_strips_trailing_slash() {
        let cfg = cfg_with_store_url("http://localhost:8000/").expect("config should build");
        assert_eq!(cfg.store_url(), "http://localhost:8000");
        assert_eq!(cfg.ai_url(), "http://localhost:9000/assess");
    }

    #[test]
    fn rejects_non_http_schemes() {
        let err = cfg_with_store_url("ftp://store").expect_err("ftp should be rejected");
        assert!(matches!(err, WorkstationError::InvalidInput(_)));
    }

    #[test]
    fn rejects_blank_model() {
        let err = CoreConfig::new(
            "http://localhost:8000".into(),
            "key".into(),
            "http://localhost:9000".into(),
            "hosted-ai".into(),
            "  ".into(),
            None,
        )
        .expect_err("blank model should be rejected");
        assert!(matches!(err, WorkstationError::InvalidInput(_)));
    }
}
