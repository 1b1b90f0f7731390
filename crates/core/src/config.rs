//! Client runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into the client. Nothing
//! reads process-wide environment variables while requests are being made.

use crate::constants::{
    API_URL_ENV, DEFAULT_API_BASE_URL, DEFAULT_SESSION_PATH, FEED_PAGE_SIZE, LEADERBOARD_LIMIT,
    SESSION_PATH_ENV,
};
use crate::{ApiError, ApiResult};
use std::path::{Path, PathBuf};

/// Client configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    api_base_url: String,
    session_path: PathBuf,
    page_size: u32,
    leaderboard_limit: u32,
}

impl ClientConfig {
    /// Create a new `ClientConfig`.
    ///
    /// The base URL is stored without a trailing slash so endpoint paths can be appended as-is.
    pub fn new(api_base_url: impl Into<String>, session_path: PathBuf) -> ApiResult<Self> {
        let api_base_url = api_base_url.into().trim().trim_end_matches('/').to_string();
        if api_base_url.is_empty() {
            return Err(ApiError::InvalidInput(
                "api_base_url cannot be empty".into(),
            ));
        }

        Ok(Self {
            api_base_url,
            session_path,
            page_size: FEED_PAGE_SIZE,
            leaderboard_limit: LEADERBOARD_LIMIT,
        })
    }

    /// Build a configuration from already-read environment values.
    ///
    /// Blank values fall back to the defaults.
    pub fn from_env_values(
        api_url: Option<String>,
        session_path: Option<String>,
    ) -> ApiResult<Self> {
        let api_url = non_blank(api_url).unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());
        let session_path = non_blank(session_path)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SESSION_PATH));
        Self::new(api_url, session_path)
    }

    /// Read `MEDCONNECT_API_URL` and `MEDCONNECT_SESSION_PATH` once.
    pub fn from_env() -> ApiResult<Self> {
        Self::from_env_values(
            std::env::var(API_URL_ENV).ok(),
            std::env::var(SESSION_PATH_ENV).ok(),
        )
    }

    pub fn api_base_url(&self) -> &str {
        &self.api_base_url
    }

    /// Full URL for an endpoint path such as `/cases/42/vote`.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.api_base_url, path)
    }

    pub fn session_path(&self) -> &Path {
        &self.session_path
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn leaderboard_limit(&self) -> u32 {
        self.leaderboard_limit
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
