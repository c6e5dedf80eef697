use std::env;
use std::num::NonZeroUsize;

use tracing::info;

use crate::error::ConfigError;

const DEFAULT_API_BASE: &str = "https://graph.facebook.com";
const DEFAULT_API_VERSION: &str = "v17.0";

/// Application configuration loaded from environment variables.
/// Only the access token is required; ids can also come from the command line.
#[derive(Debug, Clone)]
pub struct Config {
    // Graph API
    pub access_token: String,
    pub api_base: String,
    pub api_version: String,

    // Targets
    pub facebook_page_id: Option<String>,
    pub instagram_user_id: Option<String>,

    // Presentation
    pub workers: NonZeroUsize,
}

impl Config {
    /// Load from the process environment, reading `.env` first if present.
    /// An explicit worker count replaces `SOCIALFEED_WORKERS`, which is then
    /// not read at all.
    pub fn from_env_with_workers(workers: Option<NonZeroUsize>) -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup_with_workers(|key| env::var(key).ok(), workers)
    }

    /// Build from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::from_lookup_with_workers(lookup, None)
    }

    pub fn from_lookup_with_workers<F>(
        lookup: F,
        workers: Option<NonZeroUsize>,
    ) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let workers = match (workers, get("SOCIALFEED_WORKERS")) {
            (Some(explicit), _) => explicit,
            (None, Some(raw)) => parse_workers(&raw)?,
            (None, None) => NonZeroUsize::MIN,
        };

        Ok(Self {
            access_token: get("GRAPH_ACCESS_TOKEN")
                .ok_or(ConfigError::Missing("GRAPH_ACCESS_TOKEN"))?,
            api_base: get("GRAPH_API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            api_version: get("GRAPH_API_VERSION")
                .unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
            facebook_page_id: get("FACEBOOK_PAGE_ID"),
            instagram_user_id: get("INSTAGRAM_USER_ID"),
            workers,
        })
    }

    /// Log which settings are in effect without leaking the token.
    pub fn log_keys(&self) {
        fn preview(val: &str) -> String {
            let n = val.len().min(5);
            match val.get(..n) {
                Some(head) => format!("{head}..."),
                None => "...".to_string(),
            }
        }

        info!(
            api_base = %self.api_base,
            api_version = %self.api_version,
            access_token = %preview(&self.access_token),
            facebook_page_id = self.facebook_page_id.as_deref().unwrap_or("-"),
            instagram_user_id = self.instagram_user_id.as_deref().unwrap_or("-"),
            workers = self.workers.get(),
            "Config loaded"
        );
    }
}

/// Worker counts must be positive integers.
pub fn parse_workers(raw: &str) -> Result<NonZeroUsize, ConfigError> {
    raw.trim()
        .parse::<NonZeroUsize>()
        .map_err(|_| ConfigError::Invalid {
            key: "workers",
            message: format!("'{raw}' is not a positive integer"),
        })
}
