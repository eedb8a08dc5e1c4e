use anyhow::{anyhow, Result};

use crate::scrapers::SearchParams;

pub const DEFAULT_STATE_OBJECT: &str = "toripoliisi.json";

/// Everything a run needs, read once at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub keyword: String,
    pub category: String,
    /// `gs://bucket`, a bare bucket name, or `file:///dir`
    pub bucket: String,
    /// Name of the snapshot blob inside the bucket
    pub state_object: String,
    pub telegram_token: String,
    /// Telegram chat id receiving the alerts
    pub telegram_chat_id: String,
    /// Explicit GCS bearer token; the metadata server is used when absent
    pub gcs_token: Option<String>,
}

/// The part of [`Config`] the run-once job consumes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub search: SearchParams,
    pub state_object: String,
    pub target: String,
}

impl Config {
    /// Load from the process environment, honouring a `.env` file if present
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| -> Result<String> {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| anyhow!("missing required environment variable {key}"))
        };
        let optional = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        Ok(Self {
            keyword: required("KEYWORD")?,
            category: required("CATEGORY")?,
            bucket: required("BUCKET")?,
            state_object: optional("STATE_OBJECT").unwrap_or_else(|| DEFAULT_STATE_OBJECT.to_string()),
            telegram_token: required("TG_BOT_TOKEN")?,
            telegram_chat_id: required("USER_ID")?,
            gcs_token: optional("GCS_ACCESS_TOKEN"),
        })
    }

    pub fn run_config(&self) -> RunConfig {
        RunConfig {
            search: SearchParams::new(&self.keyword, &self.category),
            state_object: self.state_object.clone(),
            target: self.telegram_chat_id.clone(),
        }
    }
}
