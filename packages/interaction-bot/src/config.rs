use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use std::time::Duration;
use wikibase_client::{WikibaseOptions, WIKIDATA_API_URL};

use crate::domains::interactions::ConfigError;

/// Service configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub user_agent: Option<String>,
    pub maxlag: Option<u32>,
    /// Retries of a write the server rejected for lag; `None` keeps the client default.
    pub maxlag_retries: Option<u32>,
    pub edit_interval: Duration,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            api_url: env::var("WIKIBASE_API_URL")
                .unwrap_or_else(|_| WIKIDATA_API_URL.to_string()),
            username: env::var("WIKIBASE_USERNAME").ok(),
            password: env::var("WIKIBASE_PASSWORD").ok(),
            user_agent: env::var("WIKIBASE_USER_AGENT").ok(),
            maxlag: env::var("WIKIBASE_MAXLAG")
                .ok()
                .map(|v| v.parse())
                .transpose()
                .context("WIKIBASE_MAXLAG must be a valid number")?,
            maxlag_retries: env::var("WIKIBASE_MAXLAG_RETRIES")
                .ok()
                .map(|v| v.parse())
                .transpose()
                .context("WIKIBASE_MAXLAG_RETRIES must be a valid number")?,
            edit_interval: Duration::from_millis(
                env::var("WIKIBASE_EDIT_INTERVAL_MS")
                    .unwrap_or_else(|_| "0".to_string())
                    .parse()
                    .context("WIKIBASE_EDIT_INTERVAL_MS must be a valid number")?,
            ),
        })
    }

    /// Bot-password credentials, if both halves are set.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (&self.username, &self.password) {
            (Some(user), Some(pass)) => Some((user.as_str(), pass.as_str())),
            _ => None,
        }
    }

    /// Credentials to log in with. Dry runs may proceed anonymously.
    pub fn login_credentials(&self, dry_run: bool) -> Result<Option<(&str, &str)>, ConfigError> {
        match self.credentials() {
            Some(credentials) => Ok(Some(credentials)),
            None if dry_run => Ok(None),
            None => Err(ConfigError::MissingCredentials),
        }
    }

    pub fn wikibase_options(&self) -> WikibaseOptions {
        let mut options = WikibaseOptions {
            api_url: self.api_url.clone(),
            maxlag: self.maxlag,
            edit_interval: self.edit_interval,
            ..Default::default()
        };
        if let Some(agent) = &self.user_agent {
            options.user_agent = agent.clone();
        }
        if let Some(retries) = self.maxlag_retries {
            options.maxlag_retries = retries;
        }
        options
    }
}
