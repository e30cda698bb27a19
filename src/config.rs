use std::env;

use tracing::{info, warn};

use crate::card::DEFAULT_AVATAR_BASE_URL;
use crate::feed::{LanguageFilter, DEFAULT_PAGE_SIZE};
use crate::session::DEFAULT_AUDIENCE;

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key} is invalid: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Settings read from the environment.
#[derive(Clone, Debug)]
pub struct Config {
    pub gateway_url: Option<String>,
    pub anon_key: Option<String>,
    pub access_token: Option<String>,
    pub jwt_secret: Option<String>,
    pub jwt_audience: String,
    pub page_size: usize,
    pub feed_language: LanguageFilter,
    pub avatar_base_url: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        fn opt(name: &str) -> Option<String> {
            env::var(name).ok().filter(|v| !v.trim().is_empty())
        }

        let gateway_url = opt("GATEWAY_URL");
        let anon_key = opt("GATEWAY_ANON_KEY");
        if gateway_url.is_some() != anon_key.is_some() {
            warn!("GATEWAY_URL and GATEWAY_ANON_KEY must both be set to use the hosted store");
        }

        let jwt_secret = opt("GATEWAY_JWT_SECRET");
        if let Some(secret) = &jwt_secret {
            if secret.len() < 32 {
                return Err(ConfigError::Invalid {
                    key: "GATEWAY_JWT_SECRET",
                    reason: "must be at least 32 characters long".into(),
                });
            }
        }

        let page_size = match opt("FEED_PAGE_SIZE") {
            None => DEFAULT_PAGE_SIZE,
            Some(v) => match v.parse::<usize>() {
                Ok(n) if n >= 1 => n,
                _ => {
                    return Err(ConfigError::Invalid {
                        key: "FEED_PAGE_SIZE",
                        reason: format!("expected a positive integer, got {v:?}"),
                    })
                }
            },
        };

        let feed_language = opt("FEED_LANGUAGE")
            .map(|v| v.parse().unwrap_or_default())
            .unwrap_or_default();

        let cfg = Self {
            gateway_url,
            anon_key,
            access_token: opt("GATEWAY_ACCESS_TOKEN"),
            jwt_secret,
            jwt_audience: opt("GATEWAY_JWT_AUDIENCE").unwrap_or_else(|| DEFAULT_AUDIENCE.to_string()),
            page_size,
            feed_language,
            avatar_base_url: opt("AVATAR_BASE_URL").unwrap_or_else(|| DEFAULT_AVATAR_BASE_URL.to_string()),
        };
        info!(
            hosted_store = cfg.uses_hosted_store(),
            page_size = cfg.page_size,
            language = %cfg.feed_language,
            "configuration loaded"
        );
        Ok(cfg)
    }

    pub fn uses_hosted_store(&self) -> bool {
        self.gateway_url.is_some() && self.anon_key.is_some()
    }
}
