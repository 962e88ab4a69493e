//! Configuration Builder
//!
//! Fluent builder for client configuration.

use secrecy::SecretString;
use std::time::Duration;
use url::Url;

use crate::error::{WechatError, WechatResult};
use crate::types::{WechatConfig, DEFAULT_API_BASE_URL, DEFAULT_FILE_BASE_URL, DEFAULT_RETRY_BUDGET};

/// Client configuration builder.
#[derive(Default)]
pub struct WechatConfigBuilder {
    appid: Option<String>,
    secret: Option<SecretString>,
    api_base_url: Option<String>,
    file_base_url: Option<String>,
    timeout: Option<Duration>,
    retry_budget: Option<u32>,
}

impl WechatConfigBuilder {
    /// Create new configuration builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the principal (application) identity.
    pub fn appid(mut self, appid: impl Into<String>) -> Self {
        self.appid = Some(appid.into());
        self
    }

    /// Set the app secret the default token refresher authenticates with.
    pub fn secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = Some(SecretString::new(secret.into()));
        self
    }

    /// Override the general API base prefix.
    pub fn api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = Some(url.into());
        self
    }

    /// Override the media subsystem base prefix.
    pub fn file_base_url(mut self, url: impl Into<String>) -> Self {
        self.file_base_url = Some(url.into());
        self
    }

    /// Set the default transport timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the dispatch attempt budget per logical request.
    pub fn retry_budget(mut self, budget: u32) -> Self {
        self.retry_budget = Some(budget);
        self
    }

    /// Build the configuration.
    pub fn build(self) -> WechatResult<WechatConfig> {
        let appid = self
            .appid
            .filter(|appid| !appid.is_empty())
            .ok_or_else(|| WechatError::Configuration {
                message: "missing required field: appid".to_string(),
            })?;

        let api_base_url = normalize_base_url(
            self.api_base_url
                .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
        )?;
        let file_base_url = normalize_base_url(
            self.file_base_url
                .unwrap_or_else(|| DEFAULT_FILE_BASE_URL.to_string()),
        )?;

        Ok(WechatConfig {
            appid,
            secret: self.secret,
            api_base_url,
            file_base_url,
            timeout: self.timeout.unwrap_or(Duration::from_secs(30)),
            retry_budget: self.retry_budget.unwrap_or(DEFAULT_RETRY_BUDGET),
        })
    }
}

/// Base prefixes must parse as absolute URLs and end with a slash so path
/// joins extend them instead of replacing the last segment.
fn normalize_base_url(url: String) -> WechatResult<String> {
    Url::parse(&url).map_err(|e| WechatError::Configuration {
        message: format!("invalid base url `{}`: {}", url, e),
    })?;

    if url.ends_with('/') {
        Ok(url)
    } else {
        Ok(format!("{}/", url))
    }
}

/// Create a new client configuration builder.
pub fn wechat_config() -> WechatConfigBuilder {
    WechatConfigBuilder::new()
}
