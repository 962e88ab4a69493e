//! Configuration Types

use secrecy::SecretString;
use std::time::Duration;

/// Base prefix for the general API subsystem.
pub const DEFAULT_API_BASE_URL: &str = "https://api.weixin.qq.com/cgi-bin/";
/// Base prefix for the media upload/download subsystem.
pub const DEFAULT_FILE_BASE_URL: &str = "https://file.api.weixin.qq.com/cgi-bin/";
/// Dispatch attempts allowed per logical request, the first one included.
pub const DEFAULT_RETRY_BUDGET: u32 = 3;

/// Client configuration.
#[derive(Clone)]
pub struct WechatConfig {
    /// Principal (application) identity the credential is issued for.
    pub appid: String,
    /// App secret the default token refresher authenticates with.
    pub secret: Option<SecretString>,
    /// Base prefix for general API paths. Ends with `/`.
    pub api_base_url: String,
    /// Base prefix for media paths. Ends with `/`.
    pub file_base_url: String,
    /// Transport timeout applied when a request sets none.
    pub timeout: Duration,
    /// Dispatch attempts allowed per logical request.
    pub retry_budget: u32,
}

impl Default for WechatConfig {
    fn default() -> Self {
        Self {
            appid: String::new(),
            secret: None,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            file_base_url: DEFAULT_FILE_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
            retry_budget: DEFAULT_RETRY_BUDGET,
        }
    }
}

impl std::fmt::Debug for WechatConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WechatConfig")
            .field("appid", &self.appid)
            .field("secret", &self.secret.as_ref().map(|_| "[REDACTED]"))
            .field("api_base_url", &self.api_base_url)
            .field("file_base_url", &self.file_base_url)
            .field("timeout", &self.timeout)
            .field("retry_budget", &self.retry_budget)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = WechatConfig::default();
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.file_base_url, DEFAULT_FILE_BASE_URL);
        assert_eq!(config.retry_budget, 3);
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let config = WechatConfig {
            appid: "wx-app".to_string(),
            secret: Some(SecretString::new("app-secret".to_string())),
            ..Default::default()
        };
        let rendered = format!("{:?}", config);
        assert!(rendered.contains("[REDACTED]"));
        assert!(!rendered.contains("app-secret"));
    }
}
