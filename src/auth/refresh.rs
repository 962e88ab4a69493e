//! Token Refresh
//!
//! Refresh boundary that produces fresh credentials, with the default
//! implementation issuing tokens through the platform's client-credential
//! grant.

use async_trait::async_trait;
use secrecy::ExposeSecret;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use url::Url;

use crate::core::{HttpMethod, HttpRequest, HttpTransport};
use crate::error::{WechatError, WechatResult};
use crate::types::{AccessToken, TokenResponse, WechatConfig};

/// Lifetime assumed when the issuance response omits `expires_in`.
const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 7200;

/// Credential refresh interface: produce a fresh token for a principal.
///
/// The client persists whatever this returns through its credential store;
/// implementations only need to mint the token.
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    /// Issue a fresh credential for the principal.
    async fn refresh(&self, appid: &str) -> WechatResult<AccessToken>;
}

/// Default refresher: calls the platform's token issuance endpoint with the
/// configured appid and secret.
pub struct ClientCredentialRefresher {
    config: WechatConfig,
    transport: Arc<dyn HttpTransport>,
}

impl ClientCredentialRefresher {
    /// Create new refresher. Fails when the configuration carries no secret
    /// to authenticate the issuance call with.
    pub fn new(config: WechatConfig, transport: Arc<dyn HttpTransport>) -> WechatResult<Self> {
        if config.secret.is_none() {
            return Err(WechatError::Configuration {
                message: "token issuance requires an app secret; set one or inject a custom \
                          refresher"
                    .to_string(),
            });
        }
        Ok(Self { config, transport })
    }

    fn token_url(&self, appid: &str) -> WechatResult<Url> {
        let base = Url::parse(&self.config.api_base_url).map_err(|e| WechatError::InvalidUrl {
            message: e.to_string(),
        })?;
        let mut url = base.join("token").map_err(|e| WechatError::InvalidUrl {
            message: e.to_string(),
        })?;

        let secret = self
            .config
            .secret
            .as_ref()
            .ok_or_else(|| WechatError::Configuration {
                message: "app secret not configured".to_string(),
            })?;

        url.query_pairs_mut()
            .append_pair("grant_type", "client_credential")
            .append_pair("appid", appid)
            .append_pair("secret", secret.expose_secret());

        Ok(url)
    }
}

#[async_trait]
impl TokenRefresher for ClientCredentialRefresher {
    async fn refresh(&self, appid: &str) -> WechatResult<AccessToken> {
        let url = self.token_url(appid)?;

        // Reported URLs are stripped of the query string so the secret never
        // reaches error messages or logs.
        let mut reported_url = url.clone();
        reported_url.set_query(None);

        tracing::debug!(appid, "requesting fresh access token");

        let request = HttpRequest {
            method: HttpMethod::Get,
            url,
            headers: HashMap::new(),
            body: None,
            timeout: Some(self.config.timeout),
        };

        let response = self.transport.send(request).await?;

        if !(200..=204).contains(&response.status) {
            return Err(WechatError::Transport {
                url: reported_url.to_string(),
                status: response.status,
            });
        }

        let token: TokenResponse =
            serde_json::from_slice(&response.body).map_err(|e| WechatError::Decode {
                message: e.to_string(),
                raw_body: String::from_utf8_lossy(&response.body).into_owned(),
            })?;

        if let Some(code) = token.errcode.filter(|&code| code != 0) {
            return Err(WechatError::Api {
                code,
                message: token.errmsg.unwrap_or_default(),
            });
        }

        let access_token = token.access_token.ok_or_else(|| WechatError::Decode {
            message: "token response missing access_token".to_string(),
            raw_body: String::from_utf8_lossy(&response.body).into_owned(),
        })?;

        let expires_in = token.expires_in.unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS);
        Ok(AccessToken::with_lifetime(appid, access_token, expires_in))
    }
}

/// Mock token refresher for testing.
#[derive(Default)]
pub struct MockTokenRefresher {
    scripted: Mutex<VecDeque<AccessToken>>,
    refresh_history: Mutex<Vec<String>>,
    next_error: Mutex<Option<WechatError>>,
}

impl MockTokenRefresher {
    /// Create new mock refresher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a token to hand out; otherwise a numbered one is generated.
    pub fn queue_token(&self, token: AccessToken) -> &Self {
        self.scripted.lock().unwrap().push_back(token);
        self
    }

    /// Set next error to return.
    pub fn set_next_error(&self, error: WechatError) -> &Self {
        *self.next_error.lock().unwrap() = Some(error);
        self
    }

    /// Number of refreshes performed.
    pub fn refresh_count(&self) -> usize {
        self.refresh_history.lock().unwrap().len()
    }

    /// Principals refreshed, in call order.
    pub fn refresh_history(&self) -> Vec<String> {
        self.refresh_history.lock().unwrap().clone()
    }
}

#[async_trait]
impl TokenRefresher for MockTokenRefresher {
    async fn refresh(&self, appid: &str) -> WechatResult<AccessToken> {
        if let Some(error) = self.next_error.lock().unwrap().take() {
            return Err(error);
        }

        self.refresh_history.lock().unwrap().push(appid.to_string());

        if let Some(token) = self.scripted.lock().unwrap().pop_front() {
            return Ok(token);
        }

        let n = self.refresh_history.lock().unwrap().len();
        Ok(AccessToken::with_lifetime(
            appid,
            format!("refreshed-token-{}", n),
            3600,
        ))
    }
}
