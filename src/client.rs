//! WeChat Client
//!
//! High-level client combining credential management, request dispatch with
//! the bounded invalid-credential retry, and the capability extension point.

use serde_json::Value;
use std::sync::{Arc, Mutex};
use url::Url;

use crate::auth::{
    ClientCredentialRefresher, CredentialStore, InMemoryCredentialStore, TokenRefresher,
};
use crate::capabilities::{Capability, CapabilityRegistry};
use crate::core::{HttpMethod, HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};
use crate::error::{WechatError, WechatResult, INVALID_CREDENTIAL_CODE};
use crate::types::{AccessToken, Payload, RequestOptions, WechatConfig};

/// Accepted HTTP status range for a platform response.
const SUCCESS_STATUS: std::ops::RangeInclusive<u16> = 200..=204;

/// WeChat API client.
///
/// Owns the credential lifecycle for one principal and the dispatch
/// primitive endpoint modules build on. All collaborators sit behind
/// injectable trait objects; see [`WechatClientBuilder`].
pub struct WechatClient {
    config: WechatConfig,
    transport: Arc<dyn HttpTransport>,
    store: Arc<dyn CredentialStore>,
    refresher: Arc<dyn TokenRefresher>,
    defaults: Mutex<RequestOptions>,
    capabilities: CapabilityRegistry,
}

impl WechatClient {
    /// Start building a client for the given configuration.
    pub fn builder(config: WechatConfig) -> WechatClientBuilder {
        WechatClientBuilder::new(config)
    }

    /// Create a client with all default collaborators.
    pub fn new(config: WechatConfig) -> WechatResult<Self> {
        Self::builder(config).build()
    }

    /// Get the client configuration.
    pub fn config(&self) -> &WechatConfig {
        &self.config
    }

    /// Get the capability registry.
    pub fn capabilities(&self) -> &CapabilityRegistry {
        &self.capabilities
    }

    /// Replace the default options merged into every future request.
    ///
    /// In-flight requests keep the defaults they started with.
    pub fn configure_defaults(&self, options: RequestOptions) {
        *self.defaults.lock().unwrap() = options;
    }

    /// Dispatch a request with the configured attempt budget.
    pub async fn request(&self, url: &str, options: RequestOptions) -> WechatResult<Payload> {
        self.request_with_budget(url, options, self.config.retry_budget)
            .await
    }

    /// Dispatch a request with an explicit attempt budget.
    ///
    /// `retry_budget` is the total number of dispatches allowed for this
    /// logical request, the first one included, clamped to a minimum of one.
    /// The only self-healing path is the platform's invalid-credential code:
    /// while attempts remain, the credential is refreshed, substituted into
    /// the URL's `access_token` query parameter when one is present, and the
    /// request is re-issued. Everything else surfaces immediately.
    pub async fn request_with_budget(
        &self,
        url: &str,
        options: RequestOptions,
        retry_budget: u32,
    ) -> WechatResult<Payload> {
        let mut url: Url = url.parse().map_err(|e: url::ParseError| WechatError::InvalidUrl {
            message: e.to_string(),
        })?;

        let options = {
            let defaults = self.defaults.lock().unwrap();
            options.merged_over(&defaults)
        };

        let mut attempts_left = retry_budget.max(1);

        loop {
            let response = self.dispatch(url.clone(), &options).await?;

            if !SUCCESS_STATUS.contains(&response.status) {
                return Err(WechatError::Transport {
                    url: url.to_string(),
                    status: response.status,
                });
            }

            let structured = response
                .content_type()
                .map(|ct| ct.contains("json"))
                .unwrap_or(false);
            if !structured {
                return Ok(Payload::Bytes(response.body));
            }

            let value: Value =
                serde_json::from_slice(&response.body).map_err(|e| WechatError::Decode {
                    message: e.to_string(),
                    raw_body: String::from_utf8_lossy(&response.body).into_owned(),
                })?;

            let errcode = value.get("errcode").and_then(Value::as_i64).unwrap_or(0);
            if errcode == 0 {
                return Ok(Payload::Json(value));
            }

            let message = value
                .get("errmsg")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();

            attempts_left -= 1;
            if errcode == INVALID_CREDENTIAL_CODE && attempts_left > 0 {
                tracing::debug!(attempts_left, "access token rejected, refreshing and retrying");
                let token = self.refresh_access_token().await?;
                substitute_access_token(&mut url, &token.access_token);
                continue;
            }

            return Err(WechatError::Api { code: errcode, message });
        }
    }

    async fn dispatch(&self, url: Url, options: &RequestOptions) -> WechatResult<HttpResponse> {
        let request = HttpRequest {
            method: options.method.unwrap_or(HttpMethod::Get),
            url,
            headers: options.headers.clone(),
            body: options.body.clone(),
            timeout: options.timeout.or(Some(self.config.timeout)),
        };

        tracing::debug!(
            method = request.method.as_str(),
            path = request.url.path(),
            "dispatching request"
        );

        self.transport.send(request).await
    }

    /// Valid credential for this client's principal: the stored one when it
    /// is still valid, otherwise a freshly issued one.
    ///
    /// Every call re-validates; nothing is cached here beyond what the
    /// injected store holds, and no background refresh runs. Two concurrent
    /// callers that both observe a stale credential will both refresh unless
    /// the injected hooks coordinate.
    pub async fn ensure_access_token(&self) -> WechatResult<AccessToken> {
        if let Some(token) = self.store.get(&self.config.appid).await? {
            if token.is_valid() {
                return Ok(token);
            }
        }
        self.refresh_access_token().await
    }

    /// Issue a fresh credential and persist it through the store.
    ///
    /// Named seam so endpoint modules can force a refresh without going
    /// through validity checks.
    pub async fn refresh_access_token(&self) -> WechatResult<AccessToken> {
        let token = self.refresher.refresh(&self.config.appid).await?;
        self.store.set(token.clone()).await?;
        Ok(token)
    }

    /// Absolute URL for a general API path, carrying a valid access token in
    /// the `access_token` query parameter.
    pub async fn authorized_url(&self, path: &str) -> WechatResult<Url> {
        let base = self.config.api_base_url.clone();
        self.authorized_url_on(&base, path).await
    }

    /// Same as [`authorized_url`](Self::authorized_url) against the media
    /// upload/download subsystem prefix.
    pub async fn authorized_file_url(&self, path: &str) -> WechatResult<Url> {
        let base = self.config.file_base_url.clone();
        self.authorized_url_on(&base, path).await
    }

    async fn authorized_url_on(&self, base: &str, path: &str) -> WechatResult<Url> {
        let token = self.ensure_access_token().await?;

        let base = Url::parse(base).map_err(|e| WechatError::InvalidUrl {
            message: e.to_string(),
        })?;
        let mut url = base
            .join(path.trim_start_matches('/'))
            .map_err(|e| WechatError::InvalidUrl {
                message: e.to_string(),
            })?;

        url.query_pairs_mut()
            .append_pair("access_token", &token.access_token);
        Ok(url)
    }

    /// Attach a named operation set.
    ///
    /// A collision with any existing name fails the whole set and keeps
    /// prior registrations untouched.
    pub fn extend(&self, capabilities: Vec<(String, Arc<dyn Capability>)>) -> WechatResult<()> {
        self.capabilities.register_all(capabilities)
    }

    /// Call a registered capability by name.
    pub async fn invoke(&self, name: &str, params: Value) -> WechatResult<Value> {
        let op = self
            .capabilities
            .get(name)
            .ok_or_else(|| WechatError::UnknownCapability {
                name: name.to_string(),
            })?;
        op.call(self, params).await
    }
}

/// Swap the `access_token` query parameter for a fresh value, leaving URLs
/// without one untouched. The query string is re-serialized so the new value
/// takes effect.
fn substitute_access_token(url: &mut Url, token: &str) {
    let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
    if !pairs.iter().any(|(name, _)| name == "access_token") {
        return;
    }

    let mut serializer = url.query_pairs_mut();
    serializer.clear();
    for (name, value) in &pairs {
        if name == "access_token" {
            serializer.append_pair(name, token);
        } else {
            serializer.append_pair(name, value);
        }
    }
}

/// Builder wiring the client's injectable collaborators.
pub struct WechatClientBuilder {
    config: WechatConfig,
    transport: Option<Arc<dyn HttpTransport>>,
    store: Option<Arc<dyn CredentialStore>>,
    refresher: Option<Arc<dyn TokenRefresher>>,
}

impl WechatClientBuilder {
    fn new(config: WechatConfig) -> Self {
        Self {
            config,
            transport: None,
            store: None,
            refresher: None,
        }
    }

    /// Inject a custom HTTP transport.
    pub fn transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Inject a custom credential store. Deployments with more than one
    /// process must do this together with a coordinating refresher.
    pub fn credential_store(mut self, store: Arc<dyn CredentialStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Inject a custom token refresher.
    pub fn token_refresher(mut self, refresher: Arc<dyn TokenRefresher>) -> Self {
        self.refresher = Some(refresher);
        self
    }

    /// Build the client, wiring default collaborators for any seam left
    /// uninjected. The default refresher needs the configured app secret.
    pub fn build(self) -> WechatResult<WechatClient> {
        let transport: Arc<dyn HttpTransport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::new()?),
        };

        let store: Arc<dyn CredentialStore> = match self.store {
            Some(store) => store,
            None => Arc::new(InMemoryCredentialStore::process_local_default()),
        };

        let refresher: Arc<dyn TokenRefresher> = match self.refresher {
            Some(refresher) => refresher,
            None => Arc::new(ClientCredentialRefresher::new(
                self.config.clone(),
                transport.clone(),
            )?),
        };

        Ok(WechatClient {
            config: self.config,
            transport,
            store,
            refresher,
            defaults: Mutex::new(RequestOptions::default()),
            capabilities: CapabilityRegistry::new(),
        })
    }
}
