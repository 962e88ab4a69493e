//! Credential Storage
//!
//! Storage boundary for the access token, with the process-local default
//! and a mock for tests.

use async_trait::async_trait;
use std::sync::Mutex;

use crate::error::{WechatError, WechatResult};
use crate::types::AccessToken;

/// Credential storage interface.
///
/// Implementations own persistence and any cross-process coordination; the
/// client only reads the latest value and writes freshly issued ones. Two
/// concurrent callers that both observe a stale credential will both trigger
/// a refresh unless the implementation adds its own single-flight guard.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Latest stored credential for the principal, if any.
    async fn get(&self, appid: &str) -> WechatResult<Option<AccessToken>>;

    /// Persist a freshly issued credential, superseding the previous one.
    async fn set(&self, token: AccessToken) -> WechatResult<()>;
}

/// Single-slot in-memory credential store.
///
/// Holds the credential of exactly one process. Deployments running several
/// processes against the same appid must inject a shared store instead, or
/// each process will refresh on its own and invalidate the others.
#[derive(Default)]
pub struct InMemoryCredentialStore {
    slot: Mutex<Option<AccessToken>>,
}

impl InMemoryCredentialStore {
    /// Create new in-memory credential store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store wired in when the caller injects nothing. Warns outside debug
    /// builds: a process-local slot cannot be shared across processes.
    pub(crate) fn process_local_default() -> Self {
        if !cfg!(debug_assertions) {
            tracing::warn!(
                "no credential store injected; falling back to the process-local in-memory \
                 slot, which is unsuitable for multi-process deployments"
            );
        }
        Self::new()
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn get(&self, appid: &str) -> WechatResult<Option<AccessToken>> {
        let slot = self.slot.lock().unwrap();
        Ok(slot.as_ref().filter(|token| token.appid == appid).cloned())
    }

    async fn set(&self, token: AccessToken) -> WechatResult<()> {
        *self.slot.lock().unwrap() = Some(token);
        Ok(())
    }
}

/// Mock credential store for testing.
#[derive(Default)]
pub struct MockCredentialStore {
    slot: Mutex<Option<AccessToken>>,
    get_history: Mutex<Vec<String>>,
    set_history: Mutex<Vec<AccessToken>>,
    next_error: Mutex<Option<WechatError>>,
}

impl MockCredentialStore {
    /// Create new mock credential store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate the stored credential.
    pub fn seed(&self, token: AccessToken) -> &Self {
        *self.slot.lock().unwrap() = Some(token);
        self
    }

    /// Set next error to return.
    pub fn set_next_error(&self, error: WechatError) -> &Self {
        *self.next_error.lock().unwrap() = Some(error);
        self
    }

    /// Get retrieval history.
    pub fn get_history(&self) -> Vec<String> {
        self.get_history.lock().unwrap().clone()
    }

    /// Get persistence history.
    pub fn set_history(&self) -> Vec<AccessToken> {
        self.set_history.lock().unwrap().clone()
    }

    fn check_error(&self) -> WechatResult<()> {
        if let Some(error) = self.next_error.lock().unwrap().take() {
            return Err(error);
        }
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for MockCredentialStore {
    async fn get(&self, appid: &str) -> WechatResult<Option<AccessToken>> {
        self.check_error()?;
        self.get_history.lock().unwrap().push(appid.to_string());
        let slot = self.slot.lock().unwrap();
        Ok(slot.as_ref().filter(|token| token.appid == appid).cloned())
    }

    async fn set(&self, token: AccessToken) -> WechatResult<()> {
        self.check_error()?;
        self.set_history.lock().unwrap().push(token.clone());
        *self.slot.lock().unwrap() = Some(token);
        Ok(())
    }
}
