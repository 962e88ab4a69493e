//! Capability Registry
//!
//! Endpoint-specific operation groups (media, messaging, payments, …) attach
//! themselves to the client through a named-operation registry instead of
//! re-opening the client type. Registration is duplicate-checked so a module
//! cannot silently shadow a built-in or previously attached operation.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::{Arc, Mutex};

use crate::client::WechatClient;
use crate::error::{WechatError, WechatResult};

/// A named operation exposed through the client.
#[async_trait]
pub trait Capability: Send + Sync {
    /// Run the operation against the owning client.
    async fn call(&self, client: &WechatClient, params: Value) -> WechatResult<Value>;
}

/// Adapter so plain async closures over the request parameters can register
/// as capabilities.
///
/// The closure never sees the owning client; operations that dispatch
/// through it implement [`Capability`] directly.
pub fn capability_fn<F, Fut>(f: F) -> Arc<dyn Capability>
where
    F: Fn(Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = WechatResult<Value>> + Send + 'static,
{
    Arc::new(FnCapability(f))
}

struct FnCapability<F>(F);

#[async_trait]
impl<F, Fut> Capability for FnCapability<F>
where
    F: Fn(Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = WechatResult<Value>> + Send + 'static,
{
    async fn call(&self, _client: &WechatClient, params: Value) -> WechatResult<Value> {
        (self.0)(params).await
    }
}

/// Name-to-operation map with duplicate protection.
#[derive(Default)]
pub struct CapabilityRegistry {
    ops: Mutex<HashMap<String, Arc<dyn Capability>>>,
}

impl CapabilityRegistry {
    /// Create new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one operation. Fails without side effects if the name is
    /// already taken.
    pub fn register(&self, name: impl Into<String>, op: Arc<dyn Capability>) -> WechatResult<()> {
        let name = name.into();
        let mut ops = self.ops.lock().unwrap();
        if ops.contains_key(&name) {
            return Err(WechatError::DuplicateCapability { name });
        }
        ops.insert(name, op);
        Ok(())
    }

    /// Register a whole operation set. Every name is checked before any
    /// insert happens, so a collision leaves earlier registrations intact.
    pub fn register_all(&self, set: Vec<(String, Arc<dyn Capability>)>) -> WechatResult<()> {
        let mut ops = self.ops.lock().unwrap();

        {
            let mut seen: HashSet<&str> = ops.keys().map(String::as_str).collect();
            for (name, _) in &set {
                if !seen.insert(name.as_str()) {
                    return Err(WechatError::DuplicateCapability { name: name.clone() });
                }
            }
        }

        for (name, op) in set {
            ops.insert(name, op);
        }
        Ok(())
    }

    /// Look up an operation by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Capability>> {
        self.ops.lock().unwrap().get(name).cloned()
    }

    /// Registered operation names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.ops.lock().unwrap().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.ops.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.lock().unwrap().is_empty()
    }
}
