//! Request Option Types

use bytes::Bytes;
use serde::Serialize;
use std::collections::HashMap;
use std::time::Duration;

use crate::core::HttpMethod;
use crate::error::{WechatError, WechatResult};

/// Per-request option bag merged over the client's instance defaults.
#[derive(Clone, Debug, Default)]
pub struct RequestOptions {
    /// HTTP method; GET when unset.
    pub method: Option<HttpMethod>,
    /// Merged key-wise with the defaults; the call site wins per key.
    pub headers: HashMap<String, String>,
    /// Request body.
    pub body: Option<String>,
    /// Transport timeout override.
    pub timeout: Option<Duration>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn method(mut self, method: HttpMethod) -> Self {
        self.method = Some(method);
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Serialize a JSON body and set the matching content type.
    pub fn json<T: Serialize>(self, body: &T) -> WechatResult<Self> {
        let body = serde_json::to_string(body).map_err(|e| WechatError::Configuration {
            message: format!("request body does not serialize: {}", e),
        })?;
        Ok(self.header("content-type", "application/json").body(body))
    }

    /// Merge these call-site options over instance defaults.
    ///
    /// Headers merge key-wise with the call site winning on collisions;
    /// every other field is last-write-wins, call site over defaults.
    pub fn merged_over(&self, defaults: &RequestOptions) -> RequestOptions {
        let mut headers = defaults.headers.clone();
        headers.extend(self.headers.iter().map(|(k, v)| (k.clone(), v.clone())));

        RequestOptions {
            method: self.method.or(defaults.method),
            headers,
            body: self.body.clone().or_else(|| defaults.body.clone()),
            timeout: self.timeout.or(defaults.timeout),
        }
    }
}

/// Result of one dispatched request.
#[derive(Clone, Debug)]
pub enum Payload {
    /// Structured response whose error envelope was clean.
    Json(serde_json::Value),
    /// Non-JSON response body, returned unmodified.
    Bytes(Bytes),
}

impl Payload {
    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Json(value) => Some(value),
            Self::Bytes(_) => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            Self::Json(_) => None,
            Self::Bytes(bytes) => Some(bytes),
        }
    }

    /// Unwrap the structured payload, failing on raw responses.
    pub fn into_json(self) -> WechatResult<serde_json::Value> {
        match self {
            Self::Json(value) => Ok(value),
            Self::Bytes(bytes) => Err(WechatError::Decode {
                message: "expected a structured response".to_string(),
                raw_body: String::from_utf8_lossy(&bytes).into_owned(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_headers_merge_key_wise() {
        let defaults = RequestOptions::new().header("x-app", "core");
        let call_site = RequestOptions::new().header("x-request", "1");

        let merged = call_site.merged_over(&defaults);
        assert_eq!(merged.headers.get("x-app").map(String::as_str), Some("core"));
        assert_eq!(merged.headers.get("x-request").map(String::as_str), Some("1"));
    }

    #[test]
    fn test_call_site_wins_per_key() {
        let defaults = RequestOptions::new()
            .header("x-shared", "default")
            .method(HttpMethod::Get)
            .timeout(Duration::from_secs(5));
        let call_site = RequestOptions::new()
            .header("x-shared", "call")
            .method(HttpMethod::Post);

        let merged = call_site.merged_over(&defaults);
        assert_eq!(merged.headers.get("x-shared").map(String::as_str), Some("call"));
        assert_eq!(merged.method, Some(HttpMethod::Post));
        // Fields the call site left unset fall back to the defaults.
        assert_eq!(merged.timeout, Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_json_body_sets_content_type() {
        let options = RequestOptions::new()
            .json(&json!({"touser": "u1"}))
            .unwrap();
        assert_eq!(
            options.headers.get("content-type").map(String::as_str),
            Some("application/json")
        );
        assert_eq!(options.body.as_deref(), Some(r#"{"touser":"u1"}"#));
    }

    #[test]
    fn test_payload_accessors() {
        let json_payload = Payload::Json(json!({"openid": "u1"}));
        assert!(json_payload.as_json().is_some());
        assert!(json_payload.as_bytes().is_none());

        let raw = Payload::Bytes(Bytes::from_static(b"\xff\xd8"));
        assert!(raw.as_json().is_none());
        assert!(raw.clone().into_json().is_err());
        assert_eq!(raw.as_bytes().unwrap().as_ref(), b"\xff\xd8");
    }
}
