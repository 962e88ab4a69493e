//! Error Types
//!
//! Tagged error taxonomy for credential management and request dispatch.

use std::time::Duration;
use thiserror::Error;

/// Application error code the platform returns when the access token carried
/// by a request is expired or otherwise rejected. The only code the client
/// heals on its own, via the bounded refresh-and-retry path.
pub const INVALID_CREDENTIAL_CODE: i64 = 40001;

/// Root error type for the WeChat client.
#[derive(Error, Debug)]
pub enum WechatError {
    /// HTTP status outside the accepted [200, 204] range. Never retried.
    #[error("transport error: status {status} from {url}")]
    Transport { url: String, status: u16 },

    /// Declared JSON content type but the body failed to parse. The raw body
    /// is preserved for diagnostics.
    #[error("decode error: {message}")]
    Decode { message: String, raw_body: String },

    /// Structured payload carrying a nonzero application error code.
    #[error("api error {code}: {message}")]
    Api { code: i64, message: String },

    /// A capability with this name is already registered.
    #[error("capability `{name}` is already registered")]
    DuplicateCapability { name: String },

    /// No capability registered under this name.
    #[error("unknown capability `{name}`")]
    UnknownCapability { name: String },

    /// Transport-level failure before any response was read.
    #[error("network error: {0}")]
    Network(#[from] NetworkError),

    /// Caller-supplied credential store failure.
    #[error("credential storage error: {message}")]
    Storage { message: String },

    /// Invalid or incomplete client configuration.
    #[error("configuration error: {message}")]
    Configuration { message: String },

    /// Request URL that does not parse.
    #[error("invalid request url: {message}")]
    InvalidUrl { message: String },
}

impl WechatError {
    /// Get error code for telemetry.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Transport { .. } => "WECHAT_TRANSPORT",
            Self::Decode { .. } => "WECHAT_DECODE",
            Self::Api { .. } => "WECHAT_API",
            Self::DuplicateCapability { .. } => "WECHAT_DUPLICATE_CAPABILITY",
            Self::UnknownCapability { .. } => "WECHAT_UNKNOWN_CAPABILITY",
            Self::Network(_) => "WECHAT_NETWORK",
            Self::Storage { .. } => "WECHAT_STORAGE",
            Self::Configuration { .. } => "WECHAT_CONFIG",
            Self::InvalidUrl { .. } => "WECHAT_URL",
        }
    }

    /// True for the platform's invalid-credential code.
    pub fn is_invalid_credential(&self) -> bool {
        matches!(self, Self::Api { code, .. } if *code == INVALID_CREDENTIAL_CODE)
    }
}

/// Network/transport error.
#[derive(Error, Debug)]
pub enum NetworkError {
    #[error("connection failed: {message}")]
    ConnectionFailed { message: String },

    #[error("request timeout after {timeout:?}")]
    Timeout { timeout: Duration },

    #[error("response body unreadable: {message}")]
    InvalidBody { message: String },
}

/// Result type for client operations.
pub type WechatResult<T> = Result<T, WechatError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = WechatError::Transport {
            url: "https://api.example.com/cgi-bin/user/info".to_string(),
            status: 502,
        };
        assert_eq!(
            err.to_string(),
            "transport error: status 502 from https://api.example.com/cgi-bin/user/info"
        );

        let err = WechatError::Api {
            code: 40002,
            message: "bad param".to_string(),
        };
        assert_eq!(err.to_string(), "api error 40002: bad param");

        let err = WechatError::DuplicateCapability {
            name: "media.upload".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "capability `media.upload` is already registered"
        );
    }

    #[test]
    fn test_error_codes() {
        let err = WechatError::Api {
            code: 40001,
            message: "invalid credential".to_string(),
        };
        assert_eq!(err.error_code(), "WECHAT_API");

        let err = WechatError::Network(NetworkError::Timeout {
            timeout: Duration::from_secs(30),
        });
        assert_eq!(err.error_code(), "WECHAT_NETWORK");
    }

    #[test]
    fn test_is_invalid_credential() {
        let err = WechatError::Api {
            code: INVALID_CREDENTIAL_CODE,
            message: "invalid credential".to_string(),
        };
        assert!(err.is_invalid_credential());

        let err = WechatError::Api {
            code: 40002,
            message: "bad param".to_string(),
        };
        assert!(!err.is_invalid_credential());

        let err = WechatError::Transport {
            url: "https://api.example.com".to_string(),
            status: 401,
        };
        assert!(!err.is_invalid_credential());
    }
}
