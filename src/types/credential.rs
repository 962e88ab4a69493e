//! Credential Types

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Safety margin subtracted from the platform's advertised token lifetime so
/// the credential is considered stale slightly before the remote side does.
const EXPIRY_MARGIN_SECS: i64 = 10;

/// Short-lived bearer credential for one principal.
///
/// Immutable: a refresh always produces a new instance that supersedes the
/// previous one. Persistence of the value between calls is owned by the
/// credential store the client was built with.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AccessToken {
    /// Principal (application) identity the token was issued for.
    pub appid: String,
    /// Bearer token string.
    pub access_token: String,
    /// Absolute expiry instant.
    pub expires_at: DateTime<Utc>,
}

impl AccessToken {
    /// Create a token with an explicit expiry instant.
    pub fn new(
        appid: impl Into<String>,
        access_token: impl Into<String>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            appid: appid.into(),
            access_token: access_token.into(),
            expires_at,
        }
    }

    /// Create a token from the lifetime in seconds the platform advertises,
    /// applying the safety margin.
    pub fn with_lifetime(
        appid: impl Into<String>,
        access_token: impl Into<String>,
        expires_in_secs: i64,
    ) -> Self {
        let expires_at = Utc::now() + Duration::seconds(expires_in_secs - EXPIRY_MARGIN_SECS);
        Self::new(appid, access_token, expires_at)
    }

    /// True iff the token string is present and not expired. Pure.
    pub fn is_valid(&self) -> bool {
        !self.access_token.is_empty() && Utc::now() < self.expires_at
    }
}

/// Token issuance response from the platform.
///
/// Success carries `access_token` and `expires_in`; failure carries the
/// usual `errcode`/`errmsg` envelope instead.
#[derive(Clone, Debug, Deserialize)]
pub struct TokenResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    /// Advertised lifetime in seconds.
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub errcode: Option<i64>,
    #[serde(default)]
    pub errmsg: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validity_predicate() {
        let token = AccessToken::new("wx-app", "tok", Utc::now() + Duration::seconds(60));
        assert!(token.is_valid());

        let expired = AccessToken::new("wx-app", "tok", Utc::now() - Duration::seconds(1));
        assert!(!expired.is_valid());

        let empty = AccessToken::new("wx-app", "", Utc::now() + Duration::seconds(60));
        assert!(!empty.is_valid());
    }

    #[test]
    fn test_with_lifetime_applies_margin() {
        let token = AccessToken::with_lifetime("wx-app", "tok", 7200);
        assert!(token.is_valid());
        // Margin keeps the local expiry short of the advertised lifetime.
        assert!(token.expires_at < Utc::now() + Duration::seconds(7200));
        assert!(token.expires_at > Utc::now() + Duration::seconds(7200 - 60));
    }

    #[test]
    fn test_refresh_supersedes() {
        let first = AccessToken::with_lifetime("wx-app", "tok-1", 7200);
        let second = AccessToken::with_lifetime("wx-app", "tok-2", 7200);
        assert_ne!(first, second);
        assert_eq!(first.access_token, "tok-1");
    }

    #[test]
    fn test_token_response_success_parsing() {
        let json = r#"{"access_token":"fresh-token","expires_in":7200}"#;
        let response: TokenResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.access_token.as_deref(), Some("fresh-token"));
        assert_eq!(response.expires_in, Some(7200));
        assert_eq!(response.errcode, None);
    }

    #[test]
    fn test_token_response_error_parsing() {
        let json = r#"{"errcode":40013,"errmsg":"invalid appid"}"#;
        let response: TokenResponse = serde_json::from_str(json).unwrap();
        assert!(response.access_token.is_none());
        assert_eq!(response.errcode, Some(40013));
        assert_eq!(response.errmsg.as_deref(), Some("invalid appid"));
    }

    #[test]
    fn test_serde_round_trip_for_storage() {
        let token = AccessToken::new("wx-app", "tok", Utc::now() + Duration::seconds(60));
        let json = serde_json::to_string(&token).unwrap();
        let restored: AccessToken = serde_json::from_str(&json).unwrap();
        assert_eq!(token, restored);
    }
}
