//! WeChat Platform API Client Core
//!
//! Credential lifecycle management and request dispatch for the WeChat HTTP
//! API. The crate keeps one short-lived access token per principal, refreshes
//! it when it expires or the platform rejects it, and exposes the dispatch
//! primitive that endpoint-specific capability modules build on.
//!
//! # Example
//!
//! ```rust,ignore
//! use wechat_client::{wechat_config, RequestOptions, WechatClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = wechat_config()
//!         .appid("wx1234567890")
//!         .secret("app-secret")
//!         .build()?;
//!
//!     let client = WechatClient::new(config)?;
//!
//!     let url = client.authorized_url("user/info").await?;
//!     let payload = client.request(url.as_str(), RequestOptions::new()).await?;
//!     println!("{:?}", payload.as_json());
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! The crate is organized into several sub-modules:
//!
//! - `types`: credential, request option, and configuration types
//! - `error`: tagged error taxonomy
//! - `core`: HTTP transport boundary
//! - `auth`: credential storage and refresh boundaries
//! - `capabilities`: named-operation registry endpoint modules attach to
//! - `builders`: fluent configuration builder
//! - `client`: high-level client combining the seams

pub mod auth;
pub mod builders;
pub mod capabilities;
pub mod client;
pub mod core;
pub mod error;
pub mod types;

// Re-export main client
pub use client::{WechatClient, WechatClientBuilder};

// Re-export builders
pub use builders::{wechat_config, WechatConfigBuilder};

// Re-export errors
pub use error::{NetworkError, WechatError, WechatResult, INVALID_CREDENTIAL_CODE};

// Re-export types
pub use types::{
    AccessToken, Payload, RequestOptions, TokenResponse, WechatConfig, DEFAULT_API_BASE_URL,
    DEFAULT_FILE_BASE_URL, DEFAULT_RETRY_BUDGET,
};

// Re-export core components
pub use core::{
    HttpMethod, HttpRequest, HttpResponse, HttpTransport, MockTransport, ReqwestTransport,
};

// Re-export credential boundaries
pub use auth::{
    ClientCredentialRefresher, CredentialStore, InMemoryCredentialStore, MockCredentialStore,
    MockTokenRefresher, TokenRefresher,
};

// Re-export capability registry
pub use capabilities::{capability_fn, Capability, CapabilityRegistry};
