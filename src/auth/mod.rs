//! Credential Management
//!
//! The two injectable boundaries of the credential lifecycle: storage of the
//! current access token and issuance of fresh ones.

pub mod refresh;
pub mod storage;

pub use refresh::{ClientCredentialRefresher, MockTokenRefresher, TokenRefresher};
pub use storage::{CredentialStore, InMemoryCredentialStore, MockCredentialStore};
