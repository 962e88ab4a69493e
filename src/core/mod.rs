//! Core Components
//!
//! Transport infrastructure the client dispatches through.

pub mod transport;

pub use transport::*;
