//! Auth module for registry credentials
//!
//! Carries the server URL and optional HTTP basic credentials used by the
//! API client for admin operations.

mod basic;

pub use basic::BasicAuthenticator;
