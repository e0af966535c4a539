//! LDAP connection manager
//!
//! Produces ready-to-use directory connections from a resolved configuration
//! and an optional TLS identity. Two acquisition paths exist:
//!
//! * `get_connection()` binds with the configured search identity and, when a
//!   TLS identity is present, a client-authenticating TLS context
//! * `get_connection_as(principal, credential)` binds with caller credentials
//!   over a trust-only TLS context
//!
//! The underlying opener selects its socket factory by type name only, so the
//! per-call TLS context is handed over through a scope-keyed registry
//! (see [`connection::registry`]).

#![warn(missing_docs)]

pub mod client;
pub mod config;
pub mod connection;
pub mod error;
pub mod metrics;

pub use client::ConnectionManager;
pub use config::ResolvedConfiguration;
pub use error::{Error, Result};
