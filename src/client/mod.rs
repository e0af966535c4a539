//! Connection manager
//!
//! Entry point for callers: owns the resolved configuration and the optional
//! TLS identity, and opens connections through a [`ConnectionOpener`].
//!
//! [`ConnectionOpener`]: crate::connection::ConnectionOpener

mod manager;

pub use manager::{ConnectionManager, SERVICE_NAME};
