//! Connection configuration
//!
//! This module handles:
//! * The resolved configuration shape handed over by the management layer
//! * Presence checks of mandatory fields
//! * Endpoint URL parsing for the default opener

mod endpoint;
mod resolved;

pub use endpoint::{Endpoint, Scheme, DEFAULT_LDAPS_PORT, DEFAULT_LDAP_PORT};
pub use resolved::{
    ResolvedConfiguration, ResolvedConfigurationBuilder, INITIAL_CONTEXT_FACTORY,
    SEARCH_CREDENTIAL, SEARCH_DN, URL,
};
