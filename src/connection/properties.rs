//! Connection property set
//!
//! The underlying opener is configured entirely through string properties.
//! Builders here are pure functions over the resolved configuration.

use crate::config::ResolvedConfiguration;
use crate::Result;
use std::collections::BTreeMap;

/// Property keys understood by openers
pub mod keys {
    /// Endpoint URL
    pub const PROVIDER_URL: &str = "ldap.provider.url";

    /// Context factory type
    pub const INITIAL_CONTEXT_FACTORY: &str = "ldap.context.factory";

    /// Bind principal
    pub const SECURITY_PRINCIPAL: &str = "ldap.security.principal";

    /// Bind credential
    pub const SECURITY_CREDENTIALS: &str = "ldap.security.credentials";

    /// Type name of the socket factory the opener must instantiate
    pub const SOCKET_FACTORY: &str = "ldap.factory.socket";
}

/// String properties for one open call.
///
/// Built fresh per call and moved into the opener.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ConnectionProperties {
    entries: BTreeMap<String, String>,
}

impl ConnectionProperties {
    /// Create an empty property set
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a property, replacing any previous value
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Get a property
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Whether a property is set
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of properties
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no property is set
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate properties in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Endpoint URL
    pub fn provider_url(&self) -> Option<&str> {
        self.get(keys::PROVIDER_URL)
    }

    /// Bind principal
    pub fn principal(&self) -> Option<&str> {
        self.get(keys::SECURITY_PRINCIPAL)
    }

    /// Bind credential
    pub fn credentials(&self) -> Option<&str> {
        self.get(keys::SECURITY_CREDENTIALS)
    }

    /// Socket factory type name
    pub fn socket_factory(&self) -> Option<&str> {
        self.get(keys::SOCKET_FACTORY)
    }
}

impl std::fmt::Debug for ConnectionProperties {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut map = f.debug_map();
        for (key, value) in self.iter() {
            if key == keys::SECURITY_CREDENTIALS {
                map.entry(&key, &"<redacted>");
            } else {
                map.entry(&key, &value);
            }
        }
        map.finish()
    }
}

/// Endpoint URL and context factory type only.
///
/// The configuration was validated when it was set; the presence check is
/// repeated here.
pub fn build_base_properties(config: &ResolvedConfiguration) -> Result<ConnectionProperties> {
    let mut properties = ConnectionProperties::new();
    properties.insert(
        keys::INITIAL_CONTEXT_FACTORY,
        config.require_initial_context_factory()?,
    );
    properties.insert(keys::PROVIDER_URL, config.require_url()?);
    Ok(properties)
}

/// Base properties plus the configured search identity, where present.
///
/// Principal and credential are optional because a TLS client certificate can
/// authenticate the connection instead.
pub fn build_authenticated_properties(
    config: &ResolvedConfiguration,
) -> Result<ConnectionProperties> {
    let mut properties = build_base_properties(config)?;
    if let Some(dn) = &config.search_dn {
        properties.insert(keys::SECURITY_PRINCIPAL, dn.as_str());
    }
    if let Some(credential) = &config.search_credential {
        properties.insert(keys::SECURITY_CREDENTIALS, credential.as_str());
    }
    Ok(properties)
}

/// Base properties with the caller's principal and credential.
///
/// The configured search identity is ignored.
pub fn build_caller_properties(
    config: &ResolvedConfiguration,
    principal: &str,
    credential: &str,
) -> Result<ConnectionProperties> {
    let mut properties = build_base_properties(config)?;
    properties.insert(keys::SECURITY_PRINCIPAL, principal);
    properties.insert(keys::SECURITY_CREDENTIALS, credential);
    Ok(properties)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    fn base_config() -> ResolvedConfiguration {
        ResolvedConfiguration::new("ldap://host:389", "SimpleFactory")
    }

    fn admin_config() -> ResolvedConfiguration {
        ResolvedConfiguration::builder()
            .url("ldap://host:389")
            .initial_context_factory("SimpleFactory")
            .search_dn("cn=admin")
            .search_credential("secret")
            .build()
    }

    #[test]
    fn test_base_properties_exactly_two_entries() {
        let props = build_base_properties(&base_config()).unwrap();
        assert_eq!(props.len(), 2);
        assert_eq!(props.provider_url(), Some("ldap://host:389"));
        assert_eq!(props.get(keys::INITIAL_CONTEXT_FACTORY), Some("SimpleFactory"));
    }

    #[test]
    fn test_base_properties_missing_url() {
        let config = ResolvedConfiguration::builder()
            .initial_context_factory("SimpleFactory")
            .build();
        assert!(matches!(
            build_base_properties(&config),
            Err(Error::MissingField("url"))
        ));
    }

    #[test]
    fn test_authenticated_without_search_identity() {
        let props = build_authenticated_properties(&base_config()).unwrap();
        assert_eq!(props.len(), 2);
        assert!(props.principal().is_none());
        assert!(props.credentials().is_none());
    }

    #[test]
    fn test_authenticated_with_search_identity() {
        let props = build_authenticated_properties(&admin_config()).unwrap();
        assert_eq!(props.len(), 4);
        assert_eq!(props.principal(), Some("cn=admin"));
        assert_eq!(props.credentials(), Some("secret"));
    }

    #[test]
    fn test_authenticated_with_only_principal() {
        let mut config = base_config();
        config.search_dn = Some("cn=reader".into());
        let props = build_authenticated_properties(&config).unwrap();
        assert_eq!(props.principal(), Some("cn=reader"));
        assert!(!props.contains_key(keys::SECURITY_CREDENTIALS));
    }

    #[test]
    fn test_caller_overrides_configured_identity() {
        let props = build_caller_properties(&admin_config(), "cn=other", "pw").unwrap();
        assert_eq!(props.principal(), Some("cn=other"));
        assert_eq!(props.credentials(), Some("pw"));
        assert_eq!(props.len(), 4);
    }

    #[test]
    fn test_caller_properties_without_configured_identity() {
        let props = build_caller_properties(&base_config(), "uid=jdoe", "").unwrap();
        assert_eq!(props.principal(), Some("uid=jdoe"));
        assert_eq!(props.credentials(), Some(""));
    }

    #[test]
    fn test_builders_never_set_socket_factory() {
        assert!(build_authenticated_properties(&admin_config())
            .unwrap()
            .socket_factory()
            .is_none());
        assert!(build_caller_properties(&admin_config(), "a", "b")
            .unwrap()
            .socket_factory()
            .is_none());
    }

    #[test]
    fn test_debug_redacts_credentials() {
        let props = build_authenticated_properties(&admin_config()).unwrap();
        let debug_str = format!("{:?}", props);
        assert!(debug_str.contains("cn=admin"));
        assert!(!debug_str.contains("secret"));
    }
}
