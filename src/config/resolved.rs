//! Resolved LDAP connection configuration

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Attribute name of the endpoint URL
pub const URL: &str = "url";
/// Attribute name of the initial context factory type
pub const INITIAL_CONTEXT_FACTORY: &str = "initial-context-factory";
/// Attribute name of the search principal
pub const SEARCH_DN: &str = "search-dn";
/// Attribute name of the search credential
pub const SEARCH_CREDENTIAL: &str = "search-credential";

/// Configuration for one LDAP connection, as produced by the management model.
///
/// `url` and `initial_context_factory` are mandatory but kept optional in this
/// shape so a configuration source can hand over an incomplete value;
/// [`ResolvedConfiguration::validate`] rejects it.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ResolvedConfiguration {
    /// Endpoint URL (`ldap://host:389` or `ldaps://host:636`)
    pub url: Option<String>,
    /// Context factory type name
    pub initial_context_factory: Option<String>,
    /// Bind principal for the manager's own connections
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_dn: Option<String>,
    /// Bind credential for the manager's own connections
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_credential: Option<String>,
}

impl ResolvedConfiguration {
    /// Create a configuration with both mandatory fields set
    pub fn new(url: impl Into<String>, initial_context_factory: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            initial_context_factory: Some(initial_context_factory.into()),
            search_dn: None,
            search_credential: None,
        }
    }

    /// Create a builder
    ///
    /// # Examples
    ///
    /// ```
    /// use ldap_connect::ResolvedConfiguration;
    ///
    /// let config = ResolvedConfiguration::builder()
    ///     .url("ldap://localhost:389")
    ///     .initial_context_factory("SimpleFactory")
    ///     .search_dn("cn=admin")
    ///     .search_credential("secret")
    ///     .build();
    /// assert!(config.validate().is_ok());
    /// ```
    pub fn builder() -> ResolvedConfigurationBuilder {
        ResolvedConfigurationBuilder::default()
    }

    /// Check that the mandatory fields are present.
    ///
    /// The error names the first missing field.
    pub fn validate(&self) -> Result<()> {
        self.require_url()?;
        self.require_initial_context_factory()?;
        Ok(())
    }

    /// Endpoint URL, or `MissingField` if absent
    pub fn require_url(&self) -> Result<&str> {
        self.url.as_deref().ok_or(Error::MissingField(URL))
    }

    /// Context factory type, or `MissingField` if absent
    pub fn require_initial_context_factory(&self) -> Result<&str> {
        self.initial_context_factory
            .as_deref()
            .ok_or(Error::MissingField(INITIAL_CONTEXT_FACTORY))
    }
}

impl std::fmt::Debug for ResolvedConfiguration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedConfiguration")
            .field("url", &self.url)
            .field("initial_context_factory", &self.initial_context_factory)
            .field("search_dn", &self.search_dn)
            .field(
                "search_credential",
                &self.search_credential.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

/// Builder for [`ResolvedConfiguration`]
#[derive(Debug, Clone, Default)]
pub struct ResolvedConfigurationBuilder {
    config: ResolvedConfiguration,
}

impl ResolvedConfigurationBuilder {
    /// Set the endpoint URL
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.config.url = Some(url.into());
        self
    }

    /// Set the context factory type
    pub fn initial_context_factory(mut self, factory: impl Into<String>) -> Self {
        self.config.initial_context_factory = Some(factory.into());
        self
    }

    /// Set the search principal
    pub fn search_dn(mut self, dn: impl Into<String>) -> Self {
        self.config.search_dn = Some(dn.into());
        self
    }

    /// Set the search credential
    pub fn search_credential(mut self, credential: impl Into<String>) -> Self {
        self.config.search_credential = Some(credential.into());
        self
    }

    /// Build the configuration.
    ///
    /// Does not validate; the manager does that when the configuration is set.
    pub fn build(self) -> ResolvedConfiguration {
        self.config
    }
}
