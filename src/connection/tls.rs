//! TLS contexts and selection.
//!
//! A [`TlsIdentity`] is supplied by the surrounding system and offers two
//! contexts: a full one that presents the server's client certificate, and a
//! trust-only one that verifies the directory server without presenting any
//! certificate. [`TlsContextSelector`] picks between them per call.

use crate::{Error, Result};
use rustls::{ClientConfig, RootCertStore};
use rustls_pki_types::{CertificateDer, PrivateKeyDer, ServerName};
use once_cell::sync::OnceCell;
use std::sync::Arc;

/// TLS configuration for a single connection attempt.
///
/// Cheap to clone; the compiled rustls config is shared.
#[derive(Clone)]
pub struct TlsContext {
    client_config: Arc<ClientConfig>,
    client_auth: bool,
}

impl TlsContext {
    /// Wrap an existing rustls configuration
    pub fn new(client_config: Arc<ClientConfig>) -> Self {
        let client_auth = client_config.client_auth_cert_resolver.has_certs();
        Self {
            client_config,
            client_auth,
        }
    }

    /// Verify the server against `roots`, present no client certificate
    pub fn trust_only(roots: RootCertStore) -> Self {
        let client_config = ClientConfig::builder()
            .with_root_certificates(roots)
            .with_no_client_auth();
        Self {
            client_config: Arc::new(client_config),
            client_auth: false,
        }
    }

    /// Trust-only context over the bundled Mozilla root set
    pub fn webpki_trust_only() -> Self {
        let mut roots = RootCertStore::empty();
        roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        Self::trust_only(roots)
    }

    /// Verify the server against `roots` and authenticate with a client certificate.
    ///
    /// # Errors
    ///
    /// Returns `Error::Tls` if the key does not match the certificate chain or
    /// uses an unsupported algorithm.
    pub fn with_client_auth(
        roots: RootCertStore,
        cert_chain: Vec<CertificateDer<'static>>,
        key: PrivateKeyDer<'static>,
    ) -> Result<Self> {
        let client_config = ClientConfig::builder()
            .with_root_certificates(roots)
            .with_client_auth_cert(cert_chain, key)
            .map_err(|e| Error::Tls(format!("invalid client certificate: {}", e)))?;
        Ok(Self {
            client_config: Arc::new(client_config),
            client_auth: true,
        })
    }

    /// Get the rustls ClientConfig for this context.
    pub fn client_config(&self) -> Arc<ClientConfig> {
        self.client_config.clone()
    }

    /// Whether a client certificate is presented
    pub fn has_client_auth(&self) -> bool {
        self.client_auth
    }
}

impl std::fmt::Debug for TlsContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsContext")
            .field("client_auth", &self.client_auth)
            .field("client_config", &"<ClientConfig>")
            .finish()
    }
}

/// TLS identity of the server, as provided by the surrounding system.
pub trait TlsIdentity: Send + Sync {
    /// Context that verifies the server and presents a client certificate
    fn full_context(&self) -> TlsContext;

    /// Context that verifies the server only
    fn trust_only_context(&self) -> TlsContext;
}

/// A [`TlsIdentity`] holding two prebuilt contexts.
#[derive(Debug, Clone)]
pub struct StaticTlsIdentity {
    full: TlsContext,
    trust_only: TlsContext,
}

impl StaticTlsIdentity {
    /// Use the given contexts as-is
    pub fn new(full: TlsContext, trust_only: TlsContext) -> Self {
        Self { full, trust_only }
    }

    /// Build both contexts from one trust store and one client certificate
    pub fn from_parts(
        roots: RootCertStore,
        cert_chain: Vec<CertificateDer<'static>>,
        key: PrivateKeyDer<'static>,
    ) -> Result<Self> {
        let full = TlsContext::with_client_auth(roots.clone(), cert_chain, key)?;
        let trust_only = TlsContext::trust_only(roots);
        Ok(Self { full, trust_only })
    }
}

impl TlsIdentity for StaticTlsIdentity {
    fn full_context(&self) -> TlsContext {
        self.full.clone()
    }

    fn trust_only_context(&self) -> TlsContext {
        self.trust_only.clone()
    }
}

/// Chooses the TLS context for a connection attempt.
///
/// Holds an optional identity injected once at assembly time. Without one,
/// every selection yields no TLS.
#[derive(Default)]
pub struct TlsContextSelector {
    identity: OnceCell<Arc<dyn TlsIdentity>>,
}

impl TlsContextSelector {
    /// Create a selector with no identity
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a selector with an identity already injected
    pub fn with_identity(identity: Arc<dyn TlsIdentity>) -> Self {
        let selector = Self::new();
        let _ = selector.identity.set(identity);
        selector
    }

    /// Inject the identity.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if an identity was already injected.
    pub fn inject(&self, identity: Arc<dyn TlsIdentity>) -> Result<()> {
        self.identity
            .set(identity)
            .map_err(|_| Error::Config("TLS identity already injected".into()))
    }

    /// Whether an identity is present
    pub fn has_identity(&self) -> bool {
        self.identity.get().is_some()
    }

    /// Select the context for one attempt.
    ///
    /// `trust_only` is set when the caller supplies its own bind credentials;
    /// the connection must then not authenticate with the client certificate.
    pub fn select(&self, trust_only: bool) -> Option<TlsContext> {
        let identity = self.identity.get()?;
        if trust_only {
            Some(identity.trust_only_context())
        } else {
            Some(identity.full_context())
        }
    }
}

impl std::fmt::Debug for TlsContextSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsContextSelector")
            .field("has_identity", &self.has_identity())
            .finish()
    }
}

/// Parse server name from hostname for TLS SNI (Server Name Indication).
///
/// Accepts DNS names and IP addresses. A trailing dot is removed.
///
/// # Errors
///
/// Returns `Error::Config` if the hostname is invalid.
pub fn parse_server_name(hostname: &str) -> Result<ServerName<'static>> {
    let hostname = hostname.trim_end_matches('.');

    if hostname.is_empty() || hostname.len() > 253 {
        return Err(Error::Config(format!(
            "Invalid hostname for TLS: '{}'",
            hostname
        )));
    }

    ServerName::try_from(hostname.to_string())
        .map_err(|_| Error::Config(format!("Invalid hostname for TLS: '{}'", hostname)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Identity that counts which accessor was called
    #[derive(Default)]
    struct CountingIdentity {
        full_calls: AtomicUsize,
        trust_only_calls: AtomicUsize,
    }

    impl TlsIdentity for CountingIdentity {
        fn full_context(&self) -> TlsContext {
            self.full_calls.fetch_add(1, Ordering::SeqCst);
            TlsContext::trust_only(RootCertStore::empty())
        }

        fn trust_only_context(&self) -> TlsContext {
            self.trust_only_calls.fetch_add(1, Ordering::SeqCst);
            TlsContext::trust_only(RootCertStore::empty())
        }
    }

    #[test]
    fn test_select_without_identity_is_none() {
        let selector = TlsContextSelector::new();
        assert!(!selector.has_identity());
        assert!(selector.select(false).is_none());
        assert!(selector.select(true).is_none());
    }

    #[test]
    fn test_select_full_context() {
        let identity = Arc::new(CountingIdentity::default());
        let selector = TlsContextSelector::with_identity(identity.clone());
        assert!(selector.select(false).is_some());
        assert_eq!(identity.full_calls.load(Ordering::SeqCst), 1);
        assert_eq!(identity.trust_only_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_select_trust_only_context() {
        let identity = Arc::new(CountingIdentity::default());
        let selector = TlsContextSelector::with_identity(identity.clone());
        assert!(selector.select(true).is_some());
        assert_eq!(identity.full_calls.load(Ordering::SeqCst), 0);
        assert_eq!(identity.trust_only_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_inject_once() {
        let selector = TlsContextSelector::new();
        assert!(selector.inject(Arc::new(CountingIdentity::default())).is_ok());
        assert!(selector.has_identity());
        assert!(selector.inject(Arc::new(CountingIdentity::default())).is_err());
    }

    #[test]
    fn test_trust_only_context_has_no_client_auth() {
        let ctx = TlsContext::trust_only(RootCertStore::empty());
        assert!(!ctx.has_client_auth());
        assert!(!TlsContext::new(ctx.client_config()).has_client_auth());
    }

    #[test]
    fn test_webpki_trust_only_has_roots() {
        let ctx = TlsContext::webpki_trust_only();
        assert!(!ctx.has_client_auth());
    }

    #[test]
    fn test_static_identity_returns_its_contexts() {
        let identity = StaticTlsIdentity::new(
            TlsContext::trust_only(RootCertStore::empty()),
            TlsContext::trust_only(RootCertStore::empty()),
        );
        assert!(!identity.trust_only_context().has_client_auth());
    }

    #[test]
    fn test_tls_context_debug() {
        let ctx = TlsContext::trust_only(RootCertStore::empty());
        let debug_str = format!("{:?}", ctx);
        assert!(debug_str.contains("TlsContext"));
        assert!(debug_str.contains("client_auth"));
    }

    #[test]
    fn test_parse_server_name_valid() {
        assert!(parse_server_name("localhost").is_ok());
        assert!(parse_server_name("dir.example.com").is_ok());
        assert!(parse_server_name("127.0.0.1").is_ok());
        assert!(parse_server_name("::1").is_ok());
    }

    #[test]
    fn test_parse_server_name_trailing_dot() {
        assert!(parse_server_name("example.com.").is_ok());
    }

    #[test]
    fn test_parse_server_name_invalid() {
        assert!(parse_server_name("").is_err());
        assert!(parse_server_name("bad host").is_err());
    }
}
