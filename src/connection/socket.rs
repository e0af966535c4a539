//! Socket factories
//!
//! Openers create sockets through a [`SocketFactory`]. They only know factory
//! *types*, by name; [`SocketFactoryType`] is the static side of that contract.

use super::registry;
use super::tls::TlsContext;
use super::transport::Transport;
use crate::Result;
use futures::future::BoxFuture;
use std::sync::Arc;

/// Creates connected transports
pub trait SocketFactory: Send + Sync + std::fmt::Debug {
    /// Connect to `host:port`
    fn connect<'a>(&'a self, host: &'a str, port: u16) -> BoxFuture<'a, Result<Transport>>;
}

/// A socket factory type an opener can instantiate from its name alone
pub trait SocketFactoryType: SocketFactory + Sized + 'static {
    /// Name used in the `ldap.factory.socket` property
    const TYPE_NAME: &'static str;

    /// Instantiate the factory for the current call
    fn create() -> Result<Self>;
}

/// Plain TCP sockets
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainSocketFactory;

impl SocketFactory for PlainSocketFactory {
    fn connect<'a>(&'a self, host: &'a str, port: u16) -> BoxFuture<'a, Result<Transport>> {
        Box::pin(Transport::connect_tcp(host, port))
    }
}

impl SocketFactoryType for PlainSocketFactory {
    const TYPE_NAME: &'static str = "ldap_connect::PlainSocketFactory";

    fn create() -> Result<Self> {
        Ok(PlainSocketFactory)
    }
}

/// TLS sockets for one [`TlsContext`]
#[derive(Debug, Clone)]
pub struct TlsSocketFactory {
    context: TlsContext,
}

impl TlsSocketFactory {
    /// Create a factory using `context` for every handshake
    pub fn new(context: TlsContext) -> Self {
        Self { context }
    }

    /// TLS context used for handshakes
    pub fn context(&self) -> &TlsContext {
        &self.context
    }
}

impl SocketFactory for TlsSocketFactory {
    fn connect<'a>(&'a self, host: &'a str, port: u16) -> BoxFuture<'a, Result<Transport>> {
        Box::pin(Transport::connect_tcp_tls(host, port, &self.context))
    }
}

/// Delegates to the factory bound to the current scope.
///
/// This is the one type the connection manager names in the properties of a
/// TLS open. The delegate is resolved when the opener creates the instance.
#[derive(Debug, Clone)]
pub struct DispatchingSocketFactory {
    delegate: Arc<dyn SocketFactory>,
}

impl DispatchingSocketFactory {
    /// Factory the current call bound
    pub fn delegate(&self) -> &Arc<dyn SocketFactory> {
        &self.delegate
    }
}

impl SocketFactory for DispatchingSocketFactory {
    fn connect<'a>(&'a self, host: &'a str, port: u16) -> BoxFuture<'a, Result<Transport>> {
        self.delegate.connect(host, port)
    }
}

impl SocketFactoryType for DispatchingSocketFactory {
    const TYPE_NAME: &'static str = "ldap_connect::DispatchingSocketFactory";

    /// # Errors
    ///
    /// Returns `Error::UnboundFactory` if the current scope has no binding.
    fn create() -> Result<Self> {
        let delegate = registry::lookup()?;
        Ok(Self { delegate })
    }
}
