//! Opening directory connections from a property set

use super::properties::{keys, ConnectionProperties};
use super::socket::{DispatchingSocketFactory, PlainSocketFactory, SocketFactory, SocketFactoryType};
use super::transport::Transport;
use crate::config::{Endpoint, Scheme};
use crate::{Error, Result};
use bytes::BytesMut;
use futures::future::BoxFuture;
use std::collections::HashMap;
use std::sync::Arc;

/// The connection-open primitive.
///
/// Implementations must drive the returned future on the calling task: the
/// dispatching socket factory resolves its delegate from the caller's scope,
/// so spawning the open onto another task loses the binding.
pub trait ConnectionOpener: Send + Sync {
    /// Connection handle returned on success
    type Connection: Send;

    /// Open one connection. Failures are returned as-is to the caller.
    fn open(&self, properties: ConnectionProperties) -> BoxFuture<'_, Result<Self::Connection>>;
}

type FactoryConstructor = fn() -> Result<Arc<dyn SocketFactory>>;

fn instantiate<F: SocketFactoryType>() -> Result<Arc<dyn SocketFactory>> {
    Ok(Arc::new(F::create()?))
}

/// Default opener: establishes the TCP or TLS transport to the endpoint.
///
/// The socket factory is chosen by the type name in `ldap.factory.socket`
/// from a table of known types. Binding and the directory protocol itself are
/// left to the holder of the returned [`DirectoryConnection`].
pub struct TcpConnector {
    factory_types: HashMap<&'static str, FactoryConstructor>,
}

impl TcpConnector {
    /// Create a connector that knows the built-in factory types
    pub fn new() -> Self {
        let mut connector = Self {
            factory_types: HashMap::new(),
        };
        connector.register_factory_type::<DispatchingSocketFactory>();
        connector.register_factory_type::<PlainSocketFactory>();
        connector
    }

    /// Make a factory type selectable by name
    pub fn register_factory_type<F: SocketFactoryType>(&mut self) {
        self.factory_types.insert(F::TYPE_NAME, instantiate::<F>);
    }

    /// Whether `name` is a known factory type
    pub fn knows_factory_type(&self, name: &str) -> bool {
        self.factory_types.contains_key(name)
    }

    fn socket_factory(
        &self,
        properties: &ConnectionProperties,
    ) -> Result<Option<Arc<dyn SocketFactory>>> {
        let Some(name) = properties.socket_factory() else {
            return Ok(None);
        };
        let construct = self
            .factory_types
            .get(name)
            .ok_or_else(|| Error::Config(format!("unknown socket factory type '{}'", name)))?;
        construct().map(Some)
    }

    async fn connect(&self, properties: ConnectionProperties) -> Result<DirectoryConnection> {
        let url = properties.provider_url().ok_or_else(|| {
            Error::Config(format!("missing connection property '{}'", keys::PROVIDER_URL))
        })?;
        let endpoints = Endpoint::parse_list(url)?;

        // Instantiated before connecting, while the caller's binding is in place
        let factory = self.socket_factory(&properties)?;

        let mut last_error = None;
        for endpoint in endpoints {
            match self.connect_endpoint(factory.as_deref(), &endpoint).await {
                Ok(transport) => {
                    tracing::debug!(
                        endpoint = %endpoint,
                        tls = transport.is_tls(),
                        "transport established"
                    );
                    return Ok(DirectoryConnection {
                        endpoint,
                        transport,
                        principal: properties.principal().map(str::to_string),
                    });
                }
                Err(e) if e.is_connection_error() => {
                    tracing::debug!(endpoint = %endpoint, error = %e, "endpoint unreachable");
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }
        Err(last_error.unwrap_or_else(|| Error::Config("endpoint URL is empty".into())))
    }

    async fn connect_endpoint(
        &self,
        factory: Option<&dyn SocketFactory>,
        endpoint: &Endpoint,
    ) -> Result<Transport> {
        match factory {
            Some(factory) => factory.connect(&endpoint.host, endpoint.port).await,
            None if endpoint.scheme == Scheme::Ldaps => Err(Error::Config(format!(
                "{} requires a TLS socket factory",
                endpoint
            ))),
            None => Transport::connect_tcp(&endpoint.host, endpoint.port).await,
        }
    }
}

impl Default for TcpConnector {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TcpConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut types: Vec<_> = self.factory_types.keys().collect();
        types.sort();
        f.debug_struct("TcpConnector")
            .field("factory_types", &types)
            .finish()
    }
}

impl ConnectionOpener for TcpConnector {
    type Connection = DirectoryConnection;

    fn open(&self, properties: ConnectionProperties) -> BoxFuture<'_, Result<DirectoryConnection>> {
        Box::pin(self.connect(properties))
    }
}

/// Open connection to a directory server.
///
/// Using and closing it is up to the caller.
#[derive(Debug)]
pub struct DirectoryConnection {
    endpoint: Endpoint,
    transport: Transport,
    principal: Option<String>,
}

impl DirectoryConnection {
    /// Endpoint connected to
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Principal the connection is to bind as
    pub fn principal(&self) -> Option<&str> {
        self.principal.as_deref()
    }

    /// Whether the transport is encrypted
    pub fn is_tls(&self) -> bool {
        self.transport.is_tls()
    }

    /// Underlying transport
    pub fn transport_mut(&mut self) -> &mut Transport {
        &mut self.transport
    }

    /// Write an encoded request and flush it
    pub async fn send(&mut self, request: &[u8]) -> Result<()> {
        self.transport.write_all(request).await?;
        self.transport.flush().await
    }

    /// Read whatever the server sent next into `buf`; 0 means the peer closed
    pub async fn read_buf(&mut self, buf: &mut BytesMut) -> Result<usize> {
        self.transport.read_buf(buf).await
    }

    /// Close the connection
    pub async fn close(mut self) -> Result<()> {
        self.transport.shutdown().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::registry;
    use tokio::net::TcpListener;

    fn properties(url: &str) -> ConnectionProperties {
        let mut props = ConnectionProperties::new();
        props.insert(keys::PROVIDER_URL, url);
        props.insert(keys::INITIAL_CONTEXT_FACTORY, "SimpleFactory");
        props
    }

    #[test]
    fn test_knows_builtin_factory_types() {
        let connector = TcpConnector::new();
        assert!(connector.knows_factory_type(DispatchingSocketFactory::TYPE_NAME));
        assert!(connector.knows_factory_type(PlainSocketFactory::TYPE_NAME));
        assert!(!connector.knows_factory_type("com.example.Other"));
    }

    #[tokio::test]
    async fn test_open_plain() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let accept = tokio::spawn(async move { listener.accept().await.map(|_| ()) });

        let mut props = properties(&format!("ldap://127.0.0.1:{}", port));
        props.insert(keys::SECURITY_PRINCIPAL, "cn=admin");
        let conn = TcpConnector::new().open(props).await.unwrap();

        assert!(!conn.is_tls());
        assert_eq!(conn.endpoint().port, port);
        assert_eq!(conn.principal(), Some("cn=admin"));
        accept.await.unwrap().unwrap();
        conn.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_open_falls_back_to_next_endpoint() {
        let refused = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let refused_port = refused.local_addr().unwrap().port();
        drop(refused);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let accept = tokio::spawn(async move { listener.accept().await.map(|_| ()) });

        let url = format!("ldap://127.0.0.1:{} ldap://127.0.0.1:{}", refused_port, port);
        let conn = TcpConnector::new().open(properties(&url)).await.unwrap();

        assert_eq!(conn.endpoint().port, port);
        accept.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_open_returns_last_error_when_all_endpoints_fail() {
        let refused = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = refused.local_addr().unwrap().port();
        drop(refused);

        let url = format!("ldap://127.0.0.1:{} ldap://127.0.0.1:{}", port, port);
        let result = TcpConnector::new().open(properties(&url)).await;
        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[tokio::test]
    async fn test_open_missing_url() {
        let result = TcpConnector::new().open(ConnectionProperties::new()).await;
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[tokio::test]
    async fn test_open_unknown_factory_type() {
        let mut props = properties("ldap://127.0.0.1:389");
        props.insert(keys::SOCKET_FACTORY, "com.example.Other");
        let result = TcpConnector::new().open(props).await;
        match result {
            Err(Error::Config(msg)) => assert!(msg.contains("com.example.Other")),
            other => panic!("expected Config error, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_open_dispatching_without_binding() {
        let mut props = properties("ldap://127.0.0.1:389");
        props.insert(keys::SOCKET_FACTORY, DispatchingSocketFactory::TYPE_NAME);
        let result = registry::with_task_scope(TcpConnector::new().open(props)).await;
        assert!(matches!(result, Err(Error::UnboundFactory)));
    }

    #[tokio::test]
    async fn test_open_ldaps_without_factory() {
        let result = TcpConnector::new()
            .open(properties("ldaps://127.0.0.1:636"))
            .await;
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_connector_debug_lists_types() {
        let debug_str = format!("{:?}", TcpConnector::new());
        assert!(debug_str.contains(DispatchingSocketFactory::TYPE_NAME));
    }
}
