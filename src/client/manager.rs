//! ConnectionManager implementation

use crate::config::ResolvedConfiguration;
use crate::connection::properties::keys;
use crate::connection::{
    build_authenticated_properties, build_caller_properties, registry, ConnectionOpener,
    ConnectionProperties, DispatchingSocketFactory, SocketFactoryType, TcpConnector, TlsContext,
    TlsContextSelector, TlsIdentity, TlsSocketFactory,
};
use crate::metrics::labels::{MODE_CALLER, MODE_SERVICE};
use crate::{Error, Result};
use arc_swap::ArcSwap;
use std::sync::Arc;
use std::time::Instant;
use tracing::Instrument;

/// Base service name; one manager runs per named LDAP connection beneath it
pub const SERVICE_NAME: &str = "server.controller.management.connection_manager";

/// Hands out directory connections for one configured LDAP connection.
///
/// Each call captures the active configuration once, so a concurrent
/// [`set_configuration`](Self::set_configuration) never affects a call in
/// progress.
pub struct ConnectionManager<O = TcpConnector> {
    name: String,
    configuration: ArcSwap<ResolvedConfiguration>,
    tls: TlsContextSelector,
    opener: O,
}

impl ConnectionManager<TcpConnector> {
    /// Create a manager using the default TCP opener
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # async fn example() -> ldap_connect::Result<()> {
    /// use ldap_connect::{ConnectionManager, ResolvedConfiguration};
    ///
    /// let config = ResolvedConfiguration::new("ldap://localhost:389", "SimpleFactory");
    /// let manager = ConnectionManager::new("corp-ldap", config)?;
    ///
    /// // Bind as the configured search identity
    /// let conn = manager.get_connection().await?;
    ///
    /// // Bind as a user, e.g. to verify a password
    /// let user_conn = manager.get_connection_as("uid=jdoe,ou=people", "pw").await?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(name: impl Into<String>, configuration: ResolvedConfiguration) -> Result<Self> {
        Self::with_opener(name, configuration, TcpConnector::new())
    }
}

impl<O: ConnectionOpener> ConnectionManager<O> {
    /// Create a manager with a custom opener.
    ///
    /// # Errors
    ///
    /// Returns `Error::MissingField` if the configuration lacks a mandatory field.
    pub fn with_opener(
        name: impl Into<String>,
        configuration: ResolvedConfiguration,
        opener: O,
    ) -> Result<Self> {
        validate(&configuration)?;
        Ok(Self {
            name: name.into(),
            configuration: ArcSwap::from_pointee(configuration),
            tls: TlsContextSelector::new(),
            opener,
        })
    }

    /// Connection name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fully qualified service name of this manager
    pub fn service_name(&self) -> String {
        format!("{}.{}", SERVICE_NAME, self.name)
    }

    /// The opener used for every call
    pub fn opener(&self) -> &O {
        &self.opener
    }

    /// Snapshot of the active configuration
    pub fn configuration(&self) -> Arc<ResolvedConfiguration> {
        self.configuration.load_full()
    }

    /// Replace the active configuration.
    ///
    /// Calls already in progress keep the configuration they started with.
    ///
    /// # Errors
    ///
    /// Returns `Error::MissingField` naming the absent field; the previous
    /// configuration stays active.
    pub fn set_configuration(&self, configuration: ResolvedConfiguration) -> Result<()> {
        validate(&configuration)?;
        self.configuration.store(Arc::new(configuration));
        tracing::debug!(connection = %self.name, "configuration replaced");
        Ok(())
    }

    /// Inject the server's TLS identity.
    ///
    /// Without one, connections are opened without TLS.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if an identity was already injected.
    pub fn inject_tls_identity(&self, identity: Arc<dyn TlsIdentity>) -> Result<()> {
        self.tls.inject(identity)
    }

    /// Whether a TLS identity is present
    pub fn has_tls_identity(&self) -> bool {
        self.tls.has_identity()
    }

    /// Lifecycle hook; all setup happens at construction and injection
    pub async fn start(&self) -> Result<()> {
        tracing::debug!(service = %self.service_name(), "started");
        Ok(())
    }

    /// Lifecycle hook; connections belong to their callers and are not tracked
    pub async fn stop(&self) {
        tracing::debug!(service = %self.service_name(), "stopped");
    }

    /// Open a connection bound as the configured search identity.
    ///
    /// With a TLS identity present the full context is used, so the client
    /// certificate may authenticate in place of (or alongside) the search
    /// credential.
    pub async fn get_connection(&self) -> Result<O::Connection> {
        let configuration = self.configuration();
        let properties = build_authenticated_properties(&configuration)?;
        let tls = self.tls.select(false);
        self.open_with_tls(properties, tls, MODE_SERVICE).await
    }

    /// Open a connection bound as `principal` with `credential`.
    ///
    /// The configured search identity is ignored. With a TLS identity present
    /// only the trust-only context is used: the caller's credentials
    /// authenticate, never the server's client certificate.
    pub async fn get_connection_as(
        &self,
        principal: &str,
        credential: &str,
    ) -> Result<O::Connection> {
        let configuration = self.configuration();
        let properties = build_caller_properties(&configuration, principal, credential)?;
        let tls = self.tls.select(true);
        self.open_with_tls(properties, tls, MODE_CALLER).await
    }

    async fn open_with_tls(
        &self,
        mut properties: ConnectionProperties,
        tls: Option<TlsContext>,
        mode: &'static str,
    ) -> Result<O::Connection> {
        let span = tracing::info_span!(
            "ldap_connect",
            connection = %self.name,
            mode,
            tls = tls.is_some()
        );

        async move {
            let start = Instant::now();
            crate::metrics::counters::connect_attempted(mode, tls.is_some());

            let result = match tls {
                Some(context) => {
                    registry::with_task_scope(async move {
                        // Released when this scope ends, however the open ends
                        let _binding =
                            registry::register(Arc::new(TlsSocketFactory::new(context)));
                        properties.insert(
                            keys::SOCKET_FACTORY,
                            DispatchingSocketFactory::TYPE_NAME,
                        );
                        self.opener.open(properties).await
                    })
                    .await
                }
                None => self.opener.open(properties).await,
            };

            crate::metrics::histograms::connect_duration(
                mode,
                start.elapsed().as_millis() as u64,
            );
            match &result {
                Ok(_) => tracing::debug!("connection opened"),
                Err(e) => crate::metrics::counters::connect_failed(mode, e.category()),
            }
            result
        }
        .instrument(span)
        .await
    }
}

impl<O> std::fmt::Debug for ConnectionManager<O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("name", &self.name)
            .field("tls", &self.tls)
            .finish_non_exhaustive()
    }
}

fn validate(configuration: &ResolvedConfiguration) -> Result<()> {
    configuration.validate().map_err(|e| {
        if let Error::MissingField(field) = &e {
            crate::metrics::counters::config_rejected(*field);
        }
        e
    })
}
