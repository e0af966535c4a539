//! Connection establishment
//!
//! This module handles:
//! * Property sets handed to the connection opener
//! * TLS context selection from the server's TLS identity
//! * Socket factories and the scope-keyed factory registry
//! * Transport setup (TCP, optionally TLS)

mod opener;
pub mod properties;
pub mod registry;
mod socket;
mod tls;
mod transport;

pub use opener::{ConnectionOpener, DirectoryConnection, TcpConnector};
pub use properties::{
    build_authenticated_properties, build_base_properties, build_caller_properties,
    ConnectionProperties,
};
pub use registry::{FactoryBinding, ScopeKey};
pub use socket::{
    DispatchingSocketFactory, PlainSocketFactory, SocketFactory, SocketFactoryType,
    TlsSocketFactory,
};
pub use tls::{parse_server_name, StaticTlsIdentity, TlsContext, TlsContextSelector, TlsIdentity};
pub use transport::Transport;
