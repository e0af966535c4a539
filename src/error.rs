//! Error types

use std::io;
use thiserror::Error;

/// Main error type
#[derive(Debug, Error)]
pub enum Error {
    /// A mandatory configuration field is absent
    #[error("missing required configuration field '{0}'")]
    MissingField(&'static str),

    /// Invalid configuration or properties
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Socket factory lookup with nothing bound to the current scope.
    ///
    /// Indicates the open call ran without a prior registration.
    #[error("no socket factory bound to the current execution scope")]
    UnboundFactory,

    /// Failure reported by the underlying open call
    #[error("connection failed: {0}")]
    Connection(String),

    /// TLS handshake failure
    #[error("TLS error: {0}")]
    Tls(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Whether this error was raised while accepting configuration
    pub fn is_configuration_error(&self) -> bool {
        matches!(self, Error::MissingField(_) | Error::Config(_))
    }

    /// Whether this error came from reaching or negotiating with the server
    pub fn is_connection_error(&self) -> bool {
        matches!(self, Error::Connection(_) | Error::Tls(_) | Error::Io(_))
    }

    /// Stable, low-cardinality label for metrics
    pub fn category(&self) -> &'static str {
        match self {
            Error::MissingField(_) | Error::Config(_) => "config",
            Error::UnboundFactory => "unbound_factory",
            Error::Connection(_) => "connection",
            Error::Tls(_) => "tls",
            Error::Io(_) => "io",
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_field_names_the_field() {
        let err = Error::MissingField("url");
        assert!(err.to_string().contains("'url'"));
        assert!(err.is_configuration_error());
        assert!(!err.is_connection_error());
    }

    #[test]
    fn test_io_error_is_connection_error() {
        let err: Error = io::Error::new(io::ErrorKind::ConnectionRefused, "refused").into();
        assert!(err.is_connection_error());
        assert_eq!(err.category(), "io");
    }

    #[test]
    fn test_categories() {
        assert_eq!(Error::UnboundFactory.category(), "unbound_factory");
        assert_eq!(Error::Tls("bad cert".into()).category(), "tls");
        assert_eq!(Error::Config("x".into()).category(), "config");
        assert_eq!(Error::Connection("x".into()).category(), "connection");
    }
}
