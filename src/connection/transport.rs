//! Transport abstraction (TCP with optional TLS)

use super::tls::{parse_server_name, TlsContext};
use crate::{Error, Result};
use bytes::BytesMut;
use std::net::SocketAddr;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

/// Established byte stream to a directory server
#[allow(clippy::large_enum_variant)]
pub enum Transport {
    /// Plain TCP connection
    Plain(TcpStream),
    /// TLS-encrypted TCP connection
    Tls(tokio_rustls::client::TlsStream<TcpStream>),
}

impl std::fmt::Debug for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Transport::Plain(_) => f.write_str("Transport::Plain(TcpStream)"),
            Transport::Tls(_) => f.write_str("Transport::Tls(TlsStream)"),
        }
    }
}

impl Transport {
    /// Connect via plain TCP
    pub async fn connect_tcp(host: &str, port: u16) -> Result<Self> {
        let stream = TcpStream::connect((host, port)).await?;
        Ok(Transport::Plain(stream))
    }

    /// Connect via TLS-encrypted TCP
    pub async fn connect_tcp_tls(host: &str, port: u16, tls: &TlsContext) -> Result<Self> {
        let tcp_stream = TcpStream::connect((host, port)).await?;
        let server_name = parse_server_name(host)?;

        let tls_connector = tokio_rustls::TlsConnector::from(tls.client_config());
        let tls_stream = tls_connector
            .connect(server_name, tcp_stream)
            .await
            .map_err(|e| Error::Tls(format!("TLS handshake failed: {}", e)))?;

        Ok(Transport::Tls(tls_stream))
    }

    /// Whether the stream is encrypted
    pub fn is_tls(&self) -> bool {
        matches!(self, Transport::Tls(_))
    }

    /// Remote address
    pub fn peer_addr(&self) -> Result<SocketAddr> {
        let addr = match self {
            Transport::Plain(stream) => stream.peer_addr()?,
            Transport::Tls(stream) => stream.get_ref().0.peer_addr()?,
        };
        Ok(addr)
    }

    /// Write all bytes to the stream
    pub async fn write_all(&mut self, buf: &[u8]) -> Result<()> {
        match self {
            Transport::Plain(stream) => stream.write_all(buf).await?,
            Transport::Tls(stream) => stream.write_all(buf).await?,
        }
        Ok(())
    }

    /// Flush the stream
    pub async fn flush(&mut self) -> Result<()> {
        match self {
            Transport::Plain(stream) => stream.flush().await?,
            Transport::Tls(stream) => stream.flush().await?,
        }
        Ok(())
    }

    /// Read into buffer
    pub async fn read_buf(&mut self, buf: &mut BytesMut) -> Result<usize> {
        let n = match self {
            Transport::Plain(stream) => stream.read_buf(buf).await?,
            Transport::Tls(stream) => stream.read_buf(buf).await?,
        };
        Ok(n)
    }

    /// Shutdown the stream
    pub async fn shutdown(&mut self) -> Result<()> {
        match self {
            Transport::Plain(stream) => stream.shutdown().await?,
            Transport::Tls(stream) => stream.shutdown().await?,
        }
        Ok(())
    }
}
