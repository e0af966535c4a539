//! LDAP endpoint URL parsing
//!
//! Supports formats:
//! * ldap://host[:port][/base-dn]
//! * ldaps://host[:port][/base-dn]
//! * ldap://[ipv6-address][:port]
//!
//! A provider URL may list several of these separated by spaces; they are
//! tried in order.

use crate::{Error, Result};

/// Default port for `ldap://`
pub const DEFAULT_LDAP_PORT: u16 = 389;
/// Default port for `ldaps://`
pub const DEFAULT_LDAPS_PORT: u16 = 636;

/// URL scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    /// Plain LDAP (TLS only if a socket factory provides it)
    Ldap,
    /// LDAP over TLS from connection start
    Ldaps,
}

impl Scheme {
    /// Port used when the URL names none
    pub fn default_port(&self) -> u16 {
        match self {
            Scheme::Ldap => DEFAULT_LDAP_PORT,
            Scheme::Ldaps => DEFAULT_LDAPS_PORT,
        }
    }
}

impl std::fmt::Display for Scheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Scheme::Ldap => write!(f, "ldap"),
            Scheme::Ldaps => write!(f, "ldaps"),
        }
    }
}

/// Parsed endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// URL scheme
    pub scheme: Scheme,
    /// Host name or address (IPv6 without brackets)
    pub host: String,
    /// TCP port
    pub port: u16,
}

impl Endpoint {
    /// Parse an endpoint URL
    pub fn parse(url: &str) -> Result<Self> {
        let (scheme, rest) = if let Some(rest) = url.strip_prefix("ldaps://") {
            (Scheme::Ldaps, rest)
        } else if let Some(rest) = url.strip_prefix("ldap://") {
            (Scheme::Ldap, rest)
        } else {
            return Err(Error::Config(format!(
                "endpoint URL must start with ldap:// or ldaps://: '{}'",
                url
            )));
        };

        // Base DN and query parts are not part of the transport address
        let host_port = rest.split(['/', '?']).next().unwrap_or_default();

        let (host, port_str) = if let Some(bracketed) = host_port.strip_prefix('[') {
            let end = bracketed.find(']').ok_or_else(|| {
                Error::Config(format!("unterminated IPv6 address in '{}'", url))
            })?;
            let host = &bracketed[..end];
            let after = &bracketed[end + 1..];
            let port = match after.strip_prefix(':') {
                Some(port) => Some(port),
                None if after.is_empty() => None,
                None => {
                    return Err(Error::Config(format!(
                        "unexpected characters after IPv6 address in '{}'",
                        url
                    )))
                }
            };
            (host, port)
        } else if let Some((host, port)) = host_port.rsplit_once(':') {
            (host, Some(port))
        } else {
            (host_port, None)
        };

        if host.is_empty() {
            return Err(Error::Config(format!("endpoint URL has no host: '{}'", url)));
        }

        let port = match port_str {
            Some(p) => p
                .parse::<u16>()
                .ok()
                .filter(|p| *p != 0)
                .ok_or_else(|| Error::Config(format!("invalid port '{}' in '{}'", p, url)))?,
            None => scheme.default_port(),
        };

        Ok(Self {
            scheme,
            host: host.to_string(),
            port,
        })
    }
}

impl Endpoint {
    /// Parse a space-separated list of endpoint URLs, keeping their order
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the list is empty or any entry is invalid.
    pub fn parse_list(urls: &str) -> Result<Vec<Self>> {
        let endpoints = urls
            .split_whitespace()
            .map(Self::parse)
            .collect::<Result<Vec<_>>>()?;
        if endpoints.is_empty() {
            return Err(Error::Config("endpoint URL is empty".into()));
        }
        Ok(endpoints)
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.host.contains(':') {
            write!(f, "{}://[{}]:{}", self.scheme, self.host, self.port)
        } else {
            write!(f, "{}://{}:{}", self.scheme, self.host, self.port)
        }
    }
}
