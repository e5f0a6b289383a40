//! # Endpoint Model
//!
//! Identifies one reachable network target and the protocol spoken there.
//!
//! Endpoints can be parsed from inventory strings:
//! * **Full**: `shell://10.0.0.5:2222`, `db://db.internal:5433`.
//! * **Default port**: `shell://10.0.0.5` (uses [`Protocol::default_port`]).
//! * **IPv6**: `shell://[fe80::1]:22`.
//! * **Lists**: comma-separated, see [`parse_endpoints`].

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::ProbeError;

/// Wire protocol family a transport adapter speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Protocol {
    /// Interactive remote shell service.
    RemoteShell,
    /// Database wire protocol session.
    DatabaseWire,
}

impl Protocol {
    pub fn default_port(self) -> u16 {
        match self {
            Protocol::RemoteShell => 22,
            Protocol::DatabaseWire => 5432,
        }
    }

    /// Separator used when a batch is submitted as one joined invocation.
    pub fn command_separator(self) -> &'static str {
        match self {
            Protocol::RemoteShell => " && ",
            Protocol::DatabaseWire => "; ",
        }
    }

    /// Whether a credential for this protocol must carry a non-empty secret.
    ///
    /// Database servers routinely accept password-less accounts, shells do not.
    pub fn requires_secret(self) -> bool {
        match self {
            Protocol::RemoteShell => true,
            Protocol::DatabaseWire => false,
        }
    }

    fn scheme(self) -> &'static str {
        match self {
            Protocol::RemoteShell => "shell",
            Protocol::DatabaseWire => "db",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.scheme())
    }
}

impl FromStr for Protocol {
    type Err = ProbeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "shell" | "ssh" | "remote-shell" => Ok(Protocol::RemoteShell),
            "db" | "database" | "database-wire" => Ok(Protocol::DatabaseWire),
            other => Err(ProbeError::InvalidEndpoint(format!(
                "unknown protocol '{other}'"
            ))),
        }
    }
}

/// A network target: host, port and protocol. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Endpoint {
    host: String,
    port: u16,
    protocol: Protocol,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16, protocol: Protocol) -> Self {
        Self {
            host: host.into(),
            port,
            protocol,
        }
    }

    /// Builds an endpoint on the protocol's well-known port.
    pub fn with_default_port(host: impl Into<String>, protocol: Protocol) -> Self {
        Self::new(host, protocol.default_port(), protocol)
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn protocol(&self) -> Protocol {
        self.protocol
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "{}://[{}]:{}", self.protocol, self.host, self.port)
        } else {
            write!(f, "{}://{}:{}", self.protocol, self.host, self.port)
        }
    }
}

impl FromStr for Endpoint {
    type Err = ProbeError;

    /// Parses `scheme://host[:port]`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let Some((scheme, rest)) = s.split_once("://") else {
            return Err(ProbeError::InvalidEndpoint(format!(
                "'{s}' is missing a scheme (expected e.g. shell://host:22)"
            )));
        };

        let protocol: Protocol = scheme.parse()?;
        let (host, port) = parse_host_port(rest, s)?;
        let port: u16 = port.unwrap_or_else(|| protocol.default_port());

        Ok(Endpoint::new(host, port, protocol))
    }
}

/// Parses a comma-separated list of endpoints (e.g. `"shell://a, db://b:5433"`).
///
/// Blank entries are skipped. The first malformed entry fails the whole list.
pub fn parse_endpoints(s: &str) -> Result<Vec<Endpoint>, ProbeError> {
    s.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(Endpoint::from_str)
        .collect()
}

/// Splits `host[:port]`, accepting bracketed IPv6 hosts.
fn parse_host_port(rest: &str, original: &str) -> Result<(String, Option<u16>), ProbeError> {
    if let Some(bracketed) = rest.strip_prefix('[') {
        let Some((host, tail)) = bracketed.split_once(']') else {
            return Err(ProbeError::InvalidEndpoint(format!(
                "unclosed '[' in '{original}'"
            )));
        };
        let port: Option<u16> = match tail {
            "" => None,
            _ => match tail.strip_prefix(':') {
                Some(port_str) => Some(parse_port(port_str, original)?),
                None => {
                    return Err(ProbeError::InvalidEndpoint(format!(
                        "unexpected '{tail}' after host in '{original}'"
                    )));
                }
            },
        };
        return non_empty_host(host, original).map(|host| (host, port));
    }

    // A bare IPv6 address has several colons and no port.
    match rest.matches(':').count() {
        0 => non_empty_host(rest, original).map(|host| (host, None)),
        1 => {
            let (host, port_str) = rest.split_once(':').unwrap_or((rest, ""));
            let port: u16 = parse_port(port_str, original)?;
            non_empty_host(host, original).map(|host| (host, Some(port)))
        }
        _ => non_empty_host(rest, original).map(|host| (host, None)),
    }
}

fn parse_port(port_str: &str, original: &str) -> Result<u16, ProbeError> {
    match port_str.parse::<u16>() {
        Ok(0) | Err(_) => Err(ProbeError::InvalidEndpoint(format!(
            "invalid port '{port_str}' in '{original}'"
        ))),
        Ok(port) => Ok(port),
    }
}

fn non_empty_host(host: &str, original: &str) -> Result<String, ProbeError> {
    if host.is_empty() {
        return Err(ProbeError::InvalidEndpoint(format!(
            "missing host in '{original}'"
        )));
    }
    Ok(host.to_string())
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
