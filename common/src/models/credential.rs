//! Identity/secret pairs presented to a transport adapter.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use secrecy::{ExposeSecret, Secret};
use serde::{Serialize, Serializer};

use crate::error::ProbeError;

/// One candidate identity.
///
/// The secret is wrapped in [`Secret`] so it stays out of `Debug` output and
/// logs. Serialization only ever emits the identity.
#[derive(Clone)]
pub struct Credential {
    identity: String,
    secret: Secret<String>,
}

impl Credential {
    pub fn new(identity: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            secret: Secret::new(secret.into()),
        }
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Hands the raw secret to a transport adapter.
    ///
    /// SECURITY: callers MUST NOT log the returned value.
    pub fn expose_secret(&self) -> &str {
        self.secret.expose_secret()
    }

    pub fn has_secret(&self) -> bool {
        !self.secret.expose_secret().is_empty()
    }
}

impl PartialEq for Credential {
    fn eq(&self, other: &Self) -> bool {
        self.identity == other.identity && self.expose_secret() == other.expose_secret()
    }
}

impl Eq for Credential {}

impl Hash for Credential {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identity.hash(state);
        self.expose_secret().hash(state);
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("identity", &self.identity)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

impl Serialize for Credential {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.identity)
    }
}

impl FromStr for Credential {
    type Err = ProbeError;

    /// Parses `identity:secret`, splitting at the first colon so secrets may
    /// contain colons themselves. A missing colon means an empty secret.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (identity, secret) = s.split_once(':').unwrap_or((s, ""));
        if identity.is_empty() {
            return Err(ProbeError::InvalidCredential {
                index: 0,
                reason: "identity is empty".to_string(),
            });
        }
        Ok(Credential::new(identity, secret))
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
