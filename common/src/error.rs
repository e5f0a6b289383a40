//! Error taxonomy for probing runs.
//!
//! Two families live here:
//! * [`ProbeError`]: malformed input, detected before any network IO happens.
//! * [`TransportError`]: failures reported by a transport adapter during a run.
//!
//! Transport errors never cross the probe strategy boundary as `Err` values.
//! They are folded into the run's [`crate::ProbeResult`] instead.
//!
//! SECURITY: messages MUST NOT contain secrets.

use std::time::Duration;

use crate::models::endpoint::Protocol;

/// Input validation failures. Raised while building targets, never mid-run.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProbeError {
    #[error("invalid credential at position {index}: {reason}")]
    InvalidCredential { index: usize, reason: String },

    #[error("credential set was built for {expected} but endpoint speaks {found}")]
    ProtocolMismatch { expected: Protocol, found: Protocol },

    #[error("a command batch needs at least one command")]
    EmptyCommandBatch,

    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),
}

/// How a transport failure should be treated by the probe strategy.
///
/// Adapters classify their own errors; the engine never inspects message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The remote side refused the credential.
    Authentication,
    /// The endpoint could not be reached, refused the connection, or timed out.
    Network,
    /// A command could not be submitted or its stream broke.
    Execution,
}

/// Failures produced by transport adapters and their sessions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("authentication rejected: {0}")]
    AuthRejected(String),

    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("execution failed: {0}")]
    Execution(String),
}

impl TransportError {
    pub fn kind(&self) -> FailureKind {
        match self {
            TransportError::AuthRejected(_) => FailureKind::Authentication,
            TransportError::NetworkUnreachable(_) | TransportError::Timeout(_) => {
                FailureKind::Network
            }
            TransportError::Execution(_) => FailureKind::Execution,
        }
    }

    pub fn is_network(&self) -> bool {
        self.kind() == FailureKind::Network
    }
}

/// Errors raised while loading [`crate::ProbeConfig`] from the environment.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{key} must be a whole number of seconds, got '{value}'")]
    InvalidSeconds { key: String, value: String },

    #[error("{key} has unknown value '{value}' (expected one of: {expected})")]
    UnknownValue {
        key: String,
        value: String,
        expected: &'static str,
    },
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
