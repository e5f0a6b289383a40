//! # Sesame Common
//!
//! Shared vocabulary of the session-probing engine: the data model, the error
//! taxonomy, run configuration, and the logging macros used across the workspace.
//!
//! This crate performs no IO. Everything that talks to the network lives behind
//! the transport traits in `sesame-core`.

pub mod config;
pub mod error;
pub mod macros;
pub mod models;

#[doc(hidden)]
pub use tracing as __tracing;

pub use config::{NetworkFailurePolicy, ProbeConfig, SubmissionMode};
pub use error::{ConfigError, FailureKind, ProbeError, TransportError};
pub use models::credential::Credential;
pub use models::endpoint::{Endpoint, Protocol};
pub use models::output::Output;
pub use models::result::{ExecutionStatus, ProbeOutcome, ProbeResult};
pub use models::state::RunState;
