//! # Probe Result Record
//!
//! The uniform record produced once per run and handed to result reporters.
//! It is built in one place by the prober and never mutated afterwards.

use std::time::Duration;

use serde::Serialize;

use super::credential::Credential;
use super::endpoint::Endpoint;
use super::output::Output;

/// Run-level terminal outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeOutcome {
    /// A candidate was accepted and every requested command completed.
    Authenticated,
    /// Every candidate was tried and none was accepted. Not an error.
    AllCandidatesExhausted,
    /// The run ended on a network, timeout, execution or cancellation failure.
    ConnectionError,
}

/// How command execution over the authenticated session ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "status", content = "detail")]
pub enum ExecutionStatus {
    Completed,
    TimedOut,
    RuntimeError(String),
    Cancelled,
}

impl ExecutionStatus {
    pub fn is_completed(&self) -> bool {
        matches!(self, ExecutionStatus::Completed)
    }
}

/// One run's record. Built once when the run ends; read-only afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct ProbeResult {
    endpoint: Endpoint,
    /// The accepted candidate. Serialized as its identity only.
    credential_used: Option<Credential>,
    outcome: ProbeOutcome,
    output: Option<Output>,
    /// Present only when commands were run over an authenticated session.
    execution: Option<ExecutionStatus>,
    /// Number of connect attempts made during the run.
    attempts: usize,
    /// Human-readable cause when the outcome is [`ProbeOutcome::ConnectionError`].
    error: Option<String>,
    #[serde(serialize_with = "as_millis")]
    elapsed: Duration,
}

impl ProbeResult {
    /// Starts a record with no credential, output or error, zero attempts and
    /// zero elapsed time. The `with_*` methods fill in the rest.
    pub fn new(endpoint: Endpoint, outcome: ProbeOutcome) -> Self {
        Self {
            endpoint,
            credential_used: None,
            outcome,
            output: None,
            execution: None,
            attempts: 0,
            error: None,
            elapsed: Duration::ZERO,
        }
    }

    pub fn with_credential(mut self, credential: Credential) -> Self {
        self.credential_used = Some(credential);
        self
    }

    pub fn with_output(mut self, output: Output) -> Self {
        self.output = Some(output);
        self
    }

    pub fn with_execution(mut self, status: ExecutionStatus) -> Self {
        self.execution = Some(status);
        self
    }

    pub fn with_attempts(mut self, attempts: usize) -> Self {
        self.attempts = attempts;
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn with_elapsed(mut self, elapsed: Duration) -> Self {
        self.elapsed = elapsed;
        self
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn credential_used(&self) -> Option<&Credential> {
        self.credential_used.as_ref()
    }

    pub fn outcome(&self) -> ProbeOutcome {
        self.outcome
    }

    pub fn output(&self) -> Option<&Output> {
        self.output.as_ref()
    }

    pub fn execution(&self) -> Option<&ExecutionStatus> {
        self.execution.as_ref()
    }

    pub fn attempts(&self) -> usize {
        self.attempts
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn is_authenticated(&self) -> bool {
        self.outcome == ProbeOutcome::Authenticated
    }
}

fn as_millis<S: serde::Serializer>(elapsed: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
}
