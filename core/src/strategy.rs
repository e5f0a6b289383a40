//! # Probe Strategy
//!
//! Finds the first candidate of a [`CredentialSet`] that authenticates against an
//! [`Endpoint`].
//!
//! Candidates are tried strictly one at a time, in set order. Concurrent attempts
//! against one endpoint invite rate limiting and account lockout, so there is no
//! parallel mode. The first accepted candidate wins and the remaining ones are
//! never tried.
//!
//! Failure handling per attempt:
//! * **Rejected credential**: traced at debug level, next candidate.
//! * **Network failure** (unreachable, refused, connect timeout): decided by
//!   [`NetworkFailurePolicy`], either skip to the next candidate or abort the run.
//!
//! Per-candidate errors never escape this module as `Err` values.

use std::time::Duration;

use sesame_common::{
    Credential, Endpoint, FailureKind, NetworkFailurePolicy, ProbeConfig, RunState,
    TransportError, debug, success, warn,
};
use tokio_util::sync::CancellationToken;

use crate::credentials::CredentialSet;
use crate::tracker::RunTracker;
use crate::transport::{TransportAdapter, close_within};

/// What happened to one connect attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptVerdict {
    Accepted,
    Rejected,
    /// Network-level failure, including connect timeouts.
    NetworkFailure(String),
    /// The run was cancelled while this attempt was in flight.
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempt {
    /// Position of the candidate in its set.
    pub index: usize,
    pub identity: String,
    pub verdict: AttemptVerdict,
}

/// Terminal result of a strategy run. Owns the session on success.
#[derive(Debug)]
pub enum StrategyOutcome<S> {
    Authenticated { credential: Credential, session: S },
    Exhausted,
    /// A network failure under [`NetworkFailurePolicy::AbortRun`].
    Aborted(TransportError),
    Cancelled,
}

#[derive(Debug)]
pub struct StrategyReport<S> {
    pub outcome: StrategyOutcome<S>,
    /// Every connect attempt made, in order.
    pub attempts: Vec<Attempt>,
}

#[derive(Debug, Clone)]
pub struct ProbeStrategy {
    connect_timeout: Duration,
    close_timeout: Duration,
    policy: NetworkFailurePolicy,
}

impl ProbeStrategy {
    pub fn new(connect_timeout: Duration, policy: NetworkFailurePolicy) -> Self {
        Self {
            connect_timeout,
            close_timeout: ProbeConfig::default().close_timeout,
            policy,
        }
    }

    pub fn from_config(cfg: &ProbeConfig) -> Self {
        Self {
            connect_timeout: cfg.connect_timeout,
            close_timeout: cfg.close_timeout,
            policy: cfg.network_failure_policy,
        }
    }

    /// Tries each candidate in order until one authenticates.
    ///
    /// An empty set ends immediately as [`StrategyOutcome::Exhausted`] with
    /// zero attempts.
    pub async fn find_first<T>(
        &self,
        transport: &T,
        endpoint: &Endpoint,
        credentials: &CredentialSet,
        cancel: &CancellationToken,
        tracker: &mut RunTracker,
    ) -> StrategyReport<T::Session>
    where
        T: TransportAdapter,
    {
        let mut attempts: Vec<Attempt> = Vec::with_capacity(credentials.len());

        if cancel.is_cancelled() {
            tracker.advance(RunState::ConnectionError);
            return StrategyReport {
                outcome: StrategyOutcome::Cancelled,
                attempts,
            };
        }

        for (index, credential) in credentials.cursor().enumerate() {
            tracker.advance(RunState::Connecting(index));

            let connect = tokio::time::timeout(
                self.connect_timeout,
                transport.connect(endpoint, credential, self.connect_timeout),
            );

            let result: Result<T::Session, TransportError> = tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    attempts.push(attempt(index, credential, AttemptVerdict::Cancelled));
                    tracker.advance(RunState::ConnectionError);
                    return StrategyReport {
                        outcome: StrategyOutcome::Cancelled,
                        attempts,
                    };
                }

                connected = connect => {
                    connected.unwrap_or(Err(TransportError::Timeout(self.connect_timeout)))
                }
            };

            match result {
                Ok(mut session) => {
                    // The adapter may have finished just as the run was cancelled.
                    if cancel.is_cancelled() {
                        close_within(&mut session, self.close_timeout).await;
                        attempts.push(attempt(index, credential, AttemptVerdict::Cancelled));
                        tracker.advance(RunState::ConnectionError);
                        return StrategyReport {
                            outcome: StrategyOutcome::Cancelled,
                            attempts,
                        };
                    }

                    success!(
                        endpoint = %endpoint,
                        identity = credential.identity(),
                        attempt = index + 1,
                        "authenticated"
                    );
                    attempts.push(attempt(index, credential, AttemptVerdict::Accepted));
                    tracker.advance(RunState::Authenticated);
                    return StrategyReport {
                        outcome: StrategyOutcome::Authenticated {
                            credential: credential.clone(),
                            session,
                        },
                        attempts,
                    };
                }

                Err(err) if err.kind() == FailureKind::Authentication => {
                    debug!(
                        endpoint = %endpoint,
                        identity = credential.identity(),
                        attempt = index + 1,
                        error = %err,
                        "credential rejected"
                    );
                    attempts.push(attempt(index, credential, AttemptVerdict::Rejected));
                }

                // Anything that is not a rejection points at the infrastructure.
                Err(err) => {
                    attempts.push(attempt(
                        index,
                        credential,
                        AttemptVerdict::NetworkFailure(err.to_string()),
                    ));

                    match self.policy {
                        NetworkFailurePolicy::SkipCandidate => {
                            warn!(
                                endpoint = %endpoint,
                                identity = credential.identity(),
                                attempt = index + 1,
                                error = %err,
                                "connect failed, skipping candidate"
                            );
                        }
                        NetworkFailurePolicy::AbortRun => {
                            warn!(
                                endpoint = %endpoint,
                                attempt = index + 1,
                                error = %err,
                                "connect failed, aborting run"
                            );
                            tracker.advance(RunState::ConnectionError);
                            return StrategyReport {
                                outcome: StrategyOutcome::Aborted(err),
                                attempts,
                            };
                        }
                    }
                }
            }
        }

        debug!(
            endpoint = %endpoint,
            attempts = attempts.len(),
            "all candidates exhausted"
        );
        tracker.advance(RunState::AllCandidatesExhausted);
        StrategyReport {
            outcome: StrategyOutcome::Exhausted,
            attempts,
        }
    }
}

fn attempt(index: usize, credential: &Credential, verdict: AttemptVerdict) -> Attempt {
    Attempt {
        index,
        identity: credential.identity().to_string(),
        verdict,
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
