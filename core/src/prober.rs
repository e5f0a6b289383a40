//! # Prober
//!
//! Ties the pieces of one **Run** together:
//! 1. the [`ProbeStrategy`] walks the credential set until a session opens,
//! 2. the [`SessionRunner`] executes the optional [`CommandBatch`] on it,
//! 3. everything is folded into exactly one [`ProbeResult`].
//!
//! Nothing in here returns an error once a [`ProbeTarget`] exists. Input problems
//! are rejected while building targets; everything after that is a value in the
//! result record.

use sesame_common::{
    Credential, Endpoint, ExecutionStatus, ProbeConfig, ProbeError, ProbeOutcome, ProbeResult,
    RunState, debug, info, warn,
};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::credentials::CredentialSet;
use crate::report::ResultReporter;
use crate::runner::{CommandBatch, Execution, SessionRunner};
use crate::strategy::{ProbeStrategy, StrategyOutcome, StrategyReport};
use crate::tracker::RunTracker;
use crate::transport::{TransportAdapter, close_within};

/// An endpoint paired with the candidates to try against it.
#[derive(Debug, Clone)]
pub struct ProbeTarget {
    endpoint: Endpoint,
    credentials: CredentialSet,
}

impl ProbeTarget {
    /// # Errors
    /// [`ProbeError::ProtocolMismatch`] when `credentials` were validated for a
    /// different protocol than the one `endpoint` speaks.
    pub fn new(endpoint: Endpoint, credentials: CredentialSet) -> Result<Self, ProbeError> {
        if credentials.protocol() != endpoint.protocol() {
            return Err(ProbeError::ProtocolMismatch {
                expected: credentials.protocol(),
                found: endpoint.protocol(),
            });
        }
        Ok(Self {
            endpoint,
            credentials,
        })
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn credentials(&self) -> &CredentialSet {
        &self.credentials
    }
}

/// Runs probes over one transport adapter.
///
/// Holds no per-run state, so one prober may serve concurrent runs against
/// different endpoints.
#[derive(Debug)]
pub struct Prober<T> {
    transport: T,
    config: ProbeConfig,
    strategy: ProbeStrategy,
    runner: SessionRunner,
}

impl<T: TransportAdapter> Prober<T> {
    pub fn new(transport: T, config: ProbeConfig) -> Self {
        let strategy: ProbeStrategy = ProbeStrategy::from_config(&config);
        let runner: SessionRunner = SessionRunner::from_config(&config);
        Self {
            transport,
            config,
            strategy,
            runner,
        }
    }

    pub fn config(&self) -> &ProbeConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Probes one target and, when a candidate is accepted and `commands` is
    /// given, runs them over the new session.
    ///
    /// Without commands the session is closed right after authentication.
    pub async fn probe(
        &self,
        target: &ProbeTarget,
        commands: Option<&CommandBatch>,
        cancel: &CancellationToken,
    ) -> ProbeResult {
        let started: Instant = Instant::now();
        let endpoint: &Endpoint = target.endpoint();
        let mut tracker: RunTracker = RunTracker::new(endpoint.to_string());

        info!(
            endpoint = %endpoint,
            candidates = target.credentials().len(),
            "probing"
        );

        let StrategyReport { outcome, attempts } = self
            .strategy
            .find_first(
                &self.transport,
                endpoint,
                target.credentials(),
                cancel,
                &mut tracker,
            )
            .await;

        let record: RunRecord = RunRecord::new(endpoint.clone(), attempts.len(), started);

        let result: ProbeResult = match outcome {
            StrategyOutcome::Authenticated {
                credential,
                mut session,
            } => match commands {
                None => {
                    close_within(&mut session, self.config.close_timeout).await;
                    tracker.advance(RunState::Completed);
                    record.authenticated(credential)
                }
                Some(batch) => {
                    tracker.advance(RunState::Executing);
                    let execution: Execution = self.runner.run(session, batch, cancel).await;
                    tracker.advance(terminal_state(&execution.status));
                    record.executed(credential, execution)
                }
            },
            StrategyOutcome::Exhausted => record.exhausted(),
            StrategyOutcome::Aborted(err) => record.failed(err.to_string()),
            StrategyOutcome::Cancelled => record.failed("run cancelled".to_string()),
        };

        debug!(
            endpoint = %endpoint,
            outcome = ?result.outcome(),
            attempts = result.attempts(),
            history = ?tracker.history(),
            "run finished"
        );
        result
    }

    /// Probes `targets` strictly one after another, handing each result to
    /// `reporter` as soon as it exists.
    ///
    /// Once `cancel` fires, targets that have not started are skipped and
    /// produce no result.
    pub async fn sweep(
        &self,
        targets: &[ProbeTarget],
        commands: Option<&CommandBatch>,
        reporter: &dyn ResultReporter,
        cancel: &CancellationToken,
    ) -> Vec<ProbeResult> {
        let mut results: Vec<ProbeResult> = Vec::with_capacity(targets.len());

        for (index, target) in targets.iter().enumerate() {
            if cancel.is_cancelled() {
                warn!(
                    skipped = targets.len() - index,
                    "sweep cancelled, remaining targets skipped"
                );
                break;
            }
            let result: ProbeResult = self.probe(target, commands, cancel).await;
            reporter.report(&result);
            results.push(result);
        }

        results
    }
}

fn terminal_state(status: &ExecutionStatus) -> RunState {
    match status {
        ExecutionStatus::Completed => RunState::Completed,
        ExecutionStatus::TimedOut => RunState::TimedOut,
        ExecutionStatus::RuntimeError(_) => RunState::RuntimeError,
        ExecutionStatus::Cancelled => RunState::ConnectionError,
    }
}

/// Collects the fixed parts of a result while the run is in progress.
struct RunRecord {
    endpoint: Endpoint,
    attempts: usize,
    started: Instant,
}

impl RunRecord {
    fn new(endpoint: Endpoint, attempts: usize, started: Instant) -> Self {
        Self {
            endpoint,
            attempts,
            started,
        }
    }

    fn authenticated(self, credential: Credential) -> ProbeResult {
        self.finish(ProbeOutcome::Authenticated).with_credential(credential)
    }

    /// Execution failures keep the accepted credential and partial output.
    fn executed(self, credential: Credential, execution: Execution) -> ProbeResult {
        let Execution { output, status } = execution;
        let error: Option<String> = match &status {
            ExecutionStatus::Completed => None,
            ExecutionStatus::TimedOut => Some("command execution timed out".to_string()),
            ExecutionStatus::RuntimeError(reason) => Some(reason.clone()),
            ExecutionStatus::Cancelled => Some("run cancelled during execution".to_string()),
        };
        let outcome: ProbeOutcome = match error {
            None => ProbeOutcome::Authenticated,
            Some(_) => ProbeOutcome::ConnectionError,
        };

        let result: ProbeResult = self
            .finish(outcome)
            .with_credential(credential)
            .with_output(output)
            .with_execution(status);
        match error {
            Some(error) => result.with_error(error),
            None => result,
        }
    }

    fn exhausted(self) -> ProbeResult {
        self.finish(ProbeOutcome::AllCandidatesExhausted)
    }

    fn failed(self, error: String) -> ProbeResult {
        self.finish(ProbeOutcome::ConnectionError).with_error(error)
    }

    fn finish(self, outcome: ProbeOutcome) -> ProbeResult {
        ProbeResult::new(self.endpoint, outcome)
            .with_attempts(self.attempts)
            .with_elapsed(self.started.elapsed())
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
