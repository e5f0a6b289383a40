//! # Session Runner
//!
//! Runs a [`CommandBatch`] over one authenticated [`Session`] and collects its
//! output.
//!
//! Output events arrive on a channel; stdout and stderr chunks are appended to
//! their own buffers as they come in. The runner waits on three things at once:
//! the next event, the batch deadline, and cancellation. Whichever fires first
//! decides how execution ends.
//!
//! The session is consumed and closed exactly once, whatever the outcome.

use std::borrow::Cow;
use std::time::Duration;

use sesame_common::{
    ExecutionStatus, Output, ProbeConfig, ProbeError, SubmissionMode, debug, warn,
};
use tokio::time::{Instant, Sleep};
use tokio_util::sync::CancellationToken;

use crate::transport::{ExecEvent, ExecStream, Session, close_within};

/// Ordered, non-empty list of opaque commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandBatch {
    commands: Vec<String>,
}

impl CommandBatch {
    pub fn new<I, C>(commands: I) -> Result<Self, ProbeError>
    where
        I: IntoIterator<Item = C>,
        C: Into<String>,
    {
        let commands: Vec<String> = commands.into_iter().map(Into::into).collect();
        if commands.is_empty() {
            return Err(ProbeError::EmptyCommandBatch);
        }
        Ok(Self { commands })
    }

    pub fn single(command: impl Into<String>) -> Self {
        Self {
            commands: vec![command.into()],
        }
    }

    pub fn commands(&self) -> &[String] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

/// Execution limits and submission settings for one batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecPolicy {
    pub exec_timeout: Duration,
    pub idle_timeout: Option<Duration>,
    pub close_timeout: Duration,
    pub submission: SubmissionMode,
    pub stop_on_error: bool,
}

impl From<&ProbeConfig> for ExecPolicy {
    fn from(cfg: &ProbeConfig) -> Self {
        Self {
            exec_timeout: cfg.exec_timeout,
            idle_timeout: cfg.idle_timeout,
            close_timeout: cfg.close_timeout,
            submission: cfg.submission,
            stop_on_error: cfg.stop_on_error,
        }
    }
}

impl Default for ExecPolicy {
    fn default() -> Self {
        Self::from(&ProbeConfig::default())
    }
}

/// Output plus how execution ended. Partial output is kept on every failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Execution {
    pub output: Output,
    pub status: ExecutionStatus,
}

enum StreamEnd {
    Exited(Option<i32>),
    TimedOut,
    Cancelled,
}

#[derive(Debug, Clone, Default)]
pub struct SessionRunner {
    policy: ExecPolicy,
}

impl SessionRunner {
    pub fn new(policy: ExecPolicy) -> Self {
        Self { policy }
    }

    pub fn from_config(cfg: &ProbeConfig) -> Self {
        Self::new(ExecPolicy::from(cfg))
    }

    pub fn policy(&self) -> &ExecPolicy {
        &self.policy
    }

    /// Runs `batch` over `session`, then closes the session.
    pub async fn run<S: Session>(
        &self,
        mut session: S,
        batch: &CommandBatch,
        cancel: &CancellationToken,
    ) -> Execution {
        let mut output: Output = Output::default();
        let status: ExecutionStatus = self.drive(&mut session, batch, cancel, &mut output).await;

        close_within(&mut session, self.policy.close_timeout).await;

        debug!(
            status = ?status,
            exit_status = ?output.exit_status,
            stdout_len = output.stdout.len(),
            stderr_len = output.stderr.len(),
            "batch finished"
        );
        Execution { output, status }
    }

    async fn drive<S: Session>(
        &self,
        session: &mut S,
        batch: &CommandBatch,
        cancel: &CancellationToken,
        output: &mut Output,
    ) -> ExecutionStatus {
        let deadline = tokio::time::sleep(self.policy.exec_timeout);
        tokio::pin!(deadline);

        let invocations: Vec<Cow<'_, str>> = match self.policy.submission {
            SubmissionMode::Sequential => batch
                .commands()
                .iter()
                .map(|command| Cow::Borrowed(command.as_str()))
                .collect(),
            SubmissionMode::Joined => vec![Cow::Owned(session.join_commands(batch.commands()))],
        };
        let total: usize = invocations.len();

        for (index, command) in invocations.iter().enumerate() {
            let remaining: Duration = deadline
                .deadline()
                .saturating_duration_since(Instant::now());
            debug!(command = index + 1, of = total, "submitting command");

            let stream: ExecStream = tokio::select! {
                biased;

                _ = cancel.cancelled() => return ExecutionStatus::Cancelled,

                _ = deadline.as_mut() => {
                    warn!(command = index + 1, "execution deadline hit while submitting");
                    return ExecutionStatus::TimedOut;
                }

                submitted = session.execute(command, remaining) => match submitted {
                    Ok(stream) => stream,
                    Err(err) => {
                        warn!(command = index + 1, error = %err, "command submission failed");
                        return ExecutionStatus::RuntimeError(err.to_string());
                    }
                },
            };

            match self.collect(stream, &mut deadline, cancel, output).await {
                StreamEnd::Exited(code) => {
                    output.exit_status = code;
                    let failed: bool = matches!(code, Some(status) if status != 0);
                    if failed && self.policy.stop_on_error && index + 1 < total {
                        warn!(
                            command = index + 1,
                            exit_status = ?code,
                            skipped = total - index - 1,
                            "command failed, stopping batch"
                        );
                        break;
                    }
                }
                StreamEnd::TimedOut => {
                    warn!(command = index + 1, "command timed out");
                    return ExecutionStatus::TimedOut;
                }
                StreamEnd::Cancelled => return ExecutionStatus::Cancelled,
            }
        }

        ExecutionStatus::Completed
    }

    /// Drains one command's stream into `output` until it exits or a limit fires.
    async fn collect(
        &self,
        mut stream: ExecStream,
        deadline: &mut std::pin::Pin<&mut Sleep>,
        cancel: &CancellationToken,
        output: &mut Output,
    ) -> StreamEnd {
        loop {
            let idle = async {
                match self.policy.idle_timeout {
                    Some(limit) => tokio::time::sleep(limit).await,
                    None => std::future::pending::<()>().await,
                }
            };

            tokio::select! {
                biased;

                _ = cancel.cancelled() => return StreamEnd::Cancelled,

                _ = deadline.as_mut() => return StreamEnd::TimedOut,

                event = stream.recv() => match event {
                    Some(ExecEvent::Stdout(chunk)) => output.stdout.extend_from_slice(&chunk),
                    Some(ExecEvent::Stderr(chunk)) => output.stderr.extend_from_slice(&chunk),
                    Some(ExecEvent::Exit(code)) => return StreamEnd::Exited(code),
                    None => return StreamEnd::Exited(None),
                },

                _ = idle => {
                    debug!("session went idle");
                    return StreamEnd::TimedOut;
                }
            }
        }
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
