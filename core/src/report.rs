//! # Result Reporters
//!
//! Sinks for finished [`ProbeResult`]s. A reporter only transforms and forwards;
//! it never retries a run or feeds anything back into the engine.
//!
//! * [`LogReporter`]: one structured `tracing` event per result.
//! * [`ChannelReporter`]: hands clones to an async consumer.
//! * [`JsonLinesReporter`]: one JSON document per line on any writer.
//! * [`TerminalReporter`](crate::terminal::print::TerminalReporter): colored tree output.
//!
//! Plain closures taking `&ProbeResult` are reporters too.

use std::io::Write;
use std::sync::{Mutex, MutexGuard};

use sesame_common::{ProbeOutcome, ProbeResult, debug, error, info, success, warn};
use tokio::sync::mpsc::UnboundedSender;

pub trait ResultReporter: Send + Sync {
    fn report(&self, result: &ProbeResult);
}

impl<F> ResultReporter for F
where
    F: Fn(&ProbeResult) + Send + Sync,
{
    fn report(&self, result: &ProbeResult) {
        self(result)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LogReporter;

impl ResultReporter for LogReporter {
    fn report(&self, result: &ProbeResult) {
        let identity: Option<&str> = result.credential_used().map(|c| c.identity());
        let exit_status: Option<i32> = result.output().and_then(|o| o.exit_status);

        match result.outcome() {
            ProbeOutcome::Authenticated => success!(
                endpoint = %result.endpoint(),
                identity = identity.unwrap_or_default(),
                attempts = result.attempts(),
                exit_status = ?exit_status,
                elapsed = ?result.elapsed(),
                "credential accepted"
            ),
            ProbeOutcome::AllCandidatesExhausted => info!(
                endpoint = %result.endpoint(),
                attempts = result.attempts(),
                elapsed = ?result.elapsed(),
                "no candidate accepted"
            ),
            ProbeOutcome::ConnectionError => warn!(
                endpoint = %result.endpoint(),
                identity = ?identity,
                attempts = result.attempts(),
                error = result.error().unwrap_or("unknown"),
                "run failed"
            ),
        }
    }
}

/// Forwards a clone of every result to an unbounded channel.
///
/// A dropped receiver is not an error for the run; the result is discarded.
#[derive(Debug, Clone)]
pub struct ChannelReporter {
    tx: UnboundedSender<ProbeResult>,
}

impl ChannelReporter {
    pub fn new(tx: UnboundedSender<ProbeResult>) -> Self {
        Self { tx }
    }
}

impl ResultReporter for ChannelReporter {
    fn report(&self, result: &ProbeResult) {
        if self.tx.send(result.clone()).is_err() {
            debug!(endpoint = %result.endpoint(), "result receiver dropped, discarding");
        }
    }
}

/// Writes each result as a single line of JSON.
#[derive(Debug)]
pub struct JsonLinesReporter<W> {
    writer: Mutex<W>,
}

impl<W: Write + Send> JsonLinesReporter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lock(&self) -> MutexGuard<'_, W> {
        self.writer
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<W: Write + Send> ResultReporter for JsonLinesReporter<W> {
    fn report(&self, result: &ProbeResult) {
        let line: String = match serde_json::to_string(result) {
            Ok(line) => line,
            Err(err) => {
                error!(endpoint = %result.endpoint(), error = %err, "could not serialize result");
                return;
            }
        };

        let mut writer = self.lock();
        if let Err(err) = writeln!(writer, "{line}").and_then(|_| writer.flush()) {
            error!(endpoint = %result.endpoint(), error = %err, "could not write result");
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
