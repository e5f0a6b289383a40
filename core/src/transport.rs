//! The central **abstraction** over protocol-specific connectors.
//!
//! A [`TransportAdapter`] knows how to open an authenticated [`Session`] against
//! an [`Endpoint`] with one [`Credential`]. Everything about framing, handshakes
//! and auth exchanges stays behind this trait. The engine only sequences calls,
//! bounds them with timeouts, and closes what it opened.
//!
//! **Architectural Note:**
//! The probe strategy and session runner depend on these traits only, so a
//! remote shell adapter and a database wire adapter plug into the same loop.

use std::time::Duration;

use async_trait::async_trait;
use sesame_common::{Credential, Endpoint, Protocol, TransportError, warn};
use tokio::sync::mpsc;

/// Events a session emits while one command runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecEvent {
    Stdout(Vec<u8>),
    Stderr(Vec<u8>),
    /// The command finished. Adapters send it last; nothing after it is read.
    Exit(Option<i32>),
}

/// Stream of [`ExecEvent`]s for one submitted command.
///
/// Dropping the sender without an `Exit` event counts as completion with no
/// exit status.
pub type ExecStream = mpsc::Receiver<ExecEvent>;

/// Protocol-specific connector.
#[async_trait]
pub trait TransportAdapter: Send + Sync {
    type Session: Session;

    /// Opens a session and authenticates with `credential`.
    ///
    /// Errors MUST be classified: [`TransportError::AuthRejected`] when the
    /// remote side refused the credential, [`TransportError::NetworkUnreachable`]
    /// or [`TransportError::Timeout`] for network-level failures.
    ///
    /// The engine also bounds this call with `timeout` and drops the future when
    /// it expires or the run is cancelled, so adapters must not leave
    /// connections behind when dropped mid-flight.
    async fn connect(
        &self,
        endpoint: &Endpoint,
        credential: &Credential,
        timeout: Duration,
    ) -> Result<Self::Session, TransportError>;
}

/// A live, authenticated connection.
#[async_trait]
pub trait Session: Send {
    /// Protocol spoken by this session.
    fn protocol(&self) -> Protocol;

    /// Submits one command and returns the stream of its output events.
    ///
    /// `timeout` is the time left in the caller's budget. The runner enforces it
    /// independently, adapters may use it for their own bookkeeping.
    async fn execute(
        &mut self,
        command: &str,
        timeout: Duration,
    ) -> Result<ExecStream, TransportError>;

    /// Builds the single invocation used for joined submission.
    ///
    /// Adapters override this when their protocol has its own compound syntax.
    fn join_commands(&self, commands: &[String]) -> String {
        commands.join(self.protocol().command_separator())
    }

    /// Closes the session. Idempotent: closing twice has no further effect.
    async fn close(&mut self);
}

/// Closes `session`, giving up after `limit`.
///
/// The engine calls this exactly once per session it owns.
pub(crate) async fn close_within<S: Session + ?Sized>(session: &mut S, limit: Duration) {
    if tokio::time::timeout(limit, session.close()).await.is_err() {
        warn!(limit = ?limit, "session did not close in time, abandoning it");
    }
}
