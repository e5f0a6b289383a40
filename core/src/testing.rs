//! Scripted in-memory transport for tests.
//!
//! [`ScriptedTransport`] decides per credential whether a connect is accepted,
//! rejected, unreachable or hangs forever. Its sessions replay per-command
//! [`Step`] scripts on the output channel. Every interaction is recorded in a
//! shared [`CallLog`] so tests can assert on ordering and counts.
//!
//! Only compiled for this crate's tests and under the `testing` feature.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use sesame_common::{Credential, Endpoint, Protocol, TransportError};
use tokio::sync::mpsc;

use crate::transport::{ExecEvent, ExecStream, Session, TransportAdapter};

const STREAM_CAPACITY: usize = 16;

/// How a scripted connect attempt behaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectBehavior {
    Accept,
    Reject,
    Unreachable,
    /// Never completes. Only the engine's connect timeout ends it.
    Hang,
    /// Accepts after the given delay.
    AcceptAfter(Duration),
}

/// One step of a command's scripted output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Stdout(Vec<u8>),
    Stderr(Vec<u8>),
    Pause(Duration),
    Exit(i32),
    /// Keeps the stream open without sending anything until the reader goes away.
    Hang,
}

impl Step {
    pub fn stdout(text: &str) -> Self {
        Step::Stdout(text.as_bytes().to_vec())
    }

    pub fn stderr(text: &str) -> Self {
        Step::Stderr(text.as_bytes().to_vec())
    }
}

/// Recorded transport interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Connect { identity: String },
    Open { session: usize },
    Execute { command: String },
    /// The scripted command ran to its end (logged before its `Exit` is sent).
    Finished { command: String },
    Close { session: usize },
}

#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<Call>>>);

impl CallLog {
    fn lock(&self) -> MutexGuard<'_, Vec<Call>> {
        self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn push(&self, call: Call) {
        self.lock().push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.lock().clone()
    }

    /// Identities of every connect attempt, in order.
    pub fn connects(&self) -> Vec<String> {
        self.lock()
            .iter()
            .filter_map(|call| match call {
                Call::Connect { identity } => Some(identity.clone()),
                _ => None,
            })
            .collect()
    }

    /// Commands submitted to any session, in order.
    pub fn executes(&self) -> Vec<String> {
        self.lock()
            .iter()
            .filter_map(|call| match call {
                Call::Execute { command } => Some(command.clone()),
                _ => None,
            })
            .collect()
    }

    /// Number of sessions handed out.
    pub fn opened(&self) -> usize {
        self.count(|call| matches!(call, Call::Open { .. }))
    }

    /// Number of effective (first) closes across all sessions.
    pub fn closes(&self) -> usize {
        self.count(|call| matches!(call, Call::Close { .. }))
    }

    fn count(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.lock().iter().filter(|call| predicate(call)).count()
    }
}

#[derive(Debug, Default)]
struct Scripts {
    by_command: HashMap<String, Vec<Step>>,
    failing: HashSet<String>,
}

#[derive(Debug)]
pub struct ScriptedTransport {
    behaviors: HashMap<Credential, ConnectBehavior>,
    fallback: ConnectBehavior,
    scripts: Arc<Scripts>,
    log: CallLog,
    next_session: Arc<Mutex<usize>>,
}

impl Default for ScriptedTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedTransport {
    /// Rejects every credential until told otherwise. Unscripted commands exit 0.
    pub fn new() -> Self {
        Self {
            behaviors: HashMap::new(),
            fallback: ConnectBehavior::Reject,
            scripts: Arc::new(Scripts::default()),
            log: CallLog::default(),
            next_session: Arc::new(Mutex::new(0)),
        }
    }

    pub fn behave(mut self, identity: &str, secret: &str, behavior: ConnectBehavior) -> Self {
        self.behaviors
            .insert(Credential::new(identity, secret), behavior);
        self
    }

    pub fn accept(self, identity: &str, secret: &str) -> Self {
        self.behave(identity, secret, ConnectBehavior::Accept)
    }

    pub fn reject(self, identity: &str, secret: &str) -> Self {
        self.behave(identity, secret, ConnectBehavior::Reject)
    }

    pub fn unreachable(self, identity: &str, secret: &str) -> Self {
        self.behave(identity, secret, ConnectBehavior::Unreachable)
    }

    pub fn hang(self, identity: &str, secret: &str) -> Self {
        self.behave(identity, secret, ConnectBehavior::Hang)
    }

    /// Behavior for credentials without an explicit entry.
    pub fn otherwise(mut self, behavior: ConnectBehavior) -> Self {
        self.fallback = behavior;
        self
    }

    pub fn script(mut self, command: &str, steps: Vec<Step>) -> Self {
        self.scripts_mut()
            .by_command
            .insert(command.to_string(), steps);
        self
    }

    /// Makes `execute(command)` fail before any output is produced.
    pub fn failing_command(mut self, command: &str) -> Self {
        self.scripts_mut().failing.insert(command.to_string());
        self
    }

    pub fn log(&self) -> CallLog {
        self.log.clone()
    }

    /// Scripts are only edited while building, before any session shares them.
    fn scripts_mut(&mut self) -> &mut Scripts {
        Arc::get_mut(&mut self.scripts).expect("scripts edited after a session was opened")
    }

    fn open_session(&self, protocol: Protocol) -> ScriptedSession {
        let id: usize = {
            let mut next = self
                .next_session
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            *next += 1;
            *next
        };
        self.log.push(Call::Open { session: id });

        ScriptedSession {
            id,
            protocol,
            scripts: Arc::clone(&self.scripts),
            log: self.log.clone(),
            closed: false,
        }
    }
}

#[async_trait]
impl TransportAdapter for ScriptedTransport {
    type Session = ScriptedSession;

    async fn connect(
        &self,
        endpoint: &Endpoint,
        credential: &Credential,
        _timeout: Duration,
    ) -> Result<ScriptedSession, TransportError> {
        self.log.push(Call::Connect {
            identity: credential.identity().to_string(),
        });

        let behavior: ConnectBehavior = self
            .behaviors
            .get(credential)
            .copied()
            .unwrap_or(self.fallback);

        match behavior {
            ConnectBehavior::Accept => Ok(self.open_session(endpoint.protocol())),
            ConnectBehavior::Reject => Err(TransportError::AuthRejected(
                "permission denied".to_string(),
            )),
            ConnectBehavior::Unreachable => Err(TransportError::NetworkUnreachable(format!(
                "{endpoint} refused the connection"
            ))),
            ConnectBehavior::Hang => std::future::pending().await,
            ConnectBehavior::AcceptAfter(delay) => {
                tokio::time::sleep(delay).await;
                Ok(self.open_session(endpoint.protocol()))
            }
        }
    }
}

#[derive(Debug)]
pub struct ScriptedSession {
    id: usize,
    protocol: Protocol,
    scripts: Arc<Scripts>,
    log: CallLog,
    closed: bool,
}

impl ScriptedSession {
    pub fn id(&self) -> usize {
        self.id
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

#[async_trait]
impl Session for ScriptedSession {
    fn protocol(&self) -> Protocol {
        self.protocol
    }

    async fn execute(
        &mut self,
        command: &str,
        _timeout: Duration,
    ) -> Result<ExecStream, TransportError> {
        if self.closed {
            return Err(TransportError::Execution("session is closed".to_string()));
        }
        self.log.push(Call::Execute {
            command: command.to_string(),
        });
        if self.scripts.failing.contains(command) {
            return Err(TransportError::Execution(format!(
                "channel refused '{command}'"
            )));
        }

        let steps: Vec<Step> = self
            .scripts
            .by_command
            .get(command)
            .cloned()
            .unwrap_or_else(|| vec![Step::Exit(0)]);

        let (tx, rx) = mpsc::channel(STREAM_CAPACITY);
        tokio::spawn(play(steps, tx, self.log.clone(), command.to_string()));
        Ok(rx)
    }

    async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.log.push(Call::Close { session: self.id });
    }
}

async fn play(steps: Vec<Step>, tx: mpsc::Sender<ExecEvent>, log: CallLog, command: String) {
    for step in steps {
        let event: ExecEvent = match step {
            Step::Stdout(chunk) => ExecEvent::Stdout(chunk),
            Step::Stderr(chunk) => ExecEvent::Stderr(chunk),
            Step::Pause(delay) => {
                tokio::time::sleep(delay).await;
                continue;
            }
            Step::Hang => {
                tx.closed().await;
                return;
            }
            Step::Exit(code) => {
                log.push(Call::Finished { command });
                let _ = tx.send(ExecEvent::Exit(Some(code))).await;
                return;
            }
        };
        if tx.send(event).await.is_err() {
            return;
        }
    }
    log.push(Call::Finished { command });
}
