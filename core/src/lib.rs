//! # Sesame Core
//!
//! The probing engine. Given an [`Endpoint`](sesame_common::Endpoint) and an
//! ordered [`CredentialSet`], it tries candidates one at a time until a
//! [`TransportAdapter`] opens a session, runs a [`CommandBatch`] over it, and
//! reports exactly one [`ProbeResult`](sesame_common::ProbeResult) per run.
//!
//! **Layout:**
//! * [`credentials`]: validated, de-duplicated candidate lists.
//! * [`transport`]: the adapter and session traits protocol connectors implement.
//! * [`strategy`]: first-success credential search.
//! * [`runner`]: command submission and output collection.
//! * [`prober`]: run orchestration and multi-target sweeps.
//! * [`report`] and [`terminal`]: result sinks and terminal output.
//!
//! The crate ships no network adapters. The `testing` feature exposes an
//! in-memory scripted transport.

pub mod credentials;
pub mod prober;
pub mod report;
pub mod runner;
pub mod strategy;
pub mod terminal;
pub mod tracker;
pub mod transport;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use credentials::{CredentialCursor, CredentialSet};
pub use prober::{ProbeTarget, Prober};
pub use report::{ChannelReporter, JsonLinesReporter, LogReporter, ResultReporter};
pub use runner::{CommandBatch, ExecPolicy, Execution, SessionRunner};
pub use strategy::{Attempt, AttemptVerdict, ProbeStrategy, StrategyOutcome, StrategyReport};
pub use terminal::logging::init_logging;
pub use terminal::print::TerminalReporter;
pub use tracker::RunTracker;
pub use transport::{ExecEvent, ExecStream, Session, TransportAdapter};
