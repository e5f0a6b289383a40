//! Run configuration.
//!
//! A plain struct with defaults and builder setters. Values can also be read
//! from `SESAME_*` environment variables, see [`ProbeConfig::from_env`].

use std::time::Duration;

use crate::error::ConfigError;

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_EXEC_TIMEOUT: Duration = Duration::from_secs(300);
const DEFAULT_CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

pub const ENV_CONNECT_TIMEOUT: &str = "SESAME_CONNECT_TIMEOUT_SECS";
pub const ENV_EXEC_TIMEOUT: &str = "SESAME_EXEC_TIMEOUT_SECS";
pub const ENV_IDLE_TIMEOUT: &str = "SESAME_IDLE_TIMEOUT_SECS";
pub const ENV_CLOSE_TIMEOUT: &str = "SESAME_CLOSE_TIMEOUT_SECS";
pub const ENV_NETWORK_FAILURE_POLICY: &str = "SESAME_NETWORK_FAILURE_POLICY";
pub const ENV_SUBMISSION: &str = "SESAME_SUBMISSION";
pub const ENV_STOP_ON_ERROR: &str = "SESAME_STOP_ON_ERROR";

/// What the probe strategy does when a connect attempt fails at the network level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NetworkFailurePolicy {
    /// Count the failure against the current candidate and move on.
    #[default]
    SkipCandidate,
    /// End the run with a connection error. Use when the host is known to be
    /// reachable, so infrastructure faults are not reported as bad credentials.
    AbortRun,
}

/// How a command batch is handed to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubmissionMode {
    /// One `execute` per command, each issued after the previous one completed.
    #[default]
    Sequential,
    /// One `execute` of the batch joined by the session into a single invocation.
    Joined,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeConfig {
    /// Upper bound for a single connect-and-authenticate attempt.
    pub connect_timeout: Duration,
    /// Upper bound for running the whole command batch.
    pub exec_timeout: Duration,
    /// Ends execution early when the session stays silent this long.
    pub idle_timeout: Option<Duration>,
    /// Upper bound for closing a session.
    pub close_timeout: Duration,
    pub network_failure_policy: NetworkFailurePolicy,
    pub submission: SubmissionMode,
    /// Stop a sequential batch at the first non-zero exit status.
    pub stop_on_error: bool,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            exec_timeout: DEFAULT_EXEC_TIMEOUT,
            idle_timeout: None,
            close_timeout: DEFAULT_CLOSE_TIMEOUT,
            network_failure_policy: NetworkFailurePolicy::default(),
            submission: SubmissionMode::default(),
            stop_on_error: false,
        }
    }
}

impl ProbeConfig {
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_exec_timeout(mut self, timeout: Duration) -> Self {
        self.exec_timeout = timeout;
        self
    }

    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = Some(timeout);
        self
    }

    pub fn with_close_timeout(mut self, timeout: Duration) -> Self {
        self.close_timeout = timeout;
        self
    }

    pub fn with_network_failure_policy(mut self, policy: NetworkFailurePolicy) -> Self {
        self.network_failure_policy = policy;
        self
    }

    pub fn with_submission(mut self, mode: SubmissionMode) -> Self {
        self.submission = mode;
        self
    }

    pub fn with_stop_on_error(mut self, stop: bool) -> Self {
        self.stop_on_error = stop;
        self
    }

    /// Reads overrides from the process environment on top of the defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads overrides through `lookup`, which maps a variable name to its value.
    ///
    /// Unset variables keep their default. Set but malformed ones are errors.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg: ProbeConfig = ProbeConfig::default();

        if let Some(secs) = read_seconds(&lookup, ENV_CONNECT_TIMEOUT)? {
            cfg.connect_timeout = secs;
        }
        if let Some(secs) = read_seconds(&lookup, ENV_EXEC_TIMEOUT)? {
            cfg.exec_timeout = secs;
        }
        if let Some(secs) = read_seconds(&lookup, ENV_IDLE_TIMEOUT)? {
            cfg.idle_timeout = Some(secs);
        }
        if let Some(secs) = read_seconds(&lookup, ENV_CLOSE_TIMEOUT)? {
            cfg.close_timeout = secs;
        }

        if let Some(value) = lookup(ENV_NETWORK_FAILURE_POLICY) {
            cfg.network_failure_policy = match value.trim().to_ascii_lowercase().as_str() {
                "skip" => NetworkFailurePolicy::SkipCandidate,
                "abort" => NetworkFailurePolicy::AbortRun,
                _ => return Err(unknown(ENV_NETWORK_FAILURE_POLICY, value, "skip, abort")),
            };
        }

        if let Some(value) = lookup(ENV_SUBMISSION) {
            cfg.submission = match value.trim().to_ascii_lowercase().as_str() {
                "sequential" => SubmissionMode::Sequential,
                "joined" => SubmissionMode::Joined,
                _ => return Err(unknown(ENV_SUBMISSION, value, "sequential, joined")),
            };
        }

        if let Some(value) = lookup(ENV_STOP_ON_ERROR) {
            cfg.stop_on_error = match value.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" => true,
                "false" | "0" | "no" => false,
                _ => return Err(unknown(ENV_STOP_ON_ERROR, value, "true, false")),
            };
        }

        Ok(cfg)
    }
}

fn read_seconds<F>(lookup: &F, key: &str) -> Result<Option<Duration>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(value) = lookup(key) else {
        return Ok(None);
    };
    value
        .trim()
        .parse::<u64>()
        .map(|secs| Some(Duration::from_secs(secs)))
        .map_err(|_| ConfigError::InvalidSeconds {
            key: key.to_string(),
            value,
        })
}

fn unknown(key: &str, value: String, expected: &'static str) -> ConfigError {
    ConfigError::UnknownValue {
        key: key.to_string(),
        value,
        expected,
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
