use std::borrow::Cow;

use serde::{Serialize, Serializer};

/// Captured result of running a command batch over a session.
///
/// `stdout` and `stderr` are kept apart. Each buffer holds its stream's chunks
/// concatenated in arrival order.
///
/// The buffers hold the raw bytes. Serialization is lossy: each stream is
/// written as a string, with invalid UTF-8 sequences replaced by U+FFFD. Read
/// the fields directly when exact bytes matter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Output {
    #[serde(serialize_with = "lossy_utf8")]
    pub stdout: Vec<u8>,
    #[serde(serialize_with = "lossy_utf8")]
    pub stderr: Vec<u8>,
    pub exit_status: Option<i32>,
}

impl Output {
    pub fn stdout_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.stdout)
    }

    pub fn stderr_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.stderr)
    }

    pub fn is_empty(&self) -> bool {
        self.stdout.is_empty() && self.stderr.is_empty()
    }

    /// True when the last command reported exit status zero.
    pub fn succeeded(&self) -> bool {
        self.exit_status == Some(0)
    }
}

/// Invalid UTF-8 becomes U+FFFD; the source buffer is left untouched.
fn lossy_utf8<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&String::from_utf8_lossy(bytes))
}
