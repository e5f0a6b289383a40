//! Ordered candidate identities for one protocol.
//!
//! Candidates are validated up front, so a malformed entry fails before any
//! network IO. Duplicates are dropped (first occurrence wins), which keeps the
//! "never try a credential twice in one run" invariant structural.

use std::collections::HashSet;

use sesame_common::{Credential, ProbeError, Protocol, debug};

#[derive(Debug, Clone)]
pub struct CredentialSet {
    protocol: Protocol,
    candidates: Vec<Credential>,
}

impl CredentialSet {
    /// Validates and de-duplicates `candidates` for `protocol`.
    ///
    /// # Errors
    /// [`ProbeError::InvalidCredential`] for an empty identity, or an empty
    /// secret when [`Protocol::requires_secret`] holds.
    pub fn new<I>(protocol: Protocol, candidates: I) -> Result<Self, ProbeError>
    where
        I: IntoIterator<Item = Credential>,
    {
        let mut seen: HashSet<Credential> = HashSet::new();
        let mut unique: Vec<Credential> = Vec::new();

        for (index, candidate) in candidates.into_iter().enumerate() {
            validate(protocol, index, &candidate)?;
            if seen.insert(candidate.clone()) {
                unique.push(candidate);
            } else {
                debug!(
                    identity = candidate.identity(),
                    index, "dropping duplicate credential"
                );
            }
        }

        Ok(Self {
            protocol,
            candidates: unique,
        })
    }

    /// Convenience constructor from `(identity, secret)` pairs.
    pub fn from_pairs<I, U, S>(protocol: Protocol, pairs: I) -> Result<Self, ProbeError>
    where
        I: IntoIterator<Item = (U, S)>,
        U: Into<String>,
        S: Into<String>,
    {
        Self::new(
            protocol,
            pairs
                .into_iter()
                .map(|(identity, secret)| Credential::new(identity, secret)),
        )
    }

    /// A set with no candidates. Probing it ends immediately as exhausted.
    pub fn empty(protocol: Protocol) -> Self {
        Self {
            protocol,
            candidates: Vec::new(),
        }
    }

    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Credential> {
        self.candidates.iter()
    }

    /// Lazy cursor over the candidates in their fixed order.
    pub fn cursor(&self) -> CredentialCursor<'_> {
        CredentialCursor {
            candidates: &self.candidates,
            position: 0,
        }
    }
}

impl<'a> IntoIterator for &'a CredentialSet {
    type Item = &'a Credential;
    type IntoIter = std::slice::Iter<'a, Credential>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

fn validate(protocol: Protocol, index: usize, candidate: &Credential) -> Result<(), ProbeError> {
    if candidate.identity().is_empty() {
        return Err(ProbeError::InvalidCredential {
            index,
            reason: "identity is empty".to_string(),
        });
    }
    if protocol.requires_secret() && !candidate.has_secret() {
        return Err(ProbeError::InvalidCredential {
            index,
            reason: format!("{protocol} credentials need a non-empty secret"),
        });
    }
    Ok(())
}

/// Walks a [`CredentialSet`] front to back. Restartable with [`rewind`](Self::rewind).
#[derive(Debug, Clone)]
pub struct CredentialCursor<'a> {
    candidates: &'a [Credential],
    position: usize,
}

impl<'a> CredentialCursor<'a> {
    /// Position of the candidate the next call to `next` returns.
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn rewind(&mut self) {
        self.position = 0;
    }
}

impl<'a> Iterator for CredentialCursor<'a> {
    type Item = &'a Credential;

    fn next(&mut self) -> Option<Self::Item> {
        let candidate = self.candidates.get(self.position)?;
        self.position += 1;
        Some(candidate)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left: usize = self.candidates.len() - self.position;
        (left, Some(left))
    }
}

impl ExactSizeIterator for CredentialCursor<'_> {}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
