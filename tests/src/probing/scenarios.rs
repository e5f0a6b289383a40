#![cfg(test)]
use std::time::Duration;

use sesame_common::{
    Credential, Endpoint, NetworkFailurePolicy, Output, ProbeConfig, ProbeOutcome, ProbeResult,
    Protocol,
};
use sesame_core::testing::{ScriptedTransport, Step};
use sesame_core::{CommandBatch, CredentialSet, ProbeTarget, Prober};
use tokio_util::sync::CancellationToken;

fn shell_target(pairs: &[(&str, &str)]) -> ProbeTarget {
    ProbeTarget::new(
        Endpoint::new("10.0.0.5", 22, Protocol::RemoteShell),
        CredentialSet::from_pairs(Protocol::RemoteShell, pairs.iter().copied()).unwrap(),
    )
    .unwrap()
}

/// Second candidate is accepted after the first is rejected.
#[tokio::test]
async fn second_candidate_authenticates() {
    let transport: ScriptedTransport = ScriptedTransport::new().accept("u2", "p2");
    let log = transport.log();
    let prober: Prober<ScriptedTransport> = Prober::new(transport, ProbeConfig::default());

    let result: ProbeResult = prober
        .probe(
            &shell_target(&[("u1", "p1"), ("u2", "p2")]),
            None,
            &CancellationToken::new(),
        )
        .await;

    assert_eq!(result.outcome(), ProbeOutcome::Authenticated);
    assert_eq!(result.credential_used(), Some(&Credential::new("u2", "p2")));
    assert_eq!(result.attempts(), 2);
    assert_eq!(log.connects(), vec!["u1", "u2"]);
}

/// An empty candidate list is exhausted without touching the network.
#[tokio::test]
async fn empty_candidate_list_is_exhausted() {
    let transport: ScriptedTransport = ScriptedTransport::new();
    let log = transport.log();
    let prober: Prober<ScriptedTransport> = Prober::new(transport, ProbeConfig::default());
    let target: ProbeTarget = ProbeTarget::new(
        Endpoint::new("10.0.0.5", 22, Protocol::RemoteShell),
        CredentialSet::empty(Protocol::RemoteShell),
    )
    .unwrap();

    let result: ProbeResult = prober
        .probe(&target, None, &CancellationToken::new())
        .await;

    assert_eq!(result.outcome(), ProbeOutcome::AllCandidatesExhausted);
    assert_eq!(result.attempts(), 0);
    assert!(result.credential_used().is_none());
    assert!(log.calls().is_empty());
}

/// A single command's stdout, empty stderr and exit status are collected.
#[tokio::test]
async fn echo_output_is_collected() {
    let transport: ScriptedTransport = ScriptedTransport::new()
        .accept("u", "p")
        .script("echo hi", vec![Step::stdout("hi\n"), Step::Exit(0)]);
    let prober: Prober<ScriptedTransport> = Prober::new(transport, ProbeConfig::default());

    let result: ProbeResult = prober
        .probe(
            &shell_target(&[("u", "p")]),
            Some(&CommandBatch::new(["echo hi"]).unwrap()),
            &CancellationToken::new(),
        )
        .await;

    assert_eq!(result.outcome(), ProbeOutcome::Authenticated);
    assert_eq!(
        result.output(),
        Some(&Output {
            stdout: b"hi\n".to_vec(),
            stderr: Vec::new(),
            exit_status: Some(0),
        })
    );
}

/// A connect that never answers is a connection error under the abort policy.
#[tokio::test(start_paused = true)]
async fn hanging_connect_aborts_under_abort_policy() {
    let transport: ScriptedTransport = ScriptedTransport::new()
        .hang("u1", "p1")
        .accept("u2", "p2");
    let log = transport.log();
    let config: ProbeConfig = ProbeConfig::default()
        .with_connect_timeout(Duration::from_secs(2))
        .with_network_failure_policy(NetworkFailurePolicy::AbortRun);
    let prober: Prober<ScriptedTransport> = Prober::new(transport, config);

    let result: ProbeResult = prober
        .probe(
            &shell_target(&[("u1", "p1"), ("u2", "p2")]),
            None,
            &CancellationToken::new(),
        )
        .await;

    assert_eq!(result.outcome(), ProbeOutcome::ConnectionError);
    assert_eq!(result.attempts(), 1);
    assert!(result.elapsed() >= Duration::from_secs(2));
    assert!(result.elapsed() < Duration::from_secs(3));
    assert_eq!(log.opened(), 0);
}

/// The same hang is skipped under the default policy and the next candidate wins.
#[tokio::test(start_paused = true)]
async fn hanging_connect_is_skipped_by_default() {
    let transport: ScriptedTransport = ScriptedTransport::new()
        .hang("u1", "p1")
        .accept("u2", "p2");
    let log = transport.log();
    let config: ProbeConfig = ProbeConfig::default().with_connect_timeout(Duration::from_secs(2));
    let prober: Prober<ScriptedTransport> = Prober::new(transport, config);

    let result: ProbeResult = prober
        .probe(
            &shell_target(&[("u1", "p1"), ("u2", "p2")]),
            None,
            &CancellationToken::new(),
        )
        .await;

    assert_eq!(result.outcome(), ProbeOutcome::Authenticated);
    assert_eq!(result.credential_used(), Some(&Credential::new("u2", "p2")));
    assert_eq!(log.opened(), 1);
}
