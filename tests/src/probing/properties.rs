#![cfg(test)]
use std::sync::Mutex;
use std::time::Duration;

use sesame_common::{
    Credential, Endpoint, ExecutionStatus, ProbeConfig, ProbeError, ProbeOutcome, ProbeResult,
    Protocol, SubmissionMode,
};
use sesame_core::testing::{Call, ConnectBehavior, ScriptedTransport, Step};
use sesame_core::{CommandBatch, CredentialSet, ProbeTarget, Prober};
use tokio_util::sync::CancellationToken;

fn candidates(n: usize) -> Vec<(String, String)> {
    (0..n).map(|i| (format!("user{i}"), format!("pass{i}"))).collect()
}

fn target(protocol: Protocol, pairs: &[(String, String)]) -> ProbeTarget {
    ProbeTarget::new(
        Endpoint::with_default_port("target.lan", protocol),
        CredentialSet::from_pairs(protocol, pairs.iter().cloned()).unwrap(),
    )
    .unwrap()
}

#[tokio::test]
async fn accepted_candidate_at_any_position_stops_the_search() {
    const N: usize = 5;
    let pairs: Vec<(String, String)> = candidates(N);

    for (k, (identity, secret)) in pairs.iter().enumerate() {
        let transport: ScriptedTransport = ScriptedTransport::new().accept(identity, secret);
        let log = transport.log();
        let prober: Prober<ScriptedTransport> = Prober::new(transport, ProbeConfig::default());

        let result: ProbeResult = prober
            .probe(
                &target(Protocol::RemoteShell, &pairs),
                None,
                &CancellationToken::new(),
            )
            .await;

        assert_eq!(result.attempts(), k + 1, "accepted at position {k}");
        assert_eq!(
            result.credential_used(),
            Some(&Credential::new(identity.as_str(), secret.as_str()))
        );
        let expected: Vec<String> = pairs[..=k].iter().map(|(id, _)| id.clone()).collect();
        assert_eq!(log.connects(), expected);
        assert_eq!(log.opened(), 1);
        assert_eq!(log.closes(), 1);
    }
}

#[tokio::test]
async fn exhaustion_tries_each_candidate_once_in_order() {
    let mut pairs: Vec<(String, String)> = candidates(4);
    pairs.push(pairs[1].clone());

    let transport: ScriptedTransport = ScriptedTransport::new();
    let log = transport.log();
    let prober: Prober<ScriptedTransport> = Prober::new(transport, ProbeConfig::default());

    let result: ProbeResult = prober
        .probe(
            &target(Protocol::RemoteShell, &pairs),
            None,
            &CancellationToken::new(),
        )
        .await;

    assert_eq!(result.outcome(), ProbeOutcome::AllCandidatesExhausted);
    assert_eq!(result.attempts(), 4);
    assert_eq!(log.connects(), vec!["user0", "user1", "user2", "user3"]);
    assert_eq!(log.opened(), 0);
}

#[tokio::test]
async fn every_opened_session_is_closed_exactly_once() {
    let transport: ScriptedTransport = ScriptedTransport::new()
        .otherwise(ConnectBehavior::Accept)
        .script("ok", vec![Step::Exit(0)])
        .failing_command("broken");
    let log = transport.log();
    let prober: Prober<ScriptedTransport> = Prober::new(transport, ProbeConfig::default());
    let shell: ProbeTarget = target(Protocol::RemoteShell, &candidates(1));

    let batches: [Option<CommandBatch>; 3] = [
        None,
        Some(CommandBatch::single("ok")),
        Some(CommandBatch::new(["ok", "broken"]).unwrap()),
    ];
    for batch in &batches {
        prober
            .probe(&shell, batch.as_ref(), &CancellationToken::new())
            .await;
    }

    assert_eq!(log.opened(), 3);
    assert_eq!(log.closes(), 3);
}

#[tokio::test(start_paused = true)]
async fn execution_timeout_fires_at_the_configured_boundary() {
    let transport: ScriptedTransport = ScriptedTransport::new()
        .accept("user0", "pass0")
        .script(
            "slow",
            vec![Step::stdout("started\n"), Step::Pause(Duration::from_secs(10)), Step::Exit(0)],
        );
    let config: ProbeConfig = ProbeConfig::default().with_exec_timeout(Duration::from_secs(4));
    let prober: Prober<ScriptedTransport> = Prober::new(transport, config);

    let result: ProbeResult = prober
        .probe(
            &target(Protocol::RemoteShell, &candidates(1)),
            Some(&CommandBatch::single("slow")),
            &CancellationToken::new(),
        )
        .await;

    assert_eq!(result.execution(), Some(&ExecutionStatus::TimedOut));
    assert_eq!(result.outcome(), ProbeOutcome::ConnectionError);
    assert!(result.elapsed() >= Duration::from_secs(4));
    assert!(result.elapsed() < Duration::from_secs(5));
    assert_eq!(result.output().unwrap().stdout_lossy(), "started\n");
}

#[tokio::test(start_paused = true)]
async fn cancelling_mid_execution_ends_the_sweep_with_one_result() {
    let transport: ScriptedTransport = ScriptedTransport::new()
        .accept("user0", "pass0")
        .script("tail", vec![Step::stdout("part"), Step::Hang]);
    let log = transport.log();
    let prober: Prober<ScriptedTransport> = Prober::new(transport, ProbeConfig::default());
    let targets: Vec<ProbeTarget> = ["a", "b"]
        .iter()
        .map(|host| {
            ProbeTarget::new(
                Endpoint::with_default_port(*host, Protocol::RemoteShell),
                CredentialSet::from_pairs(Protocol::RemoteShell, candidates(1)).unwrap(),
            )
            .unwrap()
        })
        .collect();

    let cancel: CancellationToken = CancellationToken::new();
    let trigger: CancellationToken = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        trigger.cancel();
    });

    let reported: Mutex<Vec<String>> = Mutex::new(Vec::new());
    let reporter = |result: &ProbeResult| {
        reported.lock().unwrap().push(result.endpoint().host().to_string())
    };
    let results: Vec<ProbeResult> = prober
        .sweep(&targets, Some(&CommandBatch::single("tail")), &reporter, &cancel)
        .await;

    assert_eq!(results.len(), 1);
    let result: &ProbeResult = &results[0];
    assert_eq!(result.endpoint().host(), "a");
    assert_eq!(result.outcome(), ProbeOutcome::ConnectionError);
    assert_eq!(result.execution(), Some(&ExecutionStatus::Cancelled));
    assert_eq!(result.output().unwrap().stdout_lossy(), "part");
    assert_eq!(
        result.credential_used(),
        Some(&Credential::new("user0", "pass0"))
    );
    assert_eq!(*reported.lock().unwrap(), vec!["a"]);
    assert_eq!(log.connects(), vec!["user0"]);
    assert_eq!(log.closes(), 1);
}

#[tokio::test]
async fn sequential_commands_never_overlap() {
    let transport: ScriptedTransport = ScriptedTransport::new()
        .accept("user0", "pass0")
        .script("one", vec![Step::Pause(Duration::from_millis(10)), Step::Exit(0)])
        .script("two", vec![Step::Pause(Duration::from_millis(5)), Step::Exit(0)])
        .script("three", vec![Step::Exit(0)]);
    let log = transport.log();
    let config: ProbeConfig = ProbeConfig::default().with_submission(SubmissionMode::Sequential);
    let prober: Prober<ScriptedTransport> = Prober::new(transport, config);

    prober
        .probe(
            &target(Protocol::RemoteShell, &candidates(1)),
            Some(&CommandBatch::new(["one", "two", "three"]).unwrap()),
            &CancellationToken::new(),
        )
        .await;

    let order: Vec<Call> = log
        .calls()
        .into_iter()
        .filter(|call| matches!(call, Call::Execute { .. } | Call::Finished { .. }))
        .collect();
    let expected: Vec<Call> = ["one", "two", "three"]
        .iter()
        .flat_map(|command| {
            [
                Call::Execute { command: command.to_string() },
                Call::Finished { command: command.to_string() },
            ]
        })
        .collect();
    assert_eq!(order, expected);
}

#[tokio::test]
async fn database_wire_joins_with_its_own_separator() {
    let transport: ScriptedTransport = ScriptedTransport::new()
        .accept("reporting", "")
        .script("SELECT 1; SELECT 2", vec![Step::stdout("1\n2\n"), Step::Exit(0)]);
    let log = transport.log();
    let config: ProbeConfig = ProbeConfig::default().with_submission(SubmissionMode::Joined);
    let prober: Prober<ScriptedTransport> = Prober::new(transport, config);
    let pairs: Vec<(String, String)> = vec![("reporting".to_string(), String::new())];

    let result: ProbeResult = prober
        .probe(
            &target(Protocol::DatabaseWire, &pairs),
            Some(&CommandBatch::new(["SELECT 1", "SELECT 2"]).unwrap()),
            &CancellationToken::new(),
        )
        .await;

    assert!(result.is_authenticated());
    assert_eq!(log.executes(), vec!["SELECT 1; SELECT 2"]);
    assert_eq!(result.output().unwrap().stdout_lossy(), "1\n2\n");
}

#[test]
fn malformed_input_fails_before_any_io() {
    let err = CredentialSet::from_pairs(Protocol::RemoteShell, [("root", "toor"), ("admin", "")])
        .unwrap_err();
    assert!(matches!(err, ProbeError::InvalidCredential { index: 1, .. }));

    let err = CredentialSet::from_pairs(Protocol::DatabaseWire, [("", "x")]).unwrap_err();
    assert!(matches!(err, ProbeError::InvalidCredential { index: 0, .. }));

    assert_eq!(
        CommandBatch::new(Vec::<String>::new()).unwrap_err(),
        ProbeError::EmptyCommandBatch
    );
}
