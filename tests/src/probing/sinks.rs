#![cfg(test)]
use std::collections::HashMap;

use sesame_common::{
    Credential, Endpoint, NetworkFailurePolicy, ProbeConfig, ProbeOutcome, ProbeResult, Protocol,
    SubmissionMode,
};
use sesame_core::testing::{ScriptedTransport, Step};
use sesame_core::{
    ChannelReporter, CommandBatch, CredentialSet, JsonLinesReporter, ProbeTarget, Prober,
};
use tokio_util::sync::CancellationToken;

/// Builds targets from inventory strings the way a caller reading a file would.
fn inventory(endpoints: &str, credentials: &[&str]) -> anyhow::Result<Vec<ProbeTarget>> {
    let parsed: Vec<Credential> = credentials
        .iter()
        .map(|raw| raw.parse::<Credential>())
        .collect::<Result<_, _>>()?;

    sesame_common::models::endpoint::parse_endpoints(endpoints)?
        .into_iter()
        .map(|endpoint: Endpoint| -> anyhow::Result<ProbeTarget> {
            let set: CredentialSet = CredentialSet::new(endpoint.protocol(), parsed.clone())?;
            Ok(ProbeTarget::new(endpoint, set)?)
        })
        .collect()
}

#[tokio::test]
async fn sweep_writes_one_json_line_per_target() -> anyhow::Result<()> {
    let transport: ScriptedTransport = ScriptedTransport::new()
        .accept("deploy", "s3cr3t:with:colons")
        .script("uname -a", vec![Step::stdout("Linux\n"), Step::Exit(0)]);
    let prober: Prober<ScriptedTransport> = Prober::new(transport, ProbeConfig::default());
    let targets: Vec<ProbeTarget> = inventory(
        "shell://web1, shell://[fe80::1]:2222",
        &["root:toor", "deploy:s3cr3t:with:colons"],
    )?;
    let reporter: JsonLinesReporter<Vec<u8>> = JsonLinesReporter::new(Vec::new());

    let results: Vec<ProbeResult> = prober
        .sweep(
            &targets,
            Some(&CommandBatch::single("uname -a")),
            &reporter,
            &CancellationToken::new(),
        )
        .await;
    assert_eq!(results.len(), 2);

    let written: String = String::from_utf8(reporter.into_inner())?;
    let lines: Vec<serde_json::Value> = written
        .lines()
        .map(|line| serde_json::from_str::<serde_json::Value>(line))
        .collect::<Result<_, _>>()?;

    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["endpoint"]["host"], "web1");
    assert_eq!(lines[1]["endpoint"]["host"], "fe80::1");
    assert_eq!(lines[1]["endpoint"]["port"], 2222);
    for line in &lines {
        assert_eq!(line["outcome"], "authenticated");
        assert_eq!(line["credential_used"], "deploy");
        assert_eq!(line["attempts"], 2);
        assert_eq!(line["output"]["stdout"], "Linux\n");
        assert_eq!(line["output"]["exit_status"], 0);
    }
    assert!(!written.contains("s3cr3t"));
    Ok(())
}

#[tokio::test]
async fn channel_reporter_streams_results_as_they_finish() -> anyhow::Result<()> {
    let transport: ScriptedTransport = ScriptedTransport::new().accept("app", "app");
    let prober: Prober<ScriptedTransport> = Prober::new(transport, ProbeConfig::default());
    let targets: Vec<ProbeTarget> =
        inventory("db://db1, db://db2:5433", &["postgres:", "app:app"])?;
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();

    prober
        .sweep(
            &targets,
            None,
            &ChannelReporter::new(tx),
            &CancellationToken::new(),
        )
        .await;

    let mut seen: Vec<(String, ProbeOutcome)> = Vec::new();
    while let Ok(result) = rx.try_recv() {
        seen.push((result.endpoint().to_string(), result.outcome()));
    }
    assert_eq!(
        seen,
        vec![
            ("db://db1:5432".to_string(), ProbeOutcome::Authenticated),
            ("db://db2:5433".to_string(), ProbeOutcome::Authenticated),
        ]
    );
    Ok(())
}

#[test]
fn shell_inventory_rejects_secretless_candidates() {
    let err = inventory("shell://web1", &["root"]).unwrap_err();
    assert!(err.to_string().contains("non-empty secret"), "{err}");

    let targets: Vec<ProbeTarget> = inventory("db://warehouse", &["readonly"]).unwrap();
    assert_eq!(targets[0].endpoint().protocol(), Protocol::DatabaseWire);
}

#[test]
fn config_is_read_from_environment_overrides() -> anyhow::Result<()> {
    let env: HashMap<&str, &str> = HashMap::from([
        ("SESAME_CONNECT_TIMEOUT_SECS", "3"),
        ("SESAME_NETWORK_FAILURE_POLICY", "abort"),
        ("SESAME_SUBMISSION", "joined"),
    ]);
    let config: ProbeConfig = ProbeConfig::from_lookup(|key| env.get(key).map(|v| v.to_string()))?;

    assert_eq!(config.connect_timeout.as_secs(), 3);
    assert_eq!(config.network_failure_policy, NetworkFailurePolicy::AbortRun);
    assert_eq!(config.submission, SubmissionMode::Joined);

    let prober: Prober<ScriptedTransport> = Prober::new(ScriptedTransport::new(), config);
    assert_eq!(prober.config().exec_timeout.as_secs(), 300);
    Ok(())
}
