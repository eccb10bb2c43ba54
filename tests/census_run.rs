//! End-to-end runs of the census over scripted sources.

use std::time::Duration;

use request_census::error_handling::ConfigError;
use request_census::source::{ReplaySource, Script};
use request_census::{run_census, Config, TargetOutcome};
use tokio_util::sync::CancellationToken;

fn config_for(targets: &[&str], timeout_ms: u64) -> Config {
    Config {
        targets: targets.iter().map(|t| t.to_string()).collect(),
        timeout_ms,
        ..Default::default()
    }
}

#[tokio::test(start_paused = true)]
async fn test_scenario_mixed_outcomes() {
    let mut source = ReplaySource::new().with_script(
        "https://a.com/",
        Script::new()
            .load()
            .request("https://a.com/x")
            .failed("https://a.com/x")
            .request("http://b.com"),
    );

    let report = run_census(
        &config_for(&["https://a.com/"], 1_000),
        &mut source,
        CancellationToken::new(),
    )
    .await
    .expect("Run should complete");

    assert_eq!(report.targets.len(), 1);
    let target = report.targets[0].report().expect("Target should complete");
    assert_eq!(target.target, "https://a.com/");
    assert_eq!(target.requests.total, 1);
    assert_eq!(target.requests.success, 0);
    assert_eq!(target.requests.failure, 1);
    assert_eq!(target.domains.total, 2);
    assert_eq!(target.domains.success, 1);
    assert_eq!(target.domains.failure, 1);
    // Not verbose
    assert_eq!(target.listing().count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_navigation_timeout_is_isolated_per_target() {
    let mut source = ReplaySource::new()
        .with_script("https://first.com/", Script::new().load().request("https://first.com/"))
        .with_script(
            "https://never-loads.com/",
            Script::new().request("https://never-loads.com/"),
        )
        .with_script("https://last.com/", Script::new().load().request("https://last.com/"));

    let report = run_census(
        &config_for(
            &["https://first.com/", "https://never-loads.com/", "https://last.com/"],
            2_000,
        ),
        &mut source,
        CancellationToken::new(),
    )
    .await
    .expect("Run should complete despite the timeout");

    assert_eq!(report.completed(), 2);
    assert_eq!(report.failed(), 1);
    match &report.targets[1] {
        TargetOutcome::Failed { target, kind, error } => {
            assert_eq!(target, "https://never-loads.com/");
            assert_eq!(kind, "Navigation timeout");
            assert!(error.contains("timed out"));
        }
        other => panic!("Expected the second target to fail, got {:?}", other),
    }
    assert_eq!(
        report.targets[2].report().map(|r| r.requests.total),
        Some(1)
    );

    // Every opened target is released, including the failed one
    assert_eq!(source.opened().len(), 3);
    assert_eq!(source.closed(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_malformed_identity_does_not_abort_window() {
    let mut source = ReplaySource::new().with_script(
        "https://a.com/",
        Script::new()
            .load()
            .request("not-a-url")
            .request("https://a.com/app.js"),
    );

    let report = run_census(
        &config_for(&["https://a.com/"], 500),
        &mut source,
        CancellationToken::new(),
    )
    .await
    .expect("Run should complete");

    let target = report.targets[0].report().expect("Target should complete");
    assert_eq!(target.malformed, 1);
    assert_eq!(target.requests.total, 1);
    assert_eq!(target.domains.total, 1);
}

#[tokio::test(start_paused = true)]
async fn test_malformed_identity_recorded_when_rule_allows() {
    let mut source = ReplaySource::new().with_script(
        "https://a.com/",
        Script::new().load().failed("not-a-url"),
    );
    let mut config = config_for(&["https://a.com/"], 500);
    config.include_schemes.clear();
    config.verbose = true;

    let report = run_census(&config, &mut source, CancellationToken::new())
        .await
        .expect("Run should complete");

    let target = report.targets[0].report().expect("Target should complete");
    assert_eq!(target.listing().collect::<Vec<_>>(), vec![("not-a-url", false)]);
    assert_eq!(target.domains.total, 0);
}

#[tokio::test(start_paused = true)]
async fn test_targets_are_processed_in_order_with_independent_state() {
    let mut source = ReplaySource::new()
        .with_script(
            "https://one.com/",
            Script::new().load().request("https://shared.cdn/lib.js"),
        )
        .with_script(
            "https://two.com/",
            Script::new().load().failed("https://shared.cdn/lib.js"),
        );

    let report = run_census(
        &config_for(&["https://one.com/", "https://two.com/"], 100),
        &mut source,
        CancellationToken::new(),
    )
    .await
    .expect("Run should complete");

    assert_eq!(source.opened(), ["https://one.com/", "https://two.com/"]);
    let first = report.targets[0].report().unwrap();
    let second = report.targets[1].report().unwrap();
    assert_eq!((first.requests.success, first.requests.failure), (1, 0));
    assert_eq!((second.requests.success, second.requests.failure), (0, 1));
}

#[tokio::test(start_paused = true)]
async fn test_targets_are_normalized() {
    let mut source =
        ReplaySource::new().with_script("https://a.com", Script::new().load());

    let report = run_census(
        &config_for(&["a.com", "not a url!!!"], 100),
        &mut source,
        CancellationToken::new(),
    )
    .await
    .expect("Run should complete");

    assert_eq!(source.opened(), ["https://a.com"]);
    assert_eq!(report.targets.len(), 1);
}

#[tokio::test]
async fn test_invalid_configuration_aborts_before_opening() {
    let mut source = ReplaySource::new();

    let err = run_census(
        &config_for(&[], 1_000),
        &mut source,
        CancellationToken::new(),
    )
    .await
    .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ConfigError>(),
        Some(ConfigError::NoTargets)
    ));

    let err = run_census(
        &config_for(&["https://a.com/"], 0),
        &mut source,
        CancellationToken::new(),
    )
    .await
    .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ConfigError>(),
        Some(ConfigError::NonPositiveTimeout)
    ));

    assert!(source.opened().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_run_starts_no_further_targets() {
    let mut source = ReplaySource::new()
        .with_script("https://a.com/", Script::new().load())
        .with_script("https://b.com/", Script::new().load());
    let cancel = CancellationToken::new();
    cancel.cancel();

    let report = run_census(
        &config_for(&["https://a.com/", "https://b.com/"], 1_000),
        &mut source,
        cancel,
    )
    .await
    .expect("Run should complete");

    assert!(report.targets.is_empty());
    assert!(source.opened().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_report_serializes_to_json() {
    let mut source = ReplaySource::new()
        .with_script("https://a.com/", Script::new().load().request("https://a.com/"))
        .with_script("https://slow.com/", Script::new().wait(Duration::from_secs(60)).load());

    let report = run_census(
        &config_for(&["https://a.com/", "https://slow.com/"], 1_000),
        &mut source,
        CancellationToken::new(),
    )
    .await
    .expect("Run should complete");

    let json = serde_json::to_value(&report).expect("Report should serialize");
    assert_eq!(json["targets"][0]["status"], "completed");
    assert_eq!(json["targets"][0]["requests"]["total"], 1);
    assert_eq!(json["targets"][1]["status"], "failed");
    assert_eq!(json["targets"][1]["target"], "https://slow.com/");
}
