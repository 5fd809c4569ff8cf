#![cfg(unix)]

mod common;

use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use archcrack::common::ArchiveTarget;
use archcrack::crack::{Attempt, CrackEngine, CrackOutcome, PasswordTester, ToolProbe};
use archcrack::dictionary::PasswordSet;
use archcrack::tool::markers::{MarkerRule, OutputClassifier, Verdict};
use archcrack::tool::ArchiveTool;
use archcrack::CrackError;
use tempfile::tempdir;

fn tool_probe(tool: &std::path::Path, budget: Duration) -> ToolProbe {
    ToolProbe::new(ArchiveTool::new(tool), budget)
}

#[tokio::test]
async fn stops_at_first_accepted_password() {
    let dir = tempdir().unwrap();
    let tool = common::fake_tool(dir.path());
    let archive = common::dummy_archive(dir.path(), "secret.7z");
    let candidates: PasswordSet = ["alpha", "beta", common::PASSWORD, "gamma"].into_iter().collect();

    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_cb = Arc::clone(&seen);
    let engine = CrackEngine::new(tool_probe(&tool, Duration::from_secs(10)))
        .with_progress(move |p| seen_cb.lock().unwrap().push(p.index));

    let report = engine.crack(&ArchiveTarget::resolve(&archive), &candidates).await.unwrap();

    assert_eq!(report.outcome, CrackOutcome::Accepted { password: common::PASSWORD.into() });
    assert_eq!(report.tried, 4);
    assert_eq!(common::logged_passwords(dir.path()), vec!["", "alpha", "beta", common::PASSWORD]);
    assert_eq!(*seen.lock().unwrap(), vec![1, 2, 3]);
}

#[tokio::test]
async fn exhausts_dictionary_without_match() {
    let dir = tempdir().unwrap();
    let tool = common::fake_tool(dir.path());
    let archive = common::dummy_archive(dir.path(), "secret.zip");
    let candidates: PasswordSet = ["one", "two", "three"].into_iter().collect();

    let engine = CrackEngine::new(tool_probe(&tool, Duration::from_secs(10)));
    let report = engine.crack(&ArchiveTarget::resolve(&archive), &candidates).await.unwrap();

    assert!(matches!(report.outcome, CrackOutcome::Exhausted { tried: 4, .. }));
    assert_eq!(report.outcome.password(), None);
    assert_eq!(common::logged_passwords(dir.path()), vec!["", "one", "two", "three"]);
}

#[tokio::test]
async fn cancelled_before_start_runs_nothing() {
    let dir = tempdir().unwrap();
    let tool = common::fake_tool(dir.path());
    let archive = common::dummy_archive(dir.path(), "secret.rar");
    let candidates: PasswordSet = ["one"].into_iter().collect();

    let engine = CrackEngine::new(tool_probe(&tool, Duration::from_secs(10)))
        .with_cancel_flag(Arc::new(AtomicBool::new(true)));
    let report = engine.crack(&ArchiveTarget::resolve(&archive), &candidates).await.unwrap();

    assert!(matches!(report.outcome, CrackOutcome::Cancelled { tried: 0, .. }));
    assert!(common::logged_passwords(dir.path()).is_empty());
}

#[tokio::test]
async fn tool_output_is_classified() {
    let dir = tempdir().unwrap();
    let tool = common::fake_tool(dir.path());
    let archive = common::dummy_archive(dir.path(), "secret.7z");
    let tester = tool_probe(&tool, Duration::from_secs(10));

    assert_eq!(
        tester.test(&archive, common::PASSWORD).await.unwrap(),
        Attempt::Finished(Verdict::Success)
    );
    assert_eq!(
        tester.test(&archive, "nope").await.unwrap(),
        Attempt::Finished(Verdict::Failure)
    );
}

#[tokio::test]
async fn slow_test_is_killed_and_accepted() {
    let dir = tempdir().unwrap();
    let tool = common::hanging_tool(dir.path());
    let archive = common::dummy_archive(dir.path(), "slow.7z");
    let tester = tool_probe(&tool, Duration::from_millis(500));

    assert_eq!(tester.test(&archive, "x").await.unwrap(), Attempt::TimedOut);

    let pid = common::read_pid(&dir.path().join("pid"));
    assert!(common::wait_until_gone(pid), "timed out test process {} still running", pid);

    // The default policy treats the timeout as the answer.
    let engine = CrackEngine::new(tester);
    let report = engine
        .crack(&ArchiveTarget::resolve(&archive), &PasswordSet::new())
        .await
        .unwrap();
    assert_eq!(report.outcome, CrackOutcome::Accepted { password: String::new() });
}

#[tokio::test]
async fn missing_tool_is_an_error() {
    let dir = tempdir().unwrap();
    let archive = common::dummy_archive(dir.path(), "secret.7z");
    let engine = CrackEngine::new(tool_probe(&dir.path().join("no-such-7z"), Duration::from_secs(1)));

    let err = engine
        .crack(&ArchiveTarget::resolve(&archive), &PasswordSet::new())
        .await
        .unwrap_err();
    assert!(matches!(err, CrackError::Spawn { .. }));
}

#[tokio::test]
async fn timeout_kills_processes_the_tool_started() {
    let dir = tempdir().unwrap();
    let tool = common::wrapping_tool(dir.path());
    let archive = common::dummy_archive(dir.path(), "slow.7z");

    let attempt = tool_probe(&tool, Duration::from_millis(500)).test(&archive, "x").await.unwrap();
    assert_eq!(attempt, Attempt::TimedOut);

    let grandchild = common::read_pid(&dir.path().join("grandchild"));
    assert!(common::wait_until_gone(grandchild), "grandchild {} still running", grandchild);
}

#[tokio::test]
async fn held_pipes_count_against_the_budget() {
    let dir = tempdir().unwrap();
    let tool = common::lingering_tool(dir.path());
    let archive = common::dummy_archive(dir.path(), "secret.7z");
    let budget = Duration::from_millis(500);

    let started = Instant::now();
    let attempt = tool_probe(&tool, budget).test(&archive, "wrong").await.unwrap();
    let took = started.elapsed();

    assert_eq!(attempt, Attempt::TimedOut);
    assert!(took < Duration::from_secs(3), "test took {:?} with a {:?} budget", took, budget);
    let straggler = common::read_pid(&dir.path().join("straggler"));
    assert!(common::wait_until_gone(straggler), "background process {} still running", straggler);
}

#[tokio::test]
async fn custom_markers_change_the_verdict() {
    let dir = tempdir().unwrap();
    let tool = common::printing_tool(dir.path(), "Falsches Kennwort");
    let archive = common::dummy_archive(dir.path(), "secret.7z");

    let stock = tool_probe(&tool, Duration::from_secs(10));
    assert_eq!(stock.budget(), Duration::from_secs(10));
    assert_eq!(
        stock.test(&archive, "x").await.unwrap(),
        Attempt::Finished(Verdict::Inconclusive)
    );

    let localised = stock.with_classifier(
        OutputClassifier::default().with_rule(MarkerRule::new("Falsches Kennwort", Verdict::Failure)),
    );
    assert_eq!(
        localised.test(&archive, "x").await.unwrap(),
        Attempt::Finished(Verdict::Failure)
    );

    let report = CrackEngine::new(localised)
        .crack(&ArchiveTarget::resolve(&archive), &PasswordSet::new())
        .await
        .unwrap();
    assert!(matches!(report.outcome, CrackOutcome::Exhausted { tried: 1, .. }));
}
