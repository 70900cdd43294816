//! Concrete end-to-end scenarios for classification and reconciliation.

use std::cmp::Ordering;
use std::sync::Arc;
use std::time::Duration;

use apcheck::index::RepositoryIndex;
use apcheck::logic::classify::classify;
use apcheck::logic::reconcile::{Outcome, ReconcileOptions, reconcile};
use apcheck::logic::vercmp::Vercmp;

use super::support::{FakeRegistry, FixedComparator, rec};

#[test]
/// What: Only packages missing from every official index are external.
///
/// Inputs:
/// - Installed `foo 1.0-1` and `bar 2.0-1`; the `core` index provides `foo`.
///
/// Output:
/// - External set is exactly `bar`.
fn scenario_a_classifies_bar_as_external() {
    let installed = vec![rec("foo", "1.0-1"), rec("bar", "2.0-1")];
    let core = RepositoryIndex::new("core", [rec("foo", "1.0-1")]);
    let partition = classify(&installed, &[core]);
    assert_eq!(partition.external, vec![rec("bar", "2.0-1")]);
    assert_eq!(partition.official, vec![rec("foo", "1.0-1")]);
}

#[tokio::test]
async fn scenario_b_equal_versions_are_current() {
    let registry = Arc::new(FakeRegistry::new([("bar".to_string(), Ok("2.0-1".to_string()))]));
    let out = reconcile(
        vec![rec("bar", "2.0-1")],
        registry,
        Arc::new(Vercmp),
        &ReconcileOptions::default(),
    )
    .await;
    assert_eq!(out.packages.len(), 1);
    assert!(matches!(out.packages[0].outcome, Outcome::Current));
}

#[tokio::test]
/// What: An older installed version yields `UpdateAvailable` with the remote version.
///
/// Inputs:
/// - `bar 1.9-1` installed; registry reports `2.0-1`; comparator fixed to `Less`.
///
/// Output:
/// - `UpdateAvailable("2.0-1")`.
async fn scenario_c_older_install_has_update() {
    let registry = Arc::new(FakeRegistry::new([("bar".to_string(), Ok("2.0-1".to_string()))]));
    let out = reconcile(
        vec![rec("bar", "1.9-1")],
        registry,
        Arc::new(FixedComparator(Ordering::Less)),
        &ReconcileOptions::default(),
    )
    .await;
    match &out.packages[0].outcome {
        Outcome::UpdateAvailable { remote_version } => assert_eq!(remote_version, "2.0-1"),
        other => panic!("expected UpdateAvailable, got {other:?}"),
    }
}

#[tokio::test]
async fn scenario_d_unknown_package_fails_lookup() {
    let registry = Arc::new(FakeRegistry::new([]));
    let out = reconcile(
        vec![rec("baz", "1.0-1")],
        registry,
        Arc::new(Vercmp),
        &ReconcileOptions::default(),
    )
    .await;
    assert!(matches!(
        out.packages[0].outcome,
        Outcome::LookupFailed {
            cause: apcheck::error::LookupError::NotFound
        }
    ));
}

#[tokio::test]
/// What: Induced failures stay isolated and the run terminates.
///
/// Inputs:
/// - 50 external packages, 10 failing lookups at random positions, random
///   delays up to 15ms, a pool of 8 workers.
///
/// Output:
/// - 40 non-failed and 10 `LookupFailed` outcomes, all within 10 seconds.
///
/// Details:
/// - The outer timeout turns a deadlock into a test failure instead of a hang.
async fn scenario_e_fifty_packages_ten_failures() {
    use rand::seq::SliceRandom;

    let mut positions: Vec<usize> = (0..50).collect();
    positions.shuffle(&mut rand::rng());
    let failing: Vec<usize> = positions.into_iter().take(10).collect();

    let records: Vec<_> = (0..50).map(|i| rec(&format!("ext{i:02}"), "1.0-1")).collect();
    let answers = records.iter().enumerate().map(|(i, r)| {
        let answer = if failing.contains(&i) {
            Err(())
        } else {
            Ok("1.0-1".to_string())
        };
        (r.name.clone(), answer)
    });
    let registry = Arc::new(FakeRegistry::new(answers).with_random_delay(15));
    let options = ReconcileOptions {
        concurrency: 8,
        lookup_timeout: Some(Duration::from_secs(2)),
    };

    let out = tokio::time::timeout(
        Duration::from_secs(10),
        reconcile(records, Arc::clone(&registry), Arc::new(Vercmp), &options),
    )
    .await
    .expect("reconciliation finished within the time budget");

    assert_eq!(out.packages.len(), 50);
    assert_eq!(out.failed(), 10);
    assert_eq!(out.current() + out.outdated(), 40);
    for i in failing {
        assert!(out.packages[i].outcome.is_failure(), "ext{i:02} should fail");
    }
    assert_eq!(registry.total_calls(), 50);
}
