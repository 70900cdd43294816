//! Property-style checks over randomized inputs.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;

use apcheck::index::{PackageRecord, RepositoryIndex};
use apcheck::logic::classify::classify;
use apcheck::logic::reconcile::{Outcome, ReconcileOptions, reconcile};
use rand::Rng;

use super::support::{FakeRegistry, FixedComparator, rec};

fn random_installed(n: usize) -> Vec<PackageRecord> {
    let mut rng = rand::rng();
    (0..n)
        .map(|i| rec(&format!("pkg{i:03}"), &format!("{}.{}-1", rng.random_range(0..5), i)))
        .collect()
}

#[test]
/// What: Classification is a total, disjoint, deterministic partition.
///
/// Inputs:
/// - 200 installed packages; two indexes each holding a random subset of names
///   with unrelated versions.
///
/// Output:
/// - Every record lands in exactly one half; official names are exactly those
///   present in some index; a second run and a reversed index order agree.
fn classification_is_a_partition() {
    let installed = random_installed(200);
    let mut rng = rand::rng();
    let pick = |rng: &mut rand::rngs::ThreadRng| -> Vec<PackageRecord> {
        installed
            .iter()
            .filter(|_| rng.random_bool(0.3))
            .map(|r| rec(&r.name, "999-1"))
            .collect()
    };
    let core = RepositoryIndex::new("core", pick(&mut rng));
    let extra = RepositoryIndex::new("extra", pick(&mut rng));
    let indexes = vec![core, extra];

    let part = classify(&installed, &indexes);
    assert_eq!(part.official.len() + part.external.len(), installed.len());

    let official: HashSet<&str> = part.official.iter().map(|r| r.name.as_str()).collect();
    let external: HashSet<&str> = part.external.iter().map(|r| r.name.as_str()).collect();
    assert!(official.is_disjoint(&external));
    for r in &installed {
        let in_index = indexes.iter().any(|idx| idx.contains(&r.name));
        assert_eq!(official.contains(r.name.as_str()), in_index, "{}", r.name);
    }

    assert_eq!(classify(&installed, &indexes), part);
    let reversed: Vec<_> = indexes.into_iter().rev().collect();
    assert_eq!(classify(&installed, &reversed), part);
}

#[tokio::test]
/// What: Every dispatched package is looked up exactly once and reported once.
///
/// Inputs:
/// - 120 packages, random delays, a pool of 7 workers.
///
/// Output:
/// - One result per package, names matching the input, one lookup each.
async fn each_package_is_processed_exactly_once() {
    let records = random_installed(120);
    let answers = records
        .iter()
        .map(|r| (r.name.clone(), Ok(r.version.clone())));
    let registry = Arc::new(FakeRegistry::new(answers).with_random_delay(5));
    let options = ReconcileOptions {
        concurrency: 7,
        lookup_timeout: None,
    };

    let out = reconcile(
        records.clone(),
        Arc::clone(&registry),
        Arc::new(FixedComparator(Ordering::Equal)),
        &options,
    )
    .await;

    assert_eq!(out.packages.len(), records.len());
    for (input, resolved) in records.iter().zip(&out.packages) {
        assert_eq!(input, &resolved.record);
        assert_eq!(registry.calls_for(&input.name), 1);
    }
}

#[tokio::test]
/// What: The outcome table holds for every comparator result.
///
/// Inputs:
/// - One package per ordering, each reconciled with a fixed comparator.
///
/// Output:
/// - `Equal` and `Greater` give `Current`; `Less` gives `UpdateAvailable`.
async fn outcome_follows_version_ordering() {
    for (ordering, expect_update) in [
        (Ordering::Equal, false),
        (Ordering::Greater, false),
        (Ordering::Less, true),
    ] {
        let registry = Arc::new(FakeRegistry::new([("p".to_string(), Ok("5-1".to_string()))]));
        let out = reconcile(
            vec![rec("p", "4-1")],
            registry,
            Arc::new(FixedComparator(ordering)),
            &ReconcileOptions::default(),
        )
        .await;
        let is_update = matches!(out.packages[0].outcome, Outcome::UpdateAvailable { .. });
        assert_eq!(is_update, expect_update, "{ordering:?}");
        assert!(!out.packages[0].outcome.is_failure());
    }
}
