//! Shared fakes for pipeline integration tests.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use apcheck::error::LookupError;
use apcheck::index::PackageRecord;
use apcheck::logic::vercmp::{VersionComparator, VersionError};
use apcheck::sources::{Registry, RemoteVersion};
use rand::Rng;

/// What: Registry fake with scripted answers and per-name call counting.
///
/// Inputs:
/// - `answers`: name -> `Ok(version)` or `Err(())` for an induced failure.
/// - `max_delay_ms`: Upper bound of a random delay before each answer.
///
/// Output:
/// - `lookup` returns the scripted result; unknown names are `NotFound`.
pub struct FakeRegistry {
    answers: HashMap<String, Result<String, ()>>,
    max_delay_ms: u64,
    calls: Mutex<HashMap<String, usize>>,
}

impl FakeRegistry {
    pub fn new(answers: impl IntoIterator<Item = (String, Result<String, ()>)>) -> Self {
        Self {
            answers: answers.into_iter().collect(),
            max_delay_ms: 0,
            calls: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_random_delay(mut self, max_delay_ms: u64) -> Self {
        self.max_delay_ms = max_delay_ms;
        self
    }

    /// Number of lookups issued for `name`.
    pub fn calls_for(&self, name: &str) -> usize {
        self.calls
            .lock()
            .expect("calls lock")
            .get(name)
            .copied()
            .unwrap_or(0)
    }

    /// Total lookups issued.
    pub fn total_calls(&self) -> usize {
        self.calls.lock().expect("calls lock").values().sum()
    }
}

impl Registry for FakeRegistry {
    async fn lookup(&self, name: &str) -> Result<RemoteVersion, LookupError> {
        *self
            .calls
            .lock()
            .expect("calls lock")
            .entry(name.to_string())
            .or_default() += 1;
        if self.max_delay_ms > 0 {
            let ms = rand::rng().random_range(0..=self.max_delay_ms);
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }
        match self.answers.get(name) {
            Some(Ok(version)) => Ok(RemoteVersion {
                name: name.to_string(),
                version: version.clone(),
            }),
            Some(Err(())) => Err(LookupError::Transport("induced failure".into())),
            None => Err(LookupError::NotFound),
        }
    }
}

/// Comparator fake that returns a fixed ordering for any input.
pub struct FixedComparator(pub Ordering);

impl VersionComparator for FixedComparator {
    fn compare(&self, _local: &str, _remote: &str) -> Result<Ordering, VersionError> {
        Ok(self.0)
    }
}

pub fn rec(name: &str, version: &str) -> PackageRecord {
    PackageRecord::new(name, version)
}
