//! apcheck application runtime: context setup, store lifetime, and the three modes.
//!
//! `main` stays minimal; everything between argument parsing and the exit
//! code lives here.

use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use crate::args::{Args, Mode};
use crate::config::{Settings, paths};
use crate::error::AppError;
use crate::index::{PackageRecord, PackageStore, PacmanStore};
use crate::logic::classify::classify;
use crate::logic::reconcile::{Reconciliation, reconcile};
use crate::logic::vercmp::Vercmp;
use crate::report::{self, RenderOptions};
use crate::sources::{AurClient, Registry};

/// What: Immutable run-wide configuration.
///
/// Inputs:
/// - Built once at startup from `settings.conf` and the command line.
///
/// Output:
/// - Shared by reference with every mode; never mutated afterwards.
#[derive(Clone, Debug)]
pub struct Context {
    /// Effective settings (file values overlaid with flags).
    pub settings: Settings,
    /// Console rendering switches.
    pub render: RenderOptions,
}

impl Context {
    /// What: Load settings from `config_dir` and apply command-line overrides.
    ///
    /// Inputs:
    /// - `args`: Parsed command line.
    /// - `config_dir`: Directory holding `settings.conf`.
    ///
    /// Output:
    /// - Ready context.
    ///
    /// # Errors
    /// - `AppError::Config` when an existing settings file cannot be read.
    pub fn load(args: &Args, config_dir: &Path) -> Result<Self, AppError> {
        let file = Settings::load(&paths::settings_path(config_dir))?;
        let settings = args.apply_to(file);
        tracing::info!(
            registry = %settings.registry_url,
            concurrency = settings.concurrency,
            timeout_secs = settings.lookup_timeout_secs,
            official_repos = ?settings.official_repos,
            "settings resolved"
        );
        Ok(Self {
            settings,
            render: RenderOptions {
                color: args.color(),
                outdated_only: args.outdated,
            },
        })
    }
}

/// What: Work produced while a store was open, plus the outcome of releasing it.
///
/// Inputs:
/// - Returned by `check` and `list_external`.
///
/// Output:
/// - `value` is complete even when `release` failed.
///
/// Details:
/// - Callers emit `value` first and only then surface `release`.
#[derive(Debug)]
#[must_use]
pub struct Released<T> {
    /// What the run produced.
    pub value: T,
    /// Result of releasing the store.
    pub release: Result<(), AppError>,
}

impl<T> Released<T> {
    /// Collapse into a plain `Result`, dropping `value` on release failure.
    ///
    /// # Errors
    /// - `AppError::Release` when the store could not be released.
    pub fn into_result(self) -> Result<T, AppError> {
        self.release.map(|()| self.value)
    }
}

/// What: Scoped ownership of an open package store.
///
/// Inputs:
/// - An acquired store.
///
/// Output:
/// - Read access while alive; `finish` releases and reports the outcome.
///
/// Details:
/// - If the guard is dropped without `finish` (early return or unwind),
///   the store is still released and a failure is logged.
struct StoreGuard<S: PackageStore> {
    /// Always `Some` until `finish` or `drop` takes it.
    store: Option<S>,
}

impl<S: PackageStore> StoreGuard<S> {
    const fn new(store: S) -> Self {
        Self { store: Some(store) }
    }

    /// Borrow the open store.
    fn get(&self) -> &S {
        match &self.store {
            Some(store) => store,
            None => unreachable!("store guard used after release"),
        }
    }

    /// Release the store, mapping failure to `AppError::Release`.
    fn finish(mut self) -> Result<(), AppError> {
        match self.store.take() {
            Some(store) => store.release().map_err(AppError::Release),
            None => Ok(()),
        }
    }
}

impl<S: PackageStore> Drop for StoreGuard<S> {
    fn drop(&mut self) {
        if let Some(store) = self.store.take()
            && let Err(e) = store.release()
        {
            tracing::error!(error = %e, "failed to release package store");
        }
    }
}

/// Installed packages of `store` that no official index provides.
fn external_of<S: PackageStore>(store: &S) -> Vec<PackageRecord> {
    classify(store.installed_packages(), store.official_indexes()).external
}

/// What: Run the reconciliation over an already opened store.
///
/// Inputs:
/// - `store`: Package store; released before returning.
/// - `registry`: Remote lookup capability.
/// - `ctx`: Run context.
///
/// Output:
/// - The completed reconciliation and the store release result.
///
/// Details:
/// - Lookup failures never surface as errors; they are part of the result.
/// - A failed release leaves the reconciliation intact.
pub async fn check<S, R>(store: S, registry: Arc<R>, ctx: &Context) -> Released<Reconciliation>
where
    S: PackageStore,
    R: Registry,
{
    let guard = StoreGuard::new(store);
    let external = external_of(guard.get());
    tracing::info!(external = external.len(), "checking external packages");
    let value = reconcile(
        external,
        registry,
        Arc::new(Vercmp),
        &ctx.settings.reconcile_options(),
    )
    .await;
    Released {
        value,
        release: guard.finish(),
    }
}

/// What: List installed packages that no official index provides.
///
/// Inputs:
/// - `store`: Package store; released before returning.
///
/// Output:
/// - External packages in store order and the store release result.
pub fn list_external<S: PackageStore>(store: S) -> Released<Vec<PackageRecord>> {
    let guard = StoreGuard::new(store);
    let value = external_of(guard.get());
    Released {
        value,
        release: guard.finish(),
    }
}

/// Open the pacman-backed store off the async runtime.
async fn open_store(settings: &Settings) -> Result<PacmanStore, AppError> {
    let repos = settings.official_repos.clone();
    tokio::task::spawn_blocking(move || PacmanStore::open(&repos))
        .await
        .map_err(|e| AppError::Runtime(e.to_string()))?
        .map_err(AppError::Store)
}

/// Build the AUR client described by `settings`.
fn registry_client(settings: &Settings) -> Result<AurClient, AppError> {
    AurClient::new(settings.registry_url.clone(), settings.lookup_timeout())
        .map_err(|e| AppError::Runtime(e.to_string()))
}

/// What: Build the registry client, then open the store and check it.
///
/// Inputs:
/// - `ctx`: Run context.
/// - `client`: Builds the registry client.
/// - `open`: Opens the package store.
///
/// Output:
/// - The finished check and its release result.
///
/// # Errors
/// - Client setup or store initialization failures. If the client cannot be
///   built, `open` is never called.
async fn check_with<S, R, Open, Fut>(
    ctx: &Context,
    client: impl FnOnce() -> Result<R, AppError>,
    open: Open,
) -> Result<Released<Reconciliation>, AppError>
where
    S: PackageStore,
    R: Registry,
    Open: FnOnce() -> Fut,
    Fut: Future<Output = Result<S, AppError>>,
{
    let registry = Arc::new(client()?);
    let store = open().await?;
    Ok(check(store, registry, ctx).await)
}

/// What: Execute the selected mode and print its output.
///
/// Inputs:
/// - `ctx`: Run context.
/// - `mode`: Mode chosen on the command line.
///
/// Output:
/// - `Ok(())` once output has been written.
///
/// # Errors
/// - Store initialization or release failures, client setup failures, and
///   (search mode only) the registry error.
///
/// Details:
/// - Check mode builds the registry client before opening the store.
/// - On release failure the output is still written before the error returns.
pub async fn run(ctx: &Context, mode: Mode) -> Result<(), AppError> {
    match mode {
        Mode::Check => {
            let checked = check_with(
                ctx,
                || registry_client(&ctx.settings),
                || open_store(&ctx.settings),
            )
            .await?;
            print!("{}", report::render_reconciliation(&checked.value, ctx.render));
            checked.release?;
        }
        Mode::ListExternal => {
            let store = open_store(&ctx.settings).await?;
            let listed = list_external(store);
            for pkg in &listed.value {
                println!("{}", pkg.name);
            }
            listed.release?;
        }
        Mode::Search(pattern) => {
            let client = registry_client(&ctx.settings)?;
            let results = client.search(&pattern).await?;
            tracing::info!(pattern = %pattern, results = results.len(), "search complete");
            print!("{}", report::render_search(&results, ctx.render.color));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{LookupError, StoreError};
    use crate::index::RepositoryIndex;
    use crate::logic::reconcile::Outcome;
    use crate::sources::RemoteVersion;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Store whose release outcome and call count are observable.
    struct CountingStore {
        installed: Vec<PackageRecord>,
        official: Vec<RepositoryIndex>,
        releases: Arc<AtomicUsize>,
        fail: bool,
    }

    impl CountingStore {
        fn new(releases: &Arc<AtomicUsize>, fail: bool) -> Self {
            Self {
                installed: Vec::new(),
                official: Vec::new(),
                releases: Arc::clone(releases),
                fail,
            }
        }
    }

    impl PackageStore for CountingStore {
        fn installed_packages(&self) -> &[PackageRecord] {
            &self.installed
        }

        fn official_indexes(&self) -> &[RepositoryIndex] {
            &self.official
        }

        fn release(self) -> Result<(), StoreError> {
            self.releases.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(StoreError::Command {
                    command: "release".into(),
                    message: "busy".into(),
                })
            } else {
                Ok(())
            }
        }
    }

    /// Registry that knows every package at version `2.0-1`, except `gone`.
    struct FixedRegistry;

    impl Registry for FixedRegistry {
        async fn lookup(&self, name: &str) -> Result<RemoteVersion, LookupError> {
            if name == "gone" {
                return Err(LookupError::NotFound);
            }
            Ok(RemoteVersion {
                name: name.to_string(),
                version: "2.0-1".into(),
            })
        }
    }

    fn failing_store_with_packages(releases: &Arc<AtomicUsize>) -> CountingStore {
        CountingStore {
            installed: vec![
                PackageRecord::new("pacman", "7.0.0-1"),
                PackageRecord::new("old", "1.0-1"),
                PackageRecord::new("gone", "1.0-1"),
            ],
            official: vec![RepositoryIndex::new(
                "core",
                [PackageRecord::new("pacman", "7.0.0-1")],
            )],
            ..CountingStore::new(releases, true)
        }
    }

    #[test]
    /// What: The guard releases exactly once on both explicit and drop paths.
    ///
    /// Inputs:
    /// - One guard finished explicitly, one dropped.
    ///
    /// Output:
    /// - Two releases total; the failing explicit release maps to `AppError::Release`.
    fn guard_releases_once_per_store() {
        let releases = Arc::new(AtomicUsize::new(0));
        let guard = StoreGuard::new(CountingStore::new(&releases, true));
        assert!(matches!(guard.finish(), Err(AppError::Release(_))));
        assert_eq!(releases.load(Ordering::SeqCst), 1);

        drop(StoreGuard::new(CountingStore::new(&releases, true)));
        assert_eq!(releases.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    /// What: A failed release keeps every outcome of the finished check.
    ///
    /// Inputs:
    /// - Store with one official and two external packages whose release fails.
    ///
    /// Output:
    /// - Both external outcomes are present and `release` is `AppError::Release`.
    ///
    /// Details:
    /// - The store is released exactly once, after reconciliation.
    async fn check_keeps_outcomes_when_release_fails() {
        let releases = Arc::new(AtomicUsize::new(0));
        let ctx = Context {
            settings: Settings::default(),
            render: RenderOptions::default(),
        };

        let checked = check(
            failing_store_with_packages(&releases),
            Arc::new(FixedRegistry),
            &ctx,
        )
        .await;

        assert!(matches!(checked.release, Err(AppError::Release(_))));
        assert_eq!(releases.load(Ordering::SeqCst), 1);
        let packages = &checked.value.packages;
        assert_eq!(packages.len(), 2);
        assert_eq!(packages[0].record.name, "old");
        assert!(matches!(
            &packages[0].outcome,
            Outcome::UpdateAvailable { remote_version } if remote_version == "2.0-1"
        ));
        assert_eq!(packages[1].record.name, "gone");
        assert!(matches!(
            packages[1].outcome,
            Outcome::LookupFailed {
                cause: LookupError::NotFound
            }
        ));
        let text = report::render_reconciliation(&checked.value, RenderOptions::default());
        assert!(text.contains("[NEW VERSION] old (1.0-1 => 2.0-1)"));
    }

    #[tokio::test]
    /// What: No store is opened when the registry client cannot be built.
    ///
    /// Inputs:
    /// - A failing client builder; a store opener that counts its calls.
    ///
    /// Output:
    /// - The client error is returned, the opener never ran, nothing was released.
    async fn client_failure_never_opens_the_store() {
        let releases = Arc::new(AtomicUsize::new(0));
        let opened = AtomicUsize::new(0);
        let ctx = Context {
            settings: Settings::default(),
            render: RenderOptions::default(),
        };

        let result = check_with(
            &ctx,
            || Err::<FixedRegistry, _>(AppError::Runtime("no tls backend".into())),
            || async {
                opened.fetch_add(1, Ordering::SeqCst);
                Ok::<_, AppError>(CountingStore::new(&releases, false))
            },
        )
        .await;

        assert!(matches!(result, Err(AppError::Runtime(_))));
        assert_eq!(opened.load(Ordering::SeqCst), 0);
        assert_eq!(releases.load(Ordering::SeqCst), 0);

        let checked = check_with(
            &ctx,
            || Ok(FixedRegistry),
            || async { Ok::<_, AppError>(CountingStore::new(&releases, false)) },
        )
        .await
        .expect("store opens");
        assert!(checked.into_result().is_ok_and(|r| r.packages.is_empty()));
        assert_eq!(releases.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn list_external_keeps_names_when_release_fails() {
        let releases = Arc::new(AtomicUsize::new(0));
        let listed = list_external(failing_store_with_packages(&releases));
        let names: Vec<&str> = listed.value.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["old", "gone"]);
        assert!(matches!(listed.release, Err(AppError::Release(_))));
        assert_eq!(releases.load(Ordering::SeqCst), 1);
        assert!(matches!(
            list_external(CountingStore::new(&releases, false)).into_result(),
            Ok(v) if v.is_empty()
        ));
    }

    #[test]
    fn context_applies_flags_over_missing_file() {
        use clap::Parser;
        let tmp = tempfile::tempdir().expect("tempdir");
        let args = Args::try_parse_from(["apcheck", "--concurrency", "3", "--no-color", "--outdated"])
            .expect("args");
        let ctx = Context::load(&args, tmp.path()).expect("context");
        assert_eq!(ctx.settings.concurrency, 3);
        assert!(!ctx.render.color);
        assert!(ctx.render.outdated_only);
    }
}
