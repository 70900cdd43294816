//! Full check runs against a mock AUR RPC server.

use std::sync::Arc;
use std::time::Duration;

use apcheck::app::{self, Context};
use apcheck::config::Settings;
use apcheck::error::LookupError;
use apcheck::index::{RepositoryIndex, StaticStore};
use apcheck::logic::reconcile::Outcome;
use apcheck::report::{self, RenderOptions};
use apcheck::sources::AurClient;
use httpmock::prelude::*;

use super::support::rec;

fn info_body(name: &str, version: &str) -> String {
    format!(
        r#"{{"version":5,"type":"multiinfo","resultcount":1,"results":[{{"Name":"{name}","Version":"{version}"}}]}}"#
    )
}

fn context_for(server: &MockServer) -> Context {
    Context {
        settings: Settings {
            registry_url: server.url("/rpc/"),
            concurrency: 3,
            lookup_timeout_secs: 5,
            ..Settings::default()
        },
        render: RenderOptions::default(),
    }
}

#[tokio::test]
/// What: A check run classifies, queries the registry, and reports every outcome.
///
/// Inputs:
/// - Installed: `pacman` (official), `yay` current, `paru` outdated, `gone`
///   unknown upstream, `odd` answered with an unknown envelope type.
///
/// Output:
/// - Four external results with the matching outcomes; no lookup for `pacman`.
async fn check_against_mock_registry() {
    let server = MockServer::start_async().await;
    let mut mocks = Vec::new();
    for (name, body) in [
        ("yay", info_body("yay", "12.3.5-1")),
        ("paru", info_body("paru", "2.0.4-1")),
        (
            "gone",
            r#"{"version":5,"type":"multiinfo","resultcount":0,"results":[]}"#.to_string(),
        ),
        ("odd", r#"{"version":5,"type":"suggest","results":[]}"#.to_string()),
    ] {
        let mock = server
            .mock_async(move |when, then| {
                when.method(GET)
                    .path("/rpc/")
                    .query_param("type", "info")
                    .query_param("arg", name);
                then.status(200)
                    .header("content-type", "application/json")
                    .body(body);
            })
            .await;
        mocks.push(mock);
    }
    let official_mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/rpc/").query_param("arg", "pacman");
            then.status(500);
        })
        .await;

    let store = StaticStore {
        installed: vec![
            rec("pacman", "7.0.0-1"),
            rec("yay", "12.3.5-1"),
            rec("paru", "2.0.3-1"),
            rec("gone", "1.0-1"),
            rec("odd", "1.0-1"),
        ],
        official: vec![RepositoryIndex::new("core", [rec("pacman", "7.0.0-1")])],
    };
    let ctx = context_for(&server);
    let registry = Arc::new(
        AurClient::new(ctx.settings.registry_url.clone(), Some(Duration::from_secs(5)))
            .expect("client builds"),
    );

    let result = app::check(store, registry, &ctx)
        .await
        .into_result()
        .expect("check completes");

    assert_eq!(result.packages.len(), 4);
    let outcome = |name: &str| {
        &result
            .packages
            .iter()
            .find(|p| p.record.name == name)
            .expect("package reported")
            .outcome
    };
    assert!(matches!(outcome("yay"), Outcome::Current));
    assert!(
        matches!(outcome("paru"), Outcome::UpdateAvailable { remote_version } if remote_version == "2.0.4-1")
    );
    assert!(matches!(
        outcome("gone"),
        Outcome::LookupFailed {
            cause: LookupError::NotFound
        }
    ));
    assert!(matches!(
        outcome("odd"),
        Outcome::LookupFailed {
            cause: LookupError::UnknownResponseType(_)
        }
    ));
    for mock in &mocks {
        mock.assert_async().await;
    }
    official_mock.assert_calls_async(0).await;

    let text = report::render_reconciliation(&result, RenderOptions::default());
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "[MISSING] gone (package not found upstream)");
    assert!(lines[1].starts_with("[MISSING] odd"));
    assert_eq!(lines[2], "[NEW VERSION] paru (2.0.3-1 => 2.0.4-1)");
    assert_eq!(lines[3], "[CURRENT] yay = 12.3.5-1");
}

#[tokio::test]
async fn unreachable_registry_fails_lookups_not_the_run() {
    let store = StaticStore {
        installed: vec![rec("a", "1-1"), rec("b", "1-1")],
        official: Vec::new(),
    };
    let ctx = Context {
        settings: Settings {
            registry_url: "http://127.0.0.1:9/rpc/".into(),
            lookup_timeout_secs: 2,
            ..Settings::default()
        },
        render: RenderOptions::default(),
    };
    let registry = Arc::new(
        AurClient::new(ctx.settings.registry_url.clone(), ctx.settings.lookup_timeout())
            .expect("client builds"),
    );

    let result = app::check(store, registry, &ctx)
        .await
        .into_result()
        .expect("run still completes");
    assert_eq!(result.failed(), 2);
}
