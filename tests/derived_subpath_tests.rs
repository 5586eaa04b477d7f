//! Derived subpath redirects end to end.

mod common;

use common::*;
use dispatch_navigator::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

fn resolver_x() -> DerivedSubpath {
    DerivedSubpath::sync("x", |_ctx| "abc".to_string())
}

#[test]
fn test_round_trip_replaces_history() {
    let (mut router, host) = active_router(RouterOptions::new());
    router
        .derived_subpath(resolver_x())
        .route("/test/$:x/:rest", vec![])
        .unwrap();

    let outcome = pollster::block_on(router.navigate("/test/the-rest")).unwrap();
    assert_eq!(outcome.path(), Some("/test/abc/the-rest"));
    let params = outcome.params().unwrap();
    assert_param_equals(params, "x", "abc");
    assert_param_equals(params, "rest", "the-rest");

    let last = host.last_record().unwrap();
    assert_eq!(last.path, "/test/abc/the-rest");
    assert!(last.replace);
    assert!(host.assigned().is_empty());
}

#[test]
fn test_direct_navigation_matches_without_redirect() {
    let calls = Calls::new();
    let (mut router, host) = active_router(RouterOptions::new());
    router
        .derived_subpath(resolver_x())
        .route("/test/$:x/:rest", vec![calls.mark("final")])
        .unwrap();

    let outcome = pollster::block_on(router.navigate("/test/abc/the-rest")).unwrap();
    assert_param_equals(outcome.params().unwrap(), "rest", "the-rest");
    assert_eq!(calls.take(), vec!["final"]);
    assert_eq!(host.record_paths(), vec![("/test/abc/the-rest".to_string(), false)]);
}

#[test]
fn test_prefix_appends_value_and_keeps_query() {
    let (mut router, host) = active_router(RouterOptions::new());
    router
        .derived_subpath(resolver_x())
        .route("/test/$:x", vec![])
        .unwrap();

    let outcome = pollster::block_on(router.navigate("/test?tab=2")).unwrap();
    assert_eq!(outcome.path(), Some("/test/abc"));
    let last = host.last_record().unwrap();
    assert_eq!(last.context.search, "tab=2");
    assert!(last.replace);
}

#[test]
fn test_prefix_fills_literal_sections_after_value() {
    let (mut router, host) = active_router(RouterOptions::new());
    router
        .derived_subpath(DerivedSubpath::sync("id", |_| "me".to_string()))
        .route("/user/$:id/profile", vec![])
        .unwrap();

    let outcome = pollster::block_on(router.navigate("/user")).unwrap();
    assert!(outcome.is_handled());
    assert_eq!(outcome.path(), Some("/user/me/profile"));
    assert_param_equals(outcome.params().unwrap(), "id", "me");
    assert!(host.assigned().is_empty());
    assert_eq!(
        host.record_paths(),
        vec![
            ("/user".to_string(), false),
            ("/user/me/profile".to_string(), true),
        ]
    );
}

#[test]
fn test_prefix_resolves_every_derived_section() {
    let order = Arc::new(Mutex::new(Vec::new()));
    let (first, second) = (order.clone(), order.clone());
    let (mut router, host) = active_router(RouterOptions::new());
    router
        .derived_subpath(DerivedSubpath::sync("org", move |_| {
            first.lock().unwrap().push("org");
            "acme".to_string()
        }))
        .derived_subpath(DerivedSubpath::sync("team", move |_| {
            second.lock().unwrap().push("team");
            "core".to_string()
        }))
        .route("/o/$:org/teams/$:team/board", vec![])
        .unwrap();

    let outcome = pollster::block_on(router.navigate("/o")).unwrap();
    assert_eq!(outcome.path(), Some("/o/acme/teams/core/board"));
    assert_eq!(*order.lock().unwrap(), vec!["org", "team"]);

    let last = host.last_record().unwrap();
    assert_eq!(last.path, "/o/acme/teams/core/board");
    assert!(last.replace);
    assert!(host.assigned().is_empty());
}

#[test]
fn test_resolver_sees_matched_context() {
    let (mut router, _host) = active_router(RouterOptions::new());
    router
        .derived_subpath(DerivedSubpath::sync("lang", |ctx| {
            ctx.search_params.get("lang").unwrap_or("en").to_string()
        }))
        .route("/docs/$:lang/:page", vec![])
        .unwrap();

    let outcome = pollster::block_on(router.navigate("/docs/intro?lang=fr")).unwrap();
    assert_eq!(outcome.path(), Some("/docs/fr/intro"));
}

#[test]
fn test_chained_derived_sections_resolve_left_to_right() {
    let order = Arc::new(Mutex::new(Vec::new()));
    let (first, second) = (order.clone(), order.clone());
    let (mut router, host) = active_router(RouterOptions::new());
    router
        .derived_subpath(DerivedSubpath::sync("org", move |_| {
            first.lock().unwrap().push("org");
            "acme".to_string()
        }))
        .derived_subpath(DerivedSubpath::sync("team", move |_| {
            second.lock().unwrap().push("team");
            "core".to_string()
        }))
        .route("/o/$:org/teams/$:team/board", vec![])
        .unwrap();

    let sources: Vec<&str> = router.routes().iter().map(RouteEntry::source).collect();
    assert_eq!(
        sources,
        vec![
            "/o",
            "/o/$:org/teams",
            "/o/$:org/teams/board",
            "/o/teams/$:team/board",
            "/o/$:org/teams/$:team/board",
        ]
    );

    let outcome = pollster::block_on(router.navigate("/o/teams/any/board")).unwrap();
    assert_eq!(outcome.path(), Some("/o/acme/teams/core/board"));
    let params = outcome.params().unwrap();
    assert_param_equals(params, "org", "acme");
    assert_param_equals(params, "team", "core");

    assert_eq!(*order.lock().unwrap(), vec!["org", "team"]);
    assert_eq!(
        host.record_paths(),
        vec![
            ("/o/teams/any/board".to_string(), false),
            ("/o/acme/teams/core/board".to_string(), true),
        ]
    );
}

#[test]
fn test_inner_rebuild_keeps_bound_outer_value() {
    let (mut router, _host) = active_router(RouterOptions::new());
    router
        .derived_subpath(DerivedSubpath::sync("org", |_| "acme".to_string()))
        .derived_subpath(DerivedSubpath::sync("team", |_| "core".to_string()))
        .route("/o/$:org/teams/$:team/board", vec![])
        .unwrap();

    let outcome = pollster::block_on(router.navigate("/o/globex/teams/board")).unwrap();
    assert_eq!(outcome.path(), Some("/o/globex/teams/core/board"));
}

#[test]
fn test_derived_under_base_path() {
    let (mut router, _host) = active_router(RouterOptions::new().base_path("/app"));
    router
        .derived_subpath(resolver_x())
        .route("/test/$:x/:rest", vec![])
        .unwrap();

    let outcome = pollster::block_on(router.navigate("/app/test/end")).unwrap();
    assert_eq!(outcome.path(), Some("/app/test/abc/end"));
}

#[test]
fn test_unknown_subpath_is_configuration_error() {
    let mut router = Router::new();
    let err = router.route("/test/$:missing", vec![]).unwrap_err();
    assert!(err.is_configuration());
    assert_eq!(
        err.to_string(),
        "No resolver registered for derived subpath 'missing'"
    );
}

#[tokio::test]
async fn test_async_resolver() {
    let (mut router, host) = active_router(RouterOptions::new());
    router
        .derived_subpath(DerivedSubpath::new("x", |_ctx| async {
            tokio::task::yield_now().await;
            Ok::<_, String>("later".to_string())
        }))
        .route("/test/$:x/:rest", vec![])
        .unwrap();

    let outcome = router.navigate("/test/end").await.unwrap();
    assert_eq!(outcome.path(), Some("/test/later/end"));
    assert_eq!(host.last_record().unwrap().path, "/test/later/end");
}

#[tokio::test]
async fn test_failed_resolver_reports_and_leaves_no_history() {
    let reported = Arc::new(AtomicUsize::new(0));
    let counter = reported.clone();
    let handlers = ErrorHandlers::new().on_error(move |ctx, err| {
        assert_eq!(ctx.path, "/test/end");
        assert!(matches!(err, NavigationError::Resolution { .. }));
        counter.fetch_add(1, Ordering::SeqCst);
    });

    let (mut router, host) = active_router(RouterOptions::new().error_handlers(handlers));
    router
        .derived_subpath(DerivedSubpath::new("x", |_ctx| async {
            tokio::task::yield_now().await;
            Err::<String, _>("backend unavailable")
        }))
        .route("/test/$:x/:rest", vec![])
        .unwrap();

    let err = router.navigate("/test/end").await.unwrap_err();
    assert_eq!(
        err,
        NavigationError::Resolution {
            subpath: "x".to_string(),
            message: "backend unavailable".to_string(),
        }
    );
    assert!(!err.is_configuration());
    assert_eq!(reported.load(Ordering::SeqCst), 1);
    assert!(host.records.borrow().is_empty());
    assert!(host.assigned().is_empty());
}

#[tokio::test]
async fn test_concurrent_navigations_are_independent() {
    let (mut router, host) = active_router(RouterOptions::new());
    router
        .derived_subpath(DerivedSubpath::new("x", |_ctx| async {
            tokio::task::yield_now().await;
            Ok::<_, String>("slow".to_string())
        }))
        .route("/test/$:x/:rest", vec![])
        .unwrap()
        .route("/plain", vec![])
        .unwrap();

    let (slow, fast) = futures::join!(router.navigate("/test/end"), router.navigate("/plain"));
    assert_eq!(slow.unwrap().path(), Some("/test/slow/end"));
    assert_eq!(fast.unwrap().path(), Some("/plain"));

    let paths: Vec<String> = host.record_paths().into_iter().map(|(path, _)| path).collect();
    assert!(paths.contains(&"/plain".to_string()));
    assert_eq!(paths.last().map(String::as_str), Some("/test/slow/end"));
}
