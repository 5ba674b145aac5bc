mod common;

use common::{config_row, loaded_service, rec, ScriptedExecutor};
use dataserve_sdk::{ConfigError, DataError, DataService, RequestContext};
use serde_json::json;
use std::sync::Arc;

/// A reload that fails validation must leave the previously loaded registry
/// serving requests.
#[tokio::test]
async fn a_failed_reload_keeps_the_previous_registry() {
    let exec = Arc::new(ScriptedExecutor::new());
    let service = loaded_service(&exec, vec![config_row("news")]).await;

    exec.clear_responses();
    let orphan = json!({
        "id": 3,
        "pid": 55,
        "namespace": "lost",
        "type": "CRUD",
        "table_name": "lost",
        "stat": 0
    });
    exec.respond("ds_common_api", vec![rec(orphan)]);

    let err = service
        .reload_config()
        .await
        .expect_err("orphan row must fail the reload");
    assert!(matches!(
        err,
        DataError::Config(ConfigError::OrphanedNamespace { .. })
    ));

    // the old namespace still resolves and queries
    service
        .list("news", None, &RequestContext::new())
        .await
        .expect("list after failed reload");
    assert_eq!(service.namespaces().expect("namespaces"), vec!["news"]);
}

/// Duplicate namespace names are a load error, not a silent overwrite.
#[tokio::test]
async fn duplicate_namespaces_fail_the_reload() {
    let exec = Arc::new(ScriptedExecutor::new());
    let service = DataService::builder(exec.clone())
        .build()
        .expect("build service");
    let mut twin = config_row("news");
    twin["id"] = json!(2);
    exec.respond(
        "ds_common_api",
        vec![rec(config_row("news")), rec(twin)],
    );

    let err = service
        .reload_config()
        .await
        .expect_err("duplicate must fail");
    assert!(matches!(
        err,
        DataError::Config(ConfigError::DuplicateNamespace(_))
    ));
}

/// While one reload is loading, a second call is rejected immediately
/// instead of queueing behind it.
#[tokio::test]
async fn concurrent_reloads_are_rejected_not_queued() {
    let (exec, entered, release) = ScriptedExecutor::holding("ds_common_api");
    let exec = Arc::new(exec);
    exec.respond("ds_common_api", vec![rec(config_row("news"))]);
    let service = Arc::new(
        DataService::builder(exec.clone())
            .build()
            .expect("build service"),
    );

    let background = tokio::spawn({
        let service = service.clone();
        async move { service.reload_config().await }
    });
    entered.notified().await;

    let err = service
        .reload_config()
        .await
        .expect_err("second reload must be rejected");
    assert!(matches!(
        err,
        DataError::Config(ConfigError::ReloadInProgress)
    ));

    release.notify_one();
    let first = background
        .await
        .expect("join")
        .expect("first reload completes");
    assert!(first);

    // the held reload finished and its registry is live
    assert_eq!(service.namespaces().expect("namespaces"), vec!["news"]);
}
