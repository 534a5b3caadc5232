//! Hot reload: payload channel into the dispatcher.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use link_dispatch::config::loader::load_payload;
use link_dispatch::dispatch::reload::{run_reload_loop, ReloadStats};
use link_dispatch::lifecycle::Shutdown;
use link_dispatch::{ConfigPayload, Dispatcher};

mod common;

#[tokio::test]
async fn test_reload_applies_and_rejects() {
    let (registry, recorder) = common::recording_registry(&["Old", "New"]);
    let dispatcher = Arc::new(Dispatcher::new(registry));
    dispatcher
        .apply_config(&ConfigPayload::new(1).route("/p", "Old"))
        .unwrap();

    let (tx, rx) = mpsc::unbounded_channel();
    let shutdown = Shutdown::new();
    let task = tokio::spawn(run_reload_loop(dispatcher.clone(), rx, shutdown.subscribe()));

    tx.send(ConfigPayload::new(2).route("/p", "New")).unwrap();
    // stale
    tx.send(ConfigPayload::new(2).route("/p", "Old")).unwrap();
    // duplicate
    tx.send(ConfigPayload::new(3).route("/p", "Old").route("/p", "New"))
        .unwrap();
    drop(tx);

    let stats = task.await.unwrap();
    assert_eq!(
        stats,
        ReloadStats {
            applied: 1,
            rejected: 2
        }
    );
    assert_eq!(dispatcher.snapshot().unwrap().version, 2);
    assert!(dispatcher.handle_url("https://app.example/p"));
    assert_eq!(recorder.calls()[0].handler, "New");
}

#[tokio::test]
async fn test_reload_stops_on_shutdown() {
    let dispatcher = Arc::new(Dispatcher::new(common::recording_registry(&[]).0));
    let (_tx, rx) = mpsc::unbounded_channel::<ConfigPayload>();
    let shutdown = Shutdown::new();
    let task = tokio::spawn(run_reload_loop(dispatcher, rx, shutdown.subscribe()));

    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(shutdown.trigger(), 1);

    let stats = tokio::time::timeout(Duration::from_secs(1), task)
        .await
        .expect("reload loop did not stop")
        .unwrap();
    assert_eq!(stats, ReloadStats::default());
}

#[tokio::test]
async fn test_reload_from_payload_file() {
    let path = std::env::temp_dir().join(format!("link-dispatch-reload-{}.toml", std::process::id()));
    std::fs::write(
        &path,
        r#"
        version = 4
        default_handler = "Fallback"

        [[routes]]
        pattern = "myapp://product/:id"
        handler = "Product"
        "#,
    )
    .unwrap();

    let (registry, recorder) = common::recording_registry(&["Product", "Fallback"]);
    let dispatcher = Arc::new(Dispatcher::new(registry));
    let (tx, rx) = mpsc::unbounded_channel();
    let shutdown = Shutdown::new();
    let task = tokio::spawn(run_reload_loop(dispatcher.clone(), rx, shutdown.subscribe()));

    tx.send(load_payload(&path).unwrap()).unwrap();
    drop(tx);
    assert_eq!(task.await.unwrap().applied, 1);
    std::fs::remove_file(&path).ok();

    assert!(dispatcher.handle_url("myapp://product/9"));
    assert!(dispatcher.handle_url("myapp://cart"));
    let calls = recorder.calls();
    assert_eq!(calls[0].params, common::params(&[("id", "9")]));
    assert_eq!(calls[1].handler, "Fallback");
}
