//! Client lifecycle behavior: single-flight creation, admission bookkeeping,
//! idle reclamation and shutdown.

use std::time::Duration;

use db_steward::Steward;

mod common;
use common::{test_config, FakeConnector, InjectedError};

#[tokio::test]
async fn concurrent_callers_share_one_created_client() {
    // Slow creation widens the race window.
    let connector = FakeConnector::with_connect_delay(Duration::from_millis(50));
    let steward = Steward::new(test_config(), connector.clone());
    let manager = steward.manager().clone();

    let mut tasks = Vec::new();
    for _ in 0..8 {
        let manager = manager.clone();
        tasks.push(tokio::spawn(async move {
            manager.get_client().await.unwrap()
        }));
    }

    let mut ids = Vec::new();
    for task in tasks {
        ids.push(task.await.unwrap().id);
    }

    assert_eq!(connector.connects(), 1);
    assert!(ids.iter().all(|id| *id == ids[0]));
    assert_eq!(steward.metrics_snapshot().connections_created, 1);
}

#[tokio::test]
async fn leases_track_admission_and_high_water_mark() {
    let mut config = test_config();
    config.max_connections = 3;
    let steward = Steward::new(config, FakeConnector::new());
    let manager = steward.manager().clone();

    let lease_a = manager.lease().await.unwrap();
    let lease_b = manager.lease().await.unwrap();
    assert_eq!(manager.active_count(), 2);
    assert!(manager.can_admit());

    let lease_c = manager.lease().await.unwrap();
    assert_eq!(manager.active_count(), 3);
    assert!(!manager.can_admit());

    drop(lease_b);
    assert_eq!(manager.active_count(), 2);
    assert!(manager.can_admit());

    drop(lease_a);
    drop(lease_c);
    assert_eq!(manager.active_count(), 0);

    let m = steward.metrics_snapshot();
    assert_eq!(m.max_concurrent_connections, 3);
    assert_eq!(m.connections_released, 3);
    assert_eq!(m.connections_created, 1);
}

#[tokio::test]
async fn idle_client_is_reclaimed() {
    let mut config = test_config();
    config.reclaim.enabled = true;
    config.reclaim.interval_ms = 50;
    config.reclaim.idle_after_ms = 100;
    let connector = FakeConnector::new();
    let steward = Steward::new(config, connector.clone());

    steward
        .with_connection("seed", |_client| async move { Ok::<_, InjectedError>(()) })
        .await
        .unwrap();
    assert!(steward.manager().is_connected().await);

    tokio::time::sleep(Duration::from_millis(400)).await;

    assert!(!steward.manager().is_connected().await);
    assert_eq!(connector.closes(), 1);
}

#[tokio::test]
async fn active_lease_blocks_reclamation() {
    let mut config = test_config();
    config.reclaim.enabled = true;
    config.reclaim.interval_ms = 50;
    config.reclaim.idle_after_ms = 50;
    let connector = FakeConnector::new();
    let steward = Steward::new(config, connector.clone());
    let manager = steward.manager().clone();

    let lease = manager.lease().await.unwrap();
    tokio::time::sleep(Duration::from_millis(300)).await;
    // Held lease keeps the client alive regardless of elapsed idle time.
    assert!(manager.is_connected().await);
    assert_eq!(connector.closes(), 0);

    drop(lease);
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(!manager.is_connected().await);
    assert_eq!(connector.closes(), 1);
}

#[tokio::test]
async fn reclaimed_client_is_recreated_on_next_use() {
    let mut config = test_config();
    config.reclaim.enabled = true;
    config.reclaim.interval_ms = 40;
    config.reclaim.idle_after_ms = 60;
    let connector = FakeConnector::new();
    let steward = Steward::new(config, connector.clone());

    steward
        .with_connection("first", |_client| async move { Ok::<_, InjectedError>(()) })
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(!steward.manager().is_connected().await);

    steward
        .with_connection("second", |_client| async move { Ok::<_, InjectedError>(()) })
        .await
        .unwrap();
    assert!(steward.manager().is_connected().await);
    assert_eq!(connector.connects(), 2);
    assert_eq!(steward.metrics_snapshot().connections_created, 2);
}

#[tokio::test]
async fn disconnect_is_idempotent() {
    let connector = FakeConnector::new();
    let steward = Steward::new(test_config(), connector.clone());

    // No client yet: nothing to do, nothing to fail.
    steward.disconnect().await;
    steward.disconnect().await;
    assert_eq!(connector.closes(), 0);

    steward
        .with_connection("seed", |_client| async move { Ok::<_, InjectedError>(()) })
        .await
        .unwrap();
    assert!(steward.manager().is_connected().await);

    steward.disconnect().await;
    steward.disconnect().await;
    assert!(!steward.manager().is_connected().await);
    assert_eq!(connector.closes(), 1);
}

#[tokio::test]
async fn shutdown_disconnects_and_stops_background_tasks() {
    let mut config = test_config();
    config.reclaim.enabled = true;
    config.reclaim.interval_ms = 50;
    config.reclaim.idle_after_ms = 10_000;
    let connector = FakeConnector::new();
    let steward = Steward::new(config, connector.clone());

    steward
        .with_connection("seed", |_client| async move { Ok::<_, InjectedError>(()) })
        .await
        .unwrap();

    let mut rx = steward.shutdown_handle().subscribe();
    steward.shutdown().await;
    steward.shutdown().await;

    rx.recv().await.unwrap();
    assert!(!steward.manager().is_connected().await);
    assert_eq!(connector.closes(), 1);
}

#[tokio::test]
async fn admission_overflow_waits_instead_of_rejecting() {
    let mut config = test_config();
    config.max_connections = 1;
    config.retry.admission_wait_ms = 60;
    let steward = Steward::new(config, FakeConnector::new());
    let manager = steward.manager().clone();

    // Saturate the limit, then release it shortly after.
    let lease = manager.lease().await.unwrap();
    let release = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(30)).await;
        drop(lease);
    });

    let result = steward
        .with_connection("burst", |_client| async move { Ok::<_, InjectedError>(42) })
        .await;

    assert_eq!(result.unwrap(), 42);
    release.await.unwrap();
}
