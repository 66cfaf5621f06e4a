// tests/coordinator_fake_executor.rs

use std::sync::{Arc, Mutex};

use buildcoord::config::SystemConfig;
use buildcoord::coordinator::CoordinatorOptions;
use buildcoord::datastore::{BuildRecordStore, InMemoryConfigurationSource, InMemoryRecordStore};
use buildcoord::errors::CoordinatorError;
use buildcoord::graph::{SetStatus, TaskStatus};
use buildcoord::model::{BuildOptions, BuildOverrides};
use buildcoord_test_utils::builders::ConfigurationBuilder;
use buildcoord_test_utils::fake_executor::FakeExecutor;
use buildcoord_test_utils::{init_tracing, with_timeout};

#[tokio::test]
async fn dependency_chain_builds_in_order() {
    with_timeout(async {
        init_tracing();

        // app -> lib -> base
        let app = ConfigurationBuilder::new(1, "app").depends_on(2).build();
        let lib = ConfigurationBuilder::new(2, "lib").depends_on(3).build();
        let base = ConfigurationBuilder::new(3, "base").build();

        let source = Arc::new(InMemoryConfigurationSource::new([lib, base]));
        let store = Arc::new(InMemoryRecordStore::new());
        let executed = Arc::new(Mutex::new(Vec::new()));

        let executed_in = Arc::clone(&executed);
        let service = buildcoord::start_with_executor(
            &SystemConfig::default(),
            CoordinatorOptions {
                exit_when_idle: true,
            },
            source,
            store.clone() as Arc<dyn BuildRecordStore>,
            move |event_tx| FakeExecutor::new(event_tx, executed_in),
        );

        let handle = service
            .coordinator
            .build(app, "alice", BuildOptions::default(), BuildOverrides::default())
            .await
            .expect("trigger should succeed");
        assert_eq!(handle.set.tasks.len(), 3);

        let result = handle.completion.await.expect("completion should resolve");
        assert_eq!(result.status, SetStatus::Success);

        // Batch mode: the event loop exits once the set is done.
        let coordinator = Arc::clone(&service.coordinator);
        service.join().await.expect("runtime should exit cleanly");

        let order = executed.lock().unwrap().clone();
        assert_eq!(order, vec!["base", "lib", "app"]);

        let records = store.all();
        assert_eq!(records.len(), 3);
        assert!(records.iter().all(|r| r.status == TaskStatus::Success));
        assert!(records.iter().all(|r| r.execution_id.is_some()));
        assert!(records.iter().all(|r| r.start_time.is_some() && r.end_time.is_some()));

        assert!(coordinator.get_submitted_build_tasks().is_empty());
    })
    .await;
}

#[tokio::test]
async fn independent_configurations_build_as_one_set() {
    with_timeout(async {
        init_tracing();

        let a = ConfigurationBuilder::new(1, "a").build();
        let b = ConfigurationBuilder::new(2, "b").build();

        let store = Arc::new(InMemoryRecordStore::new());
        let executed = Arc::new(Mutex::new(Vec::new()));

        let executed_in = Arc::clone(&executed);
        let service = buildcoord::start_with_executor(
            &SystemConfig::default(),
            CoordinatorOptions {
                exit_when_idle: true,
            },
            Arc::new(InMemoryConfigurationSource::new([])),
            store.clone() as Arc<dyn BuildRecordStore>,
            move |event_tx| FakeExecutor::new(event_tx, executed_in),
        );

        let handle = service
            .coordinator
            .build_set(vec![a, b], "alice", BuildOptions::default())
            .await
            .expect("trigger should succeed");

        let result = handle.completion.await.expect("completion should resolve");
        assert_eq!(result.status, SetStatus::Success);
        service.join().await.expect("runtime should exit cleanly");

        // Both roots dispatched; order between them is not defined.
        let mut order = executed.lock().unwrap().clone();
        order.sort();
        assert_eq!(order, vec!["a", "b"]);
        assert_eq!(store.all().len(), 2);
    })
    .await;
}

#[tokio::test]
async fn completed_build_reruns_only_when_forced() {
    with_timeout(async {
        init_tracing();

        let store = Arc::new(InMemoryRecordStore::new());
        let executed = Arc::new(Mutex::new(Vec::new()));

        let executed_in = Arc::clone(&executed);
        let service = buildcoord::start_with_executor(
            &SystemConfig::default(),
            CoordinatorOptions::default(),
            Arc::new(InMemoryConfigurationSource::new([])),
            store.clone() as Arc<dyn BuildRecordStore>,
            move |event_tx| FakeExecutor::new(event_tx, executed_in),
        );

        let handle = service
            .coordinator
            .build(
                ConfigurationBuilder::new(1, "a").build(),
                "alice",
                BuildOptions::default(),
                BuildOverrides::default(),
            )
            .await
            .expect("first trigger succeeds");
        let result = handle.completion.await.expect("completion should resolve");
        assert_eq!(result.status, SetStatus::Success);
        assert_eq!(store.all().len(), 1);

        // Same configuration revision again: the stored result stands.
        let err = service
            .coordinator
            .build(
                ConfigurationBuilder::new(1, "a").build(),
                "alice",
                BuildOptions::default(),
                BuildOverrides::default(),
            )
            .await
            .expect_err("retrigger without force must be rejected");
        assert!(matches!(err, CoordinatorError::NoRebuildRequired(_)));

        let handle = service
            .coordinator
            .build(
                ConfigurationBuilder::new(1, "a").build(),
                "alice",
                BuildOptions {
                    force_rebuild: true,
                    ..BuildOptions::default()
                },
                BuildOverrides::default(),
            )
            .await
            .expect("forced retrigger succeeds");
        let result = handle.completion.await.expect("completion should resolve");
        assert_eq!(result.status, SetStatus::Success);

        service.coordinator.shutdown().await.expect("shutdown");
        service.join().await.expect("runtime should exit cleanly");

        assert_eq!(executed.lock().unwrap().clone(), vec!["a", "a"]);
        assert_eq!(store.all().len(), 2);
    })
    .await;
}
