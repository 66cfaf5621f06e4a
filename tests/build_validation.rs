// tests/build_validation.rs

use std::sync::Arc;

use buildcoord::config::SystemConfig;
use buildcoord::coordinator::CoordinatorOptions;
use buildcoord::datastore::{InMemoryConfigurationSource, InMemoryRecordStore};
use buildcoord::errors::CoordinatorError;
use buildcoord::model::{BuildOptions, BuildOverrides, ConfigurationId};
use buildcoord_test_utils::builders::ConfigurationBuilder;
use buildcoord_test_utils::{init_tracing, with_timeout};

fn service_without_executor(
    source: InMemoryConfigurationSource,
) -> (
    buildcoord::CoordinatorService,
    tokio::sync::mpsc::Receiver<buildcoord::graph::ScheduledBuild>,
) {
    buildcoord::start(
        &SystemConfig::default(),
        CoordinatorOptions::default(),
        Arc::new(source),
        Arc::new(InMemoryRecordStore::new()),
    )
}

#[tokio::test]
async fn invalid_option_combination_is_rejected() {
    with_timeout(async {
        init_tracing();

        let (service, _builds) = service_without_executor(InMemoryConfigurationSource::new([]));

        let options = BuildOptions {
            temporary_build: false,
            timestamp_alignment: true,
            ..BuildOptions::default()
        };
        let err = service
            .coordinator
            .build(
                ConfigurationBuilder::new(1, "a").build(),
                "alice",
                options,
                BuildOverrides::default(),
            )
            .await
            .expect_err("options must be rejected");

        assert!(matches!(err, CoordinatorError::InvalidBuildOptions(_)));
        assert!(service.coordinator.get_submitted_build_tasks().is_empty());
    })
    .await;
}

#[tokio::test]
async fn concurrent_build_of_same_configuration_is_rejected() {
    with_timeout(async {
        init_tracing();

        // Dispatched builds pile up in the channel; nothing completes them,
        // so the first build stays in flight.
        let (service, _builds) = service_without_executor(InMemoryConfigurationSource::new([]));

        service
            .coordinator
            .build(
                ConfigurationBuilder::new(1, "a").build(),
                "alice",
                BuildOptions::default(),
                BuildOverrides::default(),
            )
            .await
            .expect("first trigger succeeds");

        let err = service
            .coordinator
            .build(
                ConfigurationBuilder::new(1, "a").build(),
                "bob",
                BuildOptions::default(),
                BuildOverrides::default(),
            )
            .await
            .expect_err("second trigger must conflict");

        assert!(matches!(
            err,
            CoordinatorError::BuildConflict(ConfigurationId(1))
        ));
        // Only the first trigger's task is in flight.
        assert_eq!(service.coordinator.get_submitted_build_tasks().len(), 1);
    })
    .await;
}

#[tokio::test]
async fn dependency_cycle_is_rejected() {
    with_timeout(async {
        init_tracing();

        let (service, _builds) = service_without_executor(InMemoryConfigurationSource::new([]));

        let a = ConfigurationBuilder::new(1, "a").depends_on(2).build();
        let b = ConfigurationBuilder::new(2, "b").depends_on(1).build();

        let err = service
            .coordinator
            .build_set(vec![a, b], "alice", BuildOptions::default())
            .await
            .expect_err("cycle must be rejected");

        assert!(matches!(err, CoordinatorError::DependencyCycle(_)));
        assert!(service.coordinator.get_submitted_build_tasks().is_empty());
    })
    .await;
}

#[tokio::test]
async fn unknown_dependency_is_rejected() {
    with_timeout(async {
        init_tracing();

        let (service, _builds) = service_without_executor(InMemoryConfigurationSource::new([]));

        let err = service
            .coordinator
            .build(
                ConfigurationBuilder::new(1, "a").depends_on(42).build(),
                "alice",
                BuildOptions::default(),
                BuildOverrides::default(),
            )
            .await
            .expect_err("missing dependency must be rejected");

        assert!(matches!(
            err,
            CoordinatorError::ConfigurationNotFound(ConfigurationId(42))
        ));
    })
    .await;
}

#[tokio::test]
async fn overrides_replace_only_the_set_fields() {
    with_timeout(async {
        init_tracing();

        let (service, _builds) = service_without_executor(InMemoryConfigurationSource::new([]));

        let overrides = BuildOverrides {
            scm_revision: Some("release-1.0".to_string()),
            ..BuildOverrides::default()
        };
        let handle = service
            .coordinator
            .build(
                ConfigurationBuilder::new(1, "a").build(),
                "alice",
                BuildOptions::default(),
                overrides,
            )
            .await
            .expect("trigger should succeed");

        let configuration = &handle.set.tasks[0].configuration.configuration;
        assert_eq!(configuration.scm_revision, "release-1.0");
        // Untouched fields keep their stored values.
        assert_eq!(configuration.build_script, "mvn clean deploy");
    })
    .await;
}
