//! # Host Lifecycle Tests
//!
//! Drive a fully wired host through startup, restarts and setup using the
//! in-memory adapters, plus one file-backed round trip.

use std::sync::Arc;

use host_runtime::adapters::{InMemoryShellSettingsManager, LoggingRecipeManager};
use host_runtime::{
    HostComponents, HostConfig, HostError, Recipe, RestartQueue, RunningShellTable, SetupContext,
    ShellSettingsManager,
};
use shared_bus::InMemoryEventBus;
use shared_types::{
    ShellDescriptor, ShellFeature, ShellSettings, TenantState, BOOTSTRAP_SERIAL_NUMBER,
};
use ts_01_descriptor_store::{DescriptorStoreApi, InMemoryDescriptorRepository};

struct Harness {
    components: HostComponents,
    descriptors: Arc<InMemoryDescriptorRepository>,
}

fn harness(tenants: &[ShellSettings]) -> Harness {
    let bus = Arc::new(InMemoryEventBus::new());
    let mut manager = InMemoryShellSettingsManager::new(bus.clone());
    for settings in tenants {
        manager = manager.with_tenant(settings);
    }
    let descriptors = Arc::new(InMemoryDescriptorRepository::new());
    let components = HostComponents::new(
        HostConfig::default(),
        bus,
        Arc::new(manager),
        descriptors.clone(),
        Arc::new(LoggingRecipeManager::new()),
    );
    Harness {
        components,
        descriptors,
    }
}

fn tenant(name: &str, state: TenantState) -> ShellSettings {
    ShellSettings::new(name, state).unwrap()
}

fn descriptor(serial: i64, features: &[&str]) -> ShellDescriptor {
    ShellDescriptor::new(
        serial,
        features.iter().map(|f| ShellFeature::from(*f)).collect::<Vec<_>>(),
        Vec::new(),
    )
}

async fn store_of(h: &Harness, name: &str) -> Arc<dyn DescriptorStoreApi> {
    let shell = h.components.host.get_shell_context(name).await.unwrap();
    shell.resolve::<dyn DescriptorStoreApi>().unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_lookups_share_one_build_pass() {
    let h = harness(&[
        tenant("alpha", TenantState::Running),
        tenant("beta", TenantState::Running),
    ]);

    let mut lookups = Vec::new();
    for i in 0..12 {
        let host = Arc::clone(&h.components.host);
        let name = if i % 2 == 0 { "alpha" } else { "beta" };
        lookups.push(tokio::spawn(async move { host.get_shell_context(name).await }));
    }
    for lookup in lookups {
        assert!(lookup.await.unwrap().is_ok());
    }

    assert_eq!(h.components.host.build_passes(), 1);
}

#[tokio::test]
async fn test_persisted_descriptor_drives_full_build() {
    let h = harness(&[
        tenant("A", TenantState::Running),
        tenant("B", TenantState::Uninitialized),
    ]);
    h.descriptors.insert("A", descriptor(3, &["themes"]));

    h.components.host.initialize().await.unwrap();

    let a = h.components.host.get_shell_context("A").await.unwrap();
    assert_eq!(a.serial_number(), 3);
    assert!(a.blueprint().has_feature("themes"));
    assert!(a.blueprint().has_feature("settings"));

    let b = h.components.host.get_shell_context("B").await.unwrap();
    assert_eq!(b.serial_number(), BOOTSTRAP_SERIAL_NUMBER);
    assert_eq!(b.blueprint().features, vec!["logging", "hosting", "settings"]);

    assert_eq!(h.components.host.running_tenants(), vec!["A", "B"]);
    assert_eq!(h.components.routing.names(), vec!["A", "B"]);
}

#[tokio::test]
async fn test_unknown_tenant_not_found() {
    let h = harness(&[tenant("alpha", TenantState::Running)]);

    let err = h.components.host.get_shell_context("omega").await.unwrap_err();

    assert_eq!(
        err,
        HostError::NotFound {
            tenant: "omega".into()
        }
    );
}

#[tokio::test]
async fn test_descriptor_change_restarts_running_tenant() {
    let h = harness(&[tenant("alpha", TenantState::Running)]);
    let before = h.components.host.get_shell_context("alpha").await.unwrap();
    let store = store_of(&h, "alpha").await;

    h.components
        .host
        .scope(async {
            store
                .update_descriptor(0, vec![ShellFeature::from("themes")], Vec::new())
                .await
        })
        .await
        .unwrap()
        .unwrap();

    let after = h.components.host.get_shell_context("alpha").await.unwrap();
    assert!(!Arc::ptr_eq(&before, &after));
    assert!(before.is_disposed());
    assert!(!after.is_disposed());
    assert_eq!(after.serial_number(), 1);
    assert!(after.blueprint().has_feature("themes"));
    assert_eq!(h.components.host.build_passes(), 1);
}

#[tokio::test]
async fn test_descriptor_change_ignored_while_initializing() {
    let h = harness(&[tenant("alpha", TenantState::Initializing)]);
    let before = h.components.host.get_shell_context("alpha").await.unwrap();
    let store = store_of(&h, "alpha").await;

    let queue = RestartQueue::new();
    queue
        .clone()
        .scope(store.update_descriptor(0, vec![ShellFeature::from("themes")], Vec::new()))
        .await
        .unwrap();

    assert!(queue.is_empty());
    let current = h.components.host.get_shell_context("alpha").await.unwrap();
    assert!(Arc::ptr_eq(&before, &current));
}

#[tokio::test]
async fn test_repeated_changes_restart_once() {
    let h = harness(&[tenant("alpha", TenantState::Running)]);
    let before = h.components.host.get_shell_context("alpha").await.unwrap();
    let store = store_of(&h, "alpha").await;

    let queue = RestartQueue::new();
    queue
        .clone()
        .scope(async {
            store.update_descriptor(0, Vec::new(), Vec::new()).await.unwrap();
            store
                .update_descriptor(1, vec![ShellFeature::from("modules")], Vec::new())
                .await
                .unwrap();
        })
        .await;

    assert_eq!(queue.len(), 1);
    assert_eq!(h.components.host.drain(&queue).await.unwrap(), 1);

    let after = h.components.host.get_shell_context("alpha").await.unwrap();
    assert_eq!(after.serial_number(), 2);
    assert!(after.blueprint().has_feature("modules"));
    assert!(before.is_disposed());
}

#[tokio::test]
async fn test_change_without_scope_keeps_shell() {
    let h = harness(&[tenant("alpha", TenantState::Running)]);
    let before = h.components.host.get_shell_context("alpha").await.unwrap();
    let store = store_of(&h, "alpha").await;

    store.update_descriptor(0, Vec::new(), Vec::new()).await.unwrap();

    let current = h.components.host.get_shell_context("alpha").await.unwrap();
    assert!(Arc::ptr_eq(&before, &current));
    assert!(!current.is_disposed());
}

#[tokio::test]
async fn test_empty_host_serves_setup_shell() {
    let h = harness(&[]);

    let shell = h.components.host.get_shell_context("Default").await.unwrap();

    assert_eq!(shell.serial_number(), BOOTSTRAP_SERIAL_NUMBER);
    assert!(shell.blueprint().has_feature("setup"));
    assert!(!shell.blueprint().has_feature("settings"));
    assert_eq!(shell.settings().state(), TenantState::Uninitialized);
    let routed = h.components.routing.match_request("localhost", "/").unwrap();
    assert_eq!(routed.name(), "Default");
}

#[tokio::test]
async fn test_setup_replaces_setup_shell_with_running_tenant() {
    let h = harness(&[]);
    let setup_shell = h.components.host.get_shell_context("Default").await.unwrap();

    let service = h.components.setup_service(setup_shell.settings().clone());
    let execution = service
        .setup(SetupContext {
            database_provider: Some("Sqlite".into()),
            recipe: Recipe::new("blog").with_step("content", serde_json::json!({"posts": 3})),
            ..SetupContext::default()
        })
        .await
        .unwrap();
    assert!(execution.is_some());

    let shell = h.components.host.get_shell_context("Default").await.unwrap();
    assert!(setup_shell.is_disposed());
    assert_eq!(shell.settings().state(), TenantState::Running);
    assert_eq!(shell.settings().store().database_provider.as_deref(), Some("Sqlite"));
    assert!(shell.blueprint().has_feature("themes"));
    assert!(shell.blueprint().has_feature("recipes"));
    assert_eq!(shell.serial_number(), 2);
    assert_eq!(h.components.host.build_passes(), 1);

    let saved = h.components.settings_manager.load_settings().await.unwrap();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].state(), TenantState::Running);
}

#[tokio::test]
async fn test_failed_setup_restores_state() {
    let h = harness(&[]);
    let setup_shell = h.components.host.get_shell_context("Default").await.unwrap();
    let service = h.components.setup_service(setup_shell.settings().clone());

    let err = service
        .setup(SetupContext {
            enabled_features: vec!["blog".into()],
            ..SetupContext::default()
        })
        .await
        .unwrap_err();

    assert!(matches!(err, HostError::TenantBuildFailure { .. }));
    assert_eq!(service.settings().state(), TenantState::Uninitialized);
    let current = h.components.host.get_shell_context("Default").await.unwrap();
    assert!(Arc::ptr_eq(&setup_shell, &current));
}

#[tokio::test]
async fn test_reset_then_shutdown() {
    let h = harness(&[tenant("alpha", TenantState::Running)]);
    let first = h.components.host.get_shell_context("alpha").await.unwrap();

    h.components.host.reset().await;
    let second = h.components.host.get_shell_context("alpha").await.unwrap();

    assert!(first.is_disposed());
    assert!(!Arc::ptr_eq(&first, &second));
    assert_eq!(h.components.host.build_passes(), 2);

    h.components.host.shutdown().await;

    assert!(second.is_disposed());
    assert!(h.components.routing.is_empty());
    assert_eq!(
        h.components.host.get_shell_context("alpha").await.unwrap_err(),
        HostError::Cancelled
    );
}

#[tokio::test]
async fn test_file_backed_setup_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = HostConfig::default();
    config.storage.data_dir = dir.path().to_path_buf();

    {
        let components = HostComponents::file_backed(config.clone());
        let setup_shell = components.host.get_shell_context("Default").await.unwrap();
        components
            .setup_service(setup_shell.settings().clone())
            .setup(SetupContext {
                recipe: Recipe::new("empty").with_step("noop", serde_json::Value::Null),
                ..SetupContext::default()
            })
            .await
            .unwrap();
        components.host.shutdown().await;
    }

    let components = HostComponents::file_backed(config);
    components.host.initialize().await.unwrap();

    let shell = components.host.get_shell_context("Default").await.unwrap();
    assert_eq!(shell.settings().state(), TenantState::Running);
    assert_eq!(shell.serial_number(), 2);
    assert!(shell.blueprint().has_feature("themes"));
}
