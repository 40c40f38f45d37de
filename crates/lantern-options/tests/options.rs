//! 选项体系端到端场景：注册 → 物化 → 热更新 → 包装器取值。

use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};
use std::thread;

use lantern_config::{ConfigNode, ConfigurationRoot, SectionPath, bind_onto};
use lantern_options::{
    DEFAULT_NAME, NamedOptionWrapper, OptionsBuilder, OptionsError, OptionsMonitor,
    ServiceProvider,
};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
struct DbOptions {
    host: Option<String>,
    port: u16,
}

fn database_tree(host: &str, port: &str) -> ConfigNode {
    ConfigNode::dictionary([(
        "Database",
        ConfigNode::dictionary([
            ("Host", ConfigNode::from(host)),
            ("Port", ConfigNode::from(port)),
        ]),
    )])
}

fn provider_with(tree: ConfigNode) -> (Arc<ServiceProvider>, Arc<ConfigurationRoot>) {
    let root = Arc::new(ConfigurationRoot::new(tree));
    let mut provider = ServiceProvider::new();
    provider.register(Arc::clone(&root));
    (Arc::new(provider), root)
}

#[test]
fn unnamed_binder_matches_binding_the_section_directly() {
    let (provider, root) = provider_with(database_tree("db1", "5432"));
    let mut builder = OptionsBuilder::new();
    builder.configure::<DbOptions>("Database");
    let registry = builder.build();

    let materialized: DbOptions = registry.create_default(&provider).expect("materialize");

    let mut direct = DbOptions::default();
    let section = root
        .section(&SectionPath::from("Database"))
        .expect("section exists");
    bind_onto(&section, &mut direct).expect("bind");
    assert_eq!(materialized, direct);

    // 配置未变时重复物化幂等。
    let again: DbOptions = registry.create_default(&provider).expect("materialize");
    assert_eq!(materialized, again);
}

#[test]
fn named_binder_leaves_other_names_unmodified() {
    let (provider, _root) = provider_with(database_tree("db1", "5432"));
    let mut builder = OptionsBuilder::new();
    builder.configure_named::<DbOptions>("primary", "Database");
    let registry = builder.build();

    let other: DbOptions = registry.create(&provider, "secondary").expect("materialize");
    assert_eq!(other, DbOptions::default());

    let matching: DbOptions = registry.create(&provider, "primary").expect("materialize");
    assert_eq!(matching.host.as_deref(), Some("db1"));
    assert_eq!(matching.port, 5432);
}

#[test]
fn try_configure_twice_applies_only_the_first_section() {
    let tree = ConfigNode::dictionary([
        (
            "Database",
            ConfigNode::dictionary([("Port", ConfigNode::from("5432"))]),
        ),
        (
            "Fallback",
            ConfigNode::dictionary([("Port", ConfigNode::from("9999"))]),
        ),
    ]);
    let (provider, _root) = provider_with(tree);

    let mut builder = OptionsBuilder::new();
    assert!(builder.try_configure::<DbOptions>("Database"));
    assert!(!builder.try_configure::<DbOptions>("Fallback"));
    let registry = builder.build();

    let options: DbOptions = registry.create_default(&provider).expect("materialize");
    assert_eq!(options.port, 5432);
}

#[test]
fn database_scenario_binds_typed_fields_and_tolerates_missing_sections() {
    let (provider, _root) = provider_with(database_tree("db1", "5432"));
    let mut builder = OptionsBuilder::new();
    builder.configure::<DbOptions>("Database");
    let registry = builder.build();

    let options: DbOptions = registry.create_default(&provider).expect("materialize");
    assert_eq!(options.host.as_deref(), Some("db1"));
    assert_eq!(options.port, 5432);

    // 缺失的节不是错误：字段保持默认值。
    let (empty_provider, _) = provider_with(ConfigNode::dictionary::<_, String>([]));
    let mut builder = OptionsBuilder::new();
    builder.configure::<DbOptions>("Database");
    let registry = builder.build();
    let defaults: DbOptions = registry.create_default(&empty_provider).expect("materialize");
    assert_eq!(defaults.host, None);
    assert_eq!(defaults.port, 0);
}

#[test]
fn missing_configuration_root_surfaces_as_missing_dependency() {
    let provider = Arc::new(ServiceProvider::new());
    let mut builder = OptionsBuilder::new();
    builder.configure::<DbOptions>("Database");
    let registry = builder.build();

    let error = registry
        .create::<DbOptions>(&provider, DEFAULT_NAME)
        .expect_err("no configuration root");
    assert!(matches!(error, OptionsError::MissingDependency { .. }));
}

#[test]
fn monitor_caches_per_name_and_refreshes_on_reload() {
    let tree = ConfigNode::dictionary([
        (
            "Primary",
            ConfigNode::dictionary([("Port", ConfigNode::from("1000"))]),
        ),
        (
            "Replica",
            ConfigNode::dictionary([("Port", ConfigNode::from("2000"))]),
        ),
    ]);
    let (provider, root) = provider_with(tree);

    let mut builder = OptionsBuilder::new();
    builder
        .configure_named::<DbOptions>("primary", "Primary")
        .configure_named::<DbOptions>("replica", "Replica");
    let registry = Arc::new(builder.build());

    let monitor = OptionsMonitor::<DbOptions>::new(provider, registry).expect("monitor");
    assert_eq!(monitor.get("primary").expect("get").port, 1000);
    assert_eq!(monitor.get("replica").expect("get").port, 2000);

    let notified = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&notified);
    let _subscription = monitor.on_change(move |_, _| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    let updated = ConfigNode::dictionary([
        (
            "Primary",
            ConfigNode::dictionary([("Port", ConfigNode::from("1001"))]),
        ),
        (
            "Replica",
            ConfigNode::dictionary([("Port", ConfigNode::from("2002"))]),
        ),
    ]);
    root.reload(updated);

    assert_eq!(monitor.get("primary").expect("get").port, 1001);
    assert_eq!(monitor.get("replica").expect("get").port, 2002);
    // 两个缓存名字各收到一次通知。
    assert_eq!(notified.load(Ordering::SeqCst), 2);
}

#[test]
fn wrapper_exposes_initial_value_then_tracks_matching_changes_only() {
    let tree = ConfigNode::dictionary([
        (
            "Primary",
            ConfigNode::dictionary([("Port", ConfigNode::from("1000"))]),
        ),
        (
            "Replica",
            ConfigNode::dictionary([("Port", ConfigNode::from("2000"))]),
        ),
    ]);
    let (provider, root) = provider_with(tree);

    let mut builder = OptionsBuilder::new();
    builder
        .configure_named::<DbOptions>("primary", "Primary")
        .configure_named::<DbOptions>("replica", "Replica");
    let registry = Arc::new(builder.build());
    let monitor = OptionsMonitor::<DbOptions>::new(provider, registry).expect("monitor");

    let wrapper = NamedOptionWrapper::new("primary", &monitor).expect("wrapper");
    assert_eq!(wrapper.name(), "primary");
    assert_eq!(wrapper.value().port, 1000);

    // 仅 Replica 变化：primary 名下仍会再物化，但值不变；replica 的通知
    // 不得改写本包装器。
    let touch_replica = ConfigNode::dictionary([
        (
            "Primary",
            ConfigNode::dictionary([("Port", ConfigNode::from("1000"))]),
        ),
        (
            "Replica",
            ConfigNode::dictionary([("Port", ConfigNode::from("2999"))]),
        ),
    ]);
    root.reload(touch_replica);
    assert_eq!(wrapper.value().port, 1000);

    let touch_primary = ConfigNode::dictionary([
        (
            "Primary",
            ConfigNode::dictionary([("Port", ConfigNode::from("1111"))]),
        ),
        (
            "Replica",
            ConfigNode::dictionary([("Port", ConfigNode::from("2999"))]),
        ),
    ]);
    root.reload(touch_primary);
    assert_eq!(wrapper.value().port, 1111);
}

#[test]
fn dropping_the_wrapper_releases_its_monitor_subscription() {
    let (provider, root) = provider_with(database_tree("db1", "1000"));
    let mut builder = OptionsBuilder::new();
    builder.configure_named::<DbOptions>("primary", "Database");
    let registry = Arc::new(builder.build());
    let monitor = OptionsMonitor::<DbOptions>::new(provider, registry).expect("monitor");

    let hits = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&hits);
    let probe = monitor.on_change(move |_, _| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    let wrapper = NamedOptionWrapper::new("primary", &monitor).expect("wrapper");
    drop(wrapper);

    // 包装器析构后，监视器上只剩探针一个监听者；重载不会触碰悬挂回调。
    root.reload(database_tree("db1", "2000"));
    assert_eq!(hits.load(Ordering::SeqCst), 1);
    drop(probe);
}

#[test]
fn wrapper_can_serve_as_a_registered_single_value_contract() {
    let (provider, root) = provider_with(database_tree("db1", "1000"));
    let mut builder = OptionsBuilder::new();
    builder.configure_named::<DbOptions>("primary", "Database");
    let registry = Arc::new(builder.build());
    let monitor = OptionsMonitor::<DbOptions>::new(Arc::clone(&provider), registry).expect("monitor");

    // 组合根把包装器作为“单值选项契约”的实现注册进定位器。
    let wrapper = Arc::new(NamedOptionWrapper::new("primary", &monitor).expect("wrapper"));
    let mut consumers = ServiceProvider::new();
    consumers.register(Arc::clone(&wrapper));

    let resolved = consumers
        .get_required::<NamedOptionWrapper<DbOptions>>()
        .expect("registered contract");
    assert_eq!(resolved.value().port, 1000);

    root.reload(database_tree("db1", "4242"));
    assert_eq!(resolved.value().port, 4242);
}

#[test]
fn readers_never_observe_a_torn_value_during_reloads() {
    let (provider, root) = provider_with(database_tree("db1", "1000"));
    let mut builder = OptionsBuilder::new();
    builder.configure_named::<DbOptions>("primary", "Database");
    let registry = Arc::new(builder.build());
    let monitor = OptionsMonitor::<DbOptions>::new(provider, registry).expect("monitor");
    let wrapper = Arc::new(NamedOptionWrapper::new("primary", &monitor).expect("wrapper"));

    let stop = Arc::new(AtomicBool::new(false));
    let mut readers = Vec::new();
    for _ in 0..4 {
        let wrapper = Arc::clone(&wrapper);
        let stop = Arc::clone(&stop);
        readers.push(thread::spawn(move || {
            while !stop.load(Ordering::Relaxed) {
                let value = wrapper.value();
                // 两个已知状态之一：要么重载前要么重载后，绝无中间态。
                assert!(value.port == 1000 || value.port == 2000);
                assert_eq!(value.host.as_deref(), Some("db1"));
            }
        }));
    }

    for _ in 0..50 {
        root.reload(database_tree("db1", "2000"));
        root.reload(database_tree("db1", "1000"));
    }
    root.reload(database_tree("db1", "2000"));
    stop.store(true, Ordering::Relaxed);
    for reader in readers {
        reader.join().expect("reader thread");
    }
    assert_eq!(wrapper.value().port, 2000);
}
