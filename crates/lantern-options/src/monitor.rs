use std::sync::{
    Arc, Weak,
    atomic::{AtomicU64, Ordering},
};

use dashmap::DashMap;
use lantern_config::{ConfigurationRoot, ReloadGuard};
use parking_lot::RwLock;
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, warn};

use crate::{error::OptionsError, provider::ServiceProvider, registry::OptionsRegistry};

type ChangeListener<T> = Arc<dyn Fn(&Arc<T>, &str) + Send + Sync>;
type ListenerTable<T> = RwLock<Vec<(u64, ChangeListener<T>)>>;

/// 命名选项的监视器：按需物化、按名缓存、响应配置重载。
///
/// ### 设计目的（Why）
/// - 物化是惰性的：首次 `get(name)` 才执行绑定并缓存，后续读取直接命中；
/// - 配置根重载时，监视器重新物化所有已缓存的名字，并把 `(新值, 名字)`
///   按交付顺序推送给监听者——这是包装器实现“值始终最新”的通知源。
///
/// ### 契约说明（What）
/// - 构造时解析 [`ConfigurationRoot`]，缺失即致命错误；
/// - 监听订阅以 [`ChangeSubscription`] 归还，析构即退订；
/// - 监视器自身对重载广播的订阅随监视器析构一并释放。
///
/// ### 并发语义（Trade-offs）
/// - 缓存采用 `DashMap`，读取与重载互不阻塞；重载线程整项替换 `Arc<T>`，
///   读者要么看到旧值要么看到新值，绝不会看到半成品；
/// - 某个名字重新物化失败时记录 `warn!` 并保留旧值：读路径的完整性优先于
///   错误的即时暴露。
pub struct OptionsMonitor<T> {
    shared: Arc<MonitorShared<T>>,
    _reload: ReloadGuard,
}

impl<T> std::fmt::Debug for OptionsMonitor<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OptionsMonitor").finish_non_exhaustive()
    }
}

struct MonitorShared<T> {
    services: Arc<ServiceProvider>,
    registry: Arc<OptionsRegistry>,
    cache: DashMap<String, Arc<T>>,
    listeners: Arc<ListenerTable<T>>,
    next_listener: AtomicU64,
}

impl<T> OptionsMonitor<T>
where
    T: Default + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    /// 构造监视器并挂接到配置根的重载广播。
    ///
    /// - **前置条件**：`services` 中已注册 [`ConfigurationRoot`]；
    /// - **错误**：配置根缺失返回 [`OptionsError::MissingDependency`]。
    pub fn new(
        services: Arc<ServiceProvider>,
        registry: Arc<OptionsRegistry>,
    ) -> Result<Self, OptionsError> {
        let root = services.get_required::<ConfigurationRoot>()?;
        let shared = Arc::new(MonitorShared {
            services,
            registry,
            cache: DashMap::new(),
            listeners: Arc::new(RwLock::new(Vec::new())),
            next_listener: AtomicU64::new(0),
        });
        // 弱引用挂接：监视器先于配置根销毁时，重载回调退化为空操作。
        let weak = Arc::downgrade(&shared);
        let reload = root.on_reload(move || {
            if let Some(shared) = weak.upgrade() {
                shared.refresh();
            }
        });
        Ok(Self {
            shared,
            _reload: reload,
        })
    }

    /// 取指定名字的当前值；首次访问时惰性物化并缓存。
    ///
    /// - **后置条件**：返回的 `Arc<T>` 为完整成形的快照，后续重载不影响
    ///   已返回的引用；
    /// - **错误**：首次物化失败按致命装配错误传播，缓存保持未填充。
    pub fn get(&self, name: &str) -> Result<Arc<T>, OptionsError> {
        if let Some(entry) = self.shared.cache.get(name) {
            return Ok(Arc::clone(entry.value()));
        }
        let value = Arc::new(self.shared.registry.create::<T>(&self.shared.services, name)?);
        debug!(name = %name, "materialized named option");
        // 并发首访时保留先写入者，保证同名读者拿到同一快照。
        let entry = self
            .shared
            .cache
            .entry(name.to_owned())
            .or_insert_with(|| Arc::clone(&value));
        Ok(Arc::clone(entry.value()))
    }

    /// 订阅值变更：每次重载后对每个重新物化成功的名字回调 `(新值, 名字)`。
    ///
    /// - **输出**：[`ChangeSubscription`]，析构即退订；
    /// - **顺序**：通知在重载线程上同步执行，与交付顺序一致，不做合并。
    pub fn on_change<F>(&self, listener: F) -> ChangeSubscription<T>
    where
        F: Fn(&Arc<T>, &str) + Send + Sync + 'static,
    {
        let id = self.shared.next_listener.fetch_add(1, Ordering::Relaxed);
        self.shared.listeners.write().push((id, Arc::new(listener)));
        ChangeSubscription {
            listeners: Arc::downgrade(&self.shared.listeners),
            id,
        }
    }

    #[cfg(test)]
    pub(crate) fn listener_count(&self) -> usize {
        self.shared.listeners.read().len()
    }
}

impl<T> MonitorShared<T>
where
    T: Default + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    /// 配置重载后的再物化：逐名替换缓存并广播。
    fn refresh(&self) {
        let names: Vec<String> = self
            .cache
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        for name in names {
            match self.registry.create::<T>(&self.services, &name) {
                Ok(next) => {
                    let next = Arc::new(next);
                    self.cache.insert(name.clone(), Arc::clone(&next));
                    debug!(name = %name, "re-materialized named option after reload");
                    let listeners: Vec<ChangeListener<T>> = self
                        .listeners
                        .read()
                        .iter()
                        .map(|(_, listener)| Arc::clone(listener))
                        .collect();
                    // 通知期间不持锁，监听者可以在回调中退订。
                    for listener in listeners {
                        listener(&next, &name);
                    }
                }
                Err(error) => {
                    warn!(
                        name = %name,
                        error = %error,
                        "re-materialization failed; keeping the previous value"
                    );
                }
            }
        }
    }
}

/// 变更监听的作用域句柄：析构即退订，幂等且线程安全。
pub struct ChangeSubscription<T> {
    listeners: Weak<ListenerTable<T>>,
    id: u64,
}

impl<T> Drop for ChangeSubscription<T> {
    fn drop(&mut self) {
        if let Some(listeners) = self.listeners.upgrade() {
            listeners.write().retain(|(id, _)| *id != self.id);
        }
    }
}
