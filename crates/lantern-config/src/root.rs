use std::sync::{
    Arc, Weak,
    atomic::{AtomicU64, Ordering},
};

use arc_swap::ArcSwap;
use parking_lot::RwLock;

use crate::{node::ConfigNode, path::SectionPath};

type ReloadCallback = Arc<dyn Fn() + Send + Sync>;
type WatcherTable = RwLock<Vec<(u64, ReloadCallback)>>;

/// 配置树的运行期入口：原子快照读取 + 重载广播。
///
/// ### 设计动机（Why）
/// - 读路径必须对写入零阻塞：选项监视器、包装器在任意线程读取快照，热更新
///   线程整树替换，两侧互不等待。内部用 `ArcSwap<ConfigNode>` 实现
///   RCU 式的指针交换。
/// - 观察者以回调形式订阅重载事件；订阅以 [`ReloadGuard`] 的形式归还调用方，
///   析构即退订，不遗留悬挂回调。
///
/// ### 契约说明（What）
/// - **持有状态**：当前配置树快照与重载观察者表；
/// - **前置条件**：传入的树须为装配完成的只读结构，本类型不做校验；
/// - **后置条件**：`reload` 对后续 `snapshot`/`section` 立即可见，旧快照在
///   持有者释放前保持有效。
///
/// ### 并发语义（Trade-offs）
/// - 广播在调用 `reload` 的线程上同步执行，按订阅顺序逐个通知；回调耗时会
///   拖慢本次重载，但换来“通知顺序与交付顺序一致”的确定性。
/// - 广播前先把回调克隆出观察者表，通知期间不持锁，回调内部可安全地再次
///   订阅或退订。
pub struct ConfigurationRoot {
    tree: ArcSwap<ConfigNode>,
    watchers: Arc<WatcherTable>,
    next_watcher: AtomicU64,
}

impl ConfigurationRoot {
    /// 以初始树构造入口。
    pub fn new(tree: ConfigNode) -> Self {
        Self {
            tree: ArcSwap::new(Arc::new(tree)),
            watchers: Arc::new(RwLock::new(Vec::new())),
            next_watcher: AtomicU64::new(0),
        }
    }

    /// 获取当前树的共享快照（零拷贝，仅增加引用计数）。
    #[inline]
    pub fn snapshot(&self) -> Arc<ConfigNode> {
        self.tree.load_full()
    }

    /// 取出指定路径的子树快照。
    ///
    /// - **输出**：命中时返回子树的克隆，调用方可脱离根的生命周期使用；
    ///   未命中返回 `None`，按约定不是错误。
    pub fn section(&self, path: &SectionPath) -> Option<ConfigNode> {
        self.tree.load().section(path).cloned()
    }

    /// 用新树替换当前快照，并同步通知所有重载观察者。
    pub fn reload(&self, tree: ConfigNode) {
        self.tree.store(Arc::new(tree));
        let callbacks: Vec<ReloadCallback> = self
            .watchers
            .read()
            .iter()
            .map(|(_, callback)| Arc::clone(callback))
            .collect();
        for callback in callbacks {
            callback();
        }
    }

    /// 订阅重载事件。
    ///
    /// ### 契约说明（What）
    /// - **输入**：重载后被调用的回调，需自行从根读取新状态；
    /// - **输出**：[`ReloadGuard`]，其析构即退订；
    /// - **后置条件**：回调按订阅顺序在 `reload` 的调用线程上执行。
    pub fn on_reload<F>(&self, callback: F) -> ReloadGuard
    where
        F: Fn() + Send + Sync + 'static,
    {
        let id = self.next_watcher.fetch_add(1, Ordering::Relaxed);
        self.watchers.write().push((id, Arc::new(callback)));
        ReloadGuard {
            watchers: Arc::downgrade(&self.watchers),
            id,
        }
    }

    #[cfg(test)]
    fn watcher_count(&self) -> usize {
        self.watchers.read().len()
    }
}

/// 重载订阅的作用域句柄：析构即退订。
///
/// - 持有观察者表的弱引用，根先于句柄销毁时退订退化为空操作；
/// - 退订幂等，可在任意线程发生。
pub struct ReloadGuard {
    watchers: Weak<WatcherTable>,
    id: u64,
}

impl Drop for ReloadGuard {
    fn drop(&mut self) {
        if let Some(watchers) = self.watchers.upgrade() {
            watchers.write().retain(|(id, _)| *id != self.id);
        }
    }
}
