use std::sync::Arc;

use arc_swap::ArcSwap;
use serde::{Serialize, de::DeserializeOwned};

use crate::{
    error::OptionsError,
    monitor::{ChangeSubscription, OptionsMonitor},
};

/// 把监视器中某个名字的最新值暴露为一个读无锁的取值器。
///
/// ### 设计动机（Why）
/// - 名字维度的消费方往往只关心“此刻的值”，不想自己维护监听回调；包装器
///   替它订阅监视器，把命中本名字的变更原子地换进 `ArcSwap`。
/// - 读路径 `value()` 仅做指针加载：永不阻塞、永不触发重新计算，读者拿到
///   的要么是旧快照要么是新快照，绝无半成品。
///
/// ### 契约说明（What）
/// - **状态机**：构造中（同步取初值、登记监听）→ 存活（值保持最新）；
/// - **不变量**：`value()` 始终等于监视器为该名字交付的最近一个值，若尚无
///   匹配变更则为构造时取得的初值；其它名字的通知不会改写本包装器；
/// - **析构**：内部的 [`ChangeSubscription`] 随包装器一起释放，监听回调
///   确定性退订，不在监视器上遗留悬挂订阅。
///
/// ### 并发语义（Trade-offs）
/// - 变更按监视器交付顺序逐个生效：快速连续的多次变更可能各自被读者短暂
///   观察到，最终停留在最后一次——本层不做合并或去抖。
pub struct NamedOptionWrapper<T> {
    name: String,
    current: Arc<ArcSwap<T>>,
    _subscription: ChangeSubscription<T>,
}

impl<T> NamedOptionWrapper<T>
where
    T: Default + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    /// 构造包装器：同步取初值，然后挂接名字过滤的变更监听。
    ///
    /// - **错误**：初值物化失败按致命装配错误传播，不产生半初始化的实例。
    pub fn new(name: impl Into<String>, monitor: &OptionsMonitor<T>) -> Result<Self, OptionsError> {
        let name = name.into();
        let current = Arc::new(ArcSwap::new(monitor.get(&name)?));
        let slot = Arc::clone(&current);
        let filter = name.clone();
        let subscription = monitor.on_change(move |value, changed| {
            if changed == filter {
                slot.store(Arc::clone(value));
            }
        });
        Ok(Self {
            name,
            current,
            _subscription: subscription,
        })
    }

    /// 包装器绑定的选项名。
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 当前值的共享快照。
    #[inline]
    pub fn value(&self) -> Arc<T> {
        self.current.load_full()
    }
}
