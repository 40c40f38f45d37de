use std::{
    any::{Any, TypeId, type_name},
    collections::HashMap,
    fmt,
    sync::Arc,
};

use crate::error::OptionsError;

/// 按类型索引的最小服务定位器。
///
/// ### 设计目的（Why）
/// - 绑定规则在执行时需要解析协作者（配置根、自定义依赖）；选项层只要求
///   “按契约类型取单例”这一种能力，故不引入完整的依赖注入容器。
/// - 由组合根构造并显式传递（通常包进 `Arc`），避免进程级全局注册表。
///
/// ### 契约说明（What）
/// - 键为 `TypeId`，同一类型重复注册时后者覆盖前者；
/// - [`Self::get_required`] 未命中返回
///   [`OptionsError::MissingDependency`]，调用方按致命装配错误处理。
///
/// ### 注意事项（Trade-offs）
/// - 注册需要 `&mut self`：装配完成后包进 `Arc` 即天然冻结，运行期只读。
#[derive(Default)]
pub struct ServiceProvider {
    entries: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
}

impl ServiceProvider {
    /// 创建空的定位器。
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册一个类型化单例，返回 `&mut Self` 以便链式装配。
    pub fn register<S>(&mut self, service: Arc<S>) -> &mut Self
    where
        S: Send + Sync + 'static,
    {
        self.entries.insert(TypeId::of::<S>(), service);
        self
    }

    /// 按类型解析单例；未注册时返回 `None`。
    pub fn get<S>(&self) -> Option<Arc<S>>
    where
        S: Send + Sync + 'static,
    {
        self.entries
            .get(&TypeId::of::<S>())
            .and_then(|entry| Arc::clone(entry).downcast::<S>().ok())
    }

    /// 按类型解析单例；未注册视为致命装配错误。
    pub fn get_required<S>(&self) -> Result<Arc<S>, OptionsError>
    where
        S: Send + Sync + 'static,
    {
        self.get::<S>().ok_or(OptionsError::MissingDependency {
            service: type_name::<S>(),
        })
    }
}

impl fmt::Debug for ServiceProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceProvider")
            .field("entry_count", &self.entries.len())
            .finish()
    }
}
