use std::{any::TypeId, collections::HashMap, fmt, sync::Arc};

use lantern_config::SectionPath;
use serde::{Serialize, de::DeserializeOwned};

use crate::{
    binder::{BinderRule, ConfigureFn, ErasedBinder, TypedBinder},
    error::OptionsError,
    provider::ServiceProvider,
};

type BinderSlots = HashMap<TypeId, Vec<Arc<dyn ErasedBinder>>>;

/// 绑定注册表的装配入口，由组合根显式构造并传递。
///
/// ### 设计目的（Why）
/// - 把“哪个选项类型由哪段配置填充”的知识集中在启动期一处登记，运行期只剩
///   纯粹的物化调用；注册表对象沿调用链传递，不落在任何全局单例上。
///
/// ### 契约说明（What）
/// - `configure*`：无条件追加绑定规则，同一类型可登记多条，物化时按登记
///   顺序全部执行——重叠字段以最后一条为准；
/// - `try_configure*`：仅当该类型尚无任何绑定规则时才登记（add-if-absent，
///   槽位即选项类型本身），已占用时返回 `false` 且不做任何事；
/// - `build`：冻结为只读的 [`OptionsRegistry`]。
///
/// ### 注意事项（Trade-offs）
/// - 注册期不访问配置树，也不校验节是否存在；缺节在物化时定义为空操作，
///   这让注册顺序与配置装载顺序完全解耦。
#[derive(Default)]
pub struct OptionsBuilder {
    slots: BinderSlots,
}

impl OptionsBuilder {
    /// 创建空的注册表。
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记无条件配置节绑定：物化默认实例时把 `section` 覆盖到 `T` 上。
    pub fn configure<T>(&mut self, section: impl Into<SectionPath>) -> &mut Self
    where
        T: Serialize + DeserializeOwned + Send + Sync + 'static,
    {
        self.push::<T>(BinderRule::Section(section.into()));
        self
    }

    /// 登记命名配置节绑定：仅当物化名等于 `name` 时生效。
    ///
    /// 同一 `T` 的多条命名规则可以共存，各管各的名字。
    pub fn configure_named<T>(
        &mut self,
        name: impl Into<String>,
        section: impl Into<SectionPath>,
    ) -> &mut Self
    where
        T: Serialize + DeserializeOwned + Send + Sync + 'static,
    {
        self.push::<T>(BinderRule::NamedSection {
            name: name.into(),
            section: section.into(),
        });
        self
    }

    /// 登记服务感知绑定：回调拿到定位器与实例，适合需要已解析服务而非
    /// 配置节的场景。
    pub fn configure_with<T, F>(&mut self, configure: F) -> &mut Self
    where
        T: Serialize + DeserializeOwned + Send + Sync + 'static,
        F: Fn(&ServiceProvider, &mut T) + Send + Sync + 'static,
    {
        self.push::<T>(BinderRule::WithServices(Arc::new(configure) as ConfigureFn<T>));
        self
    }

    /// [`Self::configure`] 的 add-if-absent 形态；槽位已占用时返回 `false`。
    pub fn try_configure<T>(&mut self, section: impl Into<SectionPath>) -> bool
    where
        T: Serialize + DeserializeOwned + Send + Sync + 'static,
    {
        if self.occupied::<T>() {
            return false;
        }
        self.push::<T>(BinderRule::Section(section.into()));
        true
    }

    /// [`Self::configure_named`] 的 add-if-absent 形态。
    ///
    /// 槽位按选项类型判定：只要 `T` 已有任何绑定规则（无论命名与否），
    /// 本调用即为空操作。
    pub fn try_configure_named<T>(
        &mut self,
        name: impl Into<String>,
        section: impl Into<SectionPath>,
    ) -> bool
    where
        T: Serialize + DeserializeOwned + Send + Sync + 'static,
    {
        if self.occupied::<T>() {
            return false;
        }
        self.push::<T>(BinderRule::NamedSection {
            name: name.into(),
            section: section.into(),
        });
        true
    }

    /// [`Self::configure_with`] 的 add-if-absent 形态。
    pub fn try_configure_with<T, F>(&mut self, configure: F) -> bool
    where
        T: Serialize + DeserializeOwned + Send + Sync + 'static,
        F: Fn(&ServiceProvider, &mut T) + Send + Sync + 'static,
    {
        if self.occupied::<T>() {
            return false;
        }
        self.push::<T>(BinderRule::WithServices(Arc::new(configure) as ConfigureFn<T>));
        true
    }

    /// 冻结注册表。
    pub fn build(self) -> OptionsRegistry {
        OptionsRegistry { slots: self.slots }
    }

    fn push<T>(&mut self, rule: BinderRule<T>)
    where
        T: Serialize + DeserializeOwned + Send + Sync + 'static,
    {
        self.slots
            .entry(TypeId::of::<T>())
            .or_default()
            .push(Arc::new(TypedBinder { rule }));
    }

    fn occupied<T: 'static>(&self) -> bool {
        self.slots
            .get(&TypeId::of::<T>())
            .is_some_and(|binders| !binders.is_empty())
    }
}

impl fmt::Debug for OptionsBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OptionsBuilder")
            .field("slot_count", &self.slots.len())
            .finish()
    }
}

/// 冻结后的绑定注册表：选项物化的唯一入口。
pub struct OptionsRegistry {
    slots: BinderSlots,
}

impl OptionsRegistry {
    /// 物化一个选项实例。
    ///
    /// ### 执行逻辑（How）
    /// 1. 从 `T::default()` 出发；
    /// 2. 按登记顺序执行 `T` 槽位中的全部绑定规则（名字门控由规则自理）；
    /// 3. 零条规则时直接返回默认实例。
    ///
    /// ### 契约说明（What）
    /// - 相同输入（注册表、配置快照、名字）下幂等；
    /// - 任何一条规则失败即中止并向上传播，半成品实例被丢弃。
    pub fn create<T>(&self, services: &ServiceProvider, name: &str) -> Result<T, OptionsError>
    where
        T: Default + Serialize + DeserializeOwned + Send + Sync + 'static,
    {
        let mut value = T::default();
        if let Some(binders) = self.slots.get(&TypeId::of::<T>()) {
            for binder in binders {
                binder.apply(services, name, &mut value)?;
            }
        }
        Ok(value)
    }

    /// 物化默认（未命名）实例的便捷入口。
    pub fn create_default<T>(&self, services: &ServiceProvider) -> Result<T, OptionsError>
    where
        T: Default + Serialize + DeserializeOwned + Send + Sync + 'static,
    {
        self.create(services, crate::binder::DEFAULT_NAME)
    }
}

impl fmt::Debug for OptionsRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OptionsRegistry")
            .field("slot_count", &self.slots.len())
            .finish()
    }
}
