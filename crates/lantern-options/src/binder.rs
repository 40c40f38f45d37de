use std::{any::Any, sync::Arc};

use lantern_config::{ConfigurationRoot, SectionPath, bind_onto};
use serde::{Serialize, de::DeserializeOwned};

use crate::{error::OptionsError, provider::ServiceProvider};

/// 默认（未命名）选项实例的名字。
pub const DEFAULT_NAME: &str = "";

/// 服务感知绑定回调的共享指针形态。
pub type ConfigureFn<T> = Arc<dyn Fn(&ServiceProvider, &mut T) + Send + Sync>;

/// 一条已登记的配置到选项映射规则。
///
/// ### 设计目的（Why）
/// - 以“带标签的数据记录 + 单一 `apply` 分发”表达三种绑定形态，替代按类型
///   展开的闭包类族：规则本身是纯数据，便于审计与测试。
///
/// ### 契约说明（What）
/// - `Section`：无条件绑定器，仅在物化默认实例（[`DEFAULT_NAME`]）时生效，
///   从定位器解析 [`ConfigurationRoot`] 并把对应节覆盖到实例上；
/// - `NamedSection`：额外携带名字，物化名与之相等时才绑定，否则实例原样
///   通过（静默空操作，不记录日志——按约定如此设计）；
/// - `WithServices`：任意服务感知回调，仅对默认实例生效。
///
/// ### 生命周期（Where）
/// - 在服务注册期创建，与注册表同寿命，每次物化被调用零次或多次。
#[non_exhaustive]
pub enum BinderRule<T> {
    /// 无条件配置节绑定。
    Section(SectionPath),
    /// 名字匹配时生效的配置节绑定。
    NamedSection { name: String, section: SectionPath },
    /// 需要已解析服务参与的自定义绑定。
    WithServices(ConfigureFn<T>),
}

impl<T> BinderRule<T>
where
    T: Serialize + DeserializeOwned,
{
    /// 针对一次物化请求执行本条规则。
    ///
    /// ### 契约说明（What）
    /// - **输入**：`services` 为组合根装配的定位器；`name` 为本次物化的
    ///   选项名；`target` 为待填充实例；
    /// - **后置条件**：名字不匹配时 `target` 保持不变；缺失配置节同样是
    ///   空操作；绑定失败按致命错误向上传播；
    /// - **副作用**：除写入 `target` 外没有其它副作用，不做任何 I/O。
    pub(crate) fn apply(
        &self,
        services: &ServiceProvider,
        name: &str,
        target: &mut T,
    ) -> Result<(), OptionsError> {
        match self {
            Self::Section(section) => {
                if name == DEFAULT_NAME {
                    bind_section(services, section, target)
                } else {
                    Ok(())
                }
            }
            Self::NamedSection {
                name: bound,
                section,
            } => {
                if name == bound {
                    bind_section(services, section, target)
                } else {
                    Ok(())
                }
            }
            Self::WithServices(configure) => {
                if name == DEFAULT_NAME {
                    configure(services, target);
                }
                Ok(())
            }
        }
    }
}

/// 解析配置根并把指定节覆盖到实例上；缺节为空操作。
fn bind_section<T>(
    services: &ServiceProvider,
    section: &SectionPath,
    target: &mut T,
) -> Result<(), OptionsError>
where
    T: Serialize + DeserializeOwned,
{
    let root = services.get_required::<ConfigurationRoot>()?;
    match root.section(section) {
        Some(node) => bind_onto(&node, target).map_err(|source| OptionsError::Bind {
            section: section.to_string(),
            source,
        }),
        None => Ok(()),
    }
}

/// 注册表存储用的类型擦除适配器。
pub(crate) trait ErasedBinder: Send + Sync {
    fn apply(
        &self,
        services: &ServiceProvider,
        name: &str,
        target: &mut dyn Any,
    ) -> Result<(), OptionsError>;
}

pub(crate) struct TypedBinder<T> {
    pub(crate) rule: BinderRule<T>,
}

impl<T> ErasedBinder for TypedBinder<T>
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    fn apply(
        &self,
        services: &ServiceProvider,
        name: &str,
        target: &mut dyn Any,
    ) -> Result<(), OptionsError> {
        let target = target
            .downcast_mut::<T>()
            .ok_or_else(|| OptionsError::Internal {
                detail: format!("expected `{}`", std::any::type_name::<T>()),
            })?;
        self.rule.apply(services, name, target)
    }
}
