#![deny(unsafe_code)]
#![doc = "lantern-options: 命名配置绑定注册表与响应式选项访问器。"]

//! # 模块职责（Why）
//! - 在 [`lantern_config`] 的配置树之上提供“选项绑定”层：启动期把配置节
//!   登记到强类型选项上，运行期按需物化、缓存并响应热更新。
//! - 两个核心构件：
//!   1. **绑定注册表**（[`OptionsBuilder`] / [`OptionsRegistry`]）——由组合根
//!      显式构造并传递，不依赖任何进程级全局状态；
//!   2. **命名选项包装器**（[`NamedOptionWrapper`]）——把监视器中某个名字的
//!      最新值暴露为一个读无锁的取值器。
//!
//! # 装配路线图（How）
//! 1. 组合根向 [`ServiceProvider`] 注册 [`ConfigurationRoot`] 等单例；
//! 2. 通过 [`OptionsBuilder::configure`] 系列方法登记绑定规则，`build`
//!    冻结为 [`OptionsRegistry`]；
//! 3. 运行期以 [`OptionsMonitor`] 物化与监听选项，名字维度的消费方持有
//!    [`NamedOptionWrapper`]。
//!
//! [`ConfigurationRoot`]: lantern_config::ConfigurationRoot

mod binder;
mod error;
mod monitor;
mod provider;
mod registry;
mod wrapper;

pub use binder::{BinderRule, ConfigureFn, DEFAULT_NAME};
pub use error::OptionsError;
pub use monitor::{ChangeSubscription, OptionsMonitor};
pub use provider::ServiceProvider;
pub use registry::{OptionsBuilder, OptionsRegistry};
pub use wrapper::NamedOptionWrapper;
