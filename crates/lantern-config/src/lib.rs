#![deny(unsafe_code)]
#![doc = "lantern-config: 分层配置树的读取、绑定与热更新广播契约。"]

//! # 模块职责（Why）
//! - 为上层的选项绑定体系提供“已装配完成”的配置树抽象：本 crate 不负责解析
//!   文件或合并多源数据，只消费外部装配好的 [`ConfigNode`]。
//! - 通过 [`bind_onto`] 把配置子树按字段名（ASCII 大小写不敏感）覆盖到任意
//!   `serde` 可序列化的选项实例上，保持“顺序绑定即顺序覆盖”的组合语义。
//! - [`ConfigurationRoot`] 在树之上叠加一层原子快照与重载广播，使运行期组件
//!   能以读无锁的方式感知配置变化。
//!
//! # 使用路线图（How）
//! 1. 由组合根装配一棵 [`ConfigNode::Dictionary`]，包装进 [`ConfigurationRoot`]；
//! 2. 上层按 [`SectionPath`] 取节（missing 即 `None`，不是错误）；
//! 3. 需要热更新时调用 [`ConfigurationRoot::reload`]，观察者通过
//!    [`ConfigurationRoot::on_reload`] 拿到的 [`ReloadGuard`] 在析构时自动退订。

mod bind;
mod error;
mod node;
mod path;
mod root;

pub use bind::bind_onto;
pub use error::ConfigError;
pub use node::ConfigNode;
pub use path::SectionPath;
pub use root::{ConfigurationRoot, ReloadGuard};
