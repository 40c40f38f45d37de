use lantern_config::ConfigError;
use thiserror::Error;

/// 选项体系对外暴露的错误域。
///
/// ### 契约说明（What）
/// - `MissingDependency`：服务定位器中缺少必需协作者（如配置根），属于
///   致命的装配错误，按原样向上传播、不做恢复；
/// - `Bind`：某个配置节落到选项实例时失败，携带节路径便于排障；
/// - `Internal`：绑定槽位中出现类型不一致。公共 API 的构造方式保证该分支
///   不可达，仍以错误而非 panic 暴露。
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum OptionsError {
    /// 必需服务未注册。
    #[error("required service `{service}` is not registered")]
    MissingDependency { service: &'static str },

    /// 配置节绑定失败。
    #[error("binding configuration section `{section}` failed")]
    Bind {
        section: String,
        #[source]
        source: ConfigError,
    },

    /// 绑定槽位类型不一致。
    #[error("options slot holds an unexpected binder type: {detail}")]
    Internal { detail: String },
}
