use thiserror::Error;

/// 配置绑定层的统一错误类型。
///
/// ### 契约说明（What）
/// - `Bind`：配置子树无法落到目标实例上（类型不符、反序列化失败等），
///   属于致命的装配错误，按原样向上传播；
/// - 缺失的配置节不会产生错误：上层将其定义为“无字段写入”的空操作。
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// 绑定失败，携带底层序列化器给出的上下文。
    #[error("configuration binding failed: {detail}")]
    Bind { detail: String },
}
