use std::collections::BTreeMap;

use serde_json::{Map, Number, Value};

use crate::path::SectionPath;

/// 已装配完成的分层配置树节点。
///
/// ### 设计目的（Why）
/// - 以强类型枚举表达配置值，避免纯字符串配置在解析阶段的歧义；字符串叶子
///   仍然保留，并在绑定阶段按目标字段类型做受控转换（见 [`bind_onto`]）。
/// - 字典采用 [`BTreeMap`]，保证遍历与序列化顺序确定，便于做快照比对。
///
/// ### 契约说明（What）
/// - 树在本系统视角下是不可变的；热更新通过整树替换完成
///   （见 [`ConfigurationRoot::reload`]）。
/// - 节点寻址见 [`Self::section`]；未命中路径返回 `None`，不是错误。
///
/// [`bind_onto`]: crate::bind_onto
/// [`ConfigurationRoot::reload`]: crate::ConfigurationRoot::reload
#[derive(Clone, Debug, PartialEq)]
#[non_exhaustive]
pub enum ConfigNode {
    Boolean(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    List(Vec<ConfigNode>),
    Dictionary(BTreeMap<String, ConfigNode>),
}

impl ConfigNode {
    /// 便捷构造字典节点。
    pub fn dictionary<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, ConfigNode)>,
        K: Into<String>,
    {
        Self::Dictionary(
            entries
                .into_iter()
                .map(|(key, value)| (key.into(), value))
                .collect(),
        )
    }

    /// 按路径下钻到子树。
    ///
    /// ### 契约说明（What）
    /// - 逐段在字典节点中查找，键匹配为 ASCII 大小写不敏感；
    /// - 任一分段未命中，或中途遇到非字典节点，即返回 `None`；
    /// - 空路径返回节点自身。
    pub fn section(&self, path: &SectionPath) -> Option<&ConfigNode> {
        let mut current = self;
        for segment in path.segments() {
            let ConfigNode::Dictionary(entries) = current else {
                return None;
            };
            current = entries
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(segment))
                .map(|(_, value)| value)?;
        }
        Some(current)
    }

    /// 转换为绑定中间表示。非法浮点（NaN/∞）降级为 `null`。
    pub(crate) fn to_json(&self) -> Value {
        match self {
            Self::Boolean(value) => Value::Bool(*value),
            Self::Integer(value) => Value::Number(Number::from(*value)),
            Self::Float(value) => Number::from_f64(*value)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            Self::Text(value) => Value::String(value.clone()),
            Self::List(items) => Value::Array(items.iter().map(Self::to_json).collect()),
            Self::Dictionary(entries) => {
                let mut fields = Map::new();
                for (key, value) in entries {
                    fields.insert(key.clone(), value.to_json());
                }
                Value::Object(fields)
            }
        }
    }
}

impl From<bool> for ConfigNode {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<i64> for ConfigNode {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for ConfigNode {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for ConfigNode {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for ConfigNode {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}
