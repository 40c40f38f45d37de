use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};

use crate::{error::ConfigError, node::ConfigNode};

/// 把配置子树覆盖绑定到一个选项实例上。
///
/// ### 设计目的（Why）
/// - 选项体系要求“顺序绑定即顺序覆盖”：后执行的绑定只改写自己命中的字段，
///   其余字段保留先前的值。借助 `serde` 先把当前实例展开成中间表示，再把
///   子树合并进去并整体还原，天然得到这一组合语义。
///
/// ### 执行逻辑（How）
/// 1. `serde_json::to_value` 展开当前实例；
/// 2. [`merge`] 将子树按字段名（ASCII 大小写不敏感）合并到展开结果；
/// 3. `serde_json::from_value` 还原并回写 `target`。
///
/// ### 契约说明（What）
/// - **前置条件**：`T` 的 `Serialize`/`Deserialize` 表示需要互逆（常规
///   `#[derive]` 即满足）。
/// - **后置条件**：子树未提及的字段保持原值；命中的字段被整体覆盖；
///   文本叶子会按目标字段当前的标量类型尝试转换（`"5432"` 可落到整数字段）。
/// - **错误**：还原失败返回 [`ConfigError::Bind`]，`target` 保持原值不变。
pub fn bind_onto<T>(section: &ConfigNode, target: &mut T) -> Result<(), ConfigError>
where
    T: Serialize + DeserializeOwned,
{
    let mut current = serde_json::to_value(&*target).map_err(|error| ConfigError::Bind {
        detail: error.to_string(),
    })?;
    merge(&mut current, &section.to_json());
    *target = serde_json::from_value(current).map_err(|error| ConfigError::Bind {
        detail: error.to_string(),
    })?;
    Ok(())
}

/// 将 `incoming` 合并到 `current`：字典递归、其余整体覆盖。
fn merge(current: &mut Value, incoming: &Value) {
    match (current, incoming) {
        (Value::Object(fields), Value::Object(entries)) => {
            for (key, value) in entries {
                match lookup_field(fields, key) {
                    Some(field) => {
                        if let Some(slot) = fields.get_mut(&field) {
                            merge(slot, value);
                        }
                    }
                    None => {
                        fields.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (slot, value) => {
            let next = coerce(slot, value);
            *slot = next;
        }
    }
}

/// 在展开后的实例字段中做 ASCII 大小写不敏感查找，返回字段的原始拼写。
fn lookup_field(fields: &Map<String, Value>, key: &str) -> Option<String> {
    fields
        .keys()
        .find(|field| field.eq_ignore_ascii_case(key))
        .cloned()
}

/// 标量覆盖时的类型调和：以目标字段当前的标量类型为准做受控转换。
///
/// - 数字字段接受可解析的文本（保持整数/浮点之分）；
/// - 布尔字段接受 `"true"`/`"false"`（不区分大小写）;
/// - 文本字段接受数字与布尔的字符串化；
/// - 其余情况（包括目标为 `null` 的可选字段）按来源值原样覆盖，解析失败时
///   同样原样覆盖，让还原阶段给出准确的类型错误。
fn coerce(existing: &Value, incoming: &Value) -> Value {
    match (existing, incoming) {
        (Value::Number(number), Value::String(text)) => {
            let text = text.trim();
            if number.is_f64() {
                text.parse::<f64>()
                    .ok()
                    .and_then(serde_json::Number::from_f64)
                    .map(Value::Number)
                    .unwrap_or_else(|| incoming.clone())
            } else {
                text.parse::<i64>()
                    .map(|parsed| Value::Number(parsed.into()))
                    .unwrap_or_else(|_| incoming.clone())
            }
        }
        (Value::Bool(_), Value::String(text)) => {
            let text = text.trim();
            if text.eq_ignore_ascii_case("true") {
                Value::Bool(true)
            } else if text.eq_ignore_ascii_case("false") {
                Value::Bool(false)
            } else {
                incoming.clone()
            }
        }
        (Value::String(_), Value::Number(number)) => Value::String(number.to_string()),
        (Value::String(_), Value::Bool(flag)) => Value::String(flag.to_string()),
        _ => incoming.clone(),
    }
}
