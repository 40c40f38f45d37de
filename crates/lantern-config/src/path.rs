use std::fmt;

/// 配置节的点分路径，例如 `"Database.Primary"`。
///
/// ### 设计目的（Why）
/// - 与业界配置系统（.NET `IConfiguration`、Spring `Environment`）的分节寻址
///   习惯对齐，调用方以一个字符串即可定位任意深度的子树。
/// - 解析后保存分段列表，后续在树上逐段下钻时无需重复切分字符串。
///
/// ### 契约说明（What）
/// - 解析按 `.` 切分并丢弃空段：`"a..b."` 与 `"a.b"` 等价。
/// - `Display` 输出点分形式，供错误信息与日志使用。
/// - 路径本身不承载大小写语义；与树的匹配由 [`ConfigNode::section`]
///   （ASCII 大小写不敏感）负责。
///
/// [`ConfigNode::section`]: crate::ConfigNode::section
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SectionPath {
    segments: Vec<String>,
}

impl SectionPath {
    /// 解析点分路径。空字符串产生空路径（指向整棵树）。
    pub fn parse(path: &str) -> Self {
        let segments = path
            .split('.')
            .filter(|segment| !segment.is_empty())
            .map(str::to_owned)
            .collect();
        Self { segments }
    }

    /// 返回路径分段。
    #[inline]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// 路径是否为空（指向树根）。
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

impl From<&str> for SectionPath {
    fn from(value: &str) -> Self {
        Self::parse(value)
    }
}

impl From<String> for SectionPath {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl fmt::Display for SectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for segment in &self.segments {
            if !first {
                f.write_str(".")?;
            }
            f.write_str(segment)?;
            first = false;
        }
        Ok(())
    }
}
