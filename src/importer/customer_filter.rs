// ==========================================
// DAT 导入 - 客户过滤
// ==========================================
// 可选的客户编号白名单；被排除的行计入 skipped，不算错误
// ==========================================

use crate::domain::dat_record::normalize_customer_id;
use std::collections::HashSet;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomerFilter {
    allowed: HashSet<String>,
}

impl CustomerFilter {
    /// 白名单条目同样做编号标准化，"007" 与 "7" 等价
    pub fn from_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            allowed: ids
                .into_iter()
                .map(|id| id.as_ref().trim().to_string())
                .filter(|id| !id.is_empty())
                .map(|id| normalize_customer_id(&id))
                .collect(),
        }
    }

    /// 空白名单等同于不过滤
    pub fn is_empty(&self) -> bool {
        self.allowed.is_empty()
    }

    /// 判断已标准化的客户编号是否放行
    pub fn allows(&self, normalized_customer_id: &str) -> bool {
        self.allowed.is_empty() || self.allowed.contains(normalized_customer_id)
    }
}
