// ==========================================
// DAT 导入 - 发票号消歧
// ==========================================
// 同一文件内原始发票号可能重复（上游“发票号”实为多行发票），
// 按出现次数追加两位序号: 1001 → 1001-01, 1001-02, ...
// 计数只在单次运行内有效，不跨运行持久化
// ==========================================

use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct InvoiceNumberAllocator {
    counters: HashMap<String, u32>,
}

impl InvoiceNumberAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// 为原始发票号分配下一个有效发票号
    pub fn next_effective_number(&mut self, raw_number: &str) -> String {
        let counter = self.counters.entry(raw_number.to_string()).or_insert(0);
        *counter += 1;
        format!("{}-{:02}", raw_number, *counter)
    }
}
