// ==========================================
// DAT 导入 - 源记录模型
// ==========================================
// 用途: 导入管道中间产物（DAT 行 → 此结构 → 实体解析）
// 生命周期: 仅在单行处理内，解析完成即丢弃
// ==========================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// DAT 行的最少字段数
pub const MIN_FIELD_COUNT: usize = 14;

// ==========================================
// DatRecord - 单行 DAT 记录（已类型化）
// ==========================================
// 字段位置:
// [0] 税标志 [1] 客户简称 [2] 客户编号 [3] 日期 YYYYMMDD [4] 发票号
// [5] 币种 [6] 物料编码 [7] 物料明细 (/ 分隔) [8] 面料数量 [9] 单价
// [10] 保留 [11] 描述 [12] 增值税标志 [13] 保留
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatRecord {
    // ===== 元信息 =====
    pub line_number: usize, // 源文件行号（1 起）

    // ===== 客户 =====
    pub tax_flag: String,
    pub short_name: String,
    pub raw_customer_id: String,

    // ===== 发票头 =====
    pub invoice_date: Option<NaiveDate>,
    pub invoice_number: String,
    pub currency: String, // 下游不使用

    // ===== 发票行 =====
    pub item_code: String,
    pub item_details: ItemDetails,
    pub quantity: f64,   // 面料数量，解析失败回退 0
    pub unit_price: f64, // 单价，解析失败回退 0

    // ===== 未使用字段（保留原文）=====
    pub description: String,
    pub vat_flag: String,
}

impl DatRecord {
    /// 标准化客户编号：能解析为整数则去掉前导零，否则原样返回
    pub fn normalized_customer_id(&self) -> String {
        normalize_customer_id(&self.raw_customer_id)
    }

    /// 发票总额（由创建发票的这一行决定）
    pub fn line_total(&self) -> f64 {
        self.quantity * self.unit_price
    }
}

/// 标准化客户编号（"007" → "7"）
pub fn normalize_customer_id(raw: &str) -> String {
    match raw.parse::<i64>() {
        Ok(n) => n.to_string(),
        Err(_) => raw.to_string(),
    }
}

// ==========================================
// ItemDetails - 物料明细子字段
// ==========================================
// 源格式: "TAX/RED/0/NOTE123"（/ 分隔，空段丢弃）
// - 第 2 段为颜色
// - 第 3 段为送货单号；若第 3 段为字面 "0" 且存在第 4 段，则取第 4 段
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDetails {
    pub color: String,
    pub delivery_note: String,
}

impl ItemDetails {
    /// 从物料明细字符串解析颜色与送货单号
    pub fn parse(raw: &str) -> Self {
        let segments: Vec<&str> = raw
            .split('/')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();

        let color = segments.get(1).copied().unwrap_or("").to_string();

        // "0" 是上游的占位约定（表示取下一段），原样复现
        let delivery_note = match segments.get(2) {
            Some(&"0") if segments.len() > 3 => segments[3].to_string(),
            Some(note) => note.to_string(),
            None => String::new(),
        };

        Self {
            color,
            delivery_note,
        }
    }
}
