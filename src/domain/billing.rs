// ==========================================
// DAT 导入 - 账单领域模型
// ==========================================
// 对齐: customers / invoices / invoice_lines 三张表
// 说明: New* 为待插入结构（无自增 id），其余为已落库实体
// ==========================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// 发票默认状态
pub const INVOICE_STATUS_OPEN: &str = "open";

// ==========================================
// Customer - 客户
// ==========================================
// 自然键: (customer_id, short_name)
// 导入路径只创建，不更新
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: i64,
    pub customer_id: String, // 外部客户编号（已去前导零）
    pub short_name: String,
    pub full_name: Option<String>,
    pub registration_date: Option<NaiveDate>,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCustomer {
    pub customer_id: String,
    pub short_name: String,
    pub full_name: Option<String>,
    pub registration_date: Option<NaiveDate>,
    pub is_active: bool,
}

impl NewCustomer {
    /// 导入首次见到的客户：全称取简称，注册日期为空，默认启用
    pub fn from_import(customer_id: &str, short_name: &str) -> Self {
        Self {
            customer_id: customer_id.to_string(),
            short_name: short_name.to_string(),
            full_name: Some(short_name.to_string()),
            registration_date: None,
            is_active: true,
        }
    }
}

// ==========================================
// Invoice - 发票头
// ==========================================
// 自然键: (invoice_number, customer_id)，invoice_number 为消歧后的有效发票号
// total_amount 只在创建时由首行写入，后续行不累加
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: i64,
    pub invoice_number: String,
    pub customer_id: i64, // customers.id
    pub invoice_date: Option<NaiveDate>,
    pub total_amount: f64,
    pub status: String,
    pub tax_invoice_number: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewInvoice {
    pub invoice_number: String,
    pub customer_id: i64,
    pub invoice_date: Option<NaiveDate>,
    pub total_amount: f64,
    pub status: String,
    pub tax_invoice_number: Option<String>,
}

// ==========================================
// InvoiceLine - 发票行
// ==========================================
// 每个成功解析的源行对应一条，只插入不合并
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceLine {
    pub id: i64,
    pub invoice_id: i64,
    pub item_name: String,
    pub quantity: f64,
    pub unit_price: f64,
    pub delivered_location: Option<String>,
    pub is_defective: bool,
    pub color: String,
    pub delivery_note: String,
    pub yards_sent: f64,
    pub yards_consumed: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewInvoiceLine {
    pub invoice_id: i64,
    pub item_name: String,
    pub quantity: f64,
    pub unit_price: f64,
    pub delivered_location: Option<String>,
    pub is_defective: bool,
    pub color: String,
    pub delivery_note: String,
    pub yards_sent: f64,
    pub yards_consumed: f64,
}

impl NewInvoiceLine {
    /// 导入行：yards_sent 镜像数量，yards_consumed 由下游消耗流程维护（此处为 0）
    pub fn from_import(
        invoice_id: i64,
        item_name: &str,
        quantity: f64,
        unit_price: f64,
        color: &str,
        delivery_note: &str,
    ) -> Self {
        Self {
            invoice_id,
            item_name: item_name.to_string(),
            quantity,
            unit_price,
            delivered_location: None,
            is_defective: false,
            color: color.to_string(),
            delivery_note: delivery_note.to_string(),
            yards_sent: quantity,
            yards_consumed: 0.0,
        }
    }
}
