// ==========================================
// DAT 导入 - 领域模型层
// ==========================================
// 职责: 定义源记录、账单实体与导入结果
// 红线: 不含数据访问逻辑
// ==========================================

pub mod billing;
pub mod dat_record;
pub mod import;

// 重导出核心类型
pub use billing::{Customer, Invoice, InvoiceLine, NewCustomer, NewInvoice, NewInvoiceLine};
pub use dat_record::{DatRecord, ItemDetails};
pub use import::{ImportOutcome, JobOutcome};
