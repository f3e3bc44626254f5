// ==========================================
// DAT 导入 - 导入层
// ==========================================
// 职责: DAT 文件 → 客户 / 发票 / 发票行
// 流程: 文件选择 → 台账检查 → 逐行解析与实体解析 → 单次提交 → 写台账
// ==========================================

// 模块声明
pub mod customer_filter;
pub mod dat_importer;
pub mod entity_resolver;
pub mod error;
pub mod file_selector;
pub mod import_job;
pub mod invoice_numbering;
pub mod ledger;
pub mod record_parser;

// 重导出核心类型
pub use customer_filter::CustomerFilter;
pub use dat_importer::DatImporter;
pub use entity_resolver::{EntityResolver, ResolvedLine};
pub use error::{ImportError, ImportResult, LineError};
pub use file_selector::FileSelector;
pub use import_job::ImportJob;
pub use invoice_numbering::InvoiceNumberAllocator;
pub use ledger::ImportLedger;
pub use record_parser::{DatFileReader, RawLine, RecordParser};
