// ==========================================
// DAT 导入 - 核心库
// ==========================================
// 职责: 旧账单系统导出的 DAT 文件 → 客户 / 发票 / 发票行
// 技术栈: Rust + SQLite
// 保证: 同一文件至多导入一次（导入台账）
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 导入层 - 解析、实体解析、编排
pub mod importer;

// 配置层 - 任务配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// ==========================================
// 重导出核心类型
// ==========================================

pub use config::ImportJobConfig;
pub use domain::{ImportOutcome, JobOutcome};
pub use importer::{DatImporter, ImportError, ImportJob, ImportLedger, ImportResult};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "DAT 账单导入";
