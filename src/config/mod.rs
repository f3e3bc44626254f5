// ==========================================
// DAT 导入 - 配置层
// ==========================================

pub mod import_config;

pub use import_config::{env_keys, ImportJobConfig};
