// ==========================================
// DAT 导入 - 任务配置
// ==========================================
// 来源优先级: 命令行参数 > 环境变量 > 默认值
// 默认路径位于用户数据目录（dirs::data_dir）
// ==========================================

use crate::importer::customer_filter::CustomerFilter;
use crate::importer::error::{ImportError, ImportResult};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// 环境变量键
pub mod env_keys {
    pub const SOURCE_DIR: &str = "DAT_IMPORT_SOURCE_DIR";
    pub const EXTENSION: &str = "DAT_IMPORT_EXTENSION";
    pub const LEDGER_PATH: &str = "DAT_IMPORT_LEDGER_PATH";
    pub const DB_PATH: &str = "DAT_IMPORT_DB_PATH";
    pub const LOG_FILE: &str = "DAT_IMPORT_LOG_FILE";
    pub const CUSTOMERS: &str = "DAT_IMPORT_CUSTOMERS";
}

/// 默认文件扩展名
pub const DEFAULT_EXTENSION: &str = "dat";

const APP_DIR: &str = "dat-import";

// ==========================================
// ImportJobConfig - 导入任务配置
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportJobConfig {
    pub source_dir: PathBuf,       // DAT 文件监控目录
    pub file_extension: String,    // 候选文件扩展名
    pub ledger_path: PathBuf,      // 导入台账文件
    pub db_path: String,           // SQLite 数据库文件
    pub log_file: Option<PathBuf>, // 为空时日志输出到 stderr
    pub customer_ids: Vec<String>, // 客户白名单，为空不过滤
}

impl Default for ImportJobConfig {
    fn default() -> Self {
        let base = default_data_dir();
        Self {
            source_dir: base.join("incoming"),
            file_extension: DEFAULT_EXTENSION.to_string(),
            ledger_path: base.join("imported_dat_files.txt"),
            db_path: base.join("billing.db").display().to_string(),
            log_file: None,
            customer_ids: Vec::new(),
        }
    }
}

impl ImportJobConfig {
    /// 从环境变量加载配置（未设置或空白的变量使用默认值）
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 从任意键值来源加载配置
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let mut config = Self::default();
        if let Some(v) = get(env_keys::SOURCE_DIR) {
            config.source_dir = PathBuf::from(v);
        }
        if let Some(v) = get(env_keys::EXTENSION) {
            config.file_extension = v.trim_start_matches('.').to_string();
        }
        if let Some(v) = get(env_keys::LEDGER_PATH) {
            config.ledger_path = PathBuf::from(v);
        }
        if let Some(v) = get(env_keys::DB_PATH) {
            config.db_path = v;
        }
        if let Some(v) = get(env_keys::LOG_FILE) {
            config.log_file = Some(PathBuf::from(v));
        }
        if let Some(v) = get(env_keys::CUSTOMERS) {
            config.customer_ids = v
                .split(',')
                .map(|id| id.trim().to_string())
                .filter(|id| !id.is_empty())
                .collect();
        }
        config
    }

    /// 用位置参数覆写: [source_dir] [db_path]
    pub fn apply_args<I>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut args = args
            .into_iter()
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty());
        if let Some(dir) = args.next() {
            self.source_dir = PathBuf::from(dir);
        }
        if let Some(db) = args.next() {
            self.db_path = db;
        }
        self
    }

    /// 校验配置完整性
    pub fn validate(&self) -> ImportResult<()> {
        let config_error = |key: &str, message: &str| ImportError::Config {
            key: key.to_string(),
            message: message.to_string(),
        };

        if self.file_extension.trim().is_empty() {
            return Err(config_error(env_keys::EXTENSION, "扩展名不能为空"));
        }
        if self.source_dir.as_os_str().is_empty() {
            return Err(config_error(env_keys::SOURCE_DIR, "监控目录不能为空"));
        }
        if self.ledger_path.as_os_str().is_empty() {
            return Err(config_error(env_keys::LEDGER_PATH, "台账路径不能为空"));
        }
        if self.db_path.trim().is_empty() {
            return Err(config_error(env_keys::DB_PATH, "数据库路径不能为空"));
        }
        Ok(())
    }

    /// 白名单为空时返回 None
    pub fn customer_filter(&self) -> Option<CustomerFilter> {
        let filter = CustomerFilter::from_ids(&self.customer_ids);
        if filter.is_empty() {
            None
        } else {
            Some(filter)
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from("."))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ImportJobConfig::from_lookup(|_| None);
        assert_eq!(config.file_extension, "dat");
        assert!(config.log_file.is_none());
        assert!(config.customer_filter().is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_overrides() {
        let config = ImportJobConfig::from_lookup(lookup(&[
            (env_keys::SOURCE_DIR, "/data/dat"),
            (env_keys::EXTENSION, ".DAT"),
            (env_keys::LEDGER_PATH, "/data/imported.txt"),
            (env_keys::DB_PATH, "/data/billing.db"),
            (env_keys::LOG_FILE, "/var/log/dat.log"),
            (env_keys::CUSTOMERS, "007, 12,,"),
        ]));

        assert_eq!(config.source_dir, PathBuf::from("/data/dat"));
        assert_eq!(config.file_extension, "DAT");
        assert_eq!(config.ledger_path, PathBuf::from("/data/imported.txt"));
        assert_eq!(config.db_path, "/data/billing.db");
        assert_eq!(config.log_file, Some(PathBuf::from("/var/log/dat.log")));
        assert_eq!(config.customer_ids, vec!["007", "12"]);

        let filter = config.customer_filter().unwrap();
        assert!(filter.allows("7"));
        assert!(!filter.allows("8"));
    }

    #[test]
    fn test_blank_env_values_ignored() {
        let config = ImportJobConfig::from_lookup(lookup(&[
            (env_keys::DB_PATH, "   "),
            (env_keys::EXTENSION, ""),
        ]));
        assert_eq!(config.db_path, ImportJobConfig::default().db_path);
        assert_eq!(config.file_extension, "dat");
    }

    #[test]
    fn test_args_override() {
        let config = ImportJobConfig::from_lookup(|_| None)
            .apply_args(vec!["/mnt/share".to_string(), "/tmp/x.db".to_string()]);
        assert_eq!(config.source_dir, PathBuf::from("/mnt/share"));
        assert_eq!(config.db_path, "/tmp/x.db");
    }

    #[test]
    fn test_validate_rejects_empty_extension() {
        let mut config = ImportJobConfig::default();
        config.file_extension = " ".to_string();
        assert!(matches!(
            config.validate(),
            Err(ImportError::Config { .. })
        ));
    }
}
