// ==========================================
// DAT 导入 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// 说明: 行级错误不走这里（记录到 ImportOutcome.errors），
//       这里只描述会中断整次运行的错误
// ==========================================

use crate::repository::error::RepositoryError;
use thiserror::Error;

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件相关错误 =====
    #[error("文件读取失败: {0}")]
    FileReadError(String),

    #[error("目录扫描失败 ({dir}): {message}")]
    DirectoryScanError { dir: String, message: String },

    // ===== 导入台账错误 =====
    #[error("导入台账读取失败 ({path}): {message}")]
    LedgerRead { path: String, message: String },

    #[error("导入台账写入失败 ({path}): {message}")]
    LedgerWrite { path: String, message: String },

    // ===== 数据库错误 =====
    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    #[error("数据库事务失败: {0}")]
    DatabaseTransactionError(String),

    #[error("事务提交失败: {0}")]
    CommitError(String),

    // ===== 配置错误 =====
    #[error("配置错误 (key: {key}): {message}")]
    Config { key: String, message: String },
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;

// ==========================================
// LineError - 行级错误
// ==========================================
// 记录到 ImportOutcome.errors 后继续处理下一行，不中断运行
#[derive(Error, Debug)]
pub enum LineError {
    #[error("行 {line}: 格式无效（期望至少 {expected} 个字段，实际 {found} 个）")]
    FieldCount {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("行 {line}: 数据库错误: {source}")]
    Database {
        line: usize,
        #[source]
        source: RepositoryError,
    },
}

impl LineError {
    /// 1 起行号
    pub fn line(&self) -> usize {
        match self {
            LineError::FieldCount { line, .. } | LineError::Database { line, .. } => *line,
        }
    }
}
