// ==========================================
// DAT 导入 - 导入结果模型
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// ImportOutcome - 单文件导入结果
// ==========================================
// 不变量（未中断时）: imported + skipped + errors.len() == 非空行数
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportOutcome {
    pub imported_count: usize,
    pub skipped_count: usize, // 客户过滤排除的行（不含错误行）
    pub errors: Vec<String>,  // 每条失败行一条，含 1 起行号
    pub summary: Vec<String>, // 本次新建的客户/发票
    pub file_path: String,

    /// 文件级失败（读文件失败）时为 true，此时不得写入导入台账
    #[serde(default)]
    pub aborted: bool,
}

impl ImportOutcome {
    pub fn new(file_path: &str) -> Self {
        Self {
            file_path: file_path.to_string(),
            ..Default::default()
        }
    }

    /// 文件读取失败：零计数 + 单条错误
    pub fn file_failure(file_path: &str, message: String) -> Self {
        Self {
            errors: vec![message],
            aborted: true,
            ..Self::new(file_path)
        }
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// 已处理的非空行数
    pub fn processed_lines(&self) -> usize {
        self.imported_count + self.skipped_count + self.errors.len()
    }
}

// ==========================================
// JobOutcome - 定时任务单次运行结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobOutcome {
    /// 目录中没有候选文件
    NoFiles,
    /// 最新文件已在台账中
    AlreadyImported { file_name: String },
    /// 已导入（包括部分行失败）
    Imported {
        file_name: String,
        outcome: ImportOutcome,
    },
    /// 文件读取失败，未写台账
    Aborted {
        file_name: String,
        outcome: ImportOutcome,
    },
}
