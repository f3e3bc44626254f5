// ==========================================
// DAT 导入 - 定时导入任务
// ==========================================
// 流程: 选最新文件 → 台账检查 → 导入 → 写台账
// 并发: 不加锁，调用方必须保证同一时刻只有一个实例运行
// ==========================================

use crate::config::ImportJobConfig;
use crate::db::{ensure_import_schema, open_sqlite_connection, table_exists};
use crate::domain::import::JobOutcome;
use crate::importer::dat_importer::DatImporter;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_selector::FileSelector;
use crate::importer::ledger::ImportLedger;
use tracing::{info, warn};

pub struct ImportJob {
    config: ImportJobConfig,
    selector: FileSelector,
    ledger: ImportLedger,
    importer: DatImporter,
}

impl ImportJob {
    pub fn new(config: ImportJobConfig) -> Self {
        let selector = FileSelector::new(&config.source_dir, &config.file_extension);
        let ledger = ImportLedger::new(&config.ledger_path);
        let importer = DatImporter::new(&config.db_path);
        Self {
            config,
            selector,
            ledger,
            importer,
        }
    }

    pub fn config(&self) -> &ImportJobConfig {
        &self.config
    }

    pub fn ledger(&self) -> &ImportLedger {
        &self.ledger
    }

    /// 确保导入表存在（新库首次运行时建表）
    ///
    /// # 返回
    /// - true: 本次新建了导入表
    pub fn prepare_database(&self) -> ImportResult<bool> {
        let db_error = |e: rusqlite::Error| ImportError::DatabaseConnectionError(e.to_string());

        let conn = open_sqlite_connection(&self.config.db_path).map_err(db_error)?;
        let fresh = !table_exists(&conn, "customers").map_err(db_error)?;
        ensure_import_schema(&conn).map_err(db_error)?;

        if fresh {
            info!(db_path = %self.config.db_path, "新数据库，已创建导入表");
        }
        Ok(fresh)
    }

    /// 执行一次导入
    ///
    /// # 返回
    /// - Ok(JobOutcome): 无文件 / 已导入 / 导入完成 / 读文件失败
    /// - Err: 数据库或提交失败（台账未写入），或台账写入失败
    pub fn run(&self) -> ImportResult<JobOutcome> {
        self.config.validate()?;

        let latest = match self.selector.find_latest()? {
            Some(path) => path,
            None => {
                info!(dir = %self.selector.dir().display(), "没有找到候选 DAT 文件");
                return Ok(JobOutcome::NoFiles);
            }
        };

        let file_name = latest
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| latest.display().to_string());

        if self.ledger.has_imported(&file_name)? {
            info!(file_name = %file_name, "文件已导入，跳过");
            return Ok(JobOutcome::AlreadyImported { file_name });
        }

        self.prepare_database()?;

        info!(file_name = %file_name, "开始导入");
        let filter = self.config.customer_filter();
        let outcome = self.importer.import_file(&latest, filter.as_ref())?;

        if outcome.aborted {
            warn!(file_name = %file_name, errors = ?outcome.errors, "文件读取失败，不写入台账");
            return Ok(JobOutcome::Aborted { file_name, outcome });
        }

        self.ledger.record_imported(&file_name)?;

        info!(
            file_name = %file_name,
            result = %serde_json::to_string(&outcome).unwrap_or_default(),
            "导入结果"
        );
        Ok(JobOutcome::Imported { file_name, outcome })
    }
}
