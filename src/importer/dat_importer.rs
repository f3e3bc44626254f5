// ==========================================
// DAT 导入 - 导入编排器
// ==========================================
// 流程: 读文件 → 逐行(解析 → 过滤 → 实体解析) → 单次提交 → 返回结果
// 事务: 整个文件一个事务；每行一个 SAVEPOINT，行失败只回滚该行
// 台账: 本模块不读写导入台账，由调用方负责
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::dat_record::DatRecord;
use crate::domain::import::ImportOutcome;
use crate::importer::customer_filter::CustomerFilter;
use crate::importer::entity_resolver::{EntityResolver, ResolvedLine};
use crate::importer::error::{ImportError, ImportResult, LineError};
use crate::importer::invoice_numbering::InvoiceNumberAllocator;
use crate::importer::record_parser::{DatFileReader, RawLine, RecordParser};
use crate::repository::error::RepositoryResult;
use rusqlite::{Connection, Transaction};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

// ==========================================
// DatImporter - DAT 文件导入器
// ==========================================
pub struct DatImporter {
    db_path: String,
    reader: DatFileReader,
    parser: RecordParser,
}

impl DatImporter {
    /// 创建导入器
    ///
    /// # 参数
    /// - db_path: 数据库文件路径（每次导入独占打开一个连接，结束即释放）
    pub fn new(db_path: &str) -> Self {
        Self {
            db_path: db_path.to_string(),
            reader: DatFileReader,
            parser: RecordParser,
        }
    }

    /// 导入单个 DAT 文件
    ///
    /// # 参数
    /// - file_path: DAT 文件路径
    /// - customer_filter: 可选客户白名单
    ///
    /// # 返回
    /// - Ok(ImportOutcome): 含行级错误的结构化结果；读文件失败时 aborted = true
    /// - Err: 数据库连接失败 / 事务提交失败（此时不应写台账）
    #[instrument(skip(self, customer_filter), fields(run_id = tracing::field::Empty))]
    pub fn import_file(
        &self,
        file_path: &Path,
        customer_filter: Option<&CustomerFilter>,
    ) -> ImportResult<ImportOutcome> {
        let run_id = Uuid::new_v4().to_string();
        tracing::Span::current().record("run_id", run_id.as_str());

        let lines = match self.read(file_path) {
            Ok(lines) => lines,
            Err(outcome) => return Ok(outcome),
        };

        let mut conn = open_sqlite_connection(&self.db_path)
            .map_err(|e| ImportError::DatabaseConnectionError(e.to_string()))?;

        self.process_lines(&mut conn, file_path, lines, customer_filter)
        // conn 在此释放（成功与失败路径均如此）
    }

    /// 使用调用方提供的连接导入（连接生命周期由调用方管理）
    pub fn import_with_connection(
        &self,
        conn: &mut Connection,
        file_path: &Path,
        customer_filter: Option<&CustomerFilter>,
    ) -> ImportResult<ImportOutcome> {
        match self.read(file_path) {
            Ok(lines) => self.process_lines(conn, file_path, lines, customer_filter),
            Err(outcome) => Ok(outcome),
        }
    }

    /// 读文件；失败时直接构造文件级失败结果
    fn read(&self, file_path: &Path) -> Result<Vec<RawLine>, ImportOutcome> {
        let path_str = file_path.display().to_string();
        self.reader.read_lines(file_path).map_err(|e| {
            error!(file_path = %path_str, error = %e, "读取 DAT 文件失败");
            ImportOutcome::file_failure(&path_str, e.to_string())
        })
    }

    /// 逐行处理并在最后一次性提交
    fn process_lines(
        &self,
        conn: &mut Connection,
        file_path: &Path,
        lines: Vec<RawLine>,
        customer_filter: Option<&CustomerFilter>,
    ) -> ImportResult<ImportOutcome> {
        let start_time = Instant::now();
        let path_str = file_path.display().to_string();
        info!(file_path = %path_str, total_lines = lines.len(), "开始导入 DAT 文件");

        let mut outcome = ImportOutcome::new(&path_str);
        let mut numbering = InvoiceNumberAllocator::new();

        let mut tx = conn
            .transaction()
            .map_err(|e| ImportError::DatabaseTransactionError(e.to_string()))?;

        for raw in &lines {
            // === 步骤 1: 解析 ===
            let record = match self.parser.parse(raw) {
                Ok(record) => record,
                Err(e) => {
                    warn!(line_number = raw.line_number, error = %e, "行格式无效");
                    outcome.errors.push(e.to_string());
                    continue;
                }
            };

            // === 步骤 2: 客户过滤 ===
            let customer_id = record.normalized_customer_id();
            if let Some(filter) = customer_filter {
                if !filter.allows(&customer_id) {
                    debug!(
                        line_number = record.line_number,
                        customer_id = %customer_id,
                        "客户不在白名单，跳过"
                    );
                    outcome.skipped_count += 1;
                    continue;
                }
            }

            // === 步骤 3: 实体解析（行级保存点）===
            match resolve_in_savepoint(&mut tx, &record, &mut numbering) {
                Ok(resolved) => {
                    outcome.imported_count += 1;
                    record_summary(&mut outcome, &record, &resolved);
                }
                Err(source) => {
                    let e = LineError::Database {
                        line: record.line_number,
                        source,
                    };
                    error!(line_number = record.line_number, error = %e, "行写入失败");
                    outcome.errors.push(e.to_string());
                }
            }
        }

        // === 步骤 4: 单次提交 ===
        tx.commit().map_err(|e| {
            error!(file_path = %path_str, error = %e, "事务提交失败，本次导入全部回滚");
            ImportError::CommitError(e.to_string())
        })?;

        info!(
            file_path = %path_str,
            imported = outcome.imported_count,
            skipped = outcome.skipped_count,
            errors = outcome.errors.len(),
            elapsed_ms = start_time.elapsed().as_millis() as u64,
            "DAT 文件导入完成"
        );

        Ok(outcome)
    }
}

/// 在保存点内解析单行；出错时保存点随 drop 回滚，不留下半行数据
fn resolve_in_savepoint(
    tx: &mut Transaction<'_>,
    record: &DatRecord,
    numbering: &mut InvoiceNumberAllocator,
) -> RepositoryResult<ResolvedLine> {
    let sp = tx.savepoint()?;
    let resolved = EntityResolver::new(&sp).resolve(record, numbering)?;
    sp.commit()?;
    Ok(resolved)
}

fn record_summary(outcome: &mut ImportOutcome, record: &DatRecord, resolved: &ResolvedLine) {
    if resolved.customer_created {
        outcome.summary.push(format!(
            "新建客户: {} ({})",
            record.short_name,
            record.normalized_customer_id()
        ));
    }
    if resolved.invoice_created {
        outcome.summary.push(format!(
            "新建发票: {} (客户 {})",
            resolved.invoice_number, record.short_name
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{configure_sqlite_connection, ensure_import_schema};
    use crate::repository::billing_repo::BillingRepository;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn setup() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();
        ensure_import_schema(&conn).unwrap();
        conn
    }

    fn dat_file(lines: &[&str]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
        file
    }

    #[test]
    fn test_import_counts_and_errors() {
        let mut conn = setup();
        let file = dat_file(&[
            "T;ACME;007;20240615;5001;EUR;FAB;X/RED/0/N1;10;2;;d;v;",
            "",
            "T;ACME;007;20240615",
            "T;ACME;007;20240615;5001;EUR;FAB;X/BLUE/SHIP-A;abc;2;;d;v;",
        ]);

        let outcome = DatImporter::new(":memory:")
            .import_with_connection(&mut conn, file.path(), None)
            .unwrap();

        assert_eq!(outcome.imported_count, 2);
        assert_eq!(outcome.skipped_count, 0);
        assert_eq!(outcome.errors.len(), 1);
        assert!(outcome.errors[0].starts_with("行 3:"));
        assert_eq!(outcome.processed_lines(), 3);
        assert!(!outcome.aborted);

        let repo = BillingRepository::new(&conn);
        assert_eq!(repo.count_customers().unwrap(), 1);
        assert_eq!(repo.count_invoices().unwrap(), 2);
        assert_eq!(repo.count_invoice_lines().unwrap(), 2);
    }

    #[test]
    fn test_filter_skips_without_consuming_suffix() {
        let mut conn = setup();
        let file = dat_file(&[
            "T;OTHER;8;20240615;5001;EUR;FAB;X/RED/N1;1;1;;d;v;",
            "T;ACME;7;20240615;5001;EUR;FAB;X/RED/N1;1;1;;d;v;",
        ]);
        let filter = CustomerFilter::from_ids(["7"]);

        let outcome = DatImporter::new(":memory:")
            .import_with_connection(&mut conn, file.path(), Some(&filter))
            .unwrap();

        assert_eq!(outcome.imported_count, 1);
        assert_eq!(outcome.skipped_count, 1);
        assert!(outcome.summary.iter().any(|s| s.contains("5001-01")));
    }

    #[test]
    fn test_missing_file_is_aborted_outcome() {
        let mut conn = setup();
        let outcome = DatImporter::new(":memory:")
            .import_with_connection(&mut conn, Path::new("/no/such/file.dat"), None)
            .unwrap();

        assert!(outcome.aborted);
        assert_eq!(outcome.imported_count, 0);
        assert_eq!(outcome.errors.len(), 1);
    }

    #[test]
    fn test_failed_line_leaves_no_partial_rows() {
        let mut conn = setup();
        // 触发器拒绝物料编码为 BAD 的发票行
        conn.execute_batch(
            r#"
            CREATE TRIGGER reject_bad_item BEFORE INSERT ON invoice_lines
            WHEN NEW.item_name = 'BAD'
            BEGIN SELECT RAISE(ABORT, 'rejected item'); END;
            "#,
        )
        .unwrap();

        let file = dat_file(&[
            "T;NEWCO;9;20240615;1;EUR;BAD;X/RED/N1;1;1;;d;v;",
            "T;ACME;7;20240615;2;EUR;FAB;X/RED/N1;1;1;;d;v;",
        ]);

        let outcome = DatImporter::new(":memory:")
            .import_with_connection(&mut conn, file.path(), None)
            .unwrap();

        assert_eq!(outcome.imported_count, 1);
        assert_eq!(outcome.errors.len(), 1);
        assert!(outcome.errors[0].starts_with("行 1:"));

        let repo = BillingRepository::new(&conn);
        // 失败行的客户与发票都已回滚
        assert_eq!(repo.find_customer_id("9", "NEWCO").unwrap(), None);
        assert_eq!(repo.count_customers().unwrap(), 1);
        assert_eq!(repo.count_invoices().unwrap(), 1);
    }
}
