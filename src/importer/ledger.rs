// ==========================================
// DAT 导入 - 导入台账
// ==========================================
// 格式: 纯文本，每行一个已导入文件名，只追加
// 读取: 每次调用都完整重读，不跨运行缓存
// 写入: 失败立即报错，不重试（写失败会导致下次重复导入）
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone)]
pub struct ImportLedger {
    path: PathBuf,
}

impl ImportLedger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 读取全部已导入文件名（台账文件不存在视为空）
    pub fn load(&self) -> ImportResult<HashSet<String>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(HashSet::new()),
            Err(e) => {
                return Err(ImportError::LedgerRead {
                    path: self.path.display().to_string(),
                    message: e.to_string(),
                })
            }
        };

        Ok(content
            .lines()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect())
    }

    /// 文件名是否已导入
    pub fn has_imported(&self, file_name: &str) -> ImportResult<bool> {
        Ok(self.load()?.contains(file_name.trim()))
    }

    /// 追加一条已导入记录
    pub fn record_imported(&self, file_name: &str) -> ImportResult<()> {
        let write_error = |message: String| ImportError::LedgerWrite {
            path: self.path.display().to_string(),
            message,
        };

        // 换行会破坏一行一条的格式
        if file_name.trim().is_empty() || file_name.contains(['\n', '\r']) {
            return Err(write_error(format!("非法文件名: {:?}", file_name)));
        }

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| write_error(e.to_string()))?;
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| write_error(e.to_string()))?;
        writeln!(file, "{}", file_name).map_err(|e| write_error(e.to_string()))?;
        file.sync_all().map_err(|e| write_error(e.to_string()))?;

        info!(file_name = file_name, ledger = %self.path.display(), "已写入导入台账");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_ledger_is_empty() {
        let dir = tempdir().unwrap();
        let ledger = ImportLedger::new(dir.path().join("imported.txt"));

        assert!(ledger.load().unwrap().is_empty());
        assert!(!ledger.has_imported("june.dat").unwrap());
    }

    #[test]
    fn test_record_then_has_imported() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("imported.txt");

        ImportLedger::new(&path).record_imported("june.dat").unwrap();
        ImportLedger::new(&path).record_imported("july.dat").unwrap();

        // 新实例重新读取
        let ledger = ImportLedger::new(&path);
        assert!(ledger.has_imported("june.dat").unwrap());
        assert!(ledger.has_imported("july.dat").unwrap());
        assert!(!ledger.has_imported("august.dat").unwrap());

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "june.dat\njuly.dat\n");
    }

    #[test]
    fn test_tolerates_crlf_and_blank_lines() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("imported.txt");
        fs::write(&path, "a.dat\r\n\r\nb.dat\r\n").unwrap();

        let names = ImportLedger::new(&path).load().unwrap();
        assert_eq!(names.len(), 2);
        assert!(names.contains("a.dat"));
        assert!(names.contains("b.dat"));
    }

    #[test]
    fn test_rejects_newline_in_name() {
        let dir = tempdir().unwrap();
        let ledger = ImportLedger::new(dir.path().join("imported.txt"));

        let err = ledger.record_imported("bad\nname.dat").unwrap_err();
        assert!(matches!(err, ImportError::LedgerWrite { .. }));
    }

    #[test]
    fn test_write_failure_is_reported() {
        let dir = tempdir().unwrap();
        // 台账路径是目录，追加必然失败
        let ledger = ImportLedger::new(dir.path());

        let err = ledger.record_imported("june.dat").unwrap_err();
        assert!(matches!(err, ImportError::LedgerWrite { .. }));
    }
}
