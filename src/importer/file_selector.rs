// ==========================================
// DAT 导入 - 文件选择器
// ==========================================
// 在监控目录中找出修改时间最新的候选文件
// 不参考台账：选择与去重检查是两个独立步骤
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct FileSelector {
    dir: PathBuf,
    extension: String,
}

impl FileSelector {
    /// # 参数
    /// - dir: 监控目录
    /// - extension: 文件扩展名（不含点，大小写不敏感），如 "dat"
    pub fn new(dir: impl Into<PathBuf>, extension: &str) -> Self {
        Self {
            dir: dir.into(),
            extension: extension.trim_start_matches('.').to_string(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn matches_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case(&self.extension))
            .unwrap_or(false)
    }

    /// 列出目录下所有匹配扩展名的文件及其修改时间
    pub fn list_candidates(&self) -> ImportResult<Vec<(PathBuf, SystemTime)>> {
        let scan_error = |e: std::io::Error| ImportError::DirectoryScanError {
            dir: self.dir.display().to_string(),
            message: e.to_string(),
        };

        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!(dir = %self.dir.display(), "监控目录不存在");
                return Ok(Vec::new());
            }
            Err(e) => return Err(scan_error(e)),
        };

        let mut candidates = Vec::new();
        for entry in entries {
            let entry = entry.map_err(scan_error)?;
            let path = entry.path();
            if !self.matches_extension(&path) {
                continue;
            }
            // 跟随符号链接，取目标文件的类型与修改时间
            let metadata = match fs::metadata(&path) {
                Ok(metadata) => metadata,
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    warn!(path = %path.display(), "符号链接目标不存在，跳过");
                    continue;
                }
                Err(e) => return Err(scan_error(e)),
            };
            if !metadata.is_file() {
                continue;
            }
            let modified = metadata.modified().map_err(scan_error)?;
            candidates.push((path, modified));
        }

        debug!(dir = %self.dir.display(), count = candidates.len(), "候选文件扫描完成");
        Ok(candidates)
    }

    /// 选出修改时间最新的文件；没有候选文件时返回 None
    ///
    /// 修改时间相同时取文件名较大者，保证结果确定
    pub fn find_latest(&self) -> ImportResult<Option<PathBuf>> {
        Ok(self
            .list_candidates()?
            .into_iter()
            .max_by(|(a_path, a_time), (b_path, b_time)| {
                a_time.cmp(b_time).then_with(|| a_path.cmp(b_path))
            })
            .map(|(path, _)| path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::time::Duration;
    use tempfile::tempdir;

    fn touch(path: &Path, modified: SystemTime) {
        let file = File::create(path).unwrap();
        file.set_modified(modified).unwrap();
    }

    #[test]
    fn test_find_latest_by_mtime() {
        let dir = tempdir().unwrap();
        let base = SystemTime::now() - Duration::from_secs(3600);

        touch(&dir.path().join("a.dat"), base);
        touch(&dir.path().join("b.dat"), base + Duration::from_secs(60));
        touch(&dir.path().join("c.DAT"), base + Duration::from_secs(30));
        touch(&dir.path().join("z.txt"), base + Duration::from_secs(600));

        let selector = FileSelector::new(dir.path(), "dat");
        assert_eq!(selector.list_candidates().unwrap().len(), 3);
        assert_eq!(
            selector.find_latest().unwrap(),
            Some(dir.path().join("b.dat"))
        );
    }

    #[test]
    fn test_no_matching_files() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("notes.txt"), SystemTime::now());
        fs::create_dir(dir.path().join("folder.dat")).unwrap();

        let selector = FileSelector::new(dir.path(), ".dat");
        assert_eq!(selector.find_latest().unwrap(), None);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_file_is_candidate() {
        let dir = tempdir().unwrap();
        let elsewhere = tempdir().unwrap();
        let base = SystemTime::now() - Duration::from_secs(3600);

        touch(&dir.path().join("old.dat"), base);
        let target = elsewhere.path().join("real.dat");
        touch(&target, base + Duration::from_secs(120));
        std::os::unix::fs::symlink(&target, dir.path().join("link.dat")).unwrap();
        // 悬空链接直接忽略
        std::os::unix::fs::symlink(
            elsewhere.path().join("gone.dat"),
            dir.path().join("dangling.dat"),
        )
        .unwrap();

        let selector = FileSelector::new(dir.path(), "dat");
        assert_eq!(selector.list_candidates().unwrap().len(), 2);
        assert_eq!(
            selector.find_latest().unwrap(),
            Some(dir.path().join("link.dat"))
        );
    }

    #[test]
    fn test_missing_directory() {
        let dir = tempdir().unwrap();
        let selector = FileSelector::new(dir.path().join("missing"), "dat");
        assert_eq!(selector.find_latest().unwrap(), None);
    }
}
