//! 文件扫描服务 - 业务能力层
//!
//! 只负责"找出待评分的文件"，不关心评分流程

use crate::error::{AppResult, InputError};
use crate::models::SubmissionFile;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

/// 解析逗号分隔的扩展名列表，统一为小写并补上前导点
///
/// `".pdf, py ,"` → `[".pdf", ".py"]`
pub fn parse_extensions(extensions: &str) -> Vec<String> {
    extensions
        .split(',')
        .map(str::trim)
        .filter(|ext| !ext.is_empty())
        .map(|ext| {
            let ext = ext.to_lowercase();
            if ext.starts_with('.') {
                ext
            } else {
                format!(".{}", ext)
            }
        })
        .collect()
}

/// 递归扫描目录，返回扩展名匹配的文件（按路径字典序排序）
///
/// 扩展名匹配不区分大小写；跳过以 `.` 开头的文件和目录，跟随符号链接
pub fn scan_folder(root: &Path, extensions: &str) -> AppResult<Vec<SubmissionFile>> {
    if !root.is_dir() {
        return Err(InputError::InvalidDirectory {
            path: root.display().to_string(),
        }
        .into());
    }

    let extensions = parse_extensions(extensions);
    debug!("扫描 {}，扩展名: {:?}", root.display(), extensions);

    let root = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());

    let files: BTreeSet<PathBuf> = WalkDir::new(&root)
        .follow_links(true)
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry))
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("⚠️ 无法访问: {}", e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| matches_extension(path, &extensions))
        .collect();

    Ok(files.into_iter().map(SubmissionFile::new).collect())
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}

fn matches_extension(path: &Path, extensions: &[String]) -> bool {
    let Some(name) = path.file_name() else {
        return false;
    };
    let name = name.to_string_lossy().to_lowercase();
    extensions.iter().any(|ext| name.ends_with(ext.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use std::fs;

    #[test]
    fn test_parse_extensions() {
        assert_eq!(parse_extensions(".pdf, py , ,.TXT"), vec![".pdf", ".py", ".txt"]);
        assert!(parse_extensions("  ").is_empty());
    }

    #[test]
    fn test_scan_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["d.jpg", "c.txt", "b.PY", "a.pdf"] {
            fs::write(dir.path().join(name), b"x").unwrap();
        }

        let files = scan_folder(dir.path(), ".pdf, .py").unwrap();
        let names: Vec<&str> = files.iter().map(|f| f.name.as_str()).collect();

        assert_eq!(names, vec!["a.pdf", "b.PY"]);
        assert!(files.iter().all(|f| f.path.is_absolute()));
    }

    #[test]
    fn test_scan_is_recursive() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("student_b").join("week1");
        fs::create_dir_all(&nested).unwrap();
        fs::create_dir_all(dir.path().join("student_a")).unwrap();
        fs::write(nested.join("main.py"), b"x").unwrap();
        fs::write(dir.path().join("student_a").join("main.py"), b"x").unwrap();
        fs::write(dir.path().join("notes.md"), b"x").unwrap();

        let files = scan_folder(dir.path(), "py").unwrap();

        assert_eq!(files.len(), 2);
        assert!(files[0].path.ends_with("student_a/main.py"));
        assert!(files[1].path.ends_with("student_b/week1/main.py"));
    }

    #[test]
    fn test_skips_hidden_entries() {
        let dir = tempfile::tempdir().unwrap();
        let checkpoints = dir.path().join("student_a").join(".ipynb_checkpoints");
        fs::create_dir_all(&checkpoints).unwrap();
        fs::create_dir_all(dir.path().join(".git")).unwrap();
        fs::write(checkpoints.join("main-checkpoint.py"), b"x").unwrap();
        fs::write(dir.path().join(".git").join("hook.py"), b"x").unwrap();
        fs::write(dir.path().join("student_a").join(".scratch.py"), b"x").unwrap();
        fs::write(dir.path().join("student_a").join("main.py"), b"x").unwrap();

        let files = scan_folder(dir.path(), ".py").unwrap();

        assert_eq!(files.len(), 1);
        assert!(files[0].path.ends_with("student_a/main.py"));
    }

    #[cfg(unix)]
    #[test]
    fn test_follows_symlinked_files() {
        let dir = tempfile::tempdir().unwrap();
        let outside = tempfile::tempdir().unwrap();
        fs::write(outside.path().join("real.py"), b"x").unwrap();
        std::os::unix::fs::symlink(outside.path().join("real.py"), dir.path().join("linked.py"))
            .unwrap();

        let files = scan_folder(dir.path(), ".py").unwrap();

        assert_eq!(files.len(), 1);
        assert_eq!(files[0].name, "linked.py");
    }

    #[test]
    fn test_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        let err = scan_folder(&dir.path().join("missing"), ".pdf").unwrap_err();
        assert!(matches!(
            err,
            AppError::InvalidInput(InputError::InvalidDirectory { .. })
        ));
    }
}
