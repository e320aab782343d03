use std::fmt;
use std::path::{Path, PathBuf};

/// 一份待评分的学生提交文件
///
/// 由文件扫描生成，之后不再修改
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubmissionFile {
    pub path: PathBuf,
    /// 文件名（不含目录）
    pub name: String,
}

impl SubmissionFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        Self { path, name }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 写入结果表时使用的路径字符串
    pub fn path_string(&self) -> String {
        self.path.to_string_lossy().into_owned()
    }
}

impl fmt::Display for SubmissionFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_is_basename() {
        let file = SubmissionFile::new("/data/class_a/nguyen_van_a/bai1.py");
        assert_eq!(file.name, "bai1.py");
        assert_eq!(file.to_string(), "bai1.py");
    }
}
