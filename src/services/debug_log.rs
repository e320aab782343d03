//! 调试日志服务 - 业务能力层
//!
//! 只负责"追加一次评分尝试的记录"能力，不关心流程，也从不读取

use anyhow::Result;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::models::GradeOutcome;

/// 记录类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptKind {
    Processing,
    Retrying,
}

impl AttemptKind {
    fn label(&self) -> &'static str {
        match self {
            AttemptKind::Processing => "Processing",
            AttemptKind::Retrying => "Retrying",
        }
    }
}

/// 调试日志
///
/// 职责：
/// - 每次评分尝试追加一个 JSON 块
/// - 只追加，不截断
pub struct DebugLog {
    log_file_path: PathBuf,
}

impl DebugLog {
    /// 使用默认路径 `debug.log`
    pub fn new() -> Self {
        Self::with_path("debug.log")
    }

    /// 使用自定义文件路径创建
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            log_file_path: path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.log_file_path
    }

    /// 追加一次评分尝试
    ///
    /// # 参数
    /// - `kind`: 首次评分还是重试
    /// - `file_path`: 提交文件路径
    /// - `outcome`: 评分结果
    pub fn append(&self, kind: AttemptKind, file_path: &str, outcome: &GradeOutcome) -> Result<()> {
        debug!("写入调试日志: {} {}", kind.label(), file_path);

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_file_path)?;

        let block = format!(
            "--- {} {} ---\n{}\n",
            kind.label(),
            file_path,
            serde_json::to_string_pretty(outcome)?
        );

        file.write_all(block.as_bytes())?;

        Ok(())
    }
}

impl Default for DebugLog {
    fn default() -> Self {
        Self::new()
    }
}
