//! 评分会话 - 一次批量评分产生的结果表与其 CSV 路径
//!
//! 会话显式地在批量评分与重试之间传递，没有任何全局状态。

use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::AppResult;
use crate::models::ResultTable;

#[derive(Debug, Clone)]
pub struct GradingSession {
    pub table: ResultTable,
    /// 本次批量评分写出的 CSV，重试时覆盖写入
    pub csv_path: PathBuf,
}

impl GradingSession {
    pub fn new(table: ResultTable, csv_path: impl Into<PathBuf>) -> Self {
        Self {
            table,
            csv_path: csv_path.into(),
        }
    }

    /// 从之前保存的 CSV 恢复会话
    pub fn load(csv_path: impl AsRef<Path>) -> AppResult<Self> {
        let csv_path = csv_path.as_ref();
        let table = ResultTable::load_csv(csv_path)?;
        info!("📂 已加载 {} 行结果: {}", table.len(), csv_path.display());
        Ok(Self::new(table, csv_path))
    }

    /// 覆盖写回 CSV
    ///
    /// 所在目录已不存在时跳过写入并返回 `false`，重试从不创建目录。
    pub fn persist(&self) -> AppResult<bool> {
        if let Some(parent) = self.csv_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.is_dir() {
                warn!(
                    "⚠️ 结果目录 {} 已不存在，跳过保存",
                    parent.display()
                );
                return Ok(false);
            }
        }
        self.table.save_csv(&self.csv_path)?;
        info!("💾 结果已更新: {}", self.csv_path.display());
        Ok(true)
    }
}
