//! 重试 - 编排层
//!
//! 对已有会话中的某一行或全部失败行重新评分，原地更新结果表并覆盖写回 CSV。
//! 前置条件不满足时不做任何修改，只返回原因。

use std::fmt;
use tracing::{error, info, warn};

use crate::error::{AppResult, InputError};
use crate::infrastructure::RemoteBackend;
use crate::models::{ResultRow, RowStatus};
use crate::orchestrator::{GradingSession, Orchestrator};
use crate::workflow::{fraction, ProgressReporter, RowCtx};

/// 重试被跳过的原因
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetrySkipped {
    Invalid(InputError),
    NoFailedRows,
}

impl fmt::Display for RetrySkipped {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetrySkipped::Invalid(e) => write!(f, "{}", e),
            RetrySkipped::NoFailedRows => f.write_str("没有失败的行，无需重试"),
        }
    }
}

impl From<InputError> for RetrySkipped {
    fn from(e: InputError) -> Self {
        RetrySkipped::Invalid(e)
    }
}

/// 重试结果：执行完成，或因前置条件不满足而跳过
#[derive(Debug, Clone, PartialEq)]
pub enum RetryOutcome<T> {
    Completed(T),
    Skipped(RetrySkipped),
}

impl<T> RetryOutcome<T> {
    pub fn completed(&self) -> Option<&T> {
        match self {
            RetryOutcome::Completed(report) => Some(report),
            RetryOutcome::Skipped(_) => None,
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, RetryOutcome::Skipped(_))
    }
}

/// 单行重试报告
#[derive(Debug, Clone, PartialEq)]
pub struct RetryOneReport {
    /// 更新后的行
    pub row: ResultRow,
    /// 是否已写回 CSV
    pub persisted: bool,
    pub message: String,
}

/// 全部失败行重试报告
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryAllReport {
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub persisted: bool,
    pub message: String,
}

impl<B: RemoteBackend> Orchestrator<B> {
    /// 重新评分指定行
    ///
    /// # 参数
    /// - `session`: 评分会话（原地修改）
    /// - `row_index`: 行号（从 0 开始）
    /// - `rubric`: 题目描述
    pub async fn retry_one(
        &self,
        session: &mut GradingSession,
        row_index: usize,
        rubric: &str,
    ) -> AppResult<RetryOutcome<RetryOneReport>> {
        if let Err(reason) = self.check_retry(session, rubric) {
            warn!("⚠️ 跳过重试: {}", reason);
            return Ok(RetryOutcome::Skipped(reason));
        }

        let len = session.table.len();
        let Some(row) = session.table.get_mut(row_index) else {
            let reason = RetrySkipped::from(InputError::RowOutOfRange {
                index: row_index,
                len,
            });
            warn!("⚠️ 跳过重试: {}", reason);
            return Ok(RetryOutcome::Skipped(reason));
        };

        let ctx = RowCtx::new(row_index + 1, len, row.file_name.clone());
        info!("{} 🔁 重试 {}", ctx, row.file_path);
        self.regrade_row(row, rubric, &ctx).await;

        let row = row.clone();
        let persisted = session.persist()?;

        let message = match row.status {
            RowStatus::Success => format!("重试成功：{} 得分 {}", row.file_name, row.grade),
            RowStatus::Failed => format!("重试失败：{}: {}", row.file_name, row.error),
        };

        Ok(RetryOutcome::Completed(RetryOneReport {
            row,
            persisted,
            message,
        }))
    }

    /// 重新评分所有失败行，结束后写回一次 CSV
    pub async fn retry_all_failed(
        &self,
        session: &mut GradingSession,
        rubric: &str,
        progress: &mut dyn ProgressReporter,
    ) -> AppResult<RetryOutcome<RetryAllReport>> {
        if let Err(reason) = self.check_retry(session, rubric) {
            warn!("⚠️ 跳过重试: {}", reason);
            return Ok(RetryOutcome::Skipped(reason));
        }

        let failed_indices = session.table.failed_indices();
        if failed_indices.is_empty() {
            info!("✓ 没有失败的行，无需重试");
            return Ok(RetryOutcome::Skipped(RetrySkipped::NoFailedRows));
        }

        let count = failed_indices.len();
        info!("🔁 开始重试 {} 个失败的文件", count);

        let mut succeeded = 0;
        let mut failed = 0;

        for (position, &row_index) in failed_indices.iter().enumerate() {
            let Some(row) = session.table.get_mut(row_index) else {
                continue;
            };

            progress.report(
                fraction(position, count),
                &format!("Retrying {}/{}: {}", position + 1, count, row.file_name),
            );

            let ctx = RowCtx::new(position + 1, count, row.file_name.clone());
            match self.regrade_row(row, rubric, &ctx).await {
                RowStatus::Success => succeeded += 1,
                RowStatus::Failed => failed += 1,
            }
        }
        progress.report(1.0, "Done");

        let persisted = session.persist()?;

        Ok(RetryOutcome::Completed(RetryAllReport {
            attempted: count,
            succeeded,
            failed,
            persisted,
            message: format!(
                "重试完成：共 {} 个，成功 {}，仍失败 {}",
                count, succeeded, failed
            ),
        }))
    }

    fn check_retry(&self, session: &GradingSession, rubric: &str) -> Result<(), RetrySkipped> {
        self.check_ready(rubric)?;
        if session.table.is_empty() {
            return Err(InputError::EmptyTable.into());
        }
        Ok(())
    }

    /// 评分流程本身出错时（例如调试日志写不进去）也把行标记为失败
    async fn regrade_row(&self, row: &mut ResultRow, rubric: &str, ctx: &RowCtx) -> RowStatus {
        match self.flow().regrade(row, rubric, ctx).await {
            Ok(status) => status,
            Err(e) => {
                error!("{} ❌ 重试出现严重错误: {:#}", ctx, e);
                row.mark_failed(format!("Critical retry error: {:#}", e));
                RowStatus::Failed
            }
        }
    }
}
