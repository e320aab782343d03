//! 单行评分流程 - 流程层
//!
//! 首次评分和重试共用同一个流程：
//!
//! ```text
//! GradingClient::grade → DebugLog::append → ResultRow::apply_outcome
//! ```
//!
//! 流程本身不持有结果表，只处理调用方交给它的那一行。

use anyhow::{Context, Result};
use std::path::Path;
use tracing::{error, info};

use crate::infrastructure::RemoteBackend;
use crate::models::{GradeOutcome, ResultRow, RowStatus, SubmissionFile};
use crate::services::{AttemptKind, DebugLog, GradingClient};
use crate::utils::truncate_text;
use crate::workflow::RowCtx;

/// 单行评分流程
///
/// 职责：
/// - 调用评分客户端得到恰好一个 `GradeOutcome`
/// - 把结果追加到调试日志
/// - 用结果覆盖目标行
pub struct GradeFlow<'a, B: RemoteBackend> {
    client: &'a GradingClient<B>,
    debug_log: &'a DebugLog,
}

impl<'a, B: RemoteBackend> GradeFlow<'a, B> {
    pub fn new(client: &'a GradingClient<B>, debug_log: &'a DebugLog) -> Self {
        Self { client, debug_log }
    }

    /// 首次评分，返回新行
    ///
    /// 只有调试日志写入失败才会返回 `Err`，评分失败体现在行的 `status` 中。
    pub async fn grade_new(
        &self,
        file: &SubmissionFile,
        rubric: &str,
        ctx: &RowCtx,
    ) -> Result<ResultRow> {
        let mut row = ResultRow::new(file);
        self.run(&mut row, rubric, AttemptKind::Processing, ctx)
            .await?;
        Ok(row)
    }

    /// 重新评分已有行（原地修改）
    pub async fn regrade(&self, row: &mut ResultRow, rubric: &str, ctx: &RowCtx) -> Result<RowStatus> {
        self.run(row, rubric, AttemptKind::Retrying, ctx).await
    }

    async fn run(
        &self,
        row: &mut ResultRow,
        rubric: &str,
        kind: AttemptKind,
        ctx: &RowCtx,
    ) -> Result<RowStatus> {
        info!("{} 📝 评分: {}", ctx, ctx.file_name);

        let outcome = self.client.grade(Path::new(&row.file_path), rubric).await;

        self.debug_log
            .append(kind, &row.file_path, &outcome)
            .with_context(|| format!("写入调试日志 {} 失败", self.debug_log.path().display()))?;

        row.apply_outcome(&outcome);
        log_outcome(ctx, &outcome, row);

        Ok(row.status)
    }
}

fn log_outcome(ctx: &RowCtx, outcome: &GradeOutcome, row: &ResultRow) {
    match outcome {
        GradeOutcome::Success { .. } => {
            info!("{} ✅ {} 得分 {}", ctx, row.file_name, row.grade);
        }
        GradeOutcome::Failure { error: message } => {
            error!("{} ❌ {} 评分失败: {}", ctx, row.file_name, truncate_text(message, 200));
        }
    }
}
