//! 会话事件
//!
//! 前端只需要发出带有明确动作的事件，不再依赖表格中的列位置。

use crate::error::AppResult;
use crate::infrastructure::RemoteBackend;
use crate::orchestrator::{
    GradingSession, Orchestrator, RetryAllReport, RetryOneReport, RetryOutcome,
};
use crate::workflow::ProgressReporter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// 重试指定行
    RetryRow { row: usize },
    /// 重试全部失败行
    RetryAllFailed,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EventReport {
    RetryRow(RetryOutcome<RetryOneReport>),
    RetryAllFailed(RetryOutcome<RetryAllReport>),
}

impl EventReport {
    /// 给操作者看的状态信息
    pub fn message(&self) -> String {
        match self {
            EventReport::RetryRow(RetryOutcome::Completed(report)) => report.message.clone(),
            EventReport::RetryAllFailed(RetryOutcome::Completed(report)) => report.message.clone(),
            EventReport::RetryRow(RetryOutcome::Skipped(reason))
            | EventReport::RetryAllFailed(RetryOutcome::Skipped(reason)) => reason.to_string(),
        }
    }
}

impl<B: RemoteBackend> Orchestrator<B> {
    /// 分发会话事件
    pub async fn handle_event(
        &self,
        session: &mut GradingSession,
        event: SessionEvent,
        rubric: &str,
        progress: &mut dyn ProgressReporter,
    ) -> AppResult<EventReport> {
        match event {
            SessionEvent::RetryRow { row } => self
                .retry_one(session, row, rubric)
                .await
                .map(EventReport::RetryRow),
            SessionEvent::RetryAllFailed => self
                .retry_all_failed(session, rubric, progress)
                .await
                .map(EventReport::RetryAllFailed),
        }
    }
}
