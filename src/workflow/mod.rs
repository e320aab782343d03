//! 流程层（Workflow Layer）
//!
//! 处理"一行"的完整评分流程，批量评分和重试都委托到这里。
//!
//! - `grade_flow`: 评分 → 调试日志 → 写回行
//! - `progress`: 进度回调
//! - `row_ctx`: 日志中的 `[文件 i/n]` 前缀

pub mod grade_flow;
pub mod progress;
pub mod row_ctx;

pub use grade_flow::GradeFlow;
pub use progress::{fraction, LogProgress, NoProgress, ProgressReporter};
pub use row_ctx::RowCtx;
