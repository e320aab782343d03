//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批量评分、重试和会话状态，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `batch_processor` - 批量评分
//! - 输入校验（凭据、目录、题目描述）
//! - 扫描并顺序评分所有文件
//! - 写出带时间戳的结果 CSV
//!
//! ### `retry` - 重试
//! - 重试单行 / 重试全部失败行
//! - 原地更新结果表并覆盖写回
//!
//! ### `session` / `events`
//! - `GradingSession`：结果表 + CSV 路径
//! - `SessionEvent`：前端发出的重试动作
//!
//! ## 层次关系
//!
//! ```text
//! orchestrator (处理 Vec<SubmissionFile> / GradingSession)
//!     ↓
//! workflow::GradeFlow (处理单行)
//!     ↓
//! services (能力层：scanner / grading_client / debug_log)
//!     ↓
//! infrastructure (基础设施：RemoteBackend)
//! ```

pub mod batch_processor;
pub mod events;
pub mod retry;
pub mod session;

pub use batch_processor::{results_file_name, BatchOutcome, BatchSummary, Orchestrator};
pub use events::{EventReport, SessionEvent};
pub use retry::{RetryAllReport, RetryOneReport, RetryOutcome, RetrySkipped};
pub use session::GradingSession;
