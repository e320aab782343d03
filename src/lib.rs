//! # Grading Toolkit
//!
//! 使用远程大模型批量评分学生提交文件的工具
//!
//! ## 架构设计
//!
//! 本系统采用分层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有外部资源，只暴露能力
//! - `RemoteBackend` / `GeminiBackend` - 上传、轮询、生成、删除
//! - `DocumentConverter` / `LibreOfficeConverter` - 文档转换
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单个文件
//! - `scan_folder` - 扫描提交目录
//! - `GradingClient` - 评一个文件，恰好返回一个 `GradeOutcome`
//! - `DebugLog` - 追加调试日志
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一行"的完整处理流程
//! - `GradeFlow` - 评分 → 调试日志 → 写回行
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/` - 批量评分、重试、会话事件
//!
//! ### 工具（Tools）
//! - `tools/score_report` - 成绩汇总表
//! - `tools/doc_to_pdf` - DOCX 批量转 PDF
//!
//! ## 模块结构

pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod tools;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::{DocumentConverter, GeminiBackend, LibreOfficeConverter, RemoteBackend};
pub use models::{GradeOutcome, ResultRow, ResultTable, RowStatus};
pub use orchestrator::{BatchOutcome, GradingSession, Orchestrator, SessionEvent};
pub use workflow::{GradeFlow, LogProgress, ProgressReporter};
