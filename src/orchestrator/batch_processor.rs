//! 批量评分处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是评分流程的入口，负责输入校验、顺序调度和结果持久化。
//!
//! ## 核心功能
//!
//! 1. **输入校验**：凭据、目录、题目描述，任何远程调用之前完成
//! 2. **扫描**：委托 `file_scanner` 找出待评分文件
//! 3. **顺序评分**：一次只有一个文件在远程服务中处理
//! 4. **持久化**：整表写入带时间戳的 CSV
//! 5. **全局统计**：汇总成功/失败数量
//!
//! ## 设计特点
//!
//! - **顶层编排**：不处理单个文件的细节，委托 `GradeFlow`
//! - **资源所有者**：唯一持有 `GradingClient` 和 `DebugLog` 的模块
//! - **状态显式传递**：结果表放在 `GradingSession` 中交还给调用方

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::{AppError, AppResult, InputError};
use crate::infrastructure::RemoteBackend;
use crate::models::{ResultRow, ResultTable, SubmissionFile};
use crate::orchestrator::GradingSession;
use crate::services::{scan_folder, DebugLog, GradingClient};
use crate::utils::logging;
use crate::workflow::{fraction, GradeFlow, ProgressReporter, RowCtx};

/// 批量评分编排器
pub struct Orchestrator<B: RemoteBackend> {
    client: GradingClient<B>,
    debug_log: DebugLog,
}

/// 一次批量评分的结果
#[derive(Debug)]
pub enum BatchOutcome {
    /// 目录中没有匹配扩展名的文件，未创建任何结果文件
    NoFiles { message: String },
    Completed {
        session: GradingSession,
        summary: BatchSummary,
    },
}

impl BatchOutcome {
    pub fn message(&self) -> &str {
        match self {
            BatchOutcome::NoFiles { message } => message,
            BatchOutcome::Completed { summary, .. } => &summary.message,
        }
    }
}

/// 批量评分统计
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchSummary {
    pub total: usize,
    pub success: usize,
    pub failed: usize,
    pub csv_path: PathBuf,
    pub message: String,
}

impl<B: RemoteBackend> Orchestrator<B> {
    pub fn new(client: GradingClient<B>, debug_log: DebugLog) -> Self {
        Self { client, debug_log }
    }

    /// 使用配置中的生成参数、轮询策略与调试日志路径
    pub fn from_config(backend: B, config: &Config) -> Self {
        Self::new(
            GradingClient::from_config(backend, config),
            DebugLog::with_path(&config.debug_log_file),
        )
    }

    pub fn client(&self) -> &GradingClient<B> {
        &self.client
    }

    pub fn debug_log(&self) -> &DebugLog {
        &self.debug_log
    }

    pub(crate) fn flow(&self) -> GradeFlow<'_, B> {
        GradeFlow::new(&self.client, &self.debug_log)
    }

    /// 凭据与题目描述的公共校验
    pub(crate) fn check_ready(&self, rubric: &str) -> Result<(), InputError> {
        if !self.client.has_credentials() {
            return Err(InputError::MissingCredential);
        }
        if rubric.trim().is_empty() {
            return Err(InputError::BlankRubric);
        }
        Ok(())
    }

    /// 扫描目录并批量评分
    ///
    /// # 参数
    /// - `folder`: 提交文件所在目录（递归扫描）
    /// - `extensions`: 逗号分隔的扩展名列表
    /// - `rubric`: 题目描述
    /// - `output_dir`: 结果 CSV 的输出目录
    /// - `progress`: 进度回调
    pub async fn process_submissions(
        &self,
        folder: &Path,
        extensions: &str,
        rubric: &str,
        output_dir: &Path,
        progress: &mut dyn ProgressReporter,
    ) -> AppResult<BatchOutcome> {
        if !self.client.has_credentials() {
            return Err(InputError::MissingCredential.into());
        }
        if !folder.is_dir() {
            return Err(InputError::InvalidDirectory {
                path: folder.display().to_string(),
            }
            .into());
        }
        if rubric.trim().is_empty() {
            return Err(InputError::BlankRubric.into());
        }

        info!("\n📁 正在扫描 {} ...", folder.display());
        let files = scan_folder(folder, extensions)?;

        if files.is_empty() {
            warn!("⚠️ 没有找到匹配扩展名的文件: {}", extensions);
            return Ok(BatchOutcome::NoFiles {
                message: format!("在 {} 中没有找到扩展名为 {} 的文件", folder.display(), extensions),
            });
        }

        logging::log_files_found(files.len(), extensions);
        self.run_batch(&files, rubric, output_dir, progress).await
    }

    /// 按顺序评分给定文件并写出结果表
    pub async fn run_batch(
        &self,
        files: &[SubmissionFile],
        rubric: &str,
        output_dir: &Path,
        progress: &mut dyn ProgressReporter,
    ) -> AppResult<BatchOutcome> {
        self.check_ready(rubric)?;

        if files.is_empty() {
            warn!("⚠️ 没有待评分的文件，不生成结果表");
            return Ok(BatchOutcome::NoFiles {
                message: "没有找到待评分的文件".to_string(),
            });
        }

        let count = files.len();
        let flow = self.flow();
        let mut table = ResultTable::new();

        for (idx, file) in files.iter().enumerate() {
            progress.report(
                fraction(idx, count),
                &format!("Grading {}/{}: {}", idx + 1, count, file.name),
            );

            let ctx = RowCtx::new(idx + 1, count, file.name.clone());
            let row = match flow.grade_new(file, rubric, &ctx).await {
                Ok(row) => row,
                Err(e) => {
                    error!("{} ❌ 评分流程异常: {:#}", ctx, e);
                    let mut row = ResultRow::new(file);
                    row.mark_failed(format!("Critical grading error: {:#}", e));
                    row
                }
            };
            table.push(row);
        }
        progress.report(1.0, "Done");

        let csv_path = output_dir.join(results_file_name());
        fs::create_dir_all(output_dir)
            .map_err(|e| AppError::persistence(output_dir.display().to_string(), e))?;
        table.save_csv(&csv_path)?;

        let (success, failed) = table.counts();
        let csv_display = csv_path.display().to_string();
        logging::print_final_stats(success, failed, count, &csv_display);

        let summary = BatchSummary {
            total: count,
            success,
            failed,
            message: format!(
                "评分完成：共 {} 个文件，成功 {}，失败 {}。结果已保存至 {}",
                count, success, failed, csv_display
            ),
            csv_path: csv_path.clone(),
        };

        Ok(BatchOutcome::Completed {
            session: GradingSession::new(table, csv_path),
            summary,
        })
    }
}

/// `grading_results_<YYYYmmdd_HHMMSS>.csv`
pub fn results_file_name() -> String {
    format!(
        "grading_results_{}.csv",
        chrono::Local::now().format("%Y%m%d_%H%M%S")
    )
}
