use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use grading_toolkit::orchestrator::{BatchOutcome, SessionEvent};
use grading_toolkit::tools;
use grading_toolkit::utils::logging;
use grading_toolkit::{
    Config, GeminiBackend, GradingSession, LibreOfficeConverter, LogProgress, Orchestrator,
};

/// 未指定时结果写回提交目录
pub fn grade_output_dir(folder: &Path, output_dir: Option<PathBuf>) -> PathBuf {
    output_dir.unwrap_or_else(|| folder.to_path_buf())
}

/// 未指定时写到输入文件旁边
pub fn report_output_dir(input: &Path, output_dir: Option<PathBuf>) -> PathBuf {
    output_dir.unwrap_or_else(|| match input.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    })
}

fn read_rubric(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("无法读取题目描述文件: {}", path.display()))
}

fn build_orchestrator(config: &Config) -> Result<Orchestrator<GeminiBackend>> {
    let backend = GeminiBackend::new(config)?;
    Ok(Orchestrator::from_config(backend, config))
}

pub async fn grade(
    config: &Config,
    folder: &Path,
    extensions: &str,
    rubric_file: &Path,
    output_dir: &Path,
    retry_rounds: usize,
) -> Result<()> {
    logging::log_startup("批量评分", &config.gemini_model_name);

    let rubric = read_rubric(rubric_file)?;
    let orchestrator = build_orchestrator(config)?;
    let mut progress = LogProgress;

    let outcome = orchestrator
        .process_submissions(folder, extensions, &rubric, output_dir, &mut progress)
        .await?;

    let mut session = match outcome {
        BatchOutcome::NoFiles { message } => {
            warn!("⚠️ {}", message);
            return Ok(());
        }
        BatchOutcome::Completed { session, summary } => {
            info!("{}", summary.message);
            session
        }
    };

    for round in 1..=retry_rounds {
        info!("\n🔁 第 {}/{} 轮重试", round, retry_rounds);
        let report = orchestrator
            .handle_event(&mut session, SessionEvent::RetryAllFailed, &rubric, &mut progress)
            .await?;
        info!("{}", report.message());
        if session.table.failed_indices().is_empty() {
            break;
        }
    }

    Ok(())
}

pub async fn retry(config: &Config, csv: &Path, rubric_file: &Path, row: Option<usize>) -> Result<()> {
    logging::log_startup("重试", &config.gemini_model_name);

    let rubric = read_rubric(rubric_file)?;
    let orchestrator = build_orchestrator(config)?;
    let mut session = GradingSession::load(csv)?;

    let event = match row {
        Some(row) => SessionEvent::RetryRow { row },
        None => SessionEvent::RetryAllFailed,
    };
    let report = orchestrator
        .handle_event(&mut session, event, &rubric, &mut LogProgress)
        .await?;
    info!("{}", report.message());

    let (success, failed) = session.table.counts();
    logging::print_final_stats(
        success,
        failed,
        session.table.len(),
        &session.csv_path.display().to_string(),
    );
    Ok(())
}

pub fn report(input: &Path, output_dir: &Path, columns: &[String]) -> Result<()> {
    let output = tools::reshape_scores(input, output_dir, columns)?;
    info!("结果已保存至: {}", output.display());
    Ok(())
}

pub async fn convert(config: &Config, input: &Path, output: &Path) -> Result<()> {
    let converter = LibreOfficeConverter::from_config(config)?;
    info!("🔧 转换程序: {}", converter.program().display());

    let stats = tools::convert_directory(input, output, &converter).await?;
    if stats.failed > 0 {
        warn!("⚠️ {} 个文件转换失败", stats.failed);
    }
    Ok(())
}
