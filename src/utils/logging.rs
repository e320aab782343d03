/// 日志工具模块
///
/// 提供日志初始化、格式化和输出的辅助函数
use tracing::info;
use tracing_subscriber::EnvFilter;

/// 初始化 tracing
///
/// `RUST_LOG` 优先；否则默认 `info`，`verbose` 时为 `debug`
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录程序启动信息
///
/// # 参数
/// - `mode`: 运行模式（评分 / 重试 / 转换 …）
/// - `model`: 使用的模型名称
pub fn log_startup(mode: &str, model: &str) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - {}", mode);
    info!("🤖 模型: {}", model);
    info!("{}", "=".repeat(60));
}

/// 记录文件扫描结果
///
/// # 参数
/// - `total`: 文件总数
/// - `extensions`: 扩展名过滤条件
pub fn log_files_found(total: usize, extensions: &str) {
    info!("✓ 找到 {} 个待评分的文件 (扩展名: {})", total, extensions);
    info!("📋 将逐个顺序评分\n");
}

/// 打印最终统计信息
///
/// # 参数
/// - `success`: 成功数量
/// - `failed`: 失败数量
/// - `total`: 总数
/// - `output_path`: 结果文件路径
pub fn print_final_stats(success: usize, failed: usize, total: usize, output_path: &str) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 成功: {}/{}", success, total);
    info!("❌ 失败: {}", failed);
    info!("{}", "=".repeat(60));
    info!("\n结果已保存至: {}", output_path);
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度（按字符计）
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
