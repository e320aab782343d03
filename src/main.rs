mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use grading_toolkit::utils::logging;
use grading_toolkit::Config;

#[derive(Parser)]
#[command(name = "grading_toolkit", version)]
#[command(about = "使用 Gemini 批量评分学生提交文件", long_about = None)]
struct Cli {
    /// TOML 配置文件
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// 输出调试日志
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 扫描目录并批量评分
    Grade {
        /// 提交文件所在目录
        #[arg(short, long)]
        folder: PathBuf,

        /// 逗号分隔的扩展名（默认取配置）
        #[arg(short, long)]
        extensions: Option<String>,

        /// 题目描述文件
        #[arg(short, long)]
        rubric_file: PathBuf,

        /// 结果 CSV 输出目录（默认为提交目录）
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// 批量评分结束后自动重试失败行的轮数
        #[arg(long, default_value = "0")]
        retry_rounds: usize,
    },

    /// 重试已保存结果中的失败行
    Retry {
        /// 之前生成的结果 CSV
        #[arg(short, long)]
        csv: PathBuf,

        /// 题目描述文件
        #[arg(short, long)]
        rubric_file: PathBuf,

        /// 只重试这一行（从 0 开始）
        #[arg(long)]
        row: Option<usize>,
    },

    /// 从结果 CSV 生成成绩汇总表
    Report {
        /// 评分结果 CSV
        #[arg(short, long)]
        input: PathBuf,

        /// 输出目录（默认与输入文件相同）
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// 额外保留的列，可重复
        #[arg(long = "column")]
        columns: Vec<String>,
    },

    /// 把目录下的 .docx 批量转换为 PDF
    Convert {
        /// 输入目录
        #[arg(short, long)]
        input: PathBuf,

        /// 输出目录
        #[arg(short, long)]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // 加载配置
    let mut config = Config::load(cli.config.as_deref())?;
    if cli.verbose {
        config.verbose_logging = true;
    }

    // 初始化日志
    logging::init(config.verbose_logging);

    match cli.command {
        Commands::Grade {
            folder,
            extensions,
            rubric_file,
            output_dir,
            retry_rounds,
        } => {
            let extensions = extensions.unwrap_or_else(|| config.default_extensions.clone());
            let output_dir = commands::grade_output_dir(&folder, output_dir);
            commands::grade(&config, &folder, &extensions, &rubric_file, &output_dir, retry_rounds)
                .await
        }
        Commands::Retry {
            csv,
            rubric_file,
            row,
        } => commands::retry(&config, &csv, &rubric_file, row).await,
        Commands::Report {
            input,
            output_dir,
            columns,
        } => {
            let output_dir = commands::report_output_dir(&input, output_dir);
            commands::report(&input, &output_dir, &columns)
        }
        Commands::Convert { input, output } => commands::convert(&config, &input, &output).await,
    }
}
