//! 外部文档转换器 - 基础设施层
//!
//! 持有转换程序（LibreOffice），只暴露"把一个文件转换成 PDF"的能力

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

use crate::config::Config;

/// 文档转换能力
#[async_trait]
pub trait DocumentConverter: Send + Sync {
    /// 把 `input` 转换为 PDF 并写到 `output`（目标目录已存在）
    async fn convert(&self, input: &Path, output: &Path) -> Result<()>;
}

/// 使用 LibreOffice 无头模式转换
pub struct LibreOfficeConverter {
    program: PathBuf,
    deadline: Duration,
}

impl LibreOfficeConverter {
    pub fn new(program: impl Into<PathBuf>, deadline: Duration) -> Self {
        Self {
            program: program.into(),
            deadline,
        }
    }

    /// 优先使用配置中的程序，否则在 PATH 中查找 soffice / libreoffice
    pub fn from_config(config: &Config) -> Result<Self> {
        let program = match &config.converter_program {
            Some(program) => PathBuf::from(program),
            None => which::which("soffice")
                .or_else(|_| which::which("libreoffice"))
                .context("未找到 soffice 或 libreoffice，请安装 LibreOffice 或设置 CONVERTER_PROGRAM")?,
        };
        Ok(Self::new(program, config.conversion_timeout()))
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

#[async_trait]
impl DocumentConverter for LibreOfficeConverter {
    async fn convert(&self, input: &Path, output: &Path) -> Result<()> {
        let target_dir = output
            .parent()
            .context("输出路径没有父目录")?;

        // 转换结果使用源文件名，先写入临时目录再移动到目标位置
        let scratch = tempfile::Builder::new()
            .prefix(".convert-")
            .tempdir_in(target_dir)
            .context("无法创建临时目录")?;

        debug!(
            "转换 {} → {}",
            input.display(),
            output.display()
        );

        let run = Command::new(&self.program)
            .arg("--headless")
            .arg("--convert-to")
            .arg("pdf")
            .arg("--outdir")
            .arg(scratch.path())
            .arg(input)
            .kill_on_drop(true)
            .output();

        let result = timeout(self.deadline, run)
            .await
            .with_context(|| format!("转换超时 ({} 秒)", self.deadline.as_secs()))?
            .with_context(|| format!("无法启动转换程序: {}", self.program.display()))?;

        if !result.status.success() {
            bail!(
                "转换程序退出码 {:?}: {}",
                result.status.code(),
                String::from_utf8_lossy(&result.stderr).trim()
            );
        }

        let stem = input
            .file_stem()
            .context("输入文件没有文件名")?
            .to_string_lossy()
            .into_owned();
        let produced = scratch.path().join(format!("{}.pdf", stem));
        if !produced.exists() {
            bail!(
                "转换程序没有生成 PDF: {}",
                String::from_utf8_lossy(&result.stdout).trim()
            );
        }

        tokio::fs::rename(&produced, output)
            .await
            .with_context(|| format!("无法移动转换结果到 {}", output.display()))?;

        Ok(())
    }
}
