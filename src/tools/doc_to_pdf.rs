//! DOCX → PDF 批量转换
//!
//! 递归查找输入目录下的 `.docx`，按相同的目录结构写到输出目录。
//! 输出路径中的每一段都会规范化为 ASCII（去掉声调、空格换成下划线）。

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{error, info, warn};
use unicode_normalization::UnicodeNormalization;
use walkdir::WalkDir;

use crate::error::{AppError, AppResult, InputError};
use crate::infrastructure::DocumentConverter;

/// 转换统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConversionStats {
    pub found: usize,
    pub converted: usize,
    pub failed: usize,
    pub elapsed: Duration,
}

/// 规范化文件/目录名
///
/// `"một trái"` → `"mot_trai"`，`"Đỗ"` → `"Do"`
pub fn normalize_name(name: &str) -> String {
    // Đ/đ 在 NFD 中不会分解
    name.replace('Đ', "D")
        .replace('đ', "d")
        .nfd()
        .filter(char::is_ascii)
        .map(|c| if c == ' ' { '_' } else { c })
        .collect()
}

/// 计算输入文件在输出目录中的对应 PDF 路径
pub fn mirrored_output_path(input_root: &Path, output_root: &Path, file: &Path) -> PathBuf {
    let relative = file.strip_prefix(input_root).unwrap_or(file);

    let mut target = output_root.to_path_buf();
    if let Some(parent) = relative.parent() {
        for part in parent.iter() {
            target.push(normalize_name(&part.to_string_lossy()));
        }
    }

    let stem = file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    target.push(format!("{}.pdf", normalize_name(&stem)));
    target
}

fn find_docx_files(input_root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(input_root)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("⚠️ 无法访问: {}", e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| {
            path.extension()
                .map(|ext| ext.eq_ignore_ascii_case("docx"))
                .unwrap_or(false)
        })
        .collect();
    files.sort();
    files
}

/// 转换目录下所有 `.docx`
///
/// 单个文件失败只记录日志并计数，不会中断整批转换。
///
/// # 参数
/// - `input_root`: 输入目录（递归查找）
/// - `output_root`: 输出目录（不存在时创建）
/// - `converter`: 文档转换器
pub async fn convert_directory(
    input_root: &Path,
    output_root: &Path,
    converter: &dyn DocumentConverter,
) -> AppResult<ConversionStats> {
    if !input_root.is_dir() {
        return Err(InputError::InvalidDirectory {
            path: input_root.display().to_string(),
        }
        .into());
    }
    std::fs::create_dir_all(output_root)?;

    info!("{}", "=".repeat(60));
    info!("📄 开始转换");
    info!("  输入: {}", input_root.display());
    info!("  输出: {}", output_root.display());
    info!("{}", "=".repeat(60));

    let started = Instant::now();
    let files = find_docx_files(input_root);
    let mut stats = ConversionStats {
        found: files.len(),
        ..Default::default()
    };

    if files.is_empty() {
        warn!("⚠️ 输入目录中没有 .docx 文件");
        stats.elapsed = started.elapsed();
        return Ok(stats);
    }
    info!("✓ 找到 {} 个 .docx 文件", files.len());

    for file in &files {
        let target = mirrored_output_path(input_root, output_root, file);
        info!("\n处理: {}", file.display());
        info!("  → 输出: {}", target.display());

        match convert_one(converter, file, &target).await {
            Ok(()) => {
                info!("  ✅ 成功");
                stats.converted += 1;
            }
            Err(e) => {
                error!("  ❌ 转换失败: {}", e);
                stats.failed += 1;
            }
        }
    }

    stats.elapsed = started.elapsed();
    info!("\n{}", "=".repeat(60));
    info!("📊 转换完成，用时 {:.2} 秒", stats.elapsed.as_secs_f64());
    info!("✅ 成功: {}", stats.converted);
    info!("❌ 失败: {}", stats.failed);
    info!("{}", "=".repeat(60));

    Ok(stats)
}

async fn convert_one(
    converter: &dyn DocumentConverter,
    input: &Path,
    target: &Path,
) -> AppResult<()> {
    let path = input.display().to_string();
    if let Some(parent) = target.parent() {
        std::fs::create_dir_all(parent).map_err(|e| AppError::conversion(&path, e.to_string()))?;
    }
    converter
        .convert(input, target)
        .await
        .map_err(|e| AppError::conversion(path, format!("{:#}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("một trái"), "mot_trai");
        assert_eq!(normalize_name("Đỗ"), "Do");
        assert_eq!(normalize_name("Bài tập 1"), "Bai_tap_1");
        assert_eq!(normalize_name("plain"), "plain");
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_entries_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bai.docx"), b"doc").unwrap();
        std::os::unix::fs::symlink(dir.path().join("gone"), dir.path().join("dangling"))
            .unwrap();

        let files = find_docx_files(dir.path());

        assert_eq!(files, vec![dir.path().join("bai.docx")]);
    }

    #[test]
    fn test_mirrored_output_path() {
        let target = mirrored_output_path(
            Path::new("/in"),
            Path::new("/out"),
            Path::new("/in/Lớp A/sub folder/một trái.docx"),
        );
        assert_eq!(target, PathBuf::from("/out/Lop_A/sub_folder/mot_trai.pdf"));
    }
}
