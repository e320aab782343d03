//! 成绩汇总表
//!
//! 从评分结果 CSV 中只保留"学生 / 总分 / 满分"，便于录入成绩。

use anyhow::anyhow;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::{AppError, AppResult};

const UTF8_BOM: char = '\u{feff}';

/// 从提交文件路径中提取学生标识
///
/// 提交目录名形如 `<姓名>_<学号>_assignsubmission_file`，
/// 取目录名按 `_` 切分后的倒数第三段（学号）；段数不足时返回整个目录名。
pub fn student_identifier(file_path: &str) -> String {
    let parts: Vec<&str> = file_path.split(['/', '\\']).collect();
    let dir_name = if parts.len() >= 2 {
        parts[parts.len() - 2]
    } else {
        ""
    };

    let tokens: Vec<&str> = dir_name.split('_').collect();
    if tokens.len() >= 3 {
        tokens[tokens.len() - 3].to_string()
    } else {
        dir_name.to_string()
    }
}

/// 成绩表
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreSheet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ScoreSheet {
    /// 从评分结果 CSV 内容构建
    ///
    /// # 参数
    /// - `content`: 评分结果 CSV（可带 BOM）
    /// - `extra_columns`: 需要额外保留的列，缺少任何一列都会报错
    pub fn from_results_csv(content: &str, extra_columns: &[String]) -> AppResult<Self> {
        let content = content.strip_prefix(UTF8_BOM).unwrap_or(content);
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(content.as_bytes());

        let headers = reader.headers()?.clone();
        let column_index = |name: &str| -> AppResult<usize> {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| AppError::Other(anyhow!("结果文件中缺少列: {}", name)))
        };

        let path_idx = column_index("file_path")?;
        let score_idx = column_index("total_grade")?;
        let max_idx = column_index("max_score")?;
        let extra_idx = extra_columns
            .iter()
            .map(|name| column_index(name))
            .collect::<AppResult<Vec<_>>>()?;

        let mut columns = vec![
            "name".to_string(),
            "score".to_string(),
            "max_score".to_string(),
        ];
        columns.extend(extra_columns.iter().cloned());

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            let field = |idx: usize| record.get(idx).unwrap_or_default().to_string();

            let mut row = vec![
                student_identifier(&field(path_idx)),
                field(score_idx),
                field(max_idx),
            ];
            row.extend(extra_idx.iter().map(|&idx| field(idx)));
            rows.push(row);
        }

        Ok(Self { columns, rows })
    }

    pub fn to_csv_bytes(&self) -> AppResult<Vec<u8>> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(&self.columns)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer
            .into_inner()
            .map_err(|e| AppError::Other(anyhow!("CSV 缓冲区写入失败: {}", e)))
    }
}

/// 读取评分结果 CSV，写出 `only_score_results_<YYYYmmdd_HHMMSS>.csv`
///
/// # 返回
/// 返回写出的文件路径
pub fn reshape_scores(
    input_csv: &Path,
    output_dir: &Path,
    extra_columns: &[String],
) -> AppResult<PathBuf> {
    let content = fs::read_to_string(input_csv)?;
    let sheet = ScoreSheet::from_results_csv(&content, extra_columns)?;

    if sheet.rows.is_empty() {
        warn!("⚠️ {} 中没有任何结果行", input_csv.display());
    }

    let output_path = output_dir.join(format!(
        "only_score_results_{}.csv",
        chrono::Local::now().format("%Y%m%d_%H%M%S")
    ));
    let bytes = sheet.to_csv_bytes()?;
    fs::create_dir_all(output_dir)
        .and_then(|_| fs::write(&output_path, bytes))
        .map_err(|e| AppError::persistence(output_path.display().to_string(), e))?;

    info!(
        "✅ 已写出 {} 名学生的成绩: {}",
        sheet.rows.len(),
        output_path.display()
    );
    Ok(output_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_student_identifier() {
        assert_eq!(
            student_identifier(r"C:\subs\Nguyen Van A_2201234_assignsubmission_file\main.py"),
            "2201234"
        );
        assert_eq!(
            student_identifier("/subs/Tran Thi B_2205678_assignsubmission_file/bai1.pdf"),
            "2205678"
        );
        assert_eq!(student_identifier("/subs/alice/main.py"), "alice");
        assert_eq!(student_identifier("main.py"), "");
    }

    #[test]
    fn test_sheet_from_results() {
        let content = "\u{feff}file_path,file_name,status,total_grade,max_score,error\n\
/s/An_11_assignsubmission_file/a.py,a.py,success,1.5,2,\n\
/s/bob/b.py,b.py,failed,0,0,上传失败: boom\n";

        let sheet =
            ScoreSheet::from_results_csv(content, &["status".to_string()]).unwrap();

        assert_eq!(sheet.columns, vec!["name", "score", "max_score", "status"]);
        assert_eq!(
            sheet.rows,
            vec![
                vec!["11", "1.5", "2", "success"],
                vec!["bob", "0", "0", "failed"],
            ]
        );
    }

    #[test]
    fn test_missing_extra_column() {
        let content = "file_path,total_grade,max_score\n/s/a/a.py,1,1\n";
        let err = ScoreSheet::from_results_csv(content, &["nope".to_string()]).unwrap_err();
        assert!(err.to_string().contains("nope"));
    }
}
