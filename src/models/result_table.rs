//! 结果表及其 CSV 投影
//!
//! CSV 列 = 固定的核心列 + 所有行中出现过的 `ex_*` 列（按字典序排序）。
//! 文件以 UTF-8 BOM 开头，保证表格软件能正确显示非 ASCII 文本。

use crate::error::{AppError, AppResult};
use crate::models::result_row::{
    feedback_block, format_score, ExerciseCell, ResultRow, RowStatus,
};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

pub const CORE_COLUMNS: [&str; 9] = [
    "file_path",
    "file_name",
    "status",
    "grade",
    "total_grade",
    "max_score",
    "is_complete",
    "error",
    "timestamp",
];

const UTF8_BOM: &str = "\u{feff}";

const GRADE_SUFFIX: &str = "_grade";
const FEEDBACK_SUFFIX: &str = "_feedback";
const ATTEMPTED_SUFFIX: &str = "_attempted";

/// 结果表，行顺序与扫描顺序一致
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultTable {
    rows: Vec<ResultRow>,
}

impl ResultTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, row: ResultRow) {
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[ResultRow] {
        &self.rows
    }

    pub fn get(&self, index: usize) -> Option<&ResultRow> {
        self.rows.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut ResultRow> {
        self.rows.get_mut(index)
    }

    /// 所有失败行的索引
    pub fn failed_indices(&self) -> Vec<usize> {
        self.rows
            .iter()
            .enumerate()
            .filter(|(_, row)| row.is_failed())
            .map(|(i, _)| i)
            .collect()
    }

    /// (成功数, 失败数)
    pub fn counts(&self) -> (usize, usize) {
        let failed = self.rows.iter().filter(|row| row.is_failed()).count();
        (self.rows.len() - failed, failed)
    }

    /// CSV 列顺序
    pub fn columns(&self) -> Vec<String> {
        let dynamic: BTreeSet<String> = self
            .rows
            .iter()
            .flat_map(|row| row.exercises.keys())
            .flat_map(|id| {
                [
                    format!("ex_{id}{GRADE_SUFFIX}"),
                    format!("ex_{id}{FEEDBACK_SUFFIX}"),
                    format!("ex_{id}{ATTEMPTED_SUFFIX}"),
                ]
            })
            .collect();

        CORE_COLUMNS
            .iter()
            .map(|c| c.to_string())
            .chain(dynamic)
            .collect()
    }

    /// 序列化为带 BOM 的 CSV 字节
    pub fn to_csv_bytes(&self) -> AppResult<Vec<u8>> {
        let columns = self.columns();
        let mut buffer = UTF8_BOM.as_bytes().to_vec();
        {
            let mut writer = csv::Writer::from_writer(&mut buffer);
            writer.write_record(&columns)?;
            for row in &self.rows {
                writer.write_record(columns.iter().map(|c| cell_value(row, c)))?;
            }
            writer.flush()?;
        }
        Ok(buffer)
    }

    /// 整个文件重写（不追加）
    pub fn save_csv(&self, path: &Path) -> AppResult<()> {
        let bytes = self.to_csv_bytes()?;
        fs::write(path, bytes).map_err(|e| AppError::persistence(path.display().to_string(), e))
    }

    /// 从之前保存的 CSV 恢复结果表
    pub fn load_csv(path: &Path) -> AppResult<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_csv_str(&content)
    }

    pub fn from_csv_str(content: &str) -> AppResult<Self> {
        let content = content.strip_prefix(UTF8_BOM).unwrap_or(content);
        let mut reader = csv::Reader::from_reader(content.as_bytes());
        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

        let mut table = ResultTable::new();
        for record in reader.records() {
            let record = record?;
            let fields: BTreeMap<&str, &str> = headers
                .iter()
                .map(String::as_str)
                .zip(record.iter())
                .collect();
            table.push(row_from_fields(&fields));
        }
        Ok(table)
    }
}

fn cell_value(row: &ResultRow, column: &str) -> String {
    match column {
        "file_path" => row.file_path.clone(),
        "file_name" => row.file_name.clone(),
        "status" => row.status.to_string(),
        "grade" => row.grade.clone(),
        "total_grade" => format_score(row.total_grade),
        "max_score" => row.max_score.to_string(),
        "is_complete" => row.is_complete.to_string(),
        "error" => row.error.clone(),
        "timestamp" => row.timestamp.clone(),
        other => dynamic_cell(row, other).unwrap_or_default(),
    }
}

fn dynamic_cell(row: &ResultRow, column: &str) -> Option<String> {
    let (id, field) = split_dynamic_column(column)?;
    let cell = row.exercises.get(id)?;
    Some(match field {
        DynamicField::Grade => format_score(cell.grade),
        DynamicField::Feedback => cell.feedback.clone(),
        DynamicField::Attempted => cell.attempted.to_string(),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DynamicField {
    Grade,
    Feedback,
    Attempted,
}

/// `ex_<id>_<field>` → (id, field)
fn split_dynamic_column(column: &str) -> Option<(&str, DynamicField)> {
    let rest = column.strip_prefix("ex_")?;
    [
        (GRADE_SUFFIX, DynamicField::Grade),
        (FEEDBACK_SUFFIX, DynamicField::Feedback),
        (ATTEMPTED_SUFFIX, DynamicField::Attempted),
    ]
    .into_iter()
    .find_map(|(suffix, field)| rest.strip_suffix(suffix).map(|id| (id, field)))
}

fn parse_bool(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("true")
}

fn row_from_fields(fields: &BTreeMap<&str, &str>) -> ResultRow {
    let get = |name: &str| fields.get(name).copied().unwrap_or_default();

    let mut exercises: BTreeMap<String, ExerciseCell> = BTreeMap::new();
    for (column, value) in fields {
        let Some((id, field)) = split_dynamic_column(column) else {
            continue;
        };
        if value.is_empty() {
            continue;
        }
        let cell = exercises.entry(id.to_string()).or_insert(ExerciseCell {
            grade: 0.0,
            feedback: String::new(),
            attempted: false,
        });
        match field {
            DynamicField::Grade => cell.grade = value.trim().parse().unwrap_or(0.0),
            DynamicField::Feedback => cell.feedback = value.to_string(),
            DynamicField::Attempted => cell.attempted = parse_bool(value),
        }
    }

    let feedback = exercises
        .iter()
        .map(|(id, cell)| feedback_block(id, cell.grade, &cell.feedback))
        .collect::<Vec<_>>()
        .join("\n");

    ResultRow {
        file_path: get("file_path").to_string(),
        file_name: get("file_name").to_string(),
        status: RowStatus::parse(get("status")).unwrap_or(RowStatus::Failed),
        grade: get("grade").to_string(),
        total_grade: get("total_grade").trim().parse().unwrap_or(0.0),
        max_score: get("max_score").trim().parse().unwrap_or(0),
        is_complete: parse_bool(get("is_complete")),
        error: get("error").to_string(),
        timestamp: get("timestamp").to_string(),
        feedback,
        exercises,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::outcome::{ExerciseResult, GradeOutcome};
    use crate::models::submission::SubmissionFile;

    fn success(path: &str, ids: &[(&str, bool, f64)]) -> ResultRow {
        let data = ids
            .iter()
            .map(|(id, attempted, grade)| ExerciseResult {
                exercise_id: id.to_string(),
                is_attempted: *attempted,
                feedback: format!("Nhận xét, bài {id}"),
                grade: *grade,
            })
            .collect();
        ResultRow::from_outcome(&SubmissionFile::new(path), &GradeOutcome::Success { data })
    }

    #[test]
    fn test_columns_union_sorted() {
        let mut table = ResultTable::new();
        table.push(success("/s/a.py", &[("2", true, 1.0)]));
        table.push(ResultRow::from_outcome(
            &SubmissionFile::new("/s/b.py"),
            &GradeOutcome::failure("boom"),
        ));
        table.push(success("/s/c.py", &[("1", true, 0.5), ("10", false, 0.0)]));

        let columns = table.columns();
        assert_eq!(&columns[..9], &CORE_COLUMNS.map(String::from)[..]);
        assert_eq!(
            &columns[9..],
            &[
                "ex_10_attempted",
                "ex_10_feedback",
                "ex_10_grade",
                "ex_1_attempted",
                "ex_1_feedback",
                "ex_1_grade",
                "ex_2_attempted",
                "ex_2_feedback",
                "ex_2_grade",
            ]
        );
    }

    #[test]
    fn test_csv_starts_with_bom_and_has_one_line_per_row() {
        let mut table = ResultTable::new();
        table.push(success("/s/Nguyễn Văn A/bài1.py", &[("1", true, 1.0)]));
        table.push(success("/s/b.py", &[("1", false, 0.0)]));

        let bytes = table.to_csv_bytes().unwrap();
        assert_eq!(&bytes[..3], &[0xEF, 0xBB, 0xBF]);

        let text = String::from_utf8(bytes).unwrap();
        let mut reader = csv::Reader::from_reader(text.trim_start_matches('\u{feff}').as_bytes());
        assert_eq!(reader.records().count(), 2);
        assert!(text.contains("Nguyễn Văn A"));
    }

    #[test]
    fn test_reload_keeps_rows_and_exercises() {
        let mut table = ResultTable::new();
        table.push(success("/s/a.py", &[("1", true, 1.0), ("2_b", false, 0.5)]));
        table.push(ResultRow::from_outcome(
            &SubmissionFile::new("/s/b.py"),
            &GradeOutcome::failure("Upload failed, \"quota\"\nexceeded"),
        ));

        let text = String::from_utf8(table.to_csv_bytes().unwrap()).unwrap();
        let loaded = ResultTable::from_csv_str(&text).unwrap();

        assert_eq!(loaded.len(), 2);
        let first = loaded.get(0).unwrap();
        assert_eq!(first.status, RowStatus::Success);
        assert_eq!(first.grade, "1.5 / 2");
        assert_eq!(first.max_score, 2);
        assert_eq!(first.exercises["2_b"].grade, 0.5);
        assert!(!first.exercises["2_b"].attempted);

        let second = loaded.get(1).unwrap();
        assert!(second.is_failed());
        assert_eq!(second.error, "Upload failed, \"quota\"\nexceeded");
        assert!(second.exercises.is_empty());
        assert_eq!(loaded.failed_indices(), vec![1]);
    }

    #[test]
    fn test_split_dynamic_column() {
        assert_eq!(
            split_dynamic_column("ex_3a_feedback"),
            Some(("3a", DynamicField::Feedback))
        );
        assert_eq!(
            split_dynamic_column("ex_1_2_grade"),
            Some(("1_2", DynamicField::Grade))
        );
        assert_eq!(split_dynamic_column("total_grade"), None);
    }
}
