//! 结果行 - 每个提交文件对应一行
//!
//! 行在重试之间是可变的：每次评分都会先清空旧的题目字段，
//! 再根据新的结果重新填充。

use crate::models::outcome::{ExerciseResult, GradeOutcome};
use crate::models::submission::SubmissionFile;
use std::collections::BTreeMap;
use std::fmt;
use tracing::warn;

/// 行状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowStatus {
    Success,
    Failed,
}

impl RowStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RowStatus::Success => "success",
            RowStatus::Failed => "failed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "success" => Some(RowStatus::Success),
            "failed" => Some(RowStatus::Failed),
            _ => None,
        }
    }
}

impl fmt::Display for RowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 单道题在结果表中的三列：`ex_<id>_grade` / `ex_<id>_feedback` / `ex_<id>_attempted`
#[derive(Debug, Clone, PartialEq)]
pub struct ExerciseCell {
    pub grade: f64,
    pub feedback: String,
    pub attempted: bool,
}

/// 结果行
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRow {
    pub file_path: String,
    pub file_name: String,
    pub status: RowStatus,
    /// "总分 / 满分"，失败时为空字符串
    pub grade: String,
    pub total_grade: f64,
    pub max_score: u32,
    pub is_complete: bool,
    pub error: String,
    pub timestamp: String,
    /// 汇总后的反馈文本（仅用于展示，不写入 CSV）
    pub feedback: String,
    /// 题号 → 题目字段
    pub exercises: BTreeMap<String, ExerciseCell>,
}

impl ResultRow {
    /// 为文件创建一条空白行（尚未评分）
    pub fn new(file: &SubmissionFile) -> Self {
        Self {
            file_path: file.path_string(),
            file_name: file.name.clone(),
            status: RowStatus::Failed,
            grade: String::new(),
            total_grade: 0.0,
            max_score: 0,
            is_complete: false,
            error: String::new(),
            timestamp: now_timestamp(),
            feedback: String::new(),
            exercises: BTreeMap::new(),
        }
    }

    /// 根据一次评分结果构建新行
    pub fn from_outcome(file: &SubmissionFile, outcome: &GradeOutcome) -> Self {
        let mut row = Self::new(file);
        row.apply_outcome(outcome);
        row
    }

    /// 用评分结果覆盖本行的结果字段
    ///
    /// 旧的题目字段总是先被清空，即使新结果的题号集合不同也不会残留。
    pub fn apply_outcome(&mut self, outcome: &GradeOutcome) {
        self.exercises.clear();

        match outcome {
            GradeOutcome::Success { data } => {
                self.status = RowStatus::Success;
                self.error.clear();
                self.apply_exercises(data);
            }
            GradeOutcome::Failure { error } => {
                self.status = RowStatus::Failed;
                self.error = error.clone();
                self.mark_failed_fields();
            }
        }

        self.timestamp = now_timestamp();
    }

    /// 把行标记为失败并记录错误信息（不经过评分流程）
    ///
    /// 与失败的评分结果一样清空分数和题目字段。
    pub fn mark_failed(&mut self, error: impl Into<String>) {
        self.exercises.clear();
        self.status = RowStatus::Failed;
        self.error = error.into();
        self.mark_failed_fields();
        self.timestamp = now_timestamp();
    }

    pub fn is_failed(&self) -> bool {
        self.status == RowStatus::Failed
    }

    fn mark_failed_fields(&mut self) {
        self.grade = String::new();
        self.feedback = String::new();
        self.is_complete = false;
        self.total_grade = 0.0;
        self.max_score = 0;
    }

    fn apply_exercises(&mut self, data: &[ExerciseResult]) {
        if data.is_empty() {
            self.grade = "0 / 0".to_string();
            self.feedback = "未找到或未评分任何题目。".to_string();
            self.is_complete = false;
            self.total_grade = 0.0;
            self.max_score = 0;
            return;
        }

        let mut total_grade = 0.0;
        let mut max_score = 0;
        let mut all_attempted = true;
        let mut feedback_parts = Vec::with_capacity(data.len());

        for ex in data {
            total_grade += ex.grade;
            // 每道题满分 1 分
            max_score += 1;
            all_attempted &= ex.is_attempted;

            feedback_parts.push(feedback_block(&ex.exercise_id, ex.grade, &ex.feedback));

            let previous = self.exercises.insert(
                ex.exercise_id.clone(),
                ExerciseCell {
                    grade: ex.grade,
                    feedback: ex.feedback.clone(),
                    attempted: ex.is_attempted,
                },
            );
            if previous.is_some() {
                warn!(
                    "⚠️ {} 的评分结果中出现重复题号 {}，保留最后一个",
                    self.file_name, ex.exercise_id
                );
            }
        }

        self.total_grade = total_grade;
        self.max_score = max_score;
        self.is_complete = all_attempted;
        self.grade = format_grade(total_grade, max_score);
        self.feedback = feedback_parts.join("\n");
    }
}

/// 单道题的反馈块
pub(crate) fn feedback_block(exercise_id: &str, grade: f64, feedback: &str) -> String {
    format!(
        "**Exercise {} (Grade: {}):**\n{}\n",
        exercise_id,
        format_score(grade),
        feedback
    )
}

/// "总分 / 满分"
pub fn format_grade(total: f64, max_score: u32) -> String {
    format!("{} / {}", format_score(total), max_score)
}

/// 分数输出：整数不带小数点
pub fn format_score(score: f64) -> String {
    format!("{}", score)
}

pub(crate) fn now_timestamp() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exercise(id: &str, attempted: bool, grade: f64) -> ExerciseResult {
        ExerciseResult {
            exercise_id: id.to_string(),
            is_attempted: attempted,
            feedback: format!("feedback {}", id),
            grade,
        }
    }

    fn file() -> SubmissionFile {
        SubmissionFile::new("/subs/student_01/main.py")
    }

    #[test]
    fn test_success_aggregates() {
        let outcome = GradeOutcome::Success {
            data: vec![exercise("1", true, 1.0), exercise("2", false, 0.0)],
        };

        let row = ResultRow::from_outcome(&file(), &outcome);

        assert_eq!(row.status, RowStatus::Success);
        assert_eq!(row.total_grade, 1.0);
        assert_eq!(row.max_score, 2);
        assert_eq!(row.grade, "1 / 2");
        assert!(!row.is_complete);
        assert!(row.error.is_empty());
        assert_eq!(row.exercises.len(), 2);
        assert!(!row.exercises["2"].attempted);
        assert!(row.feedback.contains("**Exercise 1 (Grade: 1):**"));
    }

    #[test]
    fn test_half_points_and_complete() {
        let outcome = GradeOutcome::Success {
            data: vec![
                exercise("1", true, 0.5),
                exercise("2", true, 1.0),
                exercise("3", true, 0.5),
            ],
        };

        let row = ResultRow::from_outcome(&file(), &outcome);

        assert_eq!(row.total_grade, 2.0);
        assert_eq!(row.max_score, 3);
        assert_eq!(row.grade, "2 / 3");
        assert!(row.is_complete);
    }

    #[test]
    fn test_failure_resets_fields() {
        let mut row = ResultRow::from_outcome(
            &file(),
            &GradeOutcome::Success {
                data: vec![exercise("1", true, 1.0)],
            },
        );

        row.apply_outcome(&GradeOutcome::failure("Upload failed: timeout"));

        assert_eq!(row.status, RowStatus::Failed);
        assert_eq!(row.total_grade, 0.0);
        assert_eq!(row.max_score, 0);
        assert_eq!(row.grade, "");
        assert!(!row.is_complete);
        assert_eq!(row.error, "Upload failed: timeout");
        assert!(row.exercises.is_empty());
    }

    #[test]
    fn test_mark_failed_clears_previous_success() {
        let mut row = ResultRow::from_outcome(
            &file(),
            &GradeOutcome::Success {
                data: vec![exercise("1", true, 1.0), exercise("3", true, 0.5)],
            },
        );

        row.mark_failed("Critical retry error: disk full");

        assert_eq!(row.status, RowStatus::Failed);
        assert_eq!(row.grade, "");
        assert_eq!(row.total_grade, 0.0);
        assert_eq!(row.max_score, 0);
        assert!(!row.is_complete);
        assert!(row.feedback.is_empty());
        assert!(row.exercises.is_empty());
        assert_eq!(row.error, "Critical retry error: disk full");
    }

    #[test]
    fn test_stale_exercises_cleared_on_reapply() {
        let mut row = ResultRow::from_outcome(
            &file(),
            &GradeOutcome::Success {
                data: vec![exercise("1", true, 1.0), exercise("2a", true, 1.0)],
            },
        );

        row.apply_outcome(&GradeOutcome::Success {
            data: vec![exercise("1", true, 0.5), exercise("2b", false, 0.0)],
        });

        let keys: Vec<&str> = row.exercises.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["1", "2b"]);
        assert_eq!(row.total_grade, 0.5);
        assert_eq!(row.max_score, 2);
    }

    #[test]
    fn test_duplicate_ids_still_count() {
        let row = ResultRow::from_outcome(
            &file(),
            &GradeOutcome::Success {
                data: vec![exercise("1", true, 1.0), exercise("1", true, 0.5)],
            },
        );

        assert_eq!(row.max_score, 2);
        assert_eq!(row.total_grade, 1.5);
        assert_eq!(row.exercises.len(), 1);
        assert_eq!(row.exercises["1"].grade, 0.5);
    }
}
