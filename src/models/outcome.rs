//! 评分结果模型
//!
//! 远程模型返回的 JSON 数组会被解析为 `Vec<ExerciseResult>`，
//! 每次评分尝试最终只产生一个 `GradeOutcome`。

use crate::error::GradingError;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::warn;

/// 单道题的评分结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseResult {
    #[serde(
        default = "default_exercise_id",
        deserialize_with = "deserialize_exercise_id"
    )]
    pub exercise_id: String,
    #[serde(default, deserialize_with = "deserialize_attempted")]
    pub is_attempted: bool,
    #[serde(default = "default_feedback", deserialize_with = "deserialize_feedback")]
    pub feedback: String,
    /// 取值通常为 0 / 0.5 / 1
    #[serde(default, deserialize_with = "deserialize_grade")]
    pub grade: f64,
}

/// 一次评分尝试的结果
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum GradeOutcome {
    Success { data: Vec<ExerciseResult> },
    #[serde(rename = "failed")]
    Failure { error: String },
}

impl GradeOutcome {
    pub fn failure(error: impl Into<String>) -> Self {
        GradeOutcome::Failure {
            error: error.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, GradeOutcome::Success { .. })
    }

    /// 解析模型返回的文本
    ///
    /// 必须是非空的 JSON 数组，数组元素必须是对象
    pub fn parse_response(text: &str) -> Result<Vec<ExerciseResult>, GradingError> {
        let parse_failed = || GradingError::Parse {
            raw: text.to_string(),
        };

        let value: Value = serde_json::from_str(text.trim()).map_err(|_| parse_failed())?;
        let Value::Array(items) = value else {
            return Err(parse_failed());
        };

        if items.is_empty() {
            return Err(GradingError::EmptyResult);
        }

        items
            .into_iter()
            .map(|item| {
                if !item.is_object() {
                    return Err(parse_failed());
                }
                serde_json::from_value::<ExerciseResult>(item).map_err(|_| parse_failed())
            })
            .collect()
    }
}

impl From<GradingError> for GradeOutcome {
    fn from(err: GradingError) -> Self {
        GradeOutcome::failure(err.to_string())
    }
}

fn default_exercise_id() -> String {
    "N/A".to_string()
}

fn default_feedback() -> String {
    "暂无反馈。".to_string()
}

// 题号既可能是字符串也可能是数字
fn deserialize_exercise_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Visitor;
    use std::fmt;

    struct ExerciseIdVisitor;

    impl<'de> Visitor<'de> for ExerciseIdVisitor {
        type Value = String;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string or number identifying an exercise")
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value.trim().to_string())
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value.to_string())
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value.to_string())
        }

        fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value.to_string())
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(default_exercise_id())
        }
    }

    deserializer.deserialize_any(ExerciseIdVisitor)
}

fn deserialize_attempted<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Bool(b) => b,
        Value::String(s) => s.trim().eq_ignore_ascii_case("true"),
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        _ => false,
    })
}

fn deserialize_feedback<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Null => default_feedback(),
        other => other.to_string(),
    })
}

// 非数字的分数按 0 计入总分，只记录警告
fn deserialize_grade<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let grade = match &value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    Ok(grade.filter(|g| g.is_finite()).unwrap_or_else(|| {
        warn!("⚠️ 非数字的分数 {}，按 0 分计算", value);
        0.0
    }))
}
