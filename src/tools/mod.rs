//! 独立工具
//!
//! - `score_report`: 从评分结果中提取成绩表
//! - `doc_to_pdf`: 批量把 `.docx` 转换为 PDF，便于上传评分

pub mod doc_to_pdf;
pub mod score_report;

pub use doc_to_pdf::{convert_directory, mirrored_output_path, normalize_name, ConversionStats};
pub use score_report::{reshape_scores, student_identifier, ScoreSheet};
