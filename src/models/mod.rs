pub mod outcome;
pub mod result_row;
pub mod result_table;
pub mod submission;

pub use outcome::{ExerciseResult, GradeOutcome};
pub use result_row::{ExerciseCell, ResultRow, RowStatus};
pub use result_table::{ResultTable, CORE_COLUMNS};
pub use submission::SubmissionFile;
