pub mod debug_log;
pub mod file_scanner;
pub mod grading_client;
pub mod prompt;

pub use debug_log::{AttemptKind, DebugLog};
pub use file_scanner::{parse_extensions, scan_folder};
pub use grading_client::{GradingClient, PollPolicy};
pub use prompt::build_grading_prompt;
