//! 基础设施层（Infrastructure Layer）
//!
//! 持有稀缺的外部资源，只暴露能力：
//! - `RemoteBackend` / `GeminiBackend` - 远程推理服务（上传、轮询、生成、删除）
//! - `DocumentConverter` / `LibreOfficeConverter` - 外部文档转换程序

pub mod converter;
pub mod gemini;
pub mod remote;

pub use converter::{DocumentConverter, LibreOfficeConverter};
pub use gemini::GeminiBackend;
pub use remote::{FileState, GenerationSettings, RemoteBackend, RemoteFile};
