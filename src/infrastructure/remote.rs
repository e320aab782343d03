//! 远程推理服务边界
//!
//! upload(file) → handle; get(handle) → state; generate(prompt, handle, config) → text; delete(handle)

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;

/// 远程文件的处理状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum FileState {
    #[serde(rename = "PROCESSING")]
    Processing,
    #[serde(rename = "ACTIVE")]
    Ready,
    #[serde(rename = "FAILED")]
    Failed,
    #[serde(other)]
    Unknown,
}

/// 上传后得到的远程文件句柄
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteFile {
    /// 形如 `files/abc123`
    pub name: String,
    #[serde(default)]
    pub uri: String,
    #[serde(default)]
    pub mime_type: String,
    #[serde(default = "unknown_state")]
    pub state: FileState,
}

fn unknown_state() -> FileState {
    FileState::Unknown
}

/// 生成参数
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationSettings {
    pub top_p: f32,
    pub temperature: f32,
    /// 强制 JSON 输出
    pub json_output: bool,
    /// -1 表示不限制
    pub thinking_budget: i32,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            top_p: 0.5,
            temperature: 0.5,
            json_output: true,
            thinking_budget: -1,
        }
    }
}

impl From<&crate::config::Config> for GenerationSettings {
    fn from(config: &crate::config::Config) -> Self {
        Self {
            top_p: config.top_p,
            temperature: config.temperature,
            json_output: true,
            thinking_budget: config.thinking_budget,
        }
    }
}

/// 远程推理服务
///
/// 一次只有一个文件在处理中，实现不需要考虑并发
#[async_trait]
pub trait RemoteBackend: Send + Sync {
    /// 是否配置了可用的凭证
    fn has_credentials(&self) -> bool;

    async fn upload(&self, path: &Path) -> Result<RemoteFile>;

    async fn get(&self, name: &str) -> Result<RemoteFile>;

    async fn generate(
        &self,
        prompt: &str,
        file: &RemoteFile,
        settings: &GenerationSettings,
    ) -> Result<String>;

    async fn delete(&self, name: &str) -> Result<()>;
}
