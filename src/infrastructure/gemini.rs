//! Gemini 后端 - 基础设施层
//!
//! 通过 REST 接口调用 Gemini 的 Files API 和 generateContent
//!
//! ## 技术栈
//! - 使用 `reqwest` 直接调用 HTTP 接口
//! - 文件上传使用 resumable 协议（start → upload, finalize）
//! - 生成请求强制 JSON 输出

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::json;
use std::path::Path;
use tracing::{debug, warn};

use crate::config::Config;
use crate::infrastructure::remote::{GenerationSettings, RemoteBackend, RemoteFile};

/// Gemini 后端
///
/// 职责：
/// - 持有 HTTP 客户端与凭证
/// - 只暴露 上传 / 查询 / 生成 / 删除 四种能力
/// - 不认识 ResultRow / ResultTable
pub struct GeminiBackend {
    client: Client,
    api_key: String,
    api_base_url: String,
    model_name: String,
}

impl GeminiBackend {
    /// 创建新的 Gemini 后端
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .context("无法创建 HTTP 客户端")?;

        Ok(Self {
            client,
            api_key: config.gemini_api_key.trim().to_string(),
            api_base_url: config.gemini_api_base_url.trim_end_matches('/').to_string(),
            model_name: config.gemini_model_name.clone(),
        })
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_base_url, path.trim_start_matches('/'))
    }
}

#[async_trait]
impl RemoteBackend for GeminiBackend {
    fn has_credentials(&self) -> bool {
        !self.api_key.is_empty()
    }

    async fn upload(&self, path: &Path) -> Result<RemoteFile> {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("无法读取文件: {}", path.display()))?;
        let mime_type = guess_mime_type(path);
        let display_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        debug!(
            "上传文件 {} ({} 字节, {})",
            display_name,
            bytes.len(),
            mime_type
        );

        // 1. 申请上传地址
        let start_endpoint = self.endpoint("upload/v1beta/files");
        let response = self
            .client
            .post(&start_endpoint)
            .header("x-goog-api-key", &self.api_key)
            .header("X-Goog-Upload-Protocol", "resumable")
            .header("X-Goog-Upload-Command", "start")
            .header("X-Goog-Upload-Header-Content-Length", bytes.len().to_string())
            .header("X-Goog-Upload-Header-Content-Type", mime_type)
            .json(&json!({ "file": { "display_name": display_name } }))
            .send()
            .await
            .context("上传请求发送失败")?;
        let response = ensure_success(response, &start_endpoint).await?;

        let upload_url = response
            .headers()
            .get("x-goog-upload-url")
            .and_then(|v| v.to_str().ok())
            .context("响应中缺少上传地址 (x-goog-upload-url)")?
            .to_string();

        // 2. 上传内容并结束会话
        let response = self
            .client
            .post(&upload_url)
            .header("X-Goog-Upload-Offset", "0")
            .header("X-Goog-Upload-Command", "upload, finalize")
            .body(bytes)
            .send()
            .await
            .context("文件内容上传失败")?;
        let response = ensure_success(response, "upload finalize").await?;

        let body: UploadResponse = response.json().await.context("无法解析上传响应")?;
        debug!("上传完成: {} ({:?})", body.file.name, body.file.state);

        Ok(body.file)
    }

    async fn get(&self, name: &str) -> Result<RemoteFile> {
        let endpoint = self.endpoint(&format!("v1beta/{}", name));
        let response = self
            .client
            .get(&endpoint)
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await
            .with_context(|| format!("查询文件状态失败: {}", name))?;
        let response = ensure_success(response, &endpoint).await?;

        response.json().await.context("无法解析文件状态")
    }

    async fn generate(
        &self,
        prompt: &str,
        file: &RemoteFile,
        settings: &GenerationSettings,
    ) -> Result<String> {
        debug!("调用 Gemini API，模型: {}", self.model_name);
        debug!("提示词长度: {} 字符", prompt.len());

        let mut generation_config = json!({
            "topP": settings.top_p,
            "temperature": settings.temperature,
            "thinkingConfig": { "thinkingBudget": settings.thinking_budget },
        });
        if settings.json_output {
            generation_config["responseMimeType"] = json!("application/json");
        }

        let payload = json!({
            "contents": [{
                "role": "user",
                "parts": [
                    { "text": prompt },
                    { "file_data": { "mime_type": file.mime_type, "file_uri": file.uri } }
                ]
            }],
            "generationConfig": generation_config,
        });

        let endpoint = self.endpoint(&format!(
            "v1beta/models/{}:generateContent",
            self.model_name
        ));
        let response = self
            .client
            .post(&endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                warn!("Gemini API 调用失败: {}", e);
                anyhow::anyhow!("Gemini API 调用失败: {}", e)
            })?;
        let response = ensure_success(response, &endpoint).await?;

        let body: GenerateContentResponse =
            response.json().await.context("无法解析 Gemini 响应")?;

        debug!("Gemini API 调用成功");

        body.text()
    }

    async fn delete(&self, name: &str) -> Result<()> {
        let endpoint = self.endpoint(&format!("v1beta/{}", name));
        let response = self
            .client
            .delete(&endpoint)
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await
            .with_context(|| format!("删除远程文件失败: {}", name))?;
        ensure_success(response, &endpoint).await?;
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    file: RemoteFile,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    thought: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

impl GenerateContentResponse {
    /// 拼接第一个候选结果中的文本（跳过思考内容）
    fn text(self) -> Result<String> {
        if let Some(reason) = self.prompt_feedback.and_then(|f| f.block_reason) {
            anyhow::bail!("请求被拒绝: {}", reason);
        }

        let text: String = self
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter(|p| !p.thought)
                    .filter_map(|p| p.text)
                    .collect()
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            anyhow::bail!("Gemini 返回内容为空");
        }
        Ok(text.trim().to_string())
    }
}

async fn ensure_success(response: Response, endpoint: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    anyhow::bail!("{} 返回 HTTP {}: {}", endpoint, status, body)
}

/// 根据扩展名推断 MIME 类型
pub fn guess_mime_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "pdf" => "application/pdf",
        "py" => "text/x-python",
        "txt" | "md" => "text/plain",
        "java" => "text/x-java",
        "c" | "h" => "text/x-c",
        "cpp" | "cc" | "hpp" => "text/x-c++",
        "js" => "text/javascript",
        "html" | "htm" => "text/html",
        "csv" => "text/csv",
        "json" => "application/json",
        "ipynb" => "application/json",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        _ => "text/plain",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guess_mime_type() {
        assert_eq!(guess_mime_type(Path::new("a/B.PDF")), "application/pdf");
        assert_eq!(guess_mime_type(Path::new("main.py")), "text/x-python");
        assert_eq!(guess_mime_type(Path::new("README")), "text/plain");
    }

    #[test]
    fn test_response_text_skips_thoughts() {
        let body: GenerateContentResponse = serde_json::from_str(
            r#"{
                "candidates": [{
                    "content": {
                        "parts": [
                            {"text": "thinking...", "thought": true},
                            {"text": "[{\"exercise_id\": \"1\"}]"}
                        ]
                    }
                }]
            }"#,
        )
        .unwrap();

        assert_eq!(body.text().unwrap(), r#"[{"exercise_id": "1"}]"#);
    }

    #[test]
    fn test_response_blocked_or_empty() {
        let body: GenerateContentResponse =
            serde_json::from_str(r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#).unwrap();
        assert!(body.text().unwrap_err().to_string().contains("SAFETY"));

        let body: GenerateContentResponse = serde_json::from_str(r#"{"candidates": []}"#).unwrap();
        assert!(body.text().is_err());
    }

    #[test]
    fn test_credentials_and_endpoint() {
        let config = Config {
            gemini_api_base_url: "http://localhost:9000/".to_string(),
            ..Config::default()
        };
        let backend = GeminiBackend::new(&config).unwrap();
        assert!(!backend.has_credentials());
        assert_eq!(
            backend.endpoint("/v1beta/files/abc"),
            "http://localhost:9000/v1beta/files/abc"
        );
    }

    /// 需要真实的 GEMINI_API_KEY
    #[tokio::test]
    #[ignore]
    async fn test_upload_and_delete_roundtrip() {
        let _ = tracing_subscriber::fmt::try_init();

        let config = Config::from_env().unwrap();
        let backend = GeminiBackend::new(&config).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hello.txt");
        std::fs::write(&path, "print('hello')").unwrap();

        let file = backend.upload(&path).await.unwrap();
        assert!(file.name.starts_with("files/"));
        backend.delete(&file.name).await.unwrap();
    }
}
